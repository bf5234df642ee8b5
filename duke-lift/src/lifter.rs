//! The central abstract interpreter: walks a decoded method body once, in source order,
//! maintaining a simulated operand stack and local-variable map, and emits the IR described in
//! [`crate::ir`].

use std::collections::HashMap;
use std::rc::Rc;
use duke::tree::class::ClassNameSlice;
use duke::tree::method::code::{ArrayType as DukeArrayType, Instruction, Label, Loadable};
use java_string::JavaStr;
use log::{debug, trace, warn};
use crate::error::Failure;
use crate::ir::{ArithOp, CompareOp, ConstantValue, Expr, ExprNode, InvokeKind, Op, SwitchTable};
use crate::join::{ControlFlow, FlowState, JoinResolver};
use crate::method_envelope::{InstructionOutcome, LiftedMethod, MethodEnvelope};
use crate::symbols::{FieldRef, MethodRef};
use crate::types::{PrimitiveKind, Type};

const JAVA_LANG_CLASS: &ClassNameSlice = unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/Class")) };
const JAVA_LANG_STRING: &ClassNameSlice = unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/String")) };

/// Lifts one method body into [`LiftedMethod`] IR.
///
/// The lift is strictly single-threaded and bounded in time by the instruction count plus the
/// cost of join resolution; distinct methods may be lifted in parallel by the caller without any
/// coordination, since no state is shared across calls.
pub struct Lifter;

impl Lifter {
	pub fn lift(envelope: &MethodEnvelope) -> Result<LiftedMethod, Failure> {
		debug!("lifting {} ({} instructions, {} arguments)", envelope.name, envelope.code.instructions.len(), envelope.argument_types.len());
		let result = Self::lift_inner(envelope);
		match &result {
			Ok(lifted) => debug!("lifted {}: {} operations", envelope.name, lifted.operations.len()),
			Err(failure) => warn!("lifting {} aborted: {failure}", envelope.name),
		}
		result
	}

	fn lift_inner(envelope: &MethodEnvelope) -> Result<LiftedMethod, Failure> {
		let code = &envelope.code;
		let control_flow = ControlFlow::analyze(code);
		let mut resolver = JoinResolver::new(control_flow);

		let label_positions: HashMap<Label, usize> = code.instructions.iter()
			.enumerate()
			.filter_map(|(i, e)| e.label.map(|l| (l, i)))
			.collect();

		let max_locals = code.max_locals as usize;
		let max_stack = code.max_stack as usize;

		let mut locals: Vec<Option<Expr>> = vec![None; max_locals];
		let mut arguments = Vec::new();
		let mut slot = 0usize;

		if !envelope.is_static {
			let expr: Expr = Rc::new(ExprNode::Argument {
				name: format!("arg{slot}"),
				ty: Type::Reference(envelope.owning_class.clone()),
			});
			locals[slot] = Some(expr.clone());
			arguments.push(expr);
			slot += 1;
		}
		for arg_ty in &envelope.argument_types {
			let expr: Expr = Rc::new(ExprNode::Argument { name: format!("arg{slot}"), ty: arg_ty.clone() });
			locals[slot] = Some(expr.clone());
			arguments.push(expr);
			slot += if arg_ty.is_wide() { 2 } else { 1 };
		}

		let mut stack: Vec<Expr> = Vec::with_capacity(max_stack);

		if let Some(first) = code.instructions.first() {
			if let Some(label) = first.label {
				if resolver.has_predecessors(label) {
					resolver.seed_entry(label, FlowState { locals: locals.clone(), stack: Vec::new() });
				}
			}
		}

		let mut operations = Vec::new();
		let mut expressions_by_index = HashMap::new();
		let mut instruction_outcomes = Vec::with_capacity(code.instructions.len());
		// Tracks non-void `Invoke` nodes by pointer identity, from the source index that pushed
		// them to the moment (if any) a later `pop`/`pop2` discards the result without anything
		// else ever consuming it - that's when the invoke additionally becomes an emitted
		// operation, per the two-role node design in `DESIGN.md`.
		let mut pending_invokes: HashMap<usize, usize> = HashMap::new();

		for index in 0..code.instructions.len() {
			let instruction = code.instructions[index].instruction.clone();
			let label = code.instructions[index].label;

			if index != 0 {
				if let Some(label) = label {
					if resolver.has_predecessors(label) {
						let state = resolver.resolve_entry(label, index)?;
						locals = state.locals;
						if locals.len() < max_locals {
							locals.resize(max_locals, None);
						}
						stack = state.stack;
					}
				}
			}

			trace!("lifting instruction {index}: {instruction:?}");

			let outcome = lift_one(
				index,
				&instruction,
				&mut locals,
				&mut stack,
				max_stack,
				&mut operations,
				&mut pending_invokes,
				&mut instruction_outcomes,
			)?;

			if let Some(targets) = branch_targets_with_stack(&instruction) {
				let state = FlowState { locals: locals.clone(), stack: stack.clone() };
				for target in targets {
					record_or_check(&mut resolver, &label_positions, target, index, state.clone())?;
				}
			}
			if falls_through(&instruction) {
				if let Some(next) = code.instructions.get(index + 1) {
					if let Some(next_label) = next.label {
						let state = FlowState { locals: locals.clone(), stack: stack.clone() };
						record_or_check(&mut resolver, &label_positions, next_label, index, state)?;
					}
				}
			}

			if let InstructionOutcome::Pushed(e) | InstructionOutcome::PushedAndEmitted(e) = &outcome {
				expressions_by_index.insert(index, e.clone());
			}
			instruction_outcomes.push(outcome);
		}

		// A discarded `Invoke` result is recorded into `operations` at the moment the discarding
		// `pop`/`pop2` is lifted, which can be later (in insertion order) than its own source
		// index; re-sort to restore the program order §4.4 promises. Stable so operations emitted
		// at the same index (there is at most one) keep their relative order.
		operations.sort_by_key(|(source_index, _)| *source_index);

		Ok(LiftedMethod { arguments, operations, expressions_by_index, instruction_outcomes, lift_diagnostics: Vec::new() })
	}
}

fn record_or_check(
	resolver: &mut JoinResolver,
	label_positions: &HashMap<Label, usize>,
	target: Label,
	from_index: usize,
	state: FlowState,
) -> Result<(), Failure> {
	let target_pos = label_positions.get(&target).copied().unwrap_or(usize::MAX);
	if target_pos <= from_index {
		resolver.check_back_edge(target, &state, from_index)
	} else {
		resolver.record_edge(target, from_index, state);
		Ok(())
	}
}

fn falls_through(instruction: &Instruction) -> bool {
	!matches!(
		instruction,
		Instruction::Goto(_)
			| Instruction::IReturn | Instruction::LReturn | Instruction::FReturn
			| Instruction::DReturn | Instruction::AReturn | Instruction::Return
			| Instruction::AThrow
			| Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. }
	)
}

/// The explicit (non-fallthrough) branch targets of `instruction`, for edges that need a
/// snapshot of the post-instruction state. `None` for instructions with no such targets.
fn branch_targets_with_stack(instruction: &Instruction) -> Option<Vec<Label>> {
	match instruction {
		Instruction::IfEq(l) | Instruction::IfNe(l) | Instruction::IfLt(l) | Instruction::IfGe(l)
		| Instruction::IfGt(l) | Instruction::IfLe(l)
		| Instruction::IfICmpEq(l) | Instruction::IfICmpNe(l) | Instruction::IfICmpLt(l)
		| Instruction::IfICmpGe(l) | Instruction::IfICmpGt(l) | Instruction::IfICmpLe(l)
		| Instruction::IfACmpEq(l) | Instruction::IfACmpNe(l)
		| Instruction::IfNull(l) | Instruction::IfNonNull(l)
		| Instruction::Goto(l) | Instruction::Jsr(l) => Some(vec![*l]),
		Instruction::TableSwitch { default, table, .. } => {
			let mut v = table.clone();
			v.push(*default);
			Some(v)
		},
		Instruction::LookupSwitch { default, pairs } => {
			let mut v: Vec<Label> = pairs.iter().map(|(_, l)| *l).collect();
			v.push(*default);
			Some(v)
		},
		_ => None,
	}
}

fn push(stack: &mut Vec<Expr>, max_stack: usize, index: usize, e: Expr) -> Result<(), Failure> {
	if stack.len() >= max_stack {
		return Err(Failure::StackOverflow { source_index: index });
	}
	stack.push(e);
	Ok(())
}

fn pop(stack: &mut Vec<Expr>, index: usize) -> Result<Expr, Failure> {
	stack.pop().ok_or(Failure::StackUnderflow { source_index: index })
}

fn load_local(locals: &[Option<Expr>], idx: usize, index: usize) -> Result<Expr, Failure> {
	locals.get(idx).and_then(|b| b.clone()).ok_or(Failure::StackUnderflow { source_index: index })
}

fn store_local(locals: &mut [Option<Expr>], max_locals: usize, idx: usize, index: usize, e: Expr) -> Result<(), Failure> {
	if idx >= max_locals {
		return Err(Failure::LocalOverflow { source_index: index });
	}
	locals[idx] = Some(e);
	Ok(())
}

fn int_const(value: i32) -> Expr {
	Rc::new(ExprNode::Constant { value: ConstantValue::Int(value), ty: Type::Primitive(PrimitiveKind::Int) })
}

fn comparison(op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
	Rc::new(ExprNode::Comparison { op, lhs, rhs })
}

fn logical_not(inner: Expr) -> Expr {
	Rc::new(ExprNode::LogicalNot { inner })
}

/// Builds the condition expression and whether the comparison is against `null`/zero (unary) or
/// between two popped values (binary), and whether the opcode is a negated sense of its family,
/// per the table in `SPEC_FULL.md` §4.4.
fn branch_condition(
	instruction: &Instruction,
	index: usize,
	stack: &mut Vec<Expr>,
) -> Result<Option<Expr>, Failure> {
	let zero = || int_const(0);
	let null = || -> Expr { Rc::new(ExprNode::Constant { value: ConstantValue::Null, ty: Type::Null }) };

	Ok(Some(match instruction {
		Instruction::IfEq(_) => { let v = pop(stack, index)?; comparison(CompareOp::Eq, v, zero()) },
		Instruction::IfNe(_) => { let v = pop(stack, index)?; logical_not(comparison(CompareOp::Eq, v, zero())) },
		Instruction::IfLt(_) => { let v = pop(stack, index)?; comparison(CompareOp::Lt, v, zero()) },
		Instruction::IfGe(_) => { let v = pop(stack, index)?; logical_not(comparison(CompareOp::Lt, v, zero())) },
		Instruction::IfGt(_) => { let v = pop(stack, index)?; comparison(CompareOp::Gt, v, zero()) },
		Instruction::IfLe(_) => { let v = pop(stack, index)?; logical_not(comparison(CompareOp::Gt, v, zero())) },
		Instruction::IfICmpEq(_) | Instruction::IfACmpEq(_) => {
			let rhs = pop(stack, index)?; let lhs = pop(stack, index)?;
			comparison(CompareOp::Eq, lhs, rhs)
		},
		Instruction::IfICmpNe(_) | Instruction::IfACmpNe(_) => {
			let rhs = pop(stack, index)?; let lhs = pop(stack, index)?;
			logical_not(comparison(CompareOp::Eq, lhs, rhs))
		},
		Instruction::IfICmpLt(_) => { let rhs = pop(stack, index)?; let lhs = pop(stack, index)?; comparison(CompareOp::Lt, lhs, rhs) },
		Instruction::IfICmpGe(_) => { let rhs = pop(stack, index)?; let lhs = pop(stack, index)?; logical_not(comparison(CompareOp::Lt, lhs, rhs)) },
		Instruction::IfICmpGt(_) => { let rhs = pop(stack, index)?; let lhs = pop(stack, index)?; comparison(CompareOp::Gt, lhs, rhs) },
		Instruction::IfICmpLe(_) => { let rhs = pop(stack, index)?; let lhs = pop(stack, index)?; logical_not(comparison(CompareOp::Gt, lhs, rhs)) },
		Instruction::IfNull(_) => { let v = pop(stack, index)?; comparison(CompareOp::Eq, v, null()) },
		Instruction::IfNonNull(_) => { let v = pop(stack, index)?; logical_not(comparison(CompareOp::Eq, v, null())) },
		Instruction::Goto(_) => return Ok(None),
		_ => unreachable!("branch_condition called on a non-branch instruction"),
	}))
}

#[allow(clippy::too_many_lines)]
fn lift_one(
	index: usize,
	instruction: &Instruction,
	locals: &mut Vec<Option<Expr>>,
	stack: &mut Vec<Expr>,
	max_stack: usize,
	operations: &mut Vec<(usize, Op)>,
	pending_invokes: &mut HashMap<usize, usize>,
	instruction_outcomes: &mut [InstructionOutcome],
) -> Result<InstructionOutcome, Failure> {
	let max_locals = locals.len();
	macro_rules! push_new {
		($e:expr) => {{
			let e: Expr = $e;
			push(stack, max_stack, index, e.clone())?;
			return Ok(InstructionOutcome::Pushed(e));
		}};
	}
	macro_rules! emit {
		($op:expr) => {{
			operations.push((index, $op));
			return Ok(InstructionOutcome::Emitted);
		}};
	}
	macro_rules! unimplemented_opcode {
		($name:literal) => {
			return Err(Failure::Unimplemented { opcode: $name, source_index: index })
		};
	}

	match instruction {
		Instruction::Nop => Ok(InstructionOutcome::NoOp),

		Instruction::AConstNull => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Null, ty: Type::Null })),
		Instruction::IConstM1 => push_new!(int_const(-1)),
		Instruction::IConst0 => push_new!(int_const(0)),
		Instruction::IConst1 => push_new!(int_const(1)),
		Instruction::IConst2 => push_new!(int_const(2)),
		Instruction::IConst3 => push_new!(int_const(3)),
		Instruction::IConst4 => push_new!(int_const(4)),
		Instruction::IConst5 => push_new!(int_const(5)),
		Instruction::LConst0 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Long(0), ty: Type::Primitive(PrimitiveKind::Long) })),
		Instruction::LConst1 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Long(1), ty: Type::Primitive(PrimitiveKind::Long) })),
		Instruction::FConst0 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Float(0.0), ty: Type::Primitive(PrimitiveKind::Float) })),
		Instruction::FConst1 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Float(1.0), ty: Type::Primitive(PrimitiveKind::Float) })),
		Instruction::FConst2 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Float(2.0), ty: Type::Primitive(PrimitiveKind::Float) })),
		Instruction::DConst0 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Double(0.0), ty: Type::Primitive(PrimitiveKind::Double) })),
		Instruction::DConst1 => push_new!(Rc::new(ExprNode::Constant { value: ConstantValue::Double(1.0), ty: Type::Primitive(PrimitiveKind::Double) })),
		Instruction::BiPush(v) => push_new!(int_const(i32::from(*v))),
		Instruction::SiPush(v) => push_new!(int_const(i32::from(*v))),
		Instruction::Ldc(loadable) => push_new!(lift_loadable(loadable)),

		Instruction::ILoad(i) | Instruction::LLoad(i) | Instruction::FLoad(i) | Instruction::DLoad(i) | Instruction::ALoad(i) => {
			let e = load_local(locals, i.index as usize, index)?;
			push(stack, max_stack, index, e.clone())?;
			Ok(InstructionOutcome::Pushed(e))
		},

		Instruction::IStore(i) | Instruction::LStore(i) | Instruction::FStore(i) | Instruction::DStore(i) | Instruction::AStore(i) => {
			let value = pop(stack, index)?;
			store_local(locals, max_locals, i.index as usize, index, value)?;
			Ok(InstructionOutcome::StackOnly)
		},

		Instruction::IALoad | Instruction::LALoad | Instruction::FALoad | Instruction::DALoad
		| Instruction::AALoad | Instruction::BALoad | Instruction::CALoad | Instruction::SALoad => {
			let idx = pop(stack, index)?;
			let array = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::ArrayLoad { array, index: idx }))
		},

		Instruction::IAStore | Instruction::LAStore | Instruction::FAStore | Instruction::DAStore
		| Instruction::AAStore | Instruction::BAStore | Instruction::CAStore | Instruction::SAStore => {
			let value = pop(stack, index)?;
			let idx = pop(stack, index)?;
			let array = pop(stack, index)?;
			emit!(Op::ArrayStore { array, index: idx, value })
		},

		Instruction::Pop => {
			let discarded = pop(stack, index)?;
			discard_if_invoke(&discarded, operations, pending_invokes, instruction_outcomes);
			Ok(InstructionOutcome::StackOnly)
		},
		Instruction::Pop2 => {
			let top = stack.last().ok_or(Failure::StackUnderflow { source_index: index })?.clone();
			let first = pop(stack, index)?;
			discard_if_invoke(&first, operations, pending_invokes, instruction_outcomes);
			if !top.ty()?.is_wide() {
				let second = pop(stack, index)?;
				discard_if_invoke(&second, operations, pending_invokes, instruction_outcomes);
			}
			Ok(InstructionOutcome::StackOnly)
		},
		Instruction::Dup => {
			let top = stack.last().ok_or(Failure::StackUnderflow { source_index: index })?.clone();
			push(stack, max_stack, index, top)?;
			Ok(InstructionOutcome::StackOnly)
		},
		Instruction::Dup2 => {
			let top = stack.last().ok_or(Failure::StackUnderflow { source_index: index })?.clone();
			if top.ty()?.is_wide() {
				push(stack, max_stack, index, top)?;
			} else {
				let v1 = pop(stack, index)?;
				let v2 = pop(stack, index)?;
				push(stack, max_stack, index, v2.clone())?;
				push(stack, max_stack, index, v1.clone())?;
				push(stack, max_stack, index, v2)?;
				push(stack, max_stack, index, v1)?;
			}
			Ok(InstructionOutcome::StackOnly)
		},
		Instruction::Swap => {
			let v1 = pop(stack, index)?;
			let v2 = pop(stack, index)?;
			push(stack, max_stack, index, v1)?;
			push(stack, max_stack, index, v2)?;
			Ok(InstructionOutcome::StackOnly)
		},
		Instruction::DupX1 => unimplemented_opcode!("dup_x1"),
		Instruction::DupX2 => unimplemented_opcode!("dup_x2"),
		Instruction::Dup2X1 => unimplemented_opcode!("dup2_x1"),
		Instruction::Dup2X2 => unimplemented_opcode!("dup2_x2"),

		Instruction::IAdd | Instruction::LAdd | Instruction::FAdd | Instruction::DAdd => lift_binary(stack, index, max_stack, ArithOp::Add),
		Instruction::ISub | Instruction::LSub | Instruction::FSub | Instruction::DSub => lift_binary(stack, index, max_stack, ArithOp::Sub),
		Instruction::IMul | Instruction::LMul | Instruction::FMul | Instruction::DMul => lift_binary(stack, index, max_stack, ArithOp::Mul),
		Instruction::IDiv | Instruction::LDiv | Instruction::FDiv | Instruction::DDiv => lift_binary(stack, index, max_stack, ArithOp::Div),
		Instruction::IRem | Instruction::LRem | Instruction::FRem | Instruction::DRem => lift_binary(stack, index, max_stack, ArithOp::Rem),
		Instruction::IShl | Instruction::LShl => lift_binary(stack, index, max_stack, ArithOp::Shl),
		Instruction::IShr | Instruction::LShr => lift_binary(stack, index, max_stack, ArithOp::Shr),
		Instruction::IUShr | Instruction::LUShr => lift_binary(stack, index, max_stack, ArithOp::UShr),
		Instruction::IAnd | Instruction::LAnd => lift_binary(stack, index, max_stack, ArithOp::And),
		Instruction::IOr | Instruction::LOr => lift_binary(stack, index, max_stack, ArithOp::Or),
		Instruction::IXor | Instruction::LXor => lift_binary(stack, index, max_stack, ArithOp::Xor),

		Instruction::INeg | Instruction::LNeg | Instruction::FNeg | Instruction::DNeg => {
			let value = pop(stack, index)?;
			let ty = value.ty()?;
			let zero = zero_of(&ty);
			let e = ExprNode::binary_arithmetic(ArithOp::Sub, zero, value, index)?;
			push(stack, max_stack, index, e.clone())?;
			Ok(InstructionOutcome::Pushed(e))
		},

		Instruction::IInc(lv, delta) => {
			let slot = lv.index as usize;
			let current = load_local(locals, slot, index)?;
			let delta_const = int_const(i32::from(*delta));
			let incremented = ExprNode::binary_arithmetic(ArithOp::Add, current, delta_const, index)?;
			store_local(locals, max_locals, slot, index, incremented)?;
			Ok(InstructionOutcome::StackOnly)
		},

		Instruction::I2L | Instruction::I2F | Instruction::I2D
		| Instruction::L2I | Instruction::L2F | Instruction::L2D
		| Instruction::F2I | Instruction::F2L | Instruction::F2D
		| Instruction::D2I | Instruction::D2L | Instruction::D2F
		| Instruction::I2B | Instruction::I2C | Instruction::I2S => {
			let target = conversion_target(instruction);
			let inner = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::Cast { inner, target }))
		},

		Instruction::LCmp => unimplemented_opcode!("lcmp"),
		Instruction::FCmpL => unimplemented_opcode!("fcmpl"),
		Instruction::FCmpG => unimplemented_opcode!("fcmpg"),
		Instruction::DCmpL => unimplemented_opcode!("dcmpl"),
		Instruction::DCmpG => unimplemented_opcode!("dcmpg"),

		Instruction::IfEq(l) | Instruction::IfNe(l) | Instruction::IfLt(l) | Instruction::IfGe(l)
		| Instruction::IfGt(l) | Instruction::IfLe(l)
		| Instruction::IfICmpEq(l) | Instruction::IfICmpNe(l) | Instruction::IfICmpLt(l)
		| Instruction::IfICmpGe(l) | Instruction::IfICmpGt(l) | Instruction::IfICmpLe(l)
		| Instruction::IfACmpEq(l) | Instruction::IfACmpNe(l)
		| Instruction::IfNull(l) | Instruction::IfNonNull(l) => {
			let condition = branch_condition(instruction, index, stack)?;
			emit!(Op::Branch { condition, destination: *l })
		},

		Instruction::Goto(l) => emit!(Op::Branch { condition: None, destination: *l }),

		Instruction::Jsr(l) => emit!(Op::SubroutineCall { destination: *l }),
		Instruction::Ret(_) => emit!(Op::SubroutineReturn),

		Instruction::TableSwitch { default, low, table, .. } => {
			let selector = pop(stack, index)?;
			let cases = table.iter().enumerate()
				.map(|(offset, label)| (*low + offset as i32, *label))
				.collect();
			emit!(Op::Switch { selector, table: SwitchTable { default: *default, cases } })
		},
		Instruction::LookupSwitch { default, pairs } => {
			let selector = pop(stack, index)?;
			emit!(Op::Switch { selector, table: SwitchTable { default: *default, cases: pairs.clone() } })
		},

		Instruction::IReturn | Instruction::LReturn | Instruction::FReturn | Instruction::DReturn | Instruction::AReturn => {
			let value = pop(stack, index)?;
			emit!(Op::Return { value: Some(value) })
		},
		Instruction::Return => emit!(Op::Return { value: None }),

		Instruction::GetStatic(field) => {
			let field = FieldRef::resolve(field)?;
			push_new!(Rc::new(ExprNode::FieldRead { field, receiver: None }))
		},
		Instruction::PutStatic(field) => {
			let field = FieldRef::resolve(field)?;
			let value = pop(stack, index)?;
			emit!(Op::FieldWrite { field, value, receiver: None })
		},
		Instruction::GetField(field) => {
			let field = FieldRef::resolve(field)?;
			let receiver = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::FieldRead { field, receiver: Some(receiver) }))
		},
		Instruction::PutField(field) => {
			let field = FieldRef::resolve(field)?;
			let value = pop(stack, index)?;
			let receiver = pop(stack, index)?;
			emit!(Op::FieldWrite { field, value, receiver: Some(receiver) })
		},

		Instruction::InvokeVirtual(method) => lift_invoke(InvokeKind::Virtual, method, true, index, stack, max_stack, operations, pending_invokes),
		Instruction::InvokeSpecial(method, _) => lift_invoke(InvokeKind::Special, method, true, index, stack, max_stack, operations, pending_invokes),
		Instruction::InvokeStatic(method, _) => lift_invoke(InvokeKind::Static, method, false, index, stack, max_stack, operations, pending_invokes),
		Instruction::InvokeInterface(method) => lift_invoke(InvokeKind::Interface, method, true, index, stack, max_stack, operations, pending_invokes),

		Instruction::New(class) => push_new!(Rc::new(ExprNode::Allocate { ty: Type::Reference(class.clone()), dims: None })),
		Instruction::NewArray(atype) => {
			let length = pop(stack, index)?;
			let element = array_type_to_type(*atype);
			push_new!(Rc::new(ExprNode::Allocate { ty: Type::make_array(element, 1), dims: Some(vec![length]) }))
		},
		Instruction::ANewArray(class) => {
			let length = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::Allocate { ty: Type::make_array(Type::Reference(class.clone()), 1), dims: Some(vec![length]) }))
		},
		Instruction::ArrayLength => {
			let array = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::ArrayLength { array }))
		},
		Instruction::AThrow => {
			let value = pop(stack, index)?;
			emit!(Op::Throw { value })
		},
		Instruction::CheckCast(class) => {
			let inner = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::Cast { inner, target: Type::Reference(class.clone()) }))
		},
		Instruction::InstanceOf(class) => {
			let inner = pop(stack, index)?;
			push_new!(Rc::new(ExprNode::InstanceCheck { inner, probe: Type::Reference(class.clone()) }))
		},
		Instruction::MonitorEnter => { let value = pop(stack, index)?; emit!(Op::MonitorEnter { value }) },
		Instruction::MonitorExit => { let value = pop(stack, index)?; emit!(Op::MonitorExit { value }) },
		Instruction::MultiANewArray(class, dims) => {
			let k = *dims as usize;
			let mut lengths = Vec::with_capacity(k);
			for _ in 0..k {
				lengths.push(pop(stack, index)?);
			}
			lengths.reverse();
			push_new!(Rc::new(ExprNode::Allocate { ty: Type::make_array(Type::Reference(class.clone()), *dims), dims: Some(lengths) }))
		},
	}
}

fn lift_binary(stack: &mut Vec<Expr>, index: usize, max_stack: usize, op: ArithOp) -> Result<InstructionOutcome, Failure> {
	let rhs = pop(stack, index)?;
	let lhs = pop(stack, index)?;
	let e = ExprNode::binary_arithmetic(op, lhs, rhs, index)?;
	push(stack, max_stack, index, e.clone())?;
	Ok(InstructionOutcome::Pushed(e))
}

fn zero_of(ty: &Type) -> Expr {
	match ty {
		Type::Primitive(PrimitiveKind::Long) => Rc::new(ExprNode::Constant { value: ConstantValue::Long(0), ty: ty.clone() }),
		Type::Primitive(PrimitiveKind::Float) => Rc::new(ExprNode::Constant { value: ConstantValue::Float(0.0), ty: ty.clone() }),
		Type::Primitive(PrimitiveKind::Double) => Rc::new(ExprNode::Constant { value: ConstantValue::Double(0.0), ty: ty.clone() }),
		_ => int_const(0),
	}
}

fn conversion_target(instruction: &Instruction) -> Type {
	use PrimitiveKind::*;
	let p = |k| Type::Primitive(k);
	match instruction {
		Instruction::I2L => p(Long), Instruction::I2F => p(Float), Instruction::I2D => p(Double),
		Instruction::L2I => p(Int), Instruction::L2F => p(Float), Instruction::L2D => p(Double),
		Instruction::F2I => p(Int), Instruction::F2L => p(Long), Instruction::F2D => p(Double),
		Instruction::D2I => p(Int), Instruction::D2L => p(Long), Instruction::D2F => p(Float),
		Instruction::I2B => p(Byte), Instruction::I2C => p(Char), Instruction::I2S => p(Short),
		_ => unreachable!("conversion_target called on a non-conversion instruction"),
	}
}

fn array_type_to_type(atype: DukeArrayType) -> Type {
	Type::Primitive(match atype {
		DukeArrayType::Boolean => PrimitiveKind::Boolean,
		DukeArrayType::Char => PrimitiveKind::Char,
		DukeArrayType::Float => PrimitiveKind::Float,
		DukeArrayType::Double => PrimitiveKind::Double,
		DukeArrayType::Byte => PrimitiveKind::Byte,
		DukeArrayType::Short => PrimitiveKind::Short,
		DukeArrayType::Int => PrimitiveKind::Int,
		DukeArrayType::Long => PrimitiveKind::Long,
	})
}

fn lift_loadable(loadable: &Loadable) -> Expr {
	match loadable {
		Loadable::Integer(v) => Rc::new(ExprNode::Constant { value: ConstantValue::Int(*v), ty: Type::Primitive(PrimitiveKind::Int) }),
		Loadable::Float(v) => Rc::new(ExprNode::Constant { value: ConstantValue::Float(*v), ty: Type::Primitive(PrimitiveKind::Float) }),
		Loadable::Long(v) => Rc::new(ExprNode::Constant { value: ConstantValue::Long(*v), ty: Type::Primitive(PrimitiveKind::Long) }),
		Loadable::Double(v) => Rc::new(ExprNode::Constant { value: ConstantValue::Double(*v), ty: Type::Primitive(PrimitiveKind::Double) }),
		Loadable::Class(class) => Rc::new(ExprNode::Constant {
			value: ConstantValue::Class(class.clone()),
			ty: Type::Reference(JAVA_LANG_CLASS.to_owned()),
		}),
		Loadable::String(s) => Rc::new(ExprNode::Constant {
			value: ConstantValue::String(s.clone()),
			ty: Type::Reference(JAVA_LANG_STRING.to_owned()),
		}),
	}
}

fn lift_invoke(
	kind: InvokeKind,
	method: &duke::tree::method::MethodRef,
	has_receiver: bool,
	index: usize,
	stack: &mut Vec<Expr>,
	max_stack: usize,
	operations: &mut Vec<(usize, Op)>,
	pending_invokes: &mut HashMap<usize, usize>,
) -> Result<InstructionOutcome, Failure> {
	let method = MethodRef::resolve(method)?;

	let mut arguments = Vec::with_capacity(method.arg_types.len());
	for _ in &method.arg_types {
		arguments.push(pop(stack, index)?);
	}
	arguments.reverse();

	let receiver = if has_receiver { Some(pop(stack, index)?) } else { None };

	let is_void = method.is_void();
	let node: Expr = Rc::new(ExprNode::Invoke { kind, method, arguments, receiver });

	if is_void {
		operations.push((index, Op::Invoke(node)));
		Ok(InstructionOutcome::Emitted)
	} else {
		push(stack, max_stack, index, node.clone())?;
		pending_invokes.insert(Rc::as_ptr(&node) as usize, index);
		Ok(InstructionOutcome::Pushed(node))
	}
}

/// If `discarded` is a still-unused non-void `Invoke`, records it into `operations` (at its own
/// source index, not `discard_index`) and patches its instruction's recorded outcome from
/// [`InstructionOutcome::Pushed`] to [`InstructionOutcome::PushedAndEmitted`].
fn discard_if_invoke(
	discarded: &Expr,
	operations: &mut Vec<(usize, Op)>,
	pending_invokes: &mut HashMap<usize, usize>,
	instruction_outcomes: &mut [InstructionOutcome],
) {
	let Some(invoke_index) = pending_invokes.remove(&(Rc::as_ptr(discarded) as usize)) else { return };
	operations.push((invoke_index, Op::Invoke(discarded.clone())));
	if let Some(outcome @ InstructionOutcome::Pushed(_)) = instruction_outcomes.get_mut(invoke_index) {
		*outcome = InstructionOutcome::PushedAndEmitted(discarded.clone());
	}
}
