//! End-to-end lifting scenarios S1-S6, and the cross-cutting invariants of §8.

use pretty_assertions::assert_eq;
use duke::tree::class::ClassName;
use duke::tree::field::{FieldDescriptor, FieldName, FieldRef as DukeFieldRef, ObjClassName};
use duke::tree::method::code::{Code, Instruction, InstructionListEntry, LvIndex};
use duke::tree::method::{MethodDescriptor, MethodName, MethodRef as DukeMethodRef};
use duke_lift::ir::{ArithOp, ConstantValue, Expr, ExprNode, InvokeKind, Op};
use duke_lift::lifter::Lifter;
use duke_lift::method_envelope::MethodEnvelope;
use duke_lift::symbols::{FieldRef, MethodRef};
use duke_lift::types::{PrimitiveKind, Type};
use std::rc::Rc;

fn class(name: &str) -> ClassName {
	unsafe { ClassName::from_inner_unchecked(name.into()) }
}

fn method_name(name: &str) -> MethodName {
	MethodName::try_from(java_string::JavaString::from(name)).unwrap()
}

fn entry(instruction: Instruction) -> InstructionListEntry {
	InstructionListEntry { label: None, instruction }
}

fn int_type() -> Type {
	Type::Primitive(PrimitiveKind::Int)
}

fn int_const(v: i32) -> Expr {
	Rc::new(ExprNode::Constant { value: ConstantValue::Int(v), ty: int_type() })
}

fn argument(name: &str, ty: Type) -> Expr {
	Rc::new(ExprNode::Argument { name: name.to_owned(), ty })
}

/// S1 - constant return: `ICONST_3; IRETURN` lifts to one `Return(Constant(3, int))`.
#[test]
fn s1_constant_return() {
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("constantReturn"),
		argument_types: vec![],
		return_type: int_type(),
		is_static: true,
		code: Code {
			max_stack: 1,
			max_locals: 0,
			instructions: vec![entry(Instruction::IConst3), entry(Instruction::IReturn)],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	assert_eq!(lifted.operations, vec![(1, Op::Return { value: Some(int_const(3)) })]);
}

/// S2 - add two arguments: `(II)I`, not static: `ILOAD_1; ILOAD_2; IADD; IRETURN`.
#[test]
fn s2_add_two_arguments() {
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("addArguments"),
		argument_types: vec![int_type(), int_type()],
		return_type: int_type(),
		is_static: false,
		code: Code {
			max_stack: 2,
			max_locals: 3,
			instructions: vec![
				entry(Instruction::ILoad(LvIndex { index: 1 })),
				entry(Instruction::ILoad(LvIndex { index: 2 })),
				entry(Instruction::IAdd),
				entry(Instruction::IReturn),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let arg1 = argument("arg1", int_type());
	let arg2 = argument("arg2", int_type());
	let sum = Rc::new(ExprNode::BinaryArithmetic { op: ArithOp::Add, lhs: arg1, rhs: arg2 });
	assert_eq!(sum.ty().unwrap(), int_type());
	assert_eq!(lifted.operations, vec![(3, Op::Return { value: Some(sum) })]);
}

/// S3 - static field increment: `GETSTATIC f:int; ICONST_1; IADD; PUTSTATIC f:int; RETURN`.
#[test]
fn s3_static_field_increment() {
	let field = field_ref();
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("staticFieldIncrement"),
		argument_types: vec![],
		return_type: Type::Void,
		is_static: true,
		code: Code {
			max_stack: 2,
			max_locals: 0,
			instructions: vec![
				entry(Instruction::GetStatic(field.clone())),
				entry(Instruction::IConst1),
				entry(Instruction::IAdd),
				entry(Instruction::PutStatic(field)),
				entry(Instruction::Return),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let field = FieldRef { owner: class("Demo"), name: java_field_name(), ty: int_type() };
	let read = Rc::new(ExprNode::FieldRead { field: field.clone(), receiver: None });
	let sum = Rc::new(ExprNode::BinaryArithmetic { op: ArithOp::Add, lhs: read, rhs: int_const(1) });
	assert_eq!(
		lifted.operations,
		vec![
			(3, Op::FieldWrite { field, value: sum, receiver: None }),
			(4, Op::Return { value: None }),
		],
	);
}

/// S4 - local increment via `IINC`: slot 1 bound to `arg1:int`, `IINC 1, 5; ILOAD_1; IRETURN`.
#[test]
fn s4_local_increment_via_iinc() {
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("localIncrement"),
		argument_types: vec![int_type()],
		return_type: int_type(),
		is_static: false,
		code: Code {
			max_stack: 1,
			max_locals: 2,
			instructions: vec![
				entry(Instruction::IInc(LvIndex { index: 1 }, 5)),
				entry(Instruction::ILoad(LvIndex { index: 1 })),
				entry(Instruction::IReturn),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let arg1 = argument("arg1", int_type());
	let incremented = Rc::new(ExprNode::BinaryArithmetic { op: ArithOp::Add, lhs: arg1, rhs: int_const(5) });
	assert_eq!(lifted.operations, vec![(2, Op::Return { value: Some(incremented) })]);
}

/// S5 - virtual invocation with discarded result: `ALOAD_0; INVOKEVIRTUAL m()I; POP; RETURN`.
#[test]
fn s5_virtual_invoke_discarded() {
	let method = DukeMethodRef {
		class: class("Demo"),
		name: method_name("m"),
		desc: MethodDescriptor::try_from(java_string::JavaString::from("()I")).unwrap(),
	};
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("virtualInvokeDiscarded"),
		argument_types: vec![],
		return_type: Type::Void,
		is_static: false,
		code: Code {
			max_stack: 1,
			max_locals: 1,
			instructions: vec![
				entry(Instruction::ALoad(LvIndex { index: 0 })),
				entry(Instruction::InvokeVirtual(method)),
				entry(Instruction::Pop),
				entry(Instruction::Return),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let receiver = argument("arg0", Type::Reference(class("Demo")));
	let resolved = MethodRef { owner: class("Demo"), name: method_name("m"), arg_types: vec![], return_type: int_type() };
	let invoke = Rc::new(ExprNode::Invoke { kind: InvokeKind::Virtual, method: resolved, arguments: vec![], receiver: Some(receiver) });
	assert_eq!(
		lifted.operations,
		vec![(1, Op::Invoke(invoke)), (3, Op::Return { value: None })],
	);
}

/// S6 - array store: `ALOAD_1; ICONST_0; ICONST_7; IASTORE; RETURN` (using `bipush 7` for the
/// constant, since the source machine has no dedicated `iconst_7` opcode).
#[test]
fn s6_array_store() {
	let array_type = Type::make_array(int_type(), 1);
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("arrayStore"),
		argument_types: vec![array_type.clone()],
		return_type: Type::Void,
		is_static: false,
		code: Code {
			max_stack: 3,
			max_locals: 2,
			instructions: vec![
				entry(Instruction::ALoad(LvIndex { index: 1 })),
				entry(Instruction::IConst0),
				entry(Instruction::BiPush(7)),
				entry(Instruction::IAStore),
				entry(Instruction::Return),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let array = argument("arg1", array_type);
	assert_eq!(
		lifted.operations,
		vec![
			(3, Op::ArrayStore { array, index: int_const(0), value: int_const(7) }),
			(4, Op::Return { value: None }),
		],
	);
}

/// §8 invariant 5: an empty instruction list lifts to empty operations and an empty expression
/// map.
#[test]
fn empty_method_lifts_to_empty_output() {
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("empty"),
		argument_types: vec![],
		return_type: Type::Void,
		is_static: true,
		code: Code { max_stack: 0, max_locals: 0, instructions: vec![] },
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	assert!(lifted.operations.is_empty());
	assert!(lifted.expressions_by_index.is_empty());
}

/// §8 invariant 3: an `Invoke`'s argument count always matches the resolved method's parameter
/// count, in declaration order (not pop order).
#[test]
fn invoke_argument_count_and_order() {
	let method = DukeMethodRef {
		class: class("Demo"),
		name: method_name("pair"),
		desc: MethodDescriptor::try_from(java_string::JavaString::from("(II)V")).unwrap(),
	};
	let envelope = MethodEnvelope {
		owning_class: class("Demo"),
		name: method_name("callsPair"),
		argument_types: vec![],
		return_type: Type::Void,
		is_static: false,
		code: Code {
			max_stack: 3,
			max_locals: 1,
			instructions: vec![
				entry(Instruction::ALoad(LvIndex { index: 0 })),
				entry(Instruction::IConst1),
				entry(Instruction::IConst2),
				entry(Instruction::InvokeVirtual(method)),
				entry(Instruction::Return),
			],
		},
	};

	let lifted = Lifter::lift(&envelope).unwrap();

	let Op::Invoke(invoke) = &lifted.operations[0].1 else { panic!("expected an Invoke operation") };
	let ExprNode::Invoke { arguments, .. } = invoke.as_ref() else { panic!("expected ExprNode::Invoke") };
	assert_eq!(arguments.len(), 2);
	assert_eq!(arguments[0], int_const(1));
	assert_eq!(arguments[1], int_const(2));
}

fn field_ref() -> DukeFieldRef {
	DukeFieldRef {
		class: unsafe { ObjClassName::from_inner_unchecked("Demo".into()) },
		name: java_field_name(),
		desc: FieldDescriptor::try_from(java_string::JavaString::from("I")).unwrap(),
	}
}

fn java_field_name() -> FieldName {
	FieldName::try_from(java_string::JavaString::from("f")).unwrap()
}
