//! Control-flow join handling: finding which instructions are reached from more than one
//! predecessor, and reconciling the local maps that flow into them.

use std::collections::HashMap;
use std::rc::Rc;
use duke::tree::method::code::{Code, Instruction, Label};
use crate::error::Failure;
use crate::ir::{Expr, ExprNode};
use crate::types;

/// The static predecessor relation between instructions, derived once from a method's
/// instruction list before lifting begins.
pub struct ControlFlow {
	predecessors: HashMap<Label, Vec<usize>>,
}

impl ControlFlow {
	/// Computes, for every label in `code`, the sorted, deduplicated set of source instruction
	/// indices that can transfer control to it - by falling through, or via an explicit branch,
	/// `jsr`, or switch target.
	pub fn analyze(code: &Code) -> ControlFlow {
		let mut predecessors: HashMap<Label, Vec<usize>> = HashMap::new();
		let mut add_edge = |label: Label, from: usize| {
			predecessors.entry(label).or_default().push(from);
		};

		for (index, entry) in code.instructions.iter().enumerate() {
			for target in branch_targets(&entry.instruction) {
				add_edge(target, index);
			}
			if falls_through(&entry.instruction) {
				if let Some(next) = code.instructions.get(index + 1) {
					if let Some(label) = next.label {
						add_edge(label, index);
					}
				}
			}
		}

		for preds in predecessors.values_mut() {
			preds.sort_unstable();
			preds.dedup();
		}

		ControlFlow { predecessors }
	}

	/// The (sorted, deduplicated) predecessor instruction indices of `label`, or an empty slice
	/// if nothing in this method branches or falls through to it.
	pub fn predecessors(&self, label: Label) -> &[usize] {
		self.predecessors.get(&label).map_or(&[], |v| v.as_slice())
	}

	pub fn is_join(&self, label: Label) -> bool {
		self.predecessors(label).len() > 1
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

fn branch_targets(instruction: &Instruction) -> Vec<Label> {
	match instruction {
		Instruction::IfEq(l) | Instruction::IfNe(l) | Instruction::IfLt(l) | Instruction::IfGe(l)
		| Instruction::IfGt(l) | Instruction::IfLe(l)
		| Instruction::IfICmpEq(l) | Instruction::IfICmpNe(l) | Instruction::IfICmpLt(l)
		| Instruction::IfICmpGe(l) | Instruction::IfICmpGt(l) | Instruction::IfICmpLe(l)
		| Instruction::IfACmpEq(l) | Instruction::IfACmpNe(l)
		| Instruction::IfNull(l) | Instruction::IfNonNull(l)
		| Instruction::Goto(l) | Instruction::Jsr(l) => vec![*l],
		Instruction::TableSwitch { default, table, .. } => {
			let mut v = table.clone();
			v.push(*default);
			v
		},
		Instruction::LookupSwitch { default, pairs } => {
			let mut v: Vec<Label> = pairs.iter().map(|(_, l)| *l).collect();
			v.push(*default);
			v
		},
		_ => Vec::new(),
	}
}

/// A method-local environment: the bindings flowing along one control-flow edge.
#[derive(Debug, Clone)]
pub struct FlowState {
	pub locals: Vec<Option<Expr>>,
	pub stack: Vec<Expr>,
}

/// Reconciles the local maps (and validates the operand stacks) arriving at every join point in
/// a method, as instructions are visited in source order.
///
/// Because the lifter walks instructions exactly once in program order, every predecessor whose
/// instruction index is less than the join label's own index has already contributed its
/// [`FlowState`] by the time the join is reached; a predecessor with a *greater* index is a
/// backward branch (a loop) that has not been visited yet. For those, the resolver finalizes the
/// join using only the already-known predecessors and, when the back edge is finally visited,
/// merely checks that its binding for each slot is identical to what was already decided -
/// genuinely loop-varying locals are rejected with [`Failure::PhiDisagreement`] rather than
/// silently producing an unsound answer, since closing the loop correctly would require mutating
/// already-constructed IR nodes (see `DESIGN.md`).
pub struct JoinResolver {
	control_flow: ControlFlow,
	incoming: HashMap<Label, Vec<(usize, FlowState)>>,
	resolved: HashMap<Label, FlowState>,
}

impl JoinResolver {
	pub fn new(control_flow: ControlFlow) -> JoinResolver {
		JoinResolver { control_flow, incoming: HashMap::new(), resolved: HashMap::new() }
	}

	pub fn is_join(&self, label: Label) -> bool {
		self.control_flow.is_join(label)
	}

	pub fn has_predecessors(&self, label: Label) -> bool {
		!self.control_flow.predecessors(label).is_empty()
	}

	/// Records the state flowing out of `from` along an edge to `target` (a fallthrough, branch,
	/// `jsr`, or switch edge). Call this once for every forward edge (one whose target has not
	/// been visited yet) as it is lifted.
	pub fn record_edge(&mut self, target: Label, from: usize, state: FlowState) {
		self.incoming.entry(target).or_default().push((from, state));
	}

	/// Seeds the entry state for the method's first instruction directly from the
	/// argument-bootstrapped environment, so that a loop back to the very start of the method is
	/// checked against the true argument bindings rather than against an empty merge.
	pub fn seed_entry(&mut self, label: Label, state: FlowState) {
		self.resolved.insert(label, state);
	}

	/// Resolves the entry state for `label`, the first (and only) time it is visited. Returns the
	/// reconciled locals and an empty stack for the lifter to continue from. `source_index` is
	/// the label's own instruction index, for diagnostics.
	pub fn resolve_entry(&mut self, label: Label, source_index: usize) -> Result<FlowState, Failure> {
		let mut entries = self.incoming.remove(&label).unwrap_or_default();
		entries.sort_by_key(|(index, _)| *index);

		for (_, state) in &entries {
			if !state.stack.is_empty() {
				return Err(Failure::JoinStackNonEmpty { source_index });
			}
		}

		let known_predecessors = self.control_flow.predecessors(label).len();
		let max_locals = entries.iter().map(|(_, s)| s.locals.len()).max().unwrap_or(0);

		let mut locals = Vec::with_capacity(max_locals);
		for slot in 0..max_locals {
			let bindings: Vec<&Expr> = entries.iter()
				.filter_map(|(_, s)| s.locals.get(slot).and_then(|b| b.as_ref()))
				.collect();

			if bindings.len() < entries.len() {
				locals.push(None);
				continue;
			}

			locals.push(Some(merge_slot(bindings, source_index)?));
		}

		let state = FlowState { locals, stack: Vec::new() };

		if entries.len() < known_predecessors {
			// Not every predecessor has run yet (a loop back edge is still to come); finalize
			// the entry from the forward predecessors we do know, and verify the back edge
			// agrees with it once it shows up.
			self.resolved.insert(label, state.clone());
		}

		Ok(state)
	}

	/// Validates that a backward edge (one whose source instruction index is greater than the
	/// join label's own index, i.e. discovered after [`JoinResolver::resolve_entry`] already ran
	/// for that label) agrees with the already-finalized entry state. `source_index` is the
	/// back-edge instruction's own index, for diagnostics.
	pub fn check_back_edge(&self, label: Label, state: &FlowState, source_index: usize) -> Result<(), Failure> {
		let Some(resolved) = self.resolved.get(&label) else { return Ok(()) };

		if !state.stack.is_empty() {
			return Err(Failure::JoinStackNonEmpty { source_index });
		}

		for (slot, expected) in resolved.locals.iter().enumerate() {
			let Some(expected) = expected else { continue };
			let Some(Some(actual)) = state.locals.get(slot) else { continue };
			if !Rc::ptr_eq(expected, actual) {
				return Err(Failure::PhiDisagreement { types: vec![expected.ty()?, actual.ty()?], source_index });
			}
		}

		Ok(())
	}
}

fn merge_slot(bindings: Vec<&Expr>, source_index: usize) -> Result<Expr, Failure> {
	let first = bindings[0];
	if bindings.iter().all(|b| Rc::ptr_eq(b, first)) {
		return Ok(first.clone());
	}

	let mut ty = first.ty()?;
	for binding in &bindings[1..] {
		ty = types::unify(&ty, &binding.ty()?).map_err(|e| match e {
			Failure::PhiDisagreement { types, .. } => Failure::PhiDisagreement { types, source_index },
			other => other,
		})?;
	}

	Ok(Rc::new(ExprNode::Phi { inputs: bindings.into_iter().cloned().collect(), ty }))
}
