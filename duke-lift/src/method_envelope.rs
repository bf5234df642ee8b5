//! The decoded-method input the [`crate::lifter::Lifter`] consumes, and the lifted output it
//! produces.

use std::collections::HashMap;
use duke::tree::class::ClassName;
use duke::tree::method::MethodName;
use duke::tree::method::code::Code;
use crate::error::Failure;
use crate::ir::{Expr, Op};
use crate::types::Type;

/// A single decoded method, with its descriptor already parsed into [`Type`]s, ready to be
/// handed to [`crate::lifter::Lifter::lift`].
#[derive(Debug, Clone)]
pub struct MethodEnvelope {
	pub owning_class: ClassName,
	pub name: MethodName,
	pub argument_types: Vec<Type>,
	pub return_type: Type,
	pub is_static: bool,
	pub code: Code,
}

/// Which of the four outcomes lifting a given source instruction produced.
///
/// Exactly one of these applies to every instruction index, so `instruction_outcomes` always has
/// one entry per entry in [`Code::instructions`].
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionOutcome {
	/// Pushed an expression onto the simulated operand stack without emitting an operation.
	Pushed(Expr),
	/// Emitted an [`Op`] into [`LiftedMethod::operations`] (and, for a non-void [`crate::ir::ExprNode::Invoke`],
	/// also pushed the same expression — see [`InstructionOutcome::PushedAndEmitted`]).
	Emitted,
	/// Both pushed an expression and emitted an operation referencing it (a non-void invocation
	/// whose result is discarded is the only source of this outcome).
	PushedAndEmitted(Expr),
	/// Consumed or rearranged the operand stack without producing a new node (pop, dup, a local
	/// store, an increment, ...).
	StackOnly,
	/// Had no effect the IR tracks (nop).
	NoOp,
}

/// The result of lifting one method body.
#[derive(Debug, Clone)]
pub struct LiftedMethod {
	/// The argument expressions, in declaration order (including the implicit receiver for
	/// non-static methods at index 0).
	pub arguments: Vec<Expr>,
	/// Every emitted operation, in program order, alongside the source instruction index it came
	/// from.
	pub operations: Vec<(usize, Op)>,
	/// The subset of instructions that pushed an expression, keyed by source instruction index.
	pub expressions_by_index: HashMap<usize, Expr>,
	/// One entry per source instruction, recording what lifting it did.
	pub instruction_outcomes: Vec<InstructionOutcome>,
	/// Non-fatal diagnostics accumulated during a successful lift. A failure that aborts the lift
	/// is returned as `Err`, never folded into this list — see the error-handling notes in
	/// `DESIGN.md`.
	pub lift_diagnostics: Vec<Failure>,
}
