//! The expression/operation IR a method body is lifted into.
//!
//! Expressions answer `type()` without external context and form a DAG of shared
//! subexpressions; operations are the side-effecting or terminal statements that reference them.
//! Both are built exclusively by [`crate::lifter::Lifter`] — node construction is the only place
//! where the invariants below are checked, so every [`Expr`] reachable from a [`crate::method_envelope::LiftedMethod`]
//! is already known-well-typed.

use std::rc::Rc;
use duke::tree::method::code::Label;
use crate::error::Failure;
use crate::symbols::{FieldRef, MethodRef};
use crate::types::Type;

/// A value-producing IR node. Cheaply cloned: every reference to a shared subexpression is a
/// clone of the same [`Rc`], so structural sharing is identity sharing.
pub type Expr = Rc<ExprNode>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ArithOp { Add, Sub, Mul, Div, Rem, Shl, Shr, UShr, And, Or, Xor }

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CompareOp { Eq, Lt, Gt }

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InvokeKind { Static, Virtual, Interface, Special }

/// The value carried by a [`ExprNode::Constant`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
	Null,
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(java_string::JavaString),
	Class(duke::tree::class::ClassName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
	/// One of the method's formal parameters (or, for an instance method, the implicit receiver
	/// at slot 0), pre-seeded into the local environment before the first instruction runs.
	Argument { name: String, ty: Type },
	Constant { value: ConstantValue, ty: Type },
	/// The predecessor-selected binding at a control-flow merge. Inputs are ordered by ascending
	/// predecessor instruction index.
	Phi { inputs: Vec<Expr>, ty: Type },
	BinaryArithmetic { op: ArithOp, lhs: Expr, rhs: Expr },
	Comparison { op: CompareOp, lhs: Expr, rhs: Expr },
	LogicalNot { inner: Expr },
	/// Both widening numeric conversions and checked reference casts.
	Cast { inner: Expr, target: Type },
	InstanceCheck { inner: Expr, probe: Type },
	/// `receiver` is absent iff the field is static.
	FieldRead { field: FieldRef, receiver: Option<Expr> },
	ArrayLoad { array: Expr, index: Expr },
	ArrayLength { array: Expr },
	/// `dims` is absent for a scalar (non-array) allocation; present with one length expression
	/// per dimension for an array allocation.
	Allocate { ty: Type, dims: Option<Vec<Expr>> },
	/// `receiver` is present iff `kind != Static`.
	Invoke { kind: InvokeKind, method: MethodRef, arguments: Vec<Expr>, receiver: Option<Expr> },
	/// The value pushed by `jsr`/`jsr_w`. Has no external type; [`ExprNode::ty`] fails if asked
	/// for this variant's type.
	ReturnAddress { target: Label },
}

impl ExprNode {
	/// This node's type. Infallible for every variant except [`ExprNode::ReturnAddress`], which
	/// has none by construction.
	pub fn ty(&self) -> Result<Type, Failure> {
		Ok(match self {
			ExprNode::Argument { ty, .. } => ty.clone(),
			ExprNode::Constant { ty, .. } => ty.clone(),
			ExprNode::Phi { ty, .. } => ty.clone(),
			ExprNode::BinaryArithmetic { lhs, .. } => lhs.ty()?,
			ExprNode::Comparison { .. } => Type::Primitive(crate::types::PrimitiveKind::Boolean),
			ExprNode::LogicalNot { .. } => Type::Primitive(crate::types::PrimitiveKind::Boolean),
			ExprNode::Cast { target, .. } => target.clone(),
			ExprNode::InstanceCheck { .. } => Type::Primitive(crate::types::PrimitiveKind::Boolean),
			ExprNode::FieldRead { field, .. } => field.ty.clone(),
			ExprNode::ArrayLoad { array, .. } => array.ty()?.element_type()?,
			ExprNode::ArrayLength { .. } => Type::Primitive(crate::types::PrimitiveKind::Int),
			ExprNode::Allocate { ty, .. } => ty.clone(),
			ExprNode::Invoke { method, .. } => method.return_type.clone(),
			ExprNode::ReturnAddress { .. } => return Err(Failure::BadDescriptor),
		})
	}

	pub(crate) fn binary_arithmetic(op: ArithOp, lhs: Expr, rhs: Expr, source_index: usize) -> Result<Expr, Failure> {
		let (lhs_ty, rhs_ty) = (lhs.ty()?, rhs.ty()?);
		if lhs_ty != rhs_ty {
			return Err(Failure::TypeMismatch { op: "BinaryArithmetic", expected: lhs_ty, actual: rhs_ty, source_index });
		}
		Ok(Rc::new(ExprNode::BinaryArithmetic { op, lhs, rhs }))
	}
}

/// A side-effecting or terminal IR node.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
	FieldWrite { field: FieldRef, value: Expr, receiver: Option<Expr> },
	ArrayStore { array: Expr, index: Expr, value: Expr },
	/// `value` is absent for a `void`-returning method.
	Return { value: Option<Expr> },
	Throw { value: Expr },
	/// An unconditional branch has no condition; a conditional carries a boolean expression.
	Branch { condition: Option<Expr>, destination: Label },
	SubroutineCall { destination: Label },
	SubroutineReturn,
	Switch { selector: Expr, table: SwitchTable },
	MonitorEnter { value: Expr },
	MonitorExit { value: Expr },
	/// An [`ExprNode::Invoke`] whose result is unused (including every `void`-returning call):
	/// recorded here in program order in addition to (or instead of) being pushed.
	Invoke(Expr),
}

/// A `tableswitch`/`lookupswitch`, normalized to an ordered `(key, target)` list plus a default.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchTable {
	pub default: Label,
	pub cases: Vec<(i32, Label)>,
}
