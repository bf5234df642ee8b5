//! Lifts a decoded JVM method body (see [`duke`]) into an expression-oriented SSA-style IR.
//!
//! The entry point is [`lifter::Lifter::lift`], which walks a [`method_envelope::MethodEnvelope`]
//! once in source order and produces a [`method_envelope::LiftedMethod`]: an ordered list of
//! side-effecting [`ir::Op`]s, a map from source instruction index to the [`ir::Expr`] it pushed,
//! and the method's argument expressions. Everything this crate builds is append-only and
//! arena-like: [`ir::Expr`] is a cheaply-cloned [`std::rc::Rc`], so a node reachable from two
//! different places in the output is the same node, not a copy.

pub mod error;
pub mod ir;
pub mod join;
pub mod lifter;
pub mod method_envelope;
pub mod symbols;
pub mod types;
