use crate::types::Type;

/// Something the lifter could not make sense of while interpreting a single method body.
///
/// Every variant that can be pinned to a particular instruction carries the index into
/// [`crate::method_envelope::MethodEnvelope`]'s instruction list it was raised at.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
	#[error("malformed type descriptor")]
	BadDescriptor,

	#[error("type is not an array type")]
	NotAnArray,

	#[error("unimplemented opcode `{opcode}` at instruction {source_index}")]
	Unimplemented { opcode: &'static str, source_index: usize },

	#[error("operand stack underflow at instruction {source_index}")]
	StackUnderflow { source_index: usize },

	#[error("operand stack overflow (declared max_stack exceeded) at instruction {source_index}")]
	StackOverflow { source_index: usize },

	#[error("local variable slot overflow (declared max_locals exceeded) at instruction {source_index}")]
	LocalOverflow { source_index: usize },

	#[error("type mismatch in {op} at instruction {source_index}: expected {expected:?}, got {actual:?}")]
	TypeMismatch { op: &'static str, expected: Type, actual: Type, source_index: usize },

	#[error("operand stack is not empty at the control-flow join at instruction {source_index}")]
	JoinStackNonEmpty { source_index: usize },

	#[error("phi inputs have unrelated types at instruction {source_index}: {types:?}")]
	PhiDisagreement { types: Vec<Type>, source_index: usize },
}
