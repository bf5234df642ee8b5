use anyhow::bail;
use java_string::JavaStr;
use crate::macros::{make_display, make_string_str_like};
use crate::tree::class::ObjClassName;

/// A reference to a field: the class it is declared on, its name, and its descriptor.
///
/// Unlike [`crate::tree::method::MethodRef`], the owning class can never be an array class,
/// since arrays do not declare fields.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldRef {
	pub class: ObjClassName,
	pub name: FieldName,
	pub desc: FieldDescriptor,
}

make_string_str_like!(
	pub FieldName(JavaString);
	pub FieldNameSlice(JavaStr);
);
make_display!(FieldName, FieldNameSlice);

impl FieldName {
	fn check_valid(inner: &JavaStr) -> anyhow::Result<()> {
		if crate::tree::names::is_valid_unqualified_name(inner) {
			Ok(())
		} else {
			bail!("invalid field name: must be non-empty and not contain any of `.`, `;`, `[` and `/`")
		}
	}
}

make_string_str_like!(
	pub FieldDescriptor(JavaString);
	pub FieldDescriptorSlice(JavaStr);
);
make_display!(FieldDescriptor, FieldDescriptorSlice);

impl FieldDescriptor {
	fn check_valid(inner: &JavaStr) -> anyhow::Result<()> {
		// SAFETY: only used to attempt a parse; the slice never escapes this function.
		unsafe { FieldDescriptorSlice::from_inner_unchecked(inner) }.parse().map(|_| ())
	}
}
