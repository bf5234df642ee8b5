pub mod code;

use anyhow::bail;
use java_string::JavaStr;
use crate::macros::{make_display, make_string_str_like};
use crate::tree::class::ClassName;

/// A reference to a method: the class it is declared on, its name, and its descriptor.
///
/// Other than for fields, there can be references to methods on array classes, such as the
/// `.clone()` method every array implicitly inherits from `Object`. So unlike
/// [`crate::tree::field::FieldRef`], the owning class here is a plain [`ClassName`].
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MethodRef {
	pub class: ClassName,
	pub name: MethodName,
	pub desc: MethodDescriptor,
}

make_string_str_like!(
	pub MethodName(JavaString);
	pub MethodNameSlice(JavaStr);
);
make_display!(MethodName, MethodNameSlice);

impl MethodName {
	fn check_valid(inner: &JavaStr) -> anyhow::Result<()> {
		if crate::tree::names::is_valid_method_name(inner) {
			Ok(())
		} else {
			bail!("invalid method name: must be either `<init>`, `<clinit>`, or non-empty and not contain any of `.`, `;`, `[`, `/`, `<`, and `>`");
		}
	}

	pub const INIT: &'static MethodNameSlice =
		unsafe { MethodNameSlice::from_inner_unchecked(JavaStr::from_str("<init>")) };
	pub const CLINIT: &'static MethodNameSlice =
		unsafe { MethodNameSlice::from_inner_unchecked(JavaStr::from_str("<clinit>")) };
}

make_string_str_like!(
	pub MethodDescriptor(JavaString);
	pub MethodDescriptorSlice(JavaStr);
);
make_display!(MethodDescriptor, MethodDescriptorSlice);

impl MethodDescriptor {
	fn check_valid(inner: &JavaStr) -> anyhow::Result<()> {
		// SAFETY: only used to attempt a parse; the slice never escapes this function.
		unsafe { MethodDescriptorSlice::from_inner_unchecked(inner) }.parse().map(|_| ())
	}
}
