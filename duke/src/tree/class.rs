use anyhow::bail;
use java_string::JavaStr;
use crate::macros::{make_display, make_string_str_like};

make_string_str_like!(
	/// Represents a class name, using [internal binary names](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.2.1)
	/// (complete path written out, using slashes), for example `java/lang/Thread`.
	///
	/// Array classes are also valid here, e.g. `[Ljava/lang/Object;` or `[[D`; see
	/// [`ObjClassName`] for a variant that disallows them.
	pub ClassName(JavaString);
	/// A [`ClassName`] slice.
	pub ClassNameSlice(JavaStr);
	is_valid(s) = if crate::tree::names::is_valid_class_name(s) {
		Ok(())
	} else {
		bail!("invalid class name: must be either an array field descriptor, or `/`-separated non-empty parts not containing any of `.`, `;`, `[`")
	};
);

impl ClassName {
	/// The class name of `java.lang.Object`.
	pub const JAVA_LANG_OBJECT: &'static ClassNameSlice =
		unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/Object")) };

	pub fn get_simple_name(&self) -> &JavaStr {
		let s = self.as_inner();
		s.rsplit_once('/').map_or(s, |(_, simple)| simple)
	}
}

make_display!(ClassName, ClassNameSlice);

make_string_str_like!(
	/// A [`ClassName`] that is known not to name an array class.
	///
	/// Fields can only be declared on (and read from) object classes, never on arrays, so
	/// [`crate::tree::field::FieldRef`] uses this instead of the more permissive [`ClassName`].
	pub ObjClassName(JavaString);
	/// An [`ObjClassName`] slice.
	pub ObjClassNameSlice(JavaStr);
	is_valid(s) = if crate::tree::names::is_valid_obj_class_name(s) {
		Ok(())
	} else {
		bail!("invalid object class name: must not start with `[`, and must be `/`-separated non-empty parts not containing any of `.`, `;`, `[`")
	};
);

make_display!(ObjClassName, ObjClassNameSlice);

impl From<ObjClassName> for ClassName {
	fn from(value: ObjClassName) -> Self {
		// SAFETY: a valid `ObjClassName` is always a valid `ClassName`.
		unsafe { ClassName::from_inner_unchecked(value.as_inner().to_owned()) }
	}
}
