pub mod class;
pub mod descriptor;
pub mod field;
pub mod method;

mod names {
	/// Checks if a class name is valid according to JVMS 4.2.1 (also accepting array class names).
	pub(super) fn is_valid_class_name(x: &str) -> bool {
		if x.starts_with('[') {
			true
		} else {
			x.split('/').all(is_valid_unqualified_name)
		}
	}

	/// Checks if a class name is valid according to JVMS 4.2.1 and does not name an array class.
	pub(super) fn is_valid_obj_class_name(x: &str) -> bool {
		!x.starts_with('[') && is_valid_class_name(x)
	}

	/// Checks if a name is an unqualified name according to JVMS 4.2.2
	///
	/// This is used for field names, formal parameter names, local variable names.
	pub(super) fn is_valid_unqualified_name(x: &str) -> bool {
		!x.is_empty() && x.chars().all(|c| !matches!(c, '.' | ';' | '[' | '/'))
	}

	/// Checks if a method name is valid according to JVMS 4.2.2
	pub(super) fn is_valid_method_name(x: &str) -> bool {
		x == "<init>" || x == "<clinit>" || (
			!x.is_empty() &&
				x.chars().all(|c| !matches!(c, '.' | ';' | '[' | '/' | '<' | '>'))
		)
	}

}
