use duke::tree::class::ClassName;
use duke::tree::descriptor as duke_descriptor;
use duke::tree::field::{FieldDescriptor, FieldDescriptorSlice};
use duke::tree::method::MethodDescriptorSlice;
use java_string::JavaStr;
use crate::error::Failure;

/// The eight JVM primitive kinds. `returnAddress` is deliberately not a variant here: the lifter
/// tracks it on [`crate::ir::ExprNode::ReturnAddress`] instead of folding it into the type model.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
	Boolean,
	Byte,
	Char,
	Short,
	Int,
	Long,
	Float,
	Double,
}

impl PrimitiveKind {
	/// Whether a value of this kind occupies two stack slots / two local-variable slots.
	pub fn is_wide(self) -> bool {
		matches!(self, PrimitiveKind::Long | PrimitiveKind::Double)
	}
}

/// A verifier-level type, as it shows up on the operand stack, in a local-variable slot, or as
/// the type of an [`crate::ir::Expr`].
///
/// Unlike [`duke::tree::descriptor::Type`], this carries no separate array-element
/// sub-enumeration: an array's element type is itself a [`Type`], so nested arrays are
/// represented by incrementing `dim` rather than by nesting [`Type::Array`] inside itself. Use
/// [`Type::element_type`] and [`Type::make_array`] to move between dimensions.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Type {
	/// The pseudo-type of a method that returns nothing. Never the type of an [`crate::ir::Expr`].
	Void,
	/// The type of the `null` literal: a reference that unifies with any other reference type at
	/// a Φ, but names no class of its own.
	Null,
	Primitive(PrimitiveKind),
	Reference(ClassName),
	Array(Box<Type>, u8),
}

impl Type {
	pub fn is_reference(&self) -> bool {
		matches!(self, Type::Null | Type::Reference(_) | Type::Array(..))
	}

	pub fn is_array(&self) -> bool {
		matches!(self, Type::Array(..))
	}

	pub fn is_wide(&self) -> bool {
		matches!(self, Type::Primitive(p) if p.is_wide())
	}

	/// The type of a single element read out of a value of this array type.
	pub fn element_type(&self) -> Result<Type, Failure> {
		match self {
			Type::Array(element, dim) if *dim > 1 => Ok(Type::Array(element.clone(), dim - 1)),
			Type::Array(element, _) => Ok((**element).clone()),
			_ => Err(Failure::NotAnArray),
		}
	}

	/// Builds the array type with the given element type and an additional `dim` dimensions.
	pub fn make_array(element: Type, dim: u8) -> Type {
		match element {
			Type::Array(inner, inner_dim) => Type::Array(inner, inner_dim + dim),
			other => Type::Array(Box::new(other), dim),
		}
	}

	pub(crate) fn from_duke(t: &duke_descriptor::Type) -> Type {
		match t {
			duke_descriptor::Type::B => Type::Primitive(PrimitiveKind::Byte),
			duke_descriptor::Type::C => Type::Primitive(PrimitiveKind::Char),
			duke_descriptor::Type::D => Type::Primitive(PrimitiveKind::Double),
			duke_descriptor::Type::F => Type::Primitive(PrimitiveKind::Float),
			duke_descriptor::Type::I => Type::Primitive(PrimitiveKind::Int),
			duke_descriptor::Type::J => Type::Primitive(PrimitiveKind::Long),
			duke_descriptor::Type::S => Type::Primitive(PrimitiveKind::Short),
			duke_descriptor::Type::Z => Type::Primitive(PrimitiveKind::Boolean),
			duke_descriptor::Type::Object(class) => Type::Reference(class.clone()),
			duke_descriptor::Type::Array(dim, element) => {
				let element = Self::from_duke_array_type(element);
				Type::Array(Box::new(element), *dim)
			},
		}
	}

	fn from_duke_array_type(t: &duke_descriptor::ArrayType) -> Type {
		match t {
			duke_descriptor::ArrayType::B => Type::Primitive(PrimitiveKind::Byte),
			duke_descriptor::ArrayType::C => Type::Primitive(PrimitiveKind::Char),
			duke_descriptor::ArrayType::D => Type::Primitive(PrimitiveKind::Double),
			duke_descriptor::ArrayType::F => Type::Primitive(PrimitiveKind::Float),
			duke_descriptor::ArrayType::I => Type::Primitive(PrimitiveKind::Int),
			duke_descriptor::ArrayType::J => Type::Primitive(PrimitiveKind::Long),
			duke_descriptor::ArrayType::S => Type::Primitive(PrimitiveKind::Short),
			duke_descriptor::ArrayType::Z => Type::Primitive(PrimitiveKind::Boolean),
			duke_descriptor::ArrayType::Object(class) => Type::Reference(class.clone()),
		}
	}
}

/// Parses a raw field descriptor (as found on a `FieldRef` or as an operand of an instruction
/// that names a type directly, such as `checkcast`) into a [`Type`].
pub fn parse_descriptor(text: &JavaStr) -> Result<Type, Failure> {
	let owned = FieldDescriptor::try_from(text.to_owned()).map_err(|_| Failure::BadDescriptor)?;
	let parsed = owned.parse().map_err(|_| Failure::BadDescriptor)?;
	Ok(Type::from_duke(&parsed.0))
}

/// The types of the formal parameters of a method descriptor, in declaration order. Does not
/// include the implicit `this` for instance methods; the caller adds that separately.
pub fn arg_types(desc: &MethodDescriptorSlice) -> Result<Vec<Type>, Failure> {
	let parsed = desc.parse().map_err(|_| Failure::BadDescriptor)?;
	Ok(parsed.parameter_descriptors.iter().map(Type::from_duke).collect())
}

/// The return type of a method descriptor, or [`Type::Void`] for a `void` method.
pub fn return_type(desc: &MethodDescriptorSlice) -> Result<Type, Failure> {
	let parsed = desc.parse().map_err(|_| Failure::BadDescriptor)?;
	Ok(parsed.return_descriptor.as_ref().map_or(Type::Void, Type::from_duke))
}

/// Reference-type unification for Φ nodes: `null` unifies with any reference type, identical
/// types unify trivially, and two differing reference types fall back to `java/lang/Object` (the
/// one upper bound that is always sound without a class hierarchy to consult). Any other
/// disagreement - primitive vs. primitive, primitive vs. reference - is rejected.
pub fn unify(a: &Type, b: &Type) -> Result<Type, Failure> {
	if a == b {
		return Ok(a.clone());
	}
	match (a, b) {
		(Type::Null, other) | (other, Type::Null) if other.is_reference() => Ok(other.clone()),
		(a, b) if a.is_reference() && b.is_reference() => Ok(Type::Reference(ClassName::JAVA_LANG_OBJECT.to_owned())),
		// `source_index` is unknown at this layer; callers that can attribute the failure to a
		// particular instruction (such as the join resolver) replace it.
		_ => Err(Failure::PhiDisagreement { types: vec![a.clone(), b.clone()], source_index: 0 }),
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use duke::tree::class::ClassNameSlice;
	use java_string::JavaStr;
	use super::*;

	const JAVA_LANG_OBJECT: &ClassNameSlice = unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/Object")) };

	#[test]
	fn primitive() {
		assert_eq!(parse_descriptor(JavaStr::from_str("I")).unwrap(), Type::Primitive(PrimitiveKind::Int));
		assert!(Type::Primitive(PrimitiveKind::Int).is_wide() == false);
		assert!(Type::Primitive(PrimitiveKind::Long).is_wide());
		assert!(Type::Primitive(PrimitiveKind::Double).is_wide());
	}

	#[test]
	fn reference() {
		let ty = parse_descriptor(JavaStr::from_str("Ljava/lang/Object;")).unwrap();
		assert_eq!(ty, Type::Reference(JAVA_LANG_OBJECT.to_owned()));
		assert!(ty.is_reference());
	}

	#[test]
	fn array_element_and_make() {
		let ty = parse_descriptor(JavaStr::from_str("[[I")).unwrap();
		assert_eq!(ty, Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 2));
		let inner = ty.element_type().unwrap();
		assert_eq!(inner, Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 1));
		let elem = inner.element_type().unwrap();
		assert_eq!(elem, Type::Primitive(PrimitiveKind::Int));
		assert!(elem.element_type().is_err());

		assert_eq!(Type::make_array(Type::Primitive(PrimitiveKind::Int), 2), ty);
		assert_eq!(Type::make_array(elem.clone(), 1), Type::Array(Box::new(elem), 1));
	}

	#[test]
	fn bad_descriptor() {
		assert!(parse_descriptor(JavaStr::from_str("")).is_err());
		assert!(parse_descriptor(JavaStr::from_str("(I)V")).is_err());
	}

	#[test]
	fn unify_identical_and_null() {
		let obj = Type::Reference(JAVA_LANG_OBJECT.to_owned());
		assert_eq!(unify(&obj, &obj).unwrap(), obj);
		assert_eq!(unify(&Type::Null, &obj).unwrap(), obj);
		assert_eq!(unify(&obj, &Type::Null).unwrap(), obj);
		assert_eq!(unify(&Type::Null, &Type::Null).unwrap(), Type::Null);
	}

	#[test]
	fn unify_differing_references_fall_back_to_object() {
		let thread = Type::Reference(unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/Thread")) }.to_owned());
		let obj = Type::Reference(JAVA_LANG_OBJECT.to_owned());
		assert_eq!(unify(&thread, &obj).unwrap(), obj);
	}

	#[test]
	fn unify_primitive_mismatch_fails() {
		assert!(unify(&Type::Primitive(PrimitiveKind::Int), &Type::Primitive(PrimitiveKind::Long)).is_err());
		assert!(unify(&Type::Primitive(PrimitiveKind::Int), &Type::Reference(JAVA_LANG_OBJECT.to_owned())).is_err());
	}
}
