//! Field and method references with their descriptors already resolved into [`Type`]s.
//!
//! These mirror [`duke::tree::field::FieldRef`] and [`duke::tree::method::MethodRef`], but carry
//! parsed [`Type`]s instead of raw descriptor strings, since every consumer downstream of the
//! lifter wants the parsed form and would otherwise have to re-parse it itself.

use duke::tree::class::ClassName;
use duke::tree::field::FieldName;
use duke::tree::method::MethodName;
use crate::error::Failure;
use crate::types::{self, Type};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FieldRef {
	pub owner: ClassName,
	pub name: FieldName,
	pub ty: Type,
}

impl FieldRef {
	pub fn resolve(raw: &duke::tree::field::FieldRef) -> Result<FieldRef, Failure> {
		let parsed = raw.desc.parse().map_err(|_| Failure::BadDescriptor)?;
		Ok(FieldRef {
			owner: raw.class.clone().into(),
			name: raw.name.clone(),
			ty: Type::from_duke(&parsed.0),
		})
	}
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MethodRef {
	pub owner: ClassName,
	pub name: MethodName,
	pub arg_types: Vec<Type>,
	pub return_type: Type,
}

impl MethodRef {
	pub fn resolve(raw: &duke::tree::method::MethodRef) -> Result<MethodRef, Failure> {
		Ok(MethodRef {
			owner: raw.class.clone(),
			name: raw.name.clone(),
			arg_types: types::arg_types(&raw.desc)?,
			return_type: types::return_type(&raw.desc)?,
		})
	}

	pub fn is_void(&self) -> bool {
		matches!(self.return_type, Type::Void)
	}
}
