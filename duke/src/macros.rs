//! Helpers for defining owned/slice pairs of validated, string-backed identifiers
//! (class names, member names, descriptors, ...).
//!
//! Every such type wraps a [`java_string::JavaString`] (owned) or [`java_string::JavaStr`]
//! (borrowed, unsized) and is only ever constructed through a validity check, so that any
//! value of the type is known-good for the rest of the crate.

/// Defines an owned `$owned(JavaString)` type and its borrowed `$slice(JavaStr)` counterpart,
/// wiring up construction, validation, equality, and the `Deref`/`Borrow`/`ToOwned` triangle
/// between them.
///
/// If given a trailing `is_valid($arg) = $body;` clause, that becomes the type's
/// `check_valid` associated function. Otherwise the caller must provide one themselves, as
/// `fn check_valid(s: &XSlice) -> anyhow::Result<()>`, in a separate `impl $owned` block.
macro_rules! make_string_str_like {
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident(JavaString);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident(JavaStr);
	) => {
		crate::macros::make_string_str_like!(@base
			$(#[$owned_meta])* $owned_vis $owned($slice);
			$(#[$slice_meta])* $slice_vis $slice;
		);
	};
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident(JavaString);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident(JavaStr);
		is_valid($arg:ident) = $body:expr;
	) => {
		crate::macros::make_string_str_like!(@base
			$(#[$owned_meta])* $owned_vis $owned($slice);
			$(#[$slice_meta])* $slice_vis $slice;
		);

		impl $owned {
			fn check_valid($arg: &java_string::JavaStr) -> anyhow::Result<()> {
				$body
			}
		}
	};
	(@base
		$(#[$owned_meta:meta])* $owned_vis:vis $owned:ident($slice:ident);
		$(#[$slice_meta:meta])* $slice_vis:vis $slice_name:ident;
	) => {
		$(#[$owned_meta])*
		#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
		$owned_vis struct $owned(java_string::JavaString);

		$(#[$slice_meta])*
		#[repr(transparent)]
		#[derive(Eq, PartialEq, Ord, PartialOrd, Hash)]
		$slice_vis struct $slice_name(java_string::JavaStr);

		impl $owned {
			/// # Safety
			/// The caller must ensure `inner` satisfies this type's validity rules.
			pub unsafe fn from_inner_unchecked(inner: java_string::JavaString) -> Self {
				$owned(inner)
			}

			pub fn as_inner(&self) -> &java_string::JavaStr {
				&self.0
			}

			pub fn as_slice(&self) -> &$slice_name {
				// SAFETY: `self` was already validated on construction.
				unsafe { $slice_name::from_inner_unchecked(&self.0) }
			}

			pub fn is_valid(s: &java_string::JavaStr) -> bool {
				Self::check_valid(s).is_ok()
			}
		}

		impl TryFrom<java_string::JavaString> for $owned {
			type Error = anyhow::Error;
			fn try_from(inner: java_string::JavaString) -> anyhow::Result<Self> {
				Self::check_valid(&inner)?;
				Ok($owned(inner))
			}
		}

		impl std::fmt::Debug for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}({:?})", stringify!($owned), self.0)
			}
		}

		impl $slice_name {
			/// # Safety
			/// The caller must ensure `inner` satisfies this type's validity rules.
			pub unsafe fn from_inner_unchecked(inner: &java_string::JavaStr) -> &Self {
				// SAFETY: `Self` is `#[repr(transparent)]` over `JavaStr`.
				unsafe { &*(inner as *const java_string::JavaStr as *const Self) }
			}

			pub fn as_inner(&self) -> &java_string::JavaStr {
				&self.0
			}
		}

		impl std::fmt::Debug for $slice_name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}({:?})", stringify!($slice_name), &self.0)
			}
		}

		impl std::ops::Deref for $owned {
			type Target = $slice_name;
			fn deref(&self) -> &$slice_name {
				self.as_slice()
			}
		}

		impl std::borrow::Borrow<$slice_name> for $owned {
			fn borrow(&self) -> &$slice_name {
				self.as_slice()
			}
		}

		impl ToOwned for $slice_name {
			type Owned = $owned;
			fn to_owned(&self) -> $owned {
				$owned(self.0.to_owned())
			}
		}

		impl PartialEq<$slice_name> for $owned {
			fn eq(&self, other: &$slice_name) -> bool {
				self.as_slice() == other
			}
		}
	};
}

/// Adds `Display` to a `$owned`/`$slice` pair produced by [`make_string_str_like`], printing
/// the same text the type was parsed from.
macro_rules! make_display {
	($owned:ident, $slice:ident) => {
		impl std::fmt::Display for $slice {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Display::fmt(self.as_inner(), f)
			}
		}
		impl std::fmt::Display for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Display::fmt(self.as_slice(), f)
			}
		}
	};
}

pub(crate) use make_string_str_like;
pub(crate) use make_display;
