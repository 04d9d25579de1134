//! Newtype IDs for type-safe record references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different catalog collections (a brand id
//! can never be passed where an item id is expected).

use thiserror::Error;

/// Error returned when a path segment is not a valid record id.
///
/// Kept distinct from "record not found" so the HTTP layer can answer
/// `400 Bad Request` for garbage input and `404 Not Found` for ids that
/// simply don't resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} id: {input:?}")]
pub struct IdParseError {
    /// Name of the id type that failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `FromStr` accepting positive decimal integers only
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use catalog_core::define_id;
/// define_id!(ShelfId);
/// define_id!(AisleId);
///
/// let shelf_id: ShelfId = "7".parse().unwrap();
/// assert_eq!(shelf_id.as_i32(), 7);
///
/// // These are different types, so this won't compile:
/// // let _: AisleId = shelf_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                match trimmed.parse::<i32>() {
                    Ok(id) if id > 0 && !trimmed.starts_with('+') => Ok(Self(id)),
                    _ => Err($crate::types::id::IdParseError {
                        kind: stringify!($name),
                        input: s.to_string(),
                    }),
                }
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(BrandId);
define_id!(CategoryId);
define_id!(ItemId);
define_id!(ItemInstanceId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id: BrandId = "42".parse().unwrap();
        assert_eq!(id, BrandId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: ItemId = " 9 ".parse().unwrap();
        assert_eq!(id.as_i32(), 9);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "abc".parse::<CategoryId>().unwrap_err();
        assert_eq!(err.kind, "CategoryId");
        assert_eq!(err.input, "abc");
        assert_eq!(err.to_string(), "malformed CategoryId id: \"abc\"");
    }

    #[test]
    fn test_parse_rejects_zero_negative_and_signed() {
        assert!("0".parse::<ItemInstanceId>().is_err());
        assert!("-3".parse::<ItemInstanceId>().is_err());
        assert!("+3".parse::<ItemInstanceId>().is_err());
        assert!("".parse::<ItemInstanceId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&BrandId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: BrandId = serde_json::from_str("5").unwrap();
        assert_eq!(back, BrandId::new(5));
    }
}
