//! Newtype IDs for type-safe record references.
//!
//! The backend hands out identifiers in two shapes: document ids as strings
//! (`"_id": "65f1c0..."`) and row ids as integers (`"id": 7`). Every entity
//! gets its own wrapper so a product id can never be passed where a user id
//! is expected, and every wrapper accepts both wire shapes.

use serde::{Deserialize, Deserializer};

/// Wire representation accepted by every id type.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

#[doc(hidden)]
pub fn deserialize_raw_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or an integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `Display`, `From<&str>` and `From<String>`
///
/// # Example
///
/// ```rust
/// # use vitrina_core::define_id;
/// define_id!(WishlistId);
///
/// let id: WishlistId = serde_json::from_str("42").unwrap();
/// assert_eq!(id.as_str(), "42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_raw_id(deserializer).map(Self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(ProductId);
define_id!(UserId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_string() {
        let id: UserId = serde_json::from_str("\"65f1c0a2b3\"").unwrap();
        assert_eq!(id.as_str(), "65f1c0a2b3");
    }

    #[test]
    fn test_deserialize_from_integer() {
        let id: ProductId = serde_json::from_str("17").unwrap();
        assert_eq!(id, ProductId::new("17"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&OrderId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<UserId>("true").is_err());
        assert!(serde_json::from_str::<UserId>("{\"id\":1}").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProductId::from("p-1").to_string(), "p-1");
    }
}
