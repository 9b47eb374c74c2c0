//! Identifier types for Warden.
//!
//! All identifiers are opaque strings minted by the external stores
//! (database keys, directory ids, etc.). The engine never generates
//! identifiers of its own; it only compares them.
//!
//! Each identifier is a distinct newtype so a [`RoleId`] can never be
//! passed where a [`PermissionId`] is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier for an authenticated principal (user, service account).
    ///
    /// This is the value ownership conditions compare against and the
    /// first component of every resource grant key.
    ///
    /// # Example
    ///
    /// ```
    /// use warden_types::PrincipalId;
    ///
    /// let id = PrincipalId::new("u-42");
    /// assert_eq!(id.as_str(), "u-42");
    /// assert_eq!(id.to_string(), "u-42");
    /// ```
    PrincipalId
}

string_id! {
    /// Identifier for a role.
    ///
    /// Role *names* are unique too, but parent links and principal
    /// assignments always use the id.
    RoleId
}

string_id! {
    /// Identifier for a permission record.
    PermissionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(RoleId::new("admin"), RoleId::from("admin"));
        assert_ne!(RoleId::new("admin"), RoleId::new("manager"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = PrincipalId::new("u1");
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"u1\"");

        let parsed: PrincipalId = serde_json::from_str("\"u2\"").expect("deserialize id");
        assert_eq!(parsed.as_str(), "u2");
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![RoleId::new("b"), RoleId::new("a"), RoleId::new("c")];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(RoleId::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn into_inner_returns_string() {
        let id = PermissionId::new("p-1");
        assert_eq!(id.into_inner(), "p-1".to_string());
    }
}
