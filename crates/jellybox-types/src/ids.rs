//! Identifier types.
//!
//! Boxes carry a UUID v7 row identifier for storage, but the simulation
//! addresses them by [`BoxKey`]: the `(user_id, platform)` pair that is
//! unique per chat account.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Storage identifier of a jellyfish box row.
    BoxId
}

/// Identity of a box: one per chat user per platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoxKey {
    /// The chat platform's user identifier.
    pub user_id: String,
    /// The chat platform name (e.g. `onebot`, `discord`).
    pub platform: String,
}

impl BoxKey {
    /// Build a key from a user id and platform name.
    pub fn new(user_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform: platform.into(),
        }
    }
}

impl core::fmt::Display for BoxKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.platform, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_ids_are_unique() {
        assert_ne!(BoxId::new(), BoxId::new());
    }

    #[test]
    fn box_key_display_is_platform_then_user() {
        let key = BoxKey::new("10001", "onebot");
        assert_eq!(key.to_string(), "onebot:10001");
    }
}
