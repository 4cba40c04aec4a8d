// SPDX-License-Identifier: Apache-2.0
//! Typed entity identifiers.
//!
//! All entities share a 32-bit identifier space with a `NONE` sentinel
//! (§3). Newtype wrappers keep ship/module/player/projectile/session ids
//! from being accidentally interchanged, following the typed-id
//! discipline of `warp-core::ident`.

use std::fmt;

macro_rules! entity_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Sentinel meaning "no entity".
            pub const NONE: $name = $name(0);

            #[must_use]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                $name(raw)
            }
        }
    };
}

entity_id!(ShipId, "Identifies a ship, unique within the world.");
entity_id!(ModuleId, "Identifies a module, unique across the whole world (I2).");
entity_id!(PlayerId, "Identifies an embodied player avatar.");
entity_id!(ProjectileId, "Identifies a projectile (cannonball).");
entity_id!(SessionId, "Identifies a connected client session.");

/// Monotonic per-kind id allocator. IDs are never reused within a
/// server process lifetime (§3: "IDs are monotonically allocated and
/// never reused within a session lifetime of the server").
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        // 0 is reserved for NONE.
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
