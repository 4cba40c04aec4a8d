// SPDX-License-Identifier: Apache-2.0
//! Entity and module data model (§3).

pub mod module;
pub mod player;
pub mod projectile;
pub mod ship;

pub use module::{Module, ModuleKind, ModulePayload};
pub use player::{Carrier, Player, PlayerState};
pub use projectile::Projectile;
pub use ship::Ship;
