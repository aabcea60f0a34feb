//! Reusable components.

mod basic;
mod collect;
mod identity;

pub use basic::BasicComponent;
pub use collect::{CollectComponent, Collected};
pub use identity::IdentityComponent;
