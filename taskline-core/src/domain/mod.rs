//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod filter;
mod identity;
mod item;
pub mod result;

pub use filter::ItemFilter;
pub use identity::Identity;
pub use item::{Item, ItemPatch, NewItem};
