//! Player profiles and their persistence.

pub mod store;
pub mod types;

pub use store::{is_valid_session_id, FileProfileStore, MemoryProfileStore, ProfileStore};
pub use types::{Inventory, Profile, ProfileBonuses};
