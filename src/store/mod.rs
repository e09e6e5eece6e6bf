//! The collection-management layer: one in-memory list per entity kind kept in
//! lockstep with its durable slot. The generic machinery lives in `collection`;
//! the per-kind modules only describe field shape, seeds and id schemes.

mod collection;
mod collections;
mod entity;
mod error;
mod facts;
mod genres;
mod users;

pub use collection::{CollectionStore, LoadOutcome, Outcome, WritePolicy};
pub use collections::Collections;
pub use entity::Entity;
pub use error::{StoreError, ValidationError};
pub use facts::FactStore;
pub use genres::GenreStore;
pub use users::UserStore;
