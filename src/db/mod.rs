//! Durable slot backend split across logical submodules.

mod connection;
mod slots;

pub use connection::open_database;
pub use slots::{MemorySlots, SlotError, SlotStore, SqliteSlots};
