//! Core library surface for the Music Facts TUI application.
//!
//! The stores, models and slot backends are public so the binary as well as
//! the integration tests drive exactly the same code paths.
pub mod config;
pub mod db;
pub mod location;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;

/// Durable slot backends.
pub use db::{MemorySlots, SlotError, SlotStore, SqliteSlots};

/// The three record kinds and their draft inputs.
pub use models::{Fact, FactDraft, Genre, GenreDraft, Location, User, UserDraft};

pub use store::{
    CollectionStore, Collections, FactStore, GenreStore, LoadOutcome, Outcome, StoreError,
    UserStore, ValidationError, WritePolicy,
};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
