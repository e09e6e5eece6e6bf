//! Ratatui front-end: one tab per collection, modal forms for create/edit,
//! and a footer that turns store results into status messages.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
