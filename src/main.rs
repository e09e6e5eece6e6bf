//! Binary entry point that glues the SQLite-backed collections to the TUI:
//! read configuration, start logging, open the slot database, load every
//! collection, and drive the Ratatui event loop until the user exits.
use std::rc::Rc;

use anyhow::Result;
use tracing::info;

use music_facts::config::Config;
use music_facts::location::FixedLocation;
use music_facts::logging::init_logging;
use music_facts::{run_app, App, Collections, SqliteSlots};

/// Initialize persistence, load the collections, and launch the event loop.
///
/// Load failures are not fatal: the affected tab starts empty and the error is
/// shown in the footer. Only configuration and database-open problems abort.
fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_path())?;
    info!(data_dir = %config.data_dir.display(), policy = ?config.write_policy, "starting");

    let slots = Rc::new(SqliteSlots::open(&config.db_path())?);
    let mut collections = Collections::new(slots, config.write_policy);
    let failures = collections.load_all();

    let mut app = App::new(collections, Box::new(FixedLocation(config.location)));
    app.report_load_failures(&failures);
    run_app(&mut app)
}
