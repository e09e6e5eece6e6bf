//! Where GPS fixes come from. The stores only ever see an optional
//! `Location`; how it was acquired is this module's business.

use crate::models::Location;

pub trait LocationProvider {
    /// Current position, or `None` when no fix is available.
    fn locate(&self) -> Option<Location>;
}

/// Provider that always reports the same configured fix (or none).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Location>);

impl LocationProvider for FixedLocation {
    fn locate(&self) -> Option<Location> {
        self.0
    }
}
