//! One-off imports of data exported from the previous version of the site.
//!
//! Each import returns a log of what it did, one human-readable line at a
//! time, which is shown to the superuser who ran it.

pub mod band;
pub mod gig;

/// The lines reported back after an import.
pub type MigrationLog = Vec<String>;
