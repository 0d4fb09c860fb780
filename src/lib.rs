//! The backend for Gig-o-Matic: gigs, the plans members make for them, and
//! the tools for bringing bands over from the previous version of the site.

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extract;
pub mod graphql;
pub mod migration;
pub mod models;
pub mod routes;
pub mod state;
pub mod tasks;
pub mod timestamp;
pub mod util;
