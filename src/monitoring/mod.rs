//! Threshold monitoring of registered regions.
//!
//! A monitoring pass runs apart from interactive requests and shares only
//! persisted state with them, through a [`PersistenceStore`].

pub mod monitor;
pub mod store;

pub use monitor::{Monitor, MonitorConfig, MonitorRun, POLLUTANT_METRICS};
pub use store::{
    Alert, InMemoryStore, SqliteStore, Operator, PersistenceStore, RegionRecord, Threshold,
};
