//! Keeping the working set fresh.
//!
//! [`FetchCoordinator`] is the only path to the network and enforces
//! single-flight; [`RefreshScheduler`] is the auto-refresh timer that feeds
//! it. Both manual refreshes and scheduler ticks route through the same
//! coordinator.

mod coordinator;
mod scheduler;

pub use coordinator::{FetchCoordinator, FetchOutcome, FetchReport, FetchTrigger};
pub use scheduler::{RefreshScheduler, TickFn, DEFAULT_REFRESH_INTERVAL};
