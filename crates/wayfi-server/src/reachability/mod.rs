//! Push-reachability: device heartbeats, the network-eligibility gate, and
//! the staleness sweep that retires credentials of uninstalled devices.

pub mod gate;
pub mod sweep;

pub use gate::{Eligibility, ReachabilityGate};
pub use sweep::{SweepReport, spawn_sweeper, sweep_stale_devices};
