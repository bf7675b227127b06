//! Staleness sweep.
//!
//! Devices silent for longer than the window are marked uninstalled, then
//! active credentials of profiles with devices but none installed are
//! deactivated. Both writes are conditional, so a second run over the same
//! data changes nothing.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wayfi_core::db::unix_timestamp;

use crate::provisioning::ProvisionResult;
use crate::storage::ProvisioningDatabase;

/// What one sweep changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub devices_marked_stale: u64,
    pub credentials_deactivated: u64,
}

impl SweepReport {
    pub const fn is_empty(&self) -> bool {
        self.devices_marked_stale == 0 && self.credentials_deactivated == 0
    }
}

/// Run one sweep as of `now`.
pub async fn sweep_stale_devices(
    db: &ProvisioningDatabase,
    now: i64,
    stale_after_secs: i64,
) -> ProvisionResult<SweepReport> {
    let cutoff = now - stale_after_secs;
    let devices_marked_stale = db.mark_stale_devices(cutoff).await?;
    let credentials_deactivated = db.deactivate_credentials_without_installed_devices().await?;

    Ok(SweepReport {
        devices_marked_stale,
        credentials_deactivated,
    })
}

/// Run the sweep on a fixed interval, skipping the immediate first tick.
pub fn spawn_sweeper(
    db: ProvisioningDatabase,
    interval: Duration,
    stale_after_secs: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sweep_stale_devices(&db, unix_timestamp(), stale_after_secs).await {
                Ok(report) if !report.is_empty() => {
                    info!(
                        devices = report.devices_marked_stale,
                        credentials = report.credentials_deactivated,
                        "Staleness sweep completed"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Staleness sweep failed");
                }
                _ => {}
            }
        }
    })
}
