use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{info, warn};

use crate::error::Result;
use crate::es_client::EsClient;

const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Block until both clusters satisfy the readiness policy on the same poll.
///
/// Red is never acceptable, green always is, yellow is acceptable unless
/// `require_green`. A cluster that cannot be reached counts as not ready and
/// is simply polled again; it never fails the gate. Both sides are
/// re-checked on every tick so a cluster degrading mid-wait is caught.
pub async fn await_ready(source: &EsClient, dest: &EsClient, require_green: bool) -> Result<()> {
    let strategy = FixedInterval::new(POLL_INTERVAL);
    Retry::spawn(strategy, || check_both(source, dest, require_green))
        .await
        .map_err(|_: NotReady| unreachable!("readiness poll retries forever"))
}

#[derive(Debug)]
struct NotReady;

async fn check_both(
    source: &EsClient,
    dest: &EsClient,
    require_green: bool,
) -> std::result::Result<(), NotReady> {
    let source_ready = check_one(source, "source", require_green).await;
    let dest_ready = check_one(dest, "destination", require_green).await;
    if source_ready && dest_ready {
        Ok(())
    } else {
        Err(NotReady)
    }
}

async fn check_one(client: &EsClient, role: &str, require_green: bool) -> bool {
    match client.cluster_health().await {
        Ok(health) => {
            let ready = health.status.is_acceptable(require_green);
            if ready {
                info!(
                    "{} cluster {} is {}",
                    role, health.cluster_name, health.status
                );
            } else {
                warn!(
                    "{} cluster {} is {}, waiting",
                    role, health.cluster_name, health.status
                );
            }
            ready
        }
        Err(err) => {
            warn!("{} cluster unreachable, waiting: {}", role, err);
            false
        }
    }
}
