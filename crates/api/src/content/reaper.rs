//! Periodic purge of content whose auto-delete timer ran out.
//!
//! Viewers never see expired content either way (the read path checks expiry
//! itself); the reaper makes sure files and rows nobody asks for again are
//! cleaned up too.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{policy, purge};
use crate::{
    clock::Clock,
    stores::{ContentStore, FileStore},
};

#[derive(Clone)]
pub struct Reaper {
    contents: Arc<dyn ContentStore>,
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
}

impl Reaper {
    pub fn new(
        contents: Arc<dyn ContentStore>,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contents,
            files,
            clock,
        }
    }

    /// Purges every expired item. A failure on one item is logged and the
    /// sweep moves on. Returns the number of items purged.
    pub async fn sweep(&self) -> Result<usize> {
        let now = self.clock.now();
        let candidates = self.contents.list_timer_started().await?;

        let mut purged = 0;
        for item in candidates.iter().filter(|item| policy::is_expired(item, now)) {
            match purge(self.contents.as_ref(), self.files.as_ref(), item).await {
                Ok(true) => {
                    purged += 1;
                    info!(content_id = %item.public_id, "deleted expired content");
                }
                // Someone else (a reader, a manual delete) got there first.
                Ok(false) => {}
                Err(e) => warn!(
                    content_id = %item.public_id,
                    error = %e,
                    "failed to purge expired content"
                ),
            }
        }

        Ok(purged)
    }

    /// Spawn the sweep loop. The first sweep runs immediately so content that
    /// expired while the process was down is cleaned up at startup.
    ///
    /// Returns a `JoinHandle` that completes once `shutdown` is cancelled.
    pub fn spawn(
        self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {}
                }

                match self.sweep().await {
                    Ok(0) => {}
                    Ok(n) => info!(removed = n, "reaper removed expired content"),
                    Err(e) => warn!(error = %e, "reaper sweep failed"),
                }
            }

            info!("reaper stopped");
        })
    }
}
