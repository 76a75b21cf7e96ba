//! The read path for shared content.
//!
//! From a viewer's point of view an item is in one of four states:
//!
//! ```text
//! not_found        deleted or never existed              terminal
//! denied_ip        restricted and already seen from IP   terminal for this viewer
//! expired_on_read  timer ran out, reaper not there yet   item purged, terminal
//! visible          content returned                      may start timer / burn
//! ```
//!
//! Expiry is evaluated against the stored `first_viewed_at` before this request
//! starts the timer, otherwise nothing could ever expire on its first view.

use std::sync::Arc;

use anyhow::Result;
use shared::api::ContentView;
use tokio::{sync::oneshot, task::JoinHandle};

use super::{
    policy, purge,
    tracker::{ViewDecision, ViewTracker},
};
use crate::{
    models::ContentItem,
    stores::{ContentStore, FileStore},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    NotFound,
    DeniedIp,
    /// The timer had run out; the item has now been purged.
    Expired,
    Visible(VisibleContent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleContent {
    /// The item as it stands after this view (timer started if it applies).
    pub item: ContentItem,
    pub view: ContentView,
}

impl VisibleContent {
    pub fn should_burn(&self) -> bool {
        policy::should_burn(&self.item)
    }
}

#[derive(Clone)]
pub struct AccessCoordinator {
    contents: Arc<dyn ContentStore>,
    files: Arc<dyn FileStore>,
    tracker: ViewTracker,
}

impl AccessCoordinator {
    pub fn new(contents: Arc<dyn ContentStore>, files: Arc<dyn FileStore>) -> Self {
        let tracker = ViewTracker::new(contents.clone());
        Self {
            contents,
            files,
            tracker,
        }
    }

    /// Resolves a view of `public_id` by `ip` at `now`.
    ///
    /// Burn-after-read is not applied here: the caller must hand the item to
    /// [`AccessCoordinator::burn_after`] once the response has gone out.
    pub async fn view(&self, public_id: &str, ip: &str, now: i64) -> Result<ViewOutcome> {
        let Some(mut item) = self.contents.get_active(public_id).await? else {
            return Ok(ViewOutcome::NotFound);
        };

        if self.tracker.check_and_record_view(&item, ip, now).await? == ViewDecision::Denied {
            tracing::info!(content_id = %item.public_id, ip = %ip, "view denied by ip restriction");
            return Ok(ViewOutcome::DeniedIp);
        }

        if policy::is_expired(&item, now) {
            purge(self.contents.as_ref(), self.files.as_ref(), &item).await?;
            tracing::info!(content_id = %item.public_id, "content expired on read");
            return Ok(ViewOutcome::Expired);
        }

        if item.auto_delete && item.first_viewed_at.is_none() {
            let started = match self.contents.set_first_viewed(item.id, now).await {
                Ok(started) => started,
                Err(e) => {
                    self.release_view(&item, ip).await;
                    return Err(e);
                }
            };
            item.first_viewed_at = Some(started);
            tracing::info!(
                content_id = %item.public_id,
                delete_after_minutes = item.delete_after_minutes,
                "auto-delete timer started"
            );
        }

        let view = item.to_view(policy::remaining_seconds(&item, now));

        tracing::info!(
            content_id = %item.public_id,
            burn_after_read = item.burn_after_read,
            "content viewed"
        );

        Ok(ViewOutcome::Visible(VisibleContent { item, view }))
    }

    /// Hands a recorded view back to `ip` after the view itself failed, so a
    /// storage error does not use up a restricted viewer's only view.
    async fn release_view(&self, item: &ContentItem, ip: &str) {
        if !item.ip_restriction {
            return;
        }
        if let Err(e) = self.contents.forget_view(item.id, ip).await {
            tracing::error!(
                content_id = %item.public_id,
                ip = %ip,
                error = %e,
                "failed to release view after error"
            );
        }
    }

    /// Returns the item if its file may be downloaded right now.
    ///
    /// Downloads are not views, but an expired timer is still enforced here so
    /// the file is never served past its deadline.
    pub async fn downloadable(&self, public_id: &str, now: i64) -> Result<Option<ContentItem>> {
        let Some(item) = self.contents.get_active(public_id).await? else {
            return Ok(None);
        };

        if policy::is_expired(&item, now) {
            purge(self.contents.as_ref(), self.files.as_ref(), &item).await?;
            tracing::info!(content_id = %item.public_id, "content expired on download");
            return Ok(None);
        }

        Ok(Some(item))
    }

    /// Manual delete. Succeeds whether or not the item exists; a tombstoned
    /// item is left alone so its file is not touched twice.
    pub async fn delete(&self, public_id: &str) -> Result<bool> {
        match self.contents.find_by_public_id(public_id).await? {
            Some(item) if !item.deleted => {
                let deleted = purge(self.contents.as_ref(), self.files.as_ref(), &item).await?;
                tracing::info!(content_id = %public_id, "content deleted");
                Ok(deleted)
            }
            _ => Ok(false),
        }
    }

    /// Burns `item` once `delivered` resolves or its sender is dropped.
    ///
    /// The sender side is held by the response body, so the burn runs after the
    /// server has finished writing the response.
    pub fn burn_after(
        &self,
        item: ContentItem,
        delivered: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let _ = delivered.await;
            this.burn(&item).await;
        })
    }

    async fn burn(&self, item: &ContentItem) {
        match purge(self.contents.as_ref(), self.files.as_ref(), item).await {
            Ok(_) => tracing::info!(content_id = %item.public_id, "content burned after read"),
            Err(e) => tracing::error!(
                content_id = %item.public_id,
                error = %e,
                "failed to burn content after read"
            ),
        }
    }
}
