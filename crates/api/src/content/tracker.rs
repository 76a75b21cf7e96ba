//! View-once-per-IP bookkeeping.

use std::sync::Arc;

use anyhow::Result;

use crate::{models::ContentItem, stores::ContentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDecision {
    Allowed,
    /// This IP has already consumed the item.
    Denied,
}

#[derive(Clone)]
pub struct ViewTracker {
    contents: Arc<dyn ContentStore>,
}

impl ViewTracker {
    pub fn new(contents: Arc<dyn ContentStore>) -> Self {
        Self { contents }
    }

    /// Decides whether `ip` may view `item` and, if so, records the view.
    ///
    /// Unrestricted items are always allowed and leave no record. For
    /// restricted items the insert is the tiebreaker: two requests from the same
    /// IP can both pass `has_viewed`, but only one of them inserts the row.
    pub async fn check_and_record_view(
        &self,
        item: &ContentItem,
        ip: &str,
        now: i64,
    ) -> Result<ViewDecision> {
        if !item.ip_restriction {
            return Ok(ViewDecision::Allowed);
        }

        if self.contents.has_viewed(item.id, ip).await? {
            return Ok(ViewDecision::Denied);
        }

        if self.contents.record_view(item.id, ip, now).await? {
            Ok(ViewDecision::Allowed)
        } else {
            tracing::debug!(content_id = %item.public_id, ip = %ip, "lost view race");
            Ok(ViewDecision::Denied)
        }
    }
}
