//! Content expiration and visibility.
//!
//! Every path that makes an item disappear (burn-after-read, a timer that ran
//! out, a manual delete, the periodic reaper) goes through [`purge`], so the
//! end state is the same no matter which one got there first.
//!
//! - **policy** - Pure expiry arithmetic
//! - **tracker** - Per-IP view-once bookkeeping
//! - **access** - The read path: what a viewer sees and what viewing does
//! - **reaper** - Background sweep for timers that ran out unobserved

pub mod access;
pub mod policy;
pub mod reaper;
pub mod tracker;

pub use access::{AccessCoordinator, ViewOutcome};
pub use reaper::Reaper;

use anyhow::Result;

use crate::{
    models::ContentItem,
    stores::{ContentStore, FileStore},
};

/// Removes the backing file, then tombstones the record.
///
/// A file that cannot be removed is logged and skipped; the record is
/// tombstoned regardless. Returns whether this call did the tombstoning.
pub async fn purge(
    contents: &dyn ContentStore,
    files: &dyn FileStore,
    item: &ContentItem,
) -> Result<bool> {
    if let Some(path) = &item.file_path
        && let Err(e) = files.delete(path).await
    {
        tracing::warn!(
            content_id = %item.public_id,
            path = %path,
            error = %e,
            "failed to delete backing file"
        );
    }

    contents.mark_deleted(item.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MockContentStore, MockFileStore};
    use crate::test_utils::mock_item;
    use mockall::predicate::eq;
    use shared::api::ContentKind;

    #[tokio::test]
    async fn purge_deletes_file_before_tombstoning() {
        let mut item = mock_item(ContentKind::File);
        item.file_path = Some("uploads/x.png".into());
        let id = item.id;

        let mut seq = mockall::Sequence::new();
        let mut files = MockFileStore::new();
        files
            .expect_delete()
            .with(eq("uploads/x.png"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        let mut contents = MockContentStore::new();
        contents
            .expect_mark_deleted()
            .with(eq(id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        assert!(purge(&contents, &files, &item).await.unwrap());
    }

    #[tokio::test]
    async fn purge_tombstones_even_when_file_delete_fails() {
        let mut item = mock_item(ContentKind::File);
        item.file_path = Some("uploads/x.png".into());

        let mut files = MockFileStore::new();
        files
            .expect_delete()
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        let mut contents = MockContentStore::new();
        contents.expect_mark_deleted().times(1).returning(|_| Ok(true));

        assert!(purge(&contents, &files, &item).await.unwrap());
    }

    #[tokio::test]
    async fn purge_skips_file_store_for_inline_content() {
        let item = mock_item(ContentKind::Text);

        let files = MockFileStore::new();
        let mut contents = MockContentStore::new();
        contents.expect_mark_deleted().times(1).returning(|_| Ok(false));

        assert!(!purge(&contents, &files, &item).await.unwrap());
    }
}
