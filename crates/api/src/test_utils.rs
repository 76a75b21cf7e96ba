//! Shared test utilities for API handler tests.
//!
//! Provides common fixtures and a flexible `TestStateBuilder` for constructing
//! `AppState` instances with only the mocks needed for each test.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{TestStateBuilder, mock_item};
//!
//! let mut contents = MockContentStore::new();
//! contents.expect_get_active().returning(|_| Ok(Some(mock_item(ContentKind::Text))));
//!
//! let state = TestStateBuilder::new()
//!     .with_content_store(contents)
//!     .build();
//! ```

use std::sync::Arc;

use shared::api::ContentKind;
use uuid::Uuid;

use crate::clock::{Clock, ManualClock};
use crate::config::Config;
use crate::models::{ContentItem, NewContent};
use crate::state::AppState;
use crate::stores::{
    ContentStore, FileStore, MockContentStore, MockFileStore, MockRateLimiter, RateLimiter,
    Stores,
};

/// Fixed "now" used by fixtures and the default test clock.
pub const TEST_NOW: i64 = 1_700_000_000;

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3001,
        database_url: "sqlite::memory:".to_string(),
        upload_dir: "uploads".to_string(),
        max_upload_bytes: shared::api::MAX_FILE_BYTES,
        reap_interval_secs: 30,
        rate_limit_max_requests: 60,
        rate_limit_window_secs: 60,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Creates a live stored item of the given kind with no flags set.
pub fn mock_item(kind: ContentKind) -> ContentItem {
    let (file_path, file_name) = match kind {
        ContentKind::File => (
            Some("uploads/0000-photo.png".to_string()),
            Some("photo.png".to_string()),
        ),
        _ => (None, None),
    };

    ContentItem {
        id: 1,
        public_id: Uuid::new_v4().to_string(),
        kind,
        content: Some("hello".to_string()),
        file_path,
        file_name,
        auto_delete: false,
        delete_after_minutes: 1,
        burn_after_read: false,
        ip_restriction: false,
        first_viewed_at: None,
        created_at: TEST_NOW - 100,
        deleted: false,
    }
}

/// Creates an insertable item of the given kind with no flags set.
pub fn new_content(kind: ContentKind) -> NewContent {
    NewContent {
        kind,
        content: Some("hello".to_string()),
        file_path: None,
        file_name: None,
        auto_delete: false,
        delete_after_minutes: 1,
        burn_after_read: false,
        ip_restriction: false,
        created_at: TEST_NOW - 100,
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for any store not explicitly set, a permissive
/// rate limiter and a clock frozen at [`TEST_NOW`].
pub struct TestStateBuilder {
    config: Option<Config>,
    contents: Option<Arc<dyn ContentStore>>,
    files: Option<Arc<dyn FileStore>>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            config: None,
            contents: None,
            files: None,
            rate_limiter: None,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_content_store(mut self, store: impl ContentStore + 'static) -> Self {
        self.contents = Some(Arc::new(store));
        self
    }

    pub fn with_file_store(mut self, store: impl FileStore + 'static) -> Self {
        self.files = Some(Arc::new(store));
        self
    }

    pub fn with_rate_limiter(mut self, limiter: MockRateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let stores = Stores {
            contents: self
                .contents
                .unwrap_or_else(|| Arc::new(MockContentStore::new())),
            files: self.files.unwrap_or_else(|| Arc::new(MockFileStore::new())),
            rate_limiter: self
                .rate_limiter
                .unwrap_or_else(|| Arc::new(permissive_rate_limiter())),
        };

        AppState {
            config: self.config.unwrap_or_else(test_config),
            stores,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(ManualClock::new(TEST_NOW))),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a rate limiter mock that lets every request through.
fn permissive_rate_limiter() -> MockRateLimiter {
    let mut limiter = MockRateLimiter::new();
    limiter
        .expect_check()
        .returning(|_, _| crate::stores::RateLimitResult::Allowed(1));
    limiter.expect_prune().returning(|_| 0);
    limiter
}
