//! Expiry arithmetic. No I/O, no clock: callers pass `now` in.
//!
//! The auto-delete timer is anchored to the first view, not to creation. An
//! item whose timer has not started never expires on time, however old it is.

use crate::models::ContentItem;

/// When the timer fires, if it is running.
pub fn expires_at(item: &ContentItem) -> Option<i64> {
    if !item.auto_delete {
        return None;
    }
    item.first_viewed_at
        .map(|start| start.saturating_add(item.delete_after_minutes.saturating_mul(60)))
}

/// True once `now` is strictly past the timer deadline.
pub fn is_expired(item: &ContentItem, now: i64) -> bool {
    expires_at(item).is_some_and(|deadline| now > deadline)
}

/// Seconds left on a running timer, floored at zero.
pub fn remaining_seconds(item: &ContentItem, now: i64) -> Option<i64> {
    expires_at(item).map(|deadline| deadline.saturating_sub(now).max(0))
}

pub fn should_burn(item: &ContentItem) -> bool {
    item.burn_after_read
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mock_item;
    use shared::api::ContentKind;

    fn timed(minutes: i64, first_viewed_at: Option<i64>) -> ContentItem {
        let mut item = mock_item(ContentKind::Text);
        item.auto_delete = true;
        item.delete_after_minutes = minutes;
        item.first_viewed_at = first_viewed_at;
        item
    }

    #[test]
    fn items_without_auto_delete_never_expire() {
        let mut item = mock_item(ContentKind::Text);
        item.first_viewed_at = Some(0);

        for now in [0, 60, 3_600, 86_400 * 365, i64::MAX] {
            assert!(!is_expired(&item, now));
        }
        assert_eq!(remaining_seconds(&item, 10), None);
    }

    #[test]
    fn timer_does_not_run_before_first_view() {
        let item = timed(1, None);

        assert!(!is_expired(&item, i64::MAX));
        assert_eq!(remaining_seconds(&item, 1_000), None);
        assert_eq!(expires_at(&item), None);
    }

    #[test]
    fn expiry_is_strictly_after_the_deadline() {
        let item = timed(1, Some(1_000));

        assert!(!is_expired(&item, 1_000));
        assert!(!is_expired(&item, 1_060));
        assert!(is_expired(&item, 1_061));
    }

    #[test]
    fn expiry_is_monotonic() {
        let item = timed(2, Some(500));
        let mut seen_expired = false;

        for now in 400..1_000 {
            let expired = is_expired(&item, now);
            assert!(!(seen_expired && !expired), "un-expired at {now}");
            seen_expired |= expired;
        }
        assert!(seen_expired);
    }

    #[test]
    fn remaining_seconds_counts_down_to_zero() {
        let item = timed(1, Some(1_000));

        assert_eq!(remaining_seconds(&item, 1_000), Some(60));
        assert_eq!(remaining_seconds(&item, 1_045), Some(15));
        assert_eq!(remaining_seconds(&item, 1_060), Some(0));
        assert_eq!(remaining_seconds(&item, 5_000), Some(0));
    }

    #[test]
    fn huge_timers_do_not_overflow() {
        let item = timed(i64::MAX, Some(1_000));

        assert!(!is_expired(&item, i64::MAX - 1));
        assert!(remaining_seconds(&item, 0).is_some_and(|s| s > 0));
    }

    #[test]
    fn should_burn_follows_the_flag() {
        let mut item = mock_item(ContentKind::Link);
        assert!(!should_burn(&item));

        item.burn_after_read = true;
        assert!(should_burn(&item));
    }
}
