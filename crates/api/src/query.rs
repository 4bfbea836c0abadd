//! Shared query parameter types for API handlers.

use ideaflow_core::types::DbId;
use serde::Deserialize;

/// Rows returned by a trail listing when `limit` is absent.
pub const DEFAULT_TRAIL_PAGE: usize = 50;

/// `?idea_id=&limit=` for trail listings.
#[derive(Debug, Default, Deserialize)]
pub struct TrailParams {
    pub idea_id: Option<DbId>,
    pub limit: Option<usize>,
}

impl TrailParams {
    /// Requested page size, clamped to `1..=scan_limit`.
    pub fn page_size(&self, scan_limit: i64) -> usize {
        let max = usize::try_from(scan_limit).unwrap_or(usize::MAX).max(1);
        self.limit.unwrap_or(DEFAULT_TRAIL_PAGE).clamp(1, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped_to_scan_limit() {
        let params = TrailParams {
            idea_id: None,
            limit: Some(10_000),
        };
        assert_eq!(params.page_size(500), 500);
        assert_eq!(TrailParams::default().page_size(500), DEFAULT_TRAIL_PAGE);
        assert_eq!(
            TrailParams {
                idea_id: None,
                limit: Some(0)
            }
            .page_size(500),
            1
        );
    }
}
