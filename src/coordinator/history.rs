use std::cmp::Reverse;

use tracing::debug;

use crate::domain::ReleaseRecord;
use crate::error::{Result, VoyagerError};
use crate::github::RecordStore;

/// Turn a user-supplied count into a positive limit
pub fn validate_limit(limit: i64) -> Result<usize> {
    if limit <= 0 {
        return Err(VoyagerError::validation(format!(
            "limit must be a positive number, got {}",
            limit
        )));
    }
    usize::try_from(limit).map_err(|_| VoyagerError::validation("limit is too large"))
}

/// Lists releases newest first by version
pub struct ReleaseHistory<'a, R> {
    records: &'a R,
}

impl<'a, R: RecordStore> ReleaseHistory<'a, R> {
    pub fn new(records: &'a R) -> Self {
        ReleaseHistory { records }
    }

    /// Up to `limit` records ordered by parsed version, not by timestamp.
    /// Records whose tag is not a release version are left out.
    pub fn list(&self, limit: usize) -> Result<Vec<ReleaseRecord>> {
        if limit == 0 {
            return Err(VoyagerError::validation("limit must be a positive number"));
        }

        let mut releases: Vec<_> = self
            .records
            .list_records(None)?
            .into_iter()
            .filter_map(|record| match record.version() {
                Some(version) => Some((version, record)),
                None => {
                    debug!(tag = %record.tag, "skipping record without a release version");
                    None
                }
            })
            .collect();

        releases.sort_by_key(|(version, _)| Reverse(*version));
        releases.truncate(limit);
        Ok(releases.into_iter().map(|(_, record)| record).collect())
    }
}
