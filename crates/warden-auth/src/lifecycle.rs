//! Record lifecycle.
//!
//! Stores keep soft-deleted records around. Every lookup site in the
//! engine filters them through [`Lifecycle::is_available`], so "deleted"
//! and "inactive" are checked the same way everywhere.

use serde::{Deserialize, Serialize};

/// Persistence status of a stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Live record.
    #[default]
    Active,
    /// Soft-deleted; kept for bookkeeping only.
    Deleted,
}

impl RecordStatus {
    /// Returns `true` for [`RecordStatus::Deleted`].
    #[must_use]
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Uniform availability check for stored records.
pub trait Lifecycle {
    /// Persistence status.
    fn status(&self) -> RecordStatus;

    /// Administrative enable flag. Records without one are always enabled.
    fn is_enabled(&self) -> bool {
        true
    }

    /// A record takes part in decisions only when it is not deleted and
    /// is enabled.
    fn is_available(&self) -> bool {
        !self.status().is_deleted() && self.is_enabled()
    }
}

/// Keeps only available records.
pub fn available<T: Lifecycle>(records: impl IntoIterator<Item = T>) -> Vec<T> {
    records.into_iter().filter(Lifecycle::is_available).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rec {
        status: RecordStatus,
        enabled: bool,
    }

    impl Lifecycle for Rec {
        fn status(&self) -> RecordStatus {
            self.status
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    struct NoFlag(RecordStatus);

    impl Lifecycle for NoFlag {
        fn status(&self) -> RecordStatus {
            self.0
        }
    }

    #[test]
    fn availability_matrix() {
        let cases = [
            (RecordStatus::Active, true, true),
            (RecordStatus::Active, false, false),
            (RecordStatus::Deleted, true, false),
            (RecordStatus::Deleted, false, false),
        ];
        for (status, enabled, expected) in cases {
            let rec = Rec { status, enabled };
            assert_eq!(rec.is_available(), expected, "{status:?}/{enabled}");
        }
    }

    #[test]
    fn default_flag_is_enabled() {
        assert!(NoFlag(RecordStatus::Active).is_available());
        assert!(!NoFlag(RecordStatus::Deleted).is_available());
    }

    #[test]
    fn available_filters() {
        let kept = available(vec![
            NoFlag(RecordStatus::Active),
            NoFlag(RecordStatus::Deleted),
            NoFlag(RecordStatus::Active),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn status_serde() {
        assert_eq!(
            serde_json::to_string(&RecordStatus::Deleted).expect("serialize"),
            "\"deleted\""
        );
        assert_eq!(RecordStatus::default(), RecordStatus::Active);
    }
}
