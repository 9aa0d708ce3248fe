//! Cloud-backup conflict policy.
//!
//! The transport (Drive upload/download, auth) lives outside the engine; what
//! lives here is the decision logic guarding against data loss: comparing
//! remote and local modification times and byte sizes before either side
//! overwrites the other, and saying when explicit user confirmation is
//! required. Pure functions over metadata, no I/O.

use chrono::{DateTime, Utc};

/// Metadata of the newest backup file on the remote side.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBackupInfo {
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Outcome of checking whether uploading the local blob is safe.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadAssessment {
    /// No remote backup yet: upload freely.
    FirstBackup,
    /// Local is not suspiciously smaller than remote: overwrite is fine.
    Safe,
    /// Local blob is less than half the remote size — a strong signal the
    /// local store lost data. Overwriting needs explicit confirmation.
    SuspiciouslySmallLocal { local_size: u64, remote_size: u64 },
}

impl UploadAssessment {
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, UploadAssessment::SuspiciouslySmallLocal { .. })
    }
}

/// Outcome of checking whether restoring the remote backup is safe.
///
/// Every restore overwrites local state and therefore asks the user; the
/// variants exist so the prompt can say *which* side is newer and by how
/// much.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreAssessment {
    /// Fresh install or wiped store: restore after a single confirmation.
    NoLocalData { remote_modified: DateTime<Utc> },
    /// Remote backup is newer than the last local save.
    RemoteNewer { minutes: i64 },
    /// Local data is newer than the remote backup — restoring would discard
    /// recent local changes.
    LocalNewer { minutes: i64 },
    /// Both sides carry the same timestamp to the minute.
    SameTime,
}

/// Decide whether overwriting the remote backup with `local_size` bytes is
/// safe. The heuristic: a local blob under 50% of the remote size warrants a
/// data-loss warning.
pub fn assess_upload(local_size: u64, remote: Option<&RemoteBackupInfo>) -> UploadAssessment {
    match remote {
        None => UploadAssessment::FirstBackup,
        Some(remote) if local_size * 2 < remote.size_bytes => {
            UploadAssessment::SuspiciouslySmallLocal {
                local_size,
                remote_size: remote.size_bytes,
            }
        }
        Some(_) => UploadAssessment::Safe,
    }
}

/// Compare the remote backup's modification time against the last local
/// save. `local_modified` of `None` means the device never saved anything.
pub fn assess_restore(
    local_modified: Option<DateTime<Utc>>,
    local_month_count: usize,
    remote_modified: DateTime<Utc>,
) -> RestoreAssessment {
    if local_month_count == 0 {
        return RestoreAssessment::NoLocalData {
            remote_modified,
        };
    }
    let local = local_modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let minutes = (remote_modified - local).num_minutes();
    if minutes > 0 {
        RestoreAssessment::RemoteNewer { minutes }
    } else if minutes < 0 {
        RestoreAssessment::LocalNewer { minutes: -minutes }
    } else {
        RestoreAssessment::SameTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn first_upload_is_unconditionally_safe() {
        let assessment = assess_upload(1024, None);
        assert_eq!(assessment, UploadAssessment::FirstBackup);
        assert!(!assessment.requires_confirmation());
    }

    #[test]
    fn upload_warns_when_local_is_under_half_the_remote_size() {
        let remote = RemoteBackupInfo {
            modified_at: at(10, 0),
            size_bytes: 10_000,
        };
        let suspicious = assess_upload(4_999, Some(&remote));
        assert!(suspicious.requires_confirmation());
        assert_eq!(
            suspicious,
            UploadAssessment::SuspiciouslySmallLocal {
                local_size: 4_999,
                remote_size: 10_000
            }
        );

        assert_eq!(assess_upload(5_000, Some(&remote)), UploadAssessment::Safe);
        assert_eq!(assess_upload(12_000, Some(&remote)), UploadAssessment::Safe);
    }

    #[test]
    fn upload_threshold_is_exact_for_odd_remote_sizes() {
        let remote = RemoteBackupInfo {
            modified_at: at(10, 0),
            size_bytes: 9_999,
        };
        // 4999 bytes is strictly under 50% of 9999 and must warn.
        assert!(assess_upload(4_999, Some(&remote)).requires_confirmation());
        assert_eq!(assess_upload(5_000, Some(&remote)), UploadAssessment::Safe);
    }

    #[test]
    fn upload_against_an_empty_remote_file_is_safe() {
        let remote = RemoteBackupInfo {
            modified_at: at(10, 0),
            size_bytes: 0,
        };
        assert_eq!(assess_upload(10, Some(&remote)), UploadAssessment::Safe);
    }

    #[test]
    fn restore_onto_a_fresh_install_needs_no_comparison() {
        let assessment = assess_restore(None, 0, at(10, 0));
        assert_eq!(
            assessment,
            RestoreAssessment::NoLocalData {
                remote_modified: at(10, 0)
            }
        );
    }

    #[test]
    fn restore_reports_which_side_is_newer() {
        assert_eq!(
            assess_restore(Some(at(10, 0)), 3, at(10, 45)),
            RestoreAssessment::RemoteNewer { minutes: 45 }
        );
        assert_eq!(
            assess_restore(Some(at(11, 30)), 3, at(10, 0)),
            RestoreAssessment::LocalNewer { minutes: 90 }
        );
        assert_eq!(
            assess_restore(Some(at(10, 0)), 3, at(10, 0)),
            RestoreAssessment::SameTime
        );
    }

    #[test]
    fn restore_with_data_but_no_saved_timestamp_treats_local_as_ancient() {
        let assessment = assess_restore(None, 3, at(10, 0));
        assert!(matches!(
            assessment,
            RestoreAssessment::RemoteNewer { minutes } if minutes > 0
        ));
    }
}
