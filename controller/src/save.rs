/// Save directory allocation
///
/// Every request gets `<save_root>/<YYYY-MM-DD>/<uuid>`. Allocation only
/// computes the path; the directory is created by whoever writes first.
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDirectory {
    pub request_id: Uuid,
    pub path: PathBuf,
}

impl SaveDirectory {
    /// Fresh per-request directory under `save_root`, dated today (UTC).
    pub fn allocate(save_root: &Path) -> Self {
        Self::allocate_at(save_root, Utc::now())
    }

    pub fn allocate_at(save_root: &Path, now: DateTime<Utc>) -> Self {
        let request_id = Uuid::new_v4();
        let path = save_root
            .join(now.format("%Y-%m-%d").to_string())
            .join(request_id.to_string());
        Self { request_id, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_layout_is_date_then_uuid() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let dir = SaveDirectory::allocate_at(Path::new("/saves"), now);

        assert_eq!(dir.path.parent(), Some(Path::new("/saves/2024-03-09")));
        assert_eq!(dir.path.file_name().unwrap().to_string_lossy(), dir.request_id.to_string());
        assert!(!dir.path.exists(), "allocation never touches disk");
    }

    #[test]
    fn test_allocations_are_unique() {
        let a = SaveDirectory::allocate(Path::new("/saves"));
        let b = SaveDirectory::allocate(Path::new("/saves"));
        assert_ne!(a.path, b.path);
    }
}
