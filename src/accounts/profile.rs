use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::UserRecord;
use crate::app_dirs::AppDirs;

/// Remembers the signed-in user between runs.
#[derive(Debug, Clone)]
pub struct ProfileCache {
    path: PathBuf,
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCache {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_dir()
                .map(|dir| dir.join("session.json"))
                .unwrap_or_else(|| PathBuf::from("chimptype_session.json")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// A corrupt file is discarded rather than reported.
    pub fn load(&self) -> Option<UserRecord> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice::<UserRecord>(&bytes) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "discarding unreadable saved session");
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    pub fn save(&self, user: &UserRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(user)?;
        fs::write(&self.path, data)
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::tempdir;

    fn user() -> UserRecord {
        UserRecord {
            username: "chimp".to_string(),
            name: "Chim Panzee".to_string(),
            email: "chimp@example.org".to_string(),
            races: 4,
            speed: 71,
            accuracy: 96,
            member_since: Local::now(),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempdir().unwrap();
        let cache = ProfileCache::with_path(dir.path().join("session.json"));

        assert_eq!(cache.load(), None);
        cache.save(&user()).unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.username, "chimp");
        assert_eq!((loaded.races, loaded.speed, loaded.accuracy), (4, 71, 96));

        cache.clear().unwrap();
        assert_eq!(cache.load(), None);
        // clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{not json").unwrap();

        let cache = ProfileCache::with_path(&path);
        assert_eq!(cache.load(), None);
        assert!(!path.exists());
    }
}
