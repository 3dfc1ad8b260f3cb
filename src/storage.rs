//! Preferences persistence: last-used profile per network type and the last
//! trace directory, stored as JSON under the platform config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ProfileError;
use crate::profiles::{Profile, ProfileStore, ProfileType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    last_profile_3g: Option<Profile>,
    #[serde(default)]
    last_profile_lte: Option<Profile>,
    #[serde(default)]
    last_trace_directory: Option<PathBuf>,
}

impl Preferences {
    fn slot(&self, profile_type: ProfileType) -> &Option<Profile> {
        match profile_type {
            ProfileType::ThreeG => &self.last_profile_3g,
            ProfileType::Lte => &self.last_profile_lte,
        }
    }

    fn slot_mut(&mut self, profile_type: ProfileType) -> &mut Option<Profile> {
        match profile_type {
            ProfileType::ThreeG => &mut self.last_profile_3g,
            ProfileType::Lte => &mut self.last_profile_lte,
        }
    }
}

/// JSON-file preferences store.
#[derive(Debug)]
pub struct FilePrefsStore {
    path: PathBuf,
}

impl FilePrefsStore {
    /// Store under the platform config directory, falling back to the current
    /// directory when the platform offers none.
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("trace-workbench").join("preferences.json"),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Preferences, ProfileError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ProfileError::PersistFailure(format!(
                    "corrupt preferences file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(ProfileError::PersistFailure(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write(&self, prefs: &Preferences) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProfileError::PersistFailure(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let bytes = serde_json::to_vec_pretty(prefs)
            .map_err(|e| ProfileError::PersistFailure(e.to_string()))?;
        std::fs::write(&self.path, bytes).map_err(|e| {
            ProfileError::PersistFailure(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}

impl ProfileStore for FilePrefsStore {
    fn last_used(&self, profile_type: ProfileType) -> Result<Option<Profile>, ProfileError> {
        Ok(self.read()?.slot(profile_type).clone())
    }

    fn set_last_used(&self, profile: &Profile) -> Result<(), ProfileError> {
        // A corrupt file must not block persisting; start fresh instead.
        let mut prefs = self.read().unwrap_or_default();
        *prefs.slot_mut(profile.profile_type()) = Some(profile.clone());
        self.write(&prefs)
    }

    fn last_trace_directory(&self) -> Option<PathBuf> {
        self.read().ok().and_then(|p| p.last_trace_directory)
    }

    fn set_last_trace_directory(&self, dir: &Path) -> Result<(), ProfileError> {
        let mut prefs = self.read().unwrap_or_default();
        prefs.last_trace_directory = Some(dir.to_path_buf());
        self.write(&prefs)
    }
}

/// In-memory store for tests and embedded hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Preferences>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Preferences> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProfileStore for MemoryStore {
    fn last_used(&self, profile_type: ProfileType) -> Result<Option<Profile>, ProfileError> {
        Ok(self.lock().slot(profile_type).clone())
    }

    fn set_last_used(&self, profile: &Profile) -> Result<(), ProfileError> {
        *self.lock().slot_mut(profile.profile_type()) = Some(profile.clone());
        Ok(())
    }

    fn last_trace_directory(&self) -> Option<PathBuf> {
        self.lock().last_trace_directory.clone()
    }

    fn set_last_trace_directory(&self, dir: &Path) -> Result<(), ProfileError> {
        self.lock().last_trace_directory = Some(dir.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{Profile3g, ProfileLte};

    #[test]
    fn file_store_roundtrips_profiles_per_type() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FilePrefsStore::at(tmp.path().join("prefs.json"));

        let mut three_g = Profile3g::default();
        three_g.name = "tuned 3G".to_string();
        store.set_last_used(&Profile::ThreeG(three_g.clone())).unwrap();
        store
            .set_last_used(&Profile::Lte(ProfileLte::default()))
            .unwrap();

        assert_eq!(
            store.last_used(ProfileType::ThreeG).unwrap(),
            Some(Profile::ThreeG(three_g))
        );
        assert_eq!(
            store.last_used(ProfileType::Lte).unwrap(),
            Some(Profile::Lte(ProfileLte::default()))
        );
    }

    #[test]
    fn overwriting_one_type_preserves_the_other() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FilePrefsStore::at(tmp.path().join("prefs.json"));

        store
            .set_last_used(&Profile::ThreeG(Profile3g::default()))
            .unwrap();
        let mut replacement = Profile3g::default();
        replacement.name = "second".to_string();
        store
            .set_last_used(&Profile::ThreeG(replacement.clone()))
            .unwrap();

        assert_eq!(
            store.last_used(ProfileType::ThreeG).unwrap(),
            Some(Profile::ThreeG(replacement))
        );
        assert_eq!(store.last_used(ProfileType::Lte).unwrap(), None);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FilePrefsStore::at(tmp.path().join("absent.json"));
        assert_eq!(store.last_used(ProfileType::Lte).unwrap(), None);
        assert_eq!(store.last_trace_directory(), None);
    }

    #[test]
    fn corrupt_file_surfaces_persist_failure_on_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FilePrefsStore::at(&path);
        assert!(matches!(
            store.last_used(ProfileType::Lte),
            Err(ProfileError::PersistFailure(_))
        ));
        // Writing recovers by starting fresh.
        store
            .set_last_used(&Profile::Lte(ProfileLte::default()))
            .unwrap();
        assert!(store.last_used(ProfileType::Lte).unwrap().is_some());
    }

    #[test]
    fn trace_directory_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FilePrefsStore::at(tmp.path().join("prefs.json"));
        store
            .set_last_trace_directory(Path::new("/traces/latest"))
            .unwrap();
        assert_eq!(
            store.last_trace_directory(),
            Some(PathBuf::from("/traces/latest"))
        );
    }
}
