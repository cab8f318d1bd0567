//! Where profiles live between insurance stages.

use super::types::Profile;
use crate::common::constants::{PROFILE_FILE_EXTENSION, PROFILE_VERSION_MAGIC};
use crate::common::{InsuranceError, Result};
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic (8) + payload length (4) + SHA-256 (32).
const FRAME_OVERHEAD_BYTES: u64 = 8 + 4 + 32;

/// Load and persist profiles by session id.
pub trait ProfileStore {
    fn load(&self, session_id: &str) -> Result<Profile>;
    fn save(&mut self, profile: &Profile) -> Result<()>;
    /// Every stored session id, sorted.
    fn sessions(&self) -> Result<Vec<String>>;
}

/// In-process store, used by the one-shot CLI and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: BTreeMap<String, Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.session_id.clone(), profile);
        self
    }

    pub fn get(&self, session_id: &str) -> Option<&Profile> {
        self.profiles.get(session_id)
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, session_id: &str) -> Result<Profile> {
        self.profiles
            .get(session_id)
            .cloned()
            .ok_or_else(|| InsuranceError::ProfileNotFound {
                session_id: session_id.to_string(),
            })
    }

    fn save(&mut self, profile: &Profile) -> Result<()> {
        self.profiles
            .insert(profile.session_id.clone(), profile.clone());
        Ok(())
    }

    fn sessions(&self) -> Result<Vec<String>> {
        Ok(self.profiles.keys().cloned().collect())
    }
}

/// One checksummed binary file per session.
///
/// File format:
/// - Version magic (8 bytes)
/// - Data length (4 bytes)
/// - Bincode profile (variable length)
/// - SHA256 checksum over everything above (32 bytes)
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    /// Store under the platform data directory.
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "raid-insurance").ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Self::with_dir(project_dirs.data_dir().join("profiles"))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[cfg(test)]
    fn new_for_test() -> io::Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

        let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "raid-insurance-test-{}-{}",
            std::process::id(),
            test_id
        ));
        Self::with_dir(temp_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.path_for(session_id).is_ok_and(|path| path.exists())
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        if !is_valid_session_id(session_id) {
            return Err(InsuranceError::InvalidSessionId {
                session_id: session_id.to_string(),
            });
        }
        Ok(self
            .dir
            .join(format!("{}.{}", session_id, PROFILE_FILE_EXTENSION)))
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self, session_id: &str) -> Result<Profile> {
        let path = self.path_for(session_id)?;
        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InsuranceError::ProfileNotFound {
                    session_id: session_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let mut version_bytes = [0u8; 8];
        file.read_exact(&mut version_bytes)?;
        let version = u64::from_le_bytes(version_bytes);
        if version != PROFILE_VERSION_MAGIC {
            return Err(InsuranceError::Corrupt(format!(
                "Invalid profile version: expected 0x{:016X}, got 0x{:016X}",
                PROFILE_VERSION_MAGIC, version
            )));
        }

        let mut length_bytes = [0u8; 4];
        file.read_exact(&mut length_bytes)?;
        let data_len = u32::from_le_bytes(length_bytes);

        // Header and checksum around the payload
        let file_len = file.metadata()?.len();
        if u64::from(data_len) + FRAME_OVERHEAD_BYTES != file_len {
            return Err(InsuranceError::Corrupt(format!(
                "Profile length {} does not match file size {} for {}",
                data_len,
                file_len,
                path.display()
            )));
        }

        let mut data = vec![0u8; data_len as usize];
        file.read_exact(&mut data)?;

        let mut stored_checksum = [0u8; 32];
        file.read_exact(&mut stored_checksum)?;

        let mut hasher = Sha256::new();
        hasher.update(version_bytes);
        hasher.update(length_bytes);
        hasher.update(&data);
        if stored_checksum != hasher.finalize().as_slice() {
            return Err(InsuranceError::Corrupt(format!(
                "Checksum verification failed for {}",
                path.display()
            )));
        }

        let profile: Profile = bincode::deserialize(&data)?;
        debug!(%session_id, pending = profile.insurance.len(), "Loaded profile");
        Ok(profile)
    }

    fn save(&mut self, profile: &Profile) -> Result<()> {
        let path = self.path_for(&profile.session_id)?;
        let data = bincode::serialize(profile)?;
        let data_len = u32::try_from(data.len()).map_err(|_| {
            InsuranceError::Serialization(format!("Profile too large: {} bytes", data.len()))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(PROFILE_VERSION_MAGIC.to_le_bytes());
        hasher.update(data_len.to_le_bytes());
        hasher.update(&data);
        let checksum = hasher.finalize();

        // Write beside the target, then swap it in
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&PROFILE_VERSION_MAGIC.to_le_bytes())?;
            file.write_all(&data_len.to_le_bytes())?;
            file.write_all(&data)?;
            file.write_all(&checksum)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        debug!(session_id = %profile.session_id, "Saved profile");
        Ok(())
    }

    fn sessions(&self) -> Result<Vec<String>> {
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if is_valid_session_id(stem) {
                    sessions.push(stem.to_string());
                }
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}

/// Session ids become file names: ASCII letters, digits, `-` and `_` only.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 64
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::{DropMarkers, InsurancePackage, SystemData};
    use crate::items::{Item, ItemUpd, Repairable};
    use uuid::Uuid;

    fn sample_profile(session_id: &str) -> Profile {
        let mut profile = Profile::new(session_id, "equip");
        profile.insure("rifle", "trader");
        profile.bonuses.insurance_return_time_percent = 15.0;

        let mut rifle = Item::new("rifle", "tpl_rifle").with_parent("equip", "hideout");
        rifle.upd = Some(ItemUpd {
            repairable: Some(Repairable {
                durability: 80.0,
                max_durability: 100.0,
            }),
            ..ItemUpd::default()
        });
        let mut dropped = DropMarkers::new();
        dropped.mark("rifle", true);
        profile.insurance.push(InsurancePackage {
            id: Uuid::new_v4(),
            trader_id: "trader".to_string(),
            session_id: session_id.to_string(),
            items: vec![rifle],
            dropped,
            scheduled_time: 1_700_000_000,
            max_storage_time: 345_600,
            system_data: SystemData {
                location: "bigmap".to_string(),
                raid_end_time: 1_699_990_000,
            },
        });
        profile
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryProfileStore::new();
        let profile = sample_profile("s1");
        store.save(&profile).unwrap();
        assert_eq!(store.load("s1").unwrap(), profile);
        assert_eq!(store.sessions().unwrap(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_memory_store_missing_profile() {
        let store = MemoryProfileStore::new();
        assert!(matches!(
            store.load("nobody"),
            Err(InsuranceError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_file_store_save_and_load() {
        let mut store = FileProfileStore::new_for_test().expect("Failed to create store");
        let profile = sample_profile("session-1");

        store.save(&profile).expect("Failed to save profile");
        assert!(store.exists("session-1"));

        let loaded = store.load("session-1").expect("Failed to load profile");
        assert_eq!(loaded, profile);
        assert!(
            loaded.insurance[0].is_dropped("rifle"),
            "Pending drop markers must persist"
        );

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_lists_sessions() {
        let mut store = FileProfileStore::new_for_test().expect("Failed to create store");
        store.save(&sample_profile("b")).unwrap();
        store.save(&sample_profile("a")).unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        assert_eq!(
            store.sessions().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_missing_profile() {
        let store = FileProfileStore::new_for_test().expect("Failed to create store");
        assert!(matches!(
            store.load("ghost"),
            Err(InsuranceError::ProfileNotFound { .. })
        ));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_detects_tampering() {
        let mut store = FileProfileStore::new_for_test().expect("Failed to create store");
        store.save(&sample_profile("s1")).unwrap();

        let path = store.dir().join("s1.dat");
        let mut bytes = fs::read(&path).unwrap();
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(store.load("s1"), Err(InsuranceError::Corrupt(_))));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_rejects_wrong_magic() {
        let store = FileProfileStore::new_for_test().expect("Failed to create store");
        fs::write(store.dir().join("s1.dat"), [0u8; 64]).unwrap();

        assert!(matches!(store.load("s1"), Err(InsuranceError::Corrupt(_))));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_rejects_oversized_length_header() {
        let store = FileProfileStore::new_for_test().expect("Failed to create store");
        let mut bytes = PROFILE_VERSION_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 48]);
        fs::write(store.dir().join("s1.dat"), bytes).unwrap();

        assert!(matches!(store.load("s1"), Err(InsuranceError::Corrupt(_))));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_rejects_truncated_file() {
        let mut store = FileProfileStore::new_for_test().expect("Failed to create store");
        store.save(&sample_profile("s1")).unwrap();

        let path = store.dir().join("s1.dat");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

        assert!(matches!(store.load("s1"), Err(InsuranceError::Corrupt(_))));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("5f3c9a0e1b2d"));
        assert!(is_valid_session_id("player_one-2"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../etc/passwd"));
        assert!(!is_valid_session_id("a b"));

        let store = FileProfileStore::new_for_test().expect("Failed to create store");
        assert!(matches!(
            store.load("../escape"),
            Err(InsuranceError::InvalidSessionId { .. })
        ));
        fs::remove_dir_all(store.dir()).ok();
    }
}
