use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// String key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store that lives only as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// On-disk layout of the preference file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Store persisted as a JSON file, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    prefs: Preferences,
}

impl FileStore {
    /// Loads the file at `path`; a missing or corrupt file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prefs = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(prefs) => prefs,
                Err(err) => {
                    log::warn!("ignoring unreadable preferences {}: {}", path.display(), err);
                    Preferences::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Preferences::default(),
            Err(err) => return Err(Error::Io(err)),
        };
        log::debug!("opened preference store {}", path.display());
        Ok(FileStore { path, prefs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `$XDG_CONFIG_HOME/tunnel3d/preferences.json`, then `~/.config/...`,
    /// then the working directory
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
        match base {
            Some(base) => base.join("tunnel3d").join("preferences.json"),
            None => PathBuf::from(".tunnel3d-preferences.json"),
        }
    }

    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.prefs)?;
        let with_path = |source| Error::Persist {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(with_path)?;
        }
        // Write beside the target then rename so a crash never leaves half a file
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(with_path)?;
        fs::rename(&staging, &self.path).map_err(with_path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.prefs.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.prefs.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }
}
