//! Namespaced on-device key-value storage
//!
//! Holds everything a guest writes, plus a few per-device flags for signed-in
//! accounts. Values are JSON documents; a value that no longer parses is
//! treated as missing.

use std::{
  collections::BTreeMap,
  fs, io,
  path::{Path, PathBuf},
  sync::{Mutex, PoisonError},
};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};

use crate::prelude::*;

/// Prefix applied to every key this application owns.
pub const NAMESPACE: &str = "ramadhan_";

/// Raw string storage shared with other applications on the same origin.
pub trait Backend: Send + Sync {
  fn read(&self, key: &str) -> Option<String>;
  fn write(&self, key: &str, value: String) -> Result<()>;
  fn delete(&self, key: &str) -> Result<()>;
  fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct Memory {
  entries: DashMap<String, String>,
}

impl Backend for Memory {
  fn read(&self, key: &str) -> Option<String> {
    self.entries.get(key).map(|value| value.clone())
  }

  fn write(&self, key: &str, value: String) -> Result<()> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    self.entries.remove(key);
    Ok(())
  }

  fn keys(&self) -> Vec<String> {
    self.entries.iter().map(|entry| entry.key().clone()).collect()
  }
}

/// Single JSON file on disk, rewritten on every mutation.
#[derive(Debug)]
pub struct File {
  path: PathBuf,
  entries: DashMap<String, String>,
  /// Held across snapshot, write and rename; all flushes share one tmp path.
  flushing: Mutex<()>,
}

impl File {
  pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();

    let entries = match fs::read_to_string(&path) {
      Ok(raw) => match json::from_str::<BTreeMap<String, String>>(&raw) {
        Ok(map) => map.into_iter().collect(),
        Err(err) => {
          warn!("Local store {} is unreadable, starting empty: {err}", path.display());
          DashMap::new()
        }
      },
      Err(err) if err.kind() == io::ErrorKind::NotFound => DashMap::new(),
      Err(err) => return Err(err.into()),
    };

    Ok(Self { path, entries, flushing: Mutex::new(()) })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn flush(&self) -> Result<()> {
    let _guard = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);
    let snapshot: BTreeMap<String, String> = self
      .entries
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect();

    let tmp = self.path.with_extension("tmp");
    fs::write(&tmp, json::to_vec(&snapshot)?)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

impl Backend for File {
  fn read(&self, key: &str) -> Option<String> {
    self.entries.get(key).map(|value| value.clone())
  }

  fn write(&self, key: &str, value: String) -> Result<()> {
    self.entries.insert(key.to_string(), value);
    self.flush()
  }

  fn delete(&self, key: &str) -> Result<()> {
    if self.entries.remove(key).is_some() {
      self.flush()?;
    }
    Ok(())
  }

  fn keys(&self) -> Vec<String> {
    self.entries.iter().map(|entry| entry.key().clone()).collect()
  }
}

#[derive(Clone)]
pub struct LocalStore {
  backend: Arc<dyn Backend>,
}

impl LocalStore {
  pub fn new(backend: impl Backend + 'static) -> Self {
    Self { backend: Arc::new(backend) }
  }

  pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
    Self { backend }
  }

  pub fn memory() -> Self {
    Self::new(Memory::default())
  }

  pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
    Ok(Self::new(File::open(path)?))
  }

  fn scoped(key: &str) -> String {
    format!("{NAMESPACE}{key}")
  }

  /// Returns `fallback` when the key is absent or its value does not parse.
  pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
    let Some(raw) = self.backend.read(&Self::scoped(key)) else {
      return fallback;
    };

    match json::from_str(&raw) {
      Ok(value) => value,
      Err(err) => {
        debug!("Ignoring unreadable local value `{key}`: {err}");
        fallback
      }
    }
  }

  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
    self.backend.write(&Self::scoped(key), json::to_string(value)?)
  }

  pub fn remove(&self, key: &str) -> Result<()> {
    self.backend.delete(&Self::scoped(key))
  }

  /// Removes this application's keys only.
  pub fn clear(&self) -> Result<()> {
    for key in self.backend.keys() {
      if key.starts_with(NAMESPACE) {
        self.backend.delete(&key)?;
      }
    }
    Ok(())
  }

  /// Keys (without namespace) starting with `prefix`, sorted.
  pub fn keys(&self, prefix: &str) -> Vec<String> {
    let mut keys: Vec<String> = self
      .backend
      .keys()
      .into_iter()
      .filter_map(|key| key.strip_prefix(NAMESPACE).map(str::to_string))
      .filter(|key| key.starts_with(prefix))
      .collect();
    keys.sort();
    keys
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  use super::*;

  #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
  struct Flag {
    done: bool,
  }

  #[test]
  fn test_get_missing_returns_fallback() {
    let store = LocalStore::memory();
    assert_eq!(store.get("quran_total", 0u32), 0);
    assert_eq!(store.get::<Option<Flag>>("onboarding_x", None), None);
  }

  #[test]
  fn test_corrupt_value_returns_fallback() {
    let backend = Arc::new(Memory::default());
    backend.write("ramadhan_quran_total", "{not json".into()).unwrap();
    backend.write("ramadhan_flag", "\"text\"".into()).unwrap();

    let store = LocalStore::with_backend(backend);
    assert_eq!(store.get("quran_total", 7u32), 7);
    assert_eq!(store.get("flag", Flag { done: true }), Flag { done: true });
  }

  #[test]
  fn test_set_overwrites_and_remove() {
    let store = LocalStore::memory();
    store.set("flag", &Flag { done: false }).unwrap();
    store.set("flag", &Flag { done: true }).unwrap();
    assert_eq!(store.get("flag", Flag::default()), Flag { done: true });

    store.remove("flag").unwrap();
    assert_eq!(store.get("flag", Flag::default()), Flag::default());
  }

  #[test]
  fn test_clear_keeps_foreign_keys() {
    let backend = Arc::new(Memory::default());
    backend.write("other_app_token", "\"keep\"".into()).unwrap();

    let store = LocalStore::with_backend(backend.clone());
    store.set("quran_total", &12).unwrap();
    store.set("profile", &Flag { done: true }).unwrap();
    store.clear().unwrap();

    assert_eq!(store.get("quran_total", 0), 0);
    assert!(store.keys("").is_empty());
    assert_eq!(backend.read("other_app_token").as_deref(), Some("\"keep\""));
  }

  #[test]
  fn test_keys_by_prefix() {
    let store = LocalStore::memory();
    store.set("ibadah_2026-03-02", &1).unwrap();
    store.set("ibadah_2026-03-01", &1).unwrap();
    store.set("ibadah_2026-02-28", &1).unwrap();
    store.set("health_2026-03-01", &1).unwrap();

    assert_eq!(
      store.keys("ibadah_2026-03-"),
      vec!["ibadah_2026-03-01", "ibadah_2026-03-02"]
    );
  }

  #[test]
  fn test_file_backend_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");

    let store = LocalStore::open(&path).unwrap();
    store.set("quran_total", &42).unwrap();
    store.set("scratch", &1).unwrap();
    store.remove("scratch").unwrap();
    drop(store);

    let reopened = LocalStore::open(&path).unwrap();
    assert_eq!(reopened.get("quran_total", 0), 42);
    assert_eq!(reopened.get("scratch", 0), 0);
  }

  #[test]
  fn test_file_backend_concurrent_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");
    let store = LocalStore::open(&path).unwrap();

    std::thread::scope(|scope| {
      for worker in 0..4 {
        let store = store.clone();
        scope.spawn(move || {
          for n in 0..25 {
            store.set(&format!("w{worker}_{n}"), &n).unwrap();
          }
        });
      }
    });

    let reopened = LocalStore::open(&path).unwrap();
    assert_eq!(reopened.keys("w").len(), 100);
    assert_eq!(reopened.get("w3_24", 0), 24);
  }

  #[test]
  fn test_file_backend_recovers_from_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");
    fs::write(&path, "garbage").unwrap();

    let store = LocalStore::open(&path).unwrap();
    assert_eq!(store.get("quran_total", 3), 3);
    store.set("quran_total", &4).unwrap();
    assert_eq!(LocalStore::open(&path).unwrap().get("quran_total", 0), 4);
  }
}
