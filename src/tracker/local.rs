use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{
  Health, HealthPatch, Ibadah, IbadahPatch, Mode, MonthRecords, Onboarding,
  SedekahEntry, Tracker, validate_pages,
};
use crate::{local::LocalStore, prelude::*, utils::Month};

const PROFILE: &str = "profile";
const QURAN_TOTAL: &str = "quran_total";
const SEDEKAH: &str = "sedekah_logs";

fn ibadah_key(date: Date) -> String {
  format!("ibadah_{date}")
}

fn health_key(date: Date) -> String {
  format!("health_{date}")
}

fn quran_key(date: Date) -> String {
  format!("quran_today_{date}")
}

/// Guest profile as kept on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GuestProfile {
  #[serde(flatten)]
  form: Onboarding,
  #[serde(default)]
  onboarding_done: bool,
}

/// Guest records in the device's key-value store.
///
/// Reads never fail: missing or corrupt entries come back as defaults.
#[derive(Clone)]
pub struct LocalTracker {
  store: LocalStore,
}

impl LocalTracker {
  pub fn new(store: LocalStore) -> Self {
    Self { store }
  }

  /// Dated entries under `{kind}_{YYYY-MM-}`, oldest first.
  fn scan<T: DeserializeOwned>(&self, kind: &str, month: Month) -> Vec<(Date, T)> {
    let prefix = format!("{kind}_{}", month.prefix());

    self
      .store
      .keys(&prefix)
      .into_iter()
      .filter_map(|key| {
        let date = key.strip_prefix(kind)?.strip_prefix('_')?.parse().ok()?;
        let value = self.store.get::<Option<T>>(&key, None)?;
        Some((date, value))
      })
      .collect()
  }

  fn logs(&self) -> Vec<SedekahEntry> {
    self.store.get(SEDEKAH, Vec::new())
  }
}

#[async_trait]
impl Tracker for LocalTracker {
  fn mode(&self) -> Mode {
    Mode::Local
  }

  async fn ibadah(&self, date: Date) -> Result<Ibadah> {
    Ok(self.store.get(&ibadah_key(date), Ibadah::default()))
  }

  async fn write_ibadah(
    &self,
    date: Date,
    patch: &IbadahPatch,
  ) -> Result<Ibadah> {
    let mut ibadah = self.ibadah(date).await?;
    if patch.is_empty() {
      return Ok(ibadah);
    }
    patch.apply(&mut ibadah);
    self.store.set(&ibadah_key(date), &ibadah)?;
    Ok(ibadah)
  }

  async fn health(&self, date: Date) -> Result<Health> {
    Ok(self.store.get(&health_key(date), Health::default()))
  }

  async fn write_health(
    &self,
    date: Date,
    patch: &HealthPatch,
  ) -> Result<Health> {
    patch.validate()?;
    let mut health = self.health(date).await?;
    if patch.is_empty() {
      return Ok(health);
    }
    patch.apply(&mut health);
    self.store.set(&health_key(date), &health)?;
    Ok(health)
  }

  async fn quran_pages(&self, date: Date) -> Result<u32> {
    Ok(self.store.get(&quran_key(date), 0))
  }

  async fn quran_total(&self) -> Result<u32> {
    Ok(self.store.get(QURAN_TOTAL, 0))
  }

  async fn add_pages(&self, date: Date, pages: u32) -> Result<u32> {
    validate_pages(pages)?;

    let today = self.quran_pages(date).await?.saturating_add(pages);
    let total = self.quran_total().await?.saturating_add(pages);
    self.store.set(&quran_key(date), &today)?;
    self.store.set(QURAN_TOTAL, &total)?;
    Ok(today)
  }

  async fn sedekah(&self) -> Result<Vec<SedekahEntry>> {
    let mut logs = self.logs();
    // stored newest-added first; stable sort keeps that order within a day
    logs.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(logs)
  }

  async fn add_sedekah(
    &self,
    amount: i64,
    note: Option<&str>,
    date: Date,
  ) -> Result<SedekahEntry> {
    let entry = SedekahEntry::new(amount, note, date)?;

    let mut logs = self.logs();
    logs.insert(0, entry.clone());
    self.store.set(SEDEKAH, &logs)?;
    Ok(entry)
  }

  async fn delete_sedekah(&self, id: Uuid) -> Result<bool> {
    let mut logs = self.logs();
    let before = logs.len();
    logs.retain(|entry| entry.id != id);

    if logs.len() == before {
      return Ok(false);
    }
    self.store.set(SEDEKAH, &logs)?;
    Ok(true)
  }

  async fn month(&self, month: Month) -> Result<MonthRecords> {
    let mut sedekah: Vec<SedekahEntry> = self
      .logs()
      .into_iter()
      .rev()
      .filter(|entry| month.contains(entry.date))
      .collect();
    sedekah.sort_by_key(|entry| entry.date);

    Ok(MonthRecords {
      ibadah: self.scan("ibadah", month),
      health: self.scan("health", month),
      quran: self.scan("quran_today", month),
      sedekah,
    })
  }

  async fn onboarding(&self) -> Result<Option<Onboarding>> {
    let profile = self.store.get::<Option<GuestProfile>>(PROFILE, None);
    Ok(profile.filter(|p| p.onboarding_done).map(|p| p.form))
  }

  async fn complete_onboarding(&self, form: &Onboarding) -> Result<()> {
    form.validate()?;

    let form = Onboarding {
      display_name: form.display_name.trim().to_string(),
      ..form.clone()
    };
    self.store.set(PROFILE, &GuestProfile { form, onboarding_done: true })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    local::{Backend, Memory},
    tracker::IbadahFlag,
  };

  fn corrupted(entries: &[(&str, &str)]) -> LocalTracker {
    let backend = Arc::new(Memory::default());
    for (key, value) in entries {
      backend.write(&format!("ramadhan_{key}"), value.to_string()).unwrap();
    }
    LocalTracker::new(LocalStore::with_backend(backend))
  }

  #[tokio::test]
  async fn test_corrupt_entries_read_as_defaults() {
    let tracker = corrupted(&[
      ("ibadah_2026-03-01", "{broken"),
      ("health_2026-03-01", "[1,2]"),
      ("quran_total", "\"many\""),
      ("sedekah_logs", "null"),
      ("profile", "{\"display_name\":1}"),
    ]);
    let day = Date::from_ymd_opt(2026, 3, 1).unwrap();

    assert_eq!(tracker.ibadah(day).await.unwrap(), Ibadah::default());
    assert_eq!(tracker.health(day).await.unwrap(), Health::default());
    assert_eq!(tracker.quran_total().await.unwrap(), 0);
    assert!(tracker.sedekah().await.unwrap().is_empty());
    assert_eq!(tracker.onboarding().await.unwrap(), None);

    let month = tracker.month(Month::of(day)).await.unwrap();
    assert!(month.ibadah.is_empty());
    assert!(month.health.is_empty());
  }

  #[tokio::test]
  async fn test_corrupt_entry_is_overwritten() {
    let tracker = corrupted(&[("ibadah_2026-03-01", "{broken")]);
    let day = Date::from_ymd_opt(2026, 3, 1).unwrap();

    let patch = IbadahPatch::new().set(IbadahFlag::Sahur, true);
    let ibadah = tracker.write_ibadah(day, &patch).await.unwrap();
    assert!(ibadah.sahur);
    assert_eq!(tracker.ibadah(day).await.unwrap(), ibadah);
  }

  #[tokio::test]
  async fn test_profile_layout() {
    let store = LocalStore::memory();
    let tracker = LocalTracker::new(store.clone());

    tracker
      .complete_onboarding(&Onboarding {
        display_name: " Umar ".into(),
        ramadhan_day: 5,
        quran_target: 1,
        sedekah_target: 0,
      })
      .await
      .unwrap();

    let raw: json::Value = store.get(PROFILE, json::Value::Null);
    assert_eq!(raw["display_name"], "Umar");
    assert_eq!(raw["ramadhan_day"], 5);
    assert_eq!(raw["onboarding_done"], true);
  }

  #[tokio::test]
  async fn test_unfinished_profile_is_not_onboarding() {
    let store = LocalStore::memory();
    store
      .set(
        PROFILE,
        &json::json!({
          "display_name": "Umar", "ramadhan_day": 5,
          "quran_target": 1, "sedekah_target": 0
        }),
      )
      .unwrap();

    assert_eq!(LocalTracker::new(store).onboarding().await.unwrap(), None);
  }
}
