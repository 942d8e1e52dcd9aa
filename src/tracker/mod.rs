//! Daily devotional records behind one interface
//!
//! Signed-in accounts persist to the database, guests to the device's
//! [`LocalStore`]. Callers pick an implementation once with [`select`] and
//! never branch on the mode again.

mod local;
mod remote;

use serde::{Deserialize, Serialize};

pub use self::{local::LocalTracker, remote::RemoteTracker};
use crate::{local::LocalStore, prelude::*, utils::Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbadahFlag {
  Subuh,
  Dzuhur,
  Ashar,
  Maghrib,
  Isya,
  Tahajud,
  Dhuha,
  Rawatib,
  Witir,
  Tadarus,
  Sahur,
  BukaTepatWaktu,
}

impl IbadahFlag {
  pub const ALL: [IbadahFlag; 12] = [
    Self::Subuh,
    Self::Dzuhur,
    Self::Ashar,
    Self::Maghrib,
    Self::Isya,
    Self::Tahajud,
    Self::Dhuha,
    Self::Rawatib,
    Self::Witir,
    Self::Tadarus,
    Self::Sahur,
    Self::BukaTepatWaktu,
  ];

  /// The five daily obligatory prayers.
  pub fn is_obligatory(self) -> bool {
    matches!(
      self,
      Self::Subuh | Self::Dzuhur | Self::Ashar | Self::Maghrib | Self::Isya
    )
  }
}

/// One day's checklist. Missing fields read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ibadah {
  pub subuh: bool,
  pub dzuhur: bool,
  pub ashar: bool,
  pub maghrib: bool,
  pub isya: bool,
  pub tahajud: bool,
  pub dhuha: bool,
  pub rawatib: bool,
  pub witir: bool,
  pub tadarus: bool,
  pub sahur: bool,
  pub buka_tepat_waktu: bool,
}

impl Ibadah {
  pub fn get(&self, flag: IbadahFlag) -> bool {
    match flag {
      IbadahFlag::Subuh => self.subuh,
      IbadahFlag::Dzuhur => self.dzuhur,
      IbadahFlag::Ashar => self.ashar,
      IbadahFlag::Maghrib => self.maghrib,
      IbadahFlag::Isya => self.isya,
      IbadahFlag::Tahajud => self.tahajud,
      IbadahFlag::Dhuha => self.dhuha,
      IbadahFlag::Rawatib => self.rawatib,
      IbadahFlag::Witir => self.witir,
      IbadahFlag::Tadarus => self.tadarus,
      IbadahFlag::Sahur => self.sahur,
      IbadahFlag::BukaTepatWaktu => self.buka_tepat_waktu,
    }
  }

  pub fn set(&mut self, flag: IbadahFlag, value: bool) {
    let slot = match flag {
      IbadahFlag::Subuh => &mut self.subuh,
      IbadahFlag::Dzuhur => &mut self.dzuhur,
      IbadahFlag::Ashar => &mut self.ashar,
      IbadahFlag::Maghrib => &mut self.maghrib,
      IbadahFlag::Isya => &mut self.isya,
      IbadahFlag::Tahajud => &mut self.tahajud,
      IbadahFlag::Dhuha => &mut self.dhuha,
      IbadahFlag::Rawatib => &mut self.rawatib,
      IbadahFlag::Witir => &mut self.witir,
      IbadahFlag::Tadarus => &mut self.tadarus,
      IbadahFlag::Sahur => &mut self.sahur,
      IbadahFlag::BukaTepatWaktu => &mut self.buka_tepat_waktu,
    };
    *slot = value;
  }

  pub fn done(&self) -> usize {
    IbadahFlag::ALL.iter().filter(|&&flag| self.get(flag)).count()
  }

  /// Share of the twelve items completed, rounded half up.
  pub fn percent(&self) -> u32 {
    utils::percent(self.done() as u64, IbadahFlag::ALL.len() as u64)
  }
}

/// Flags to change on a day; everything else keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IbadahPatch {
  flags: Vec<(IbadahFlag, bool)>,
}

impl IbadahPatch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Later values for the same flag win.
  pub fn set(mut self, flag: IbadahFlag, value: bool) -> Self {
    self.flags.retain(|(f, _)| *f != flag);
    self.flags.push((flag, value));
    self
  }

  pub fn toggle(current: &Ibadah, flag: IbadahFlag) -> Self {
    Self::new().set(flag, !current.get(flag))
  }

  pub fn flags(&self) -> &[(IbadahFlag, bool)] {
    &self.flags
  }

  pub fn is_empty(&self) -> bool {
    self.flags.is_empty()
  }

  pub fn apply(&self, ibadah: &mut Ibadah) {
    for &(flag, value) in &self.flags {
      ibadah.set(flag, value);
    }
  }
}

pub const WATER_TARGET: i32 = 8;
pub const DEFAULT_SLEEP_HOURS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
  pub water_glasses: i32,
  pub ate_fruit: bool,
  pub exercised: bool,
  pub sleep_hours: f64,
}

impl Default for Health {
  fn default() -> Self {
    Self {
      water_glasses: 0,
      ate_fruit: false,
      exercised: false,
      sleep_hours: DEFAULT_SLEEP_HOURS,
    }
  }
}

impl Health {
  pub fn water_goal_met(&self) -> bool {
    self.water_glasses >= WATER_TARGET
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthPatch {
  pub water_glasses: Option<i32>,
  pub ate_fruit: Option<bool>,
  pub exercised: Option<bool>,
  pub sleep_hours: Option<f64>,
}

impl HealthPatch {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn validate(&self) -> Result<()> {
    if let Some(water) = self.water_glasses
      && water < 0
    {
      return Err(Error::invalid("Water glasses must not be negative"));
    }
    if let Some(sleep) = self.sleep_hours
      && !(sleep.is_finite() && (0.0..=24.0).contains(&sleep))
    {
      return Err(Error::invalid("Sleep hours must be between 0 and 24"));
    }
    Ok(())
  }

  pub fn apply(&self, health: &mut Health) {
    if let Some(water) = self.water_glasses {
      health.water_glasses = water;
    }
    if let Some(fruit) = self.ate_fruit {
      health.ate_fruit = fruit;
    }
    if let Some(exercised) = self.exercised {
      health.exercised = exercised;
    }
    if let Some(sleep) = self.sleep_hours {
      health.sleep_hours = sleep;
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SedekahEntry {
  pub id: Uuid,
  pub amount: i64,
  pub note: Option<String>,
  pub date: Date,
}

impl SedekahEntry {
  pub fn new(amount: i64, note: Option<&str>, date: Date) -> Result<Self> {
    if amount <= 0 {
      return Err(Error::invalid("Sedekah amount must be positive"));
    }
    let note = note.map(str::trim).filter(|note| !note.is_empty());
    Ok(Self { id: Uuid::new_v4(), amount, note: note.map(String::from), date })
  }
}

/// Profile answers collected on first launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Onboarding {
  pub display_name: String,
  pub ramadhan_day: i32,
  /// Number of complete readings aimed for this month.
  pub quran_target: i32,
  pub sedekah_target: i64,
}

impl Onboarding {
  pub const RAMADHAN_DAYS: i32 = 30;
  pub const MAX_QURAN_TARGET: i32 = 30;

  pub fn validate(&self) -> Result<()> {
    if self.display_name.trim().is_empty() {
      return Err(Error::invalid("Display name must not be empty"));
    }
    if !(1..=Self::RAMADHAN_DAYS).contains(&self.ramadhan_day) {
      return Err(Error::invalid("Ramadhan day must be between 1 and 30"));
    }
    if !(1..=Self::MAX_QURAN_TARGET).contains(&self.quran_target) {
      return Err(Error::invalid("Qur'an target must be between 1 and 30 khatam"));
    }
    if self.sedekah_target < 0 {
      return Err(Error::invalid("Sedekah target must not be negative"));
    }
    Ok(())
  }

  /// Pages per remaining day to reach the target from zero.
  pub fn pages_per_day(&self) -> u32 {
    let target = utils::khatam_pages(self.quran_target);
    let remaining = (Self::RAMADHAN_DAYS - self.ramadhan_day + 1).max(1) as u32;
    target.div_ceil(remaining)
  }
}

/// Every raw record of one month, each list sorted by date ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthRecords {
  pub ibadah: Vec<(Date, Ibadah)>,
  pub health: Vec<(Date, Health)>,
  pub quran: Vec<(Date, u32)>,
  pub sedekah: Vec<SedekahEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Local,
  Remote(Uuid),
}

#[async_trait]
pub trait Tracker: Send + Sync {
  fn mode(&self) -> Mode;

  async fn ibadah(&self, date: Date) -> Result<Ibadah>;
  /// Upserts the day, changing only the flags in `patch`.
  async fn write_ibadah(&self, date: Date, patch: &IbadahPatch)
  -> Result<Ibadah>;

  async fn health(&self, date: Date) -> Result<Health>;
  async fn write_health(&self, date: Date, patch: &HealthPatch)
  -> Result<Health>;

  async fn quran_pages(&self, date: Date) -> Result<u32>;
  async fn quran_total(&self) -> Result<u32>;
  /// Adds to the day's count and returns the new value.
  async fn add_pages(&self, date: Date, pages: u32) -> Result<u32>;

  /// Newest first.
  async fn sedekah(&self) -> Result<Vec<SedekahEntry>>;
  async fn add_sedekah(
    &self,
    amount: i64,
    note: Option<&str>,
    date: Date,
  ) -> Result<SedekahEntry>;
  async fn delete_sedekah(&self, id: Uuid) -> Result<bool>;

  async fn month(&self, month: Month) -> Result<MonthRecords>;

  /// `None` until onboarding has been completed.
  async fn onboarding(&self) -> Result<Option<Onboarding>>;
  async fn complete_onboarding(&self, form: &Onboarding) -> Result<()>;

  async fn toggle_ibadah(&self, date: Date, flag: IbadahFlag) -> Result<Ibadah> {
    let current = self.ibadah(date).await?;
    self.write_ibadah(date, &IbadahPatch::toggle(&current, flag)).await
  }

  async fn sedekah_total(&self) -> Result<i64> {
    Ok(self.sedekah().await?.iter().map(|entry| entry.amount).sum())
  }
}

pub fn select(
  account: Option<Uuid>,
  db: &DatabaseConnection,
  local: &LocalStore,
) -> Box<dyn Tracker> {
  match account {
    Some(account) => Box::new(RemoteTracker::new(db.clone(), account)),
    None => Box::new(LocalTracker::new(local.clone())),
  }
}

/// Falls back to the default value when a read failed; the failure is
/// logged and the screen renders empty instead of breaking.
pub trait Degrade<T> {
  fn or_degrade(self, what: &str) -> T;
}

impl<T: Default> Degrade<T> for Result<T> {
  fn or_degrade(self, what: &str) -> T {
    self.unwrap_or_else(|err| {
      warn!("Showing defaults for {what}: {err}");
      T::default()
    })
  }
}

fn validate_pages(pages: u32) -> Result<()> {
  if pages == 0 {
    return Err(Error::invalid("Pages must be positive"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{sv, testing};

  fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd_opt(y, m, d).unwrap()
  }

  async fn both() -> (DatabaseConnection, Vec<Box<dyn Tracker>>) {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    let trackers = vec![
      select(Some(account.id), &db, &LocalStore::memory()),
      select(None, &db, &LocalStore::memory()),
    ];
    (db, trackers)
  }

  #[test]
  fn test_ibadah_percent() {
    let mut ibadah = Ibadah::default();
    assert_eq!(ibadah.percent(), 0);

    for flag in IbadahFlag::ALL.iter().copied().filter(|f| f.is_obligatory()) {
      ibadah.set(flag, true);
    }
    ibadah.set(IbadahFlag::Sahur, true);
    assert_eq!(ibadah.done(), 6);
    assert_eq!(ibadah.percent(), 50);
  }

  #[test]
  fn test_patch_last_write_wins() {
    let patch = IbadahPatch::new()
      .set(IbadahFlag::Witir, true)
      .set(IbadahFlag::Subuh, true)
      .set(IbadahFlag::Witir, false);
    assert_eq!(
      patch.flags(),
      &[(IbadahFlag::Subuh, true), (IbadahFlag::Witir, false)]
    );
  }

  #[test]
  fn test_ibadah_deserializes_partial() {
    let ibadah: Ibadah = json::from_str(r#"{"subuh":true}"#).unwrap();
    assert!(ibadah.subuh);
    assert_eq!(ibadah.done(), 1);

    let flag: IbadahFlag = json::from_str(r#""buka_tepat_waktu""#).unwrap();
    assert_eq!(flag, IbadahFlag::BukaTepatWaktu);
  }

  #[test]
  fn test_health_patch_validation() {
    let bad = [
      HealthPatch { water_glasses: Some(-1), ..Default::default() },
      HealthPatch { sleep_hours: Some(24.5), ..Default::default() },
      HealthPatch { sleep_hours: Some(-0.5), ..Default::default() },
      HealthPatch { sleep_hours: Some(f64::NAN), ..Default::default() },
    ];
    for patch in bad {
      assert!(matches!(patch.validate(), Err(Error::Invalid(_))), "{patch:?}");
    }

    let ok = HealthPatch { water_glasses: Some(0), sleep_hours: Some(24.0), ..Default::default() };
    assert!(ok.validate().is_ok());
  }

  #[test]
  fn test_onboarding_rules() {
    let form = Onboarding {
      display_name: "Aisyah".into(),
      ramadhan_day: 1,
      quran_target: 1,
      sedekah_target: 100_000,
    };
    assert!(form.validate().is_ok());
    assert_eq!(form.pages_per_day(), 21);
    assert_eq!(Onboarding { ramadhan_day: 21, quran_target: 2, ..form.clone() }.pages_per_day(), 121);

    assert!(Onboarding { display_name: "  ".into(), ..form.clone() }.validate().is_err());
    assert!(Onboarding { ramadhan_day: 31, ..form.clone() }.validate().is_err());
    assert!(Onboarding { quran_target: 0, ..form.clone() }.validate().is_err());
    assert!(Onboarding { quran_target: 30, ..form.clone() }.validate().is_ok());
    assert!(Onboarding { quran_target: 31, ..form.clone() }.validate().is_err());
    // raw values that skipped validation still do not overflow
    let huge = Onboarding { quran_target: 10_000_000, ..form.clone() };
    assert!(huge.validate().is_err());
    assert_eq!(huge.pages_per_day(), u32::MAX.div_ceil(30));
    assert!(Onboarding { sedekah_target: -1, ..form }.validate().is_err());
  }

  #[test]
  fn test_sedekah_entry_rules() {
    let day = date(2026, 3, 1);
    assert!(SedekahEntry::new(0, None, day).is_err());
    assert!(SedekahEntry::new(-5, None, day).is_err());
    assert_eq!(SedekahEntry::new(5, Some("  "), day).unwrap().note, None);
    assert_eq!(
      SedekahEntry::new(5, Some(" masjid "), day).unwrap().note.as_deref(),
      Some("masjid")
    );
  }

  #[test]
  fn test_degrade_substitutes_default() {
    let failed: Result<Ibadah> = Err(Error::Internal("offline".into()));
    assert_eq!(failed.or_degrade("ibadah"), Ibadah::default());

    let fine: Result<u32> = Ok(4);
    assert_eq!(fine.or_degrade("pages"), 4);
  }

  #[tokio::test]
  async fn test_select_by_identity() {
    let (_db, trackers) = both().await;
    assert!(matches!(trackers[0].mode(), Mode::Remote(_)));
    assert_eq!(trackers[1].mode(), Mode::Local);
  }

  #[tokio::test]
  async fn test_backends_agree_on_defaults() {
    let (_db, trackers) = both().await;
    let day = date(2026, 3, 1);

    for tracker in &trackers {
      assert_eq!(tracker.ibadah(day).await.unwrap(), Ibadah::default());
      assert_eq!(tracker.health(day).await.unwrap(), Health::default());
      assert_eq!(tracker.quran_pages(day).await.unwrap(), 0);
      assert_eq!(tracker.quran_total().await.unwrap(), 0);
      assert!(tracker.sedekah().await.unwrap().is_empty());
      assert_eq!(tracker.onboarding().await.unwrap(), None);
      assert_eq!(
        tracker.month(Month::of(day)).await.unwrap(),
        MonthRecords::default()
      );
    }
  }

  #[tokio::test]
  async fn test_backends_agree_after_writes() {
    let (_db, trackers) = both().await;
    let day = date(2026, 3, 2);

    let mut results = Vec::new();
    for tracker in &trackers {
      tracker
        .write_ibadah(day, &IbadahPatch::new().set(IbadahFlag::Subuh, true))
        .await
        .unwrap();
      tracker.toggle_ibadah(day, IbadahFlag::Tadarus).await.unwrap();
      tracker
        .write_health(day, &HealthPatch { water_glasses: Some(5), ..Default::default() })
        .await
        .unwrap();
      tracker.add_pages(day, 4).await.unwrap();
      tracker.add_pages(day, 6).await.unwrap();
      tracker.add_sedekah(10_000, Some("masjid"), day).await.unwrap();
      tracker.add_sedekah(2_500, None, day).await.unwrap();

      results.push((
        tracker.ibadah(day).await.unwrap(),
        tracker.health(day).await.unwrap(),
        tracker.quran_pages(day).await.unwrap(),
        tracker.quran_total().await.unwrap(),
        tracker.sedekah_total().await.unwrap(),
        tracker
          .sedekah()
          .await
          .unwrap()
          .into_iter()
          .map(|entry| (entry.amount, entry.note))
          .collect::<Vec<_>>(),
      ));
    }

    assert_eq!(results[0], results[1]);
    let (ibadah, health, pages, total, sedekah, entries) = &results[0];
    assert!(ibadah.subuh && ibadah.tadarus);
    assert_eq!(ibadah.done(), 2);
    assert_eq!(health.water_glasses, 5);
    assert_eq!(health.sleep_hours, DEFAULT_SLEEP_HOURS);
    assert_eq!((*pages, *total), (10, 10));
    assert_eq!(*sedekah, 12_500);
    assert_eq!(entries[0], (2_500, None));
  }

  #[tokio::test]
  async fn test_patch_leaves_other_fields_alone() {
    let (_db, trackers) = both().await;
    let day = date(2026, 3, 3);

    for tracker in &trackers {
      tracker
        .write_ibadah(
          day,
          &IbadahPatch::new().set(IbadahFlag::Subuh, true).set(IbadahFlag::Witir, true),
        )
        .await
        .unwrap();
      let after = tracker
        .write_ibadah(day, &IbadahPatch::new().set(IbadahFlag::Witir, false))
        .await
        .unwrap();
      assert!(after.subuh);
      assert!(!after.witir);

      tracker
        .write_health(day, &HealthPatch { sleep_hours: Some(5.5), ..Default::default() })
        .await
        .unwrap();
      let health = tracker
        .write_health(day, &HealthPatch { ate_fruit: Some(true), ..Default::default() })
        .await
        .unwrap();
      assert_eq!(health.sleep_hours, 5.5);
      assert!(health.ate_fruit);
    }
  }

  #[tokio::test]
  async fn test_invalid_writes_are_rejected_before_storage() {
    let (_db, trackers) = both().await;
    let day = date(2026, 3, 4);

    for tracker in &trackers {
      let bad = HealthPatch { water_glasses: Some(-2), ..Default::default() };
      assert!(matches!(tracker.write_health(day, &bad).await, Err(Error::Invalid(_))));
      assert!(matches!(tracker.add_pages(day, 0).await, Err(Error::Invalid(_))));
      assert!(matches!(tracker.add_sedekah(0, None, day).await, Err(Error::Invalid(_))));

      assert_eq!(tracker.health(day).await.unwrap(), Health::default());
      assert_eq!(tracker.quran_total().await.unwrap(), 0);
      assert!(tracker.sedekah().await.unwrap().is_empty());
    }
  }

  #[tokio::test]
  async fn test_delete_sedekah() {
    let (_db, trackers) = both().await;
    let day = date(2026, 3, 5);

    for tracker in &trackers {
      let keep = tracker.add_sedekah(1_000, None, day).await.unwrap();
      let drop = tracker.add_sedekah(2_000, None, day).await.unwrap();

      assert!(tracker.delete_sedekah(drop.id).await.unwrap());
      assert!(!tracker.delete_sedekah(drop.id).await.unwrap());
      assert_eq!(tracker.sedekah().await.unwrap(), vec![keep]);
    }
  }

  #[tokio::test]
  async fn test_month_boundaries() {
    let (_db, trackers) = both().await;
    let before = date(2026, 2, 28);
    let first = date(2026, 3, 1);
    let last = date(2026, 3, 31);
    let after = date(2026, 4, 1);

    for tracker in &trackers {
      for day in [before, first, last, after] {
        tracker.toggle_ibadah(day, IbadahFlag::Isya).await.unwrap();
        tracker
          .write_health(day, &HealthPatch { exercised: Some(true), ..Default::default() })
          .await
          .unwrap();
        tracker.add_pages(day, 2).await.unwrap();
        tracker.add_sedekah(500, None, day).await.unwrap();
      }

      let records = tracker.month(Month::of(first)).await.unwrap();
      let ibadah_days: Vec<Date> = records.ibadah.iter().map(|(d, _)| *d).collect();
      let health_days: Vec<Date> = records.health.iter().map(|(d, _)| *d).collect();
      let quran_days: Vec<Date> = records.quran.iter().map(|(d, _)| *d).collect();
      let sedekah_days: Vec<Date> = records.sedekah.iter().map(|e| e.date).collect();

      assert_eq!(ibadah_days, [first, last]);
      assert_eq!(health_days, [first, last]);
      assert_eq!(quran_days, [first, last]);
      assert_eq!(sedekah_days, [first, last]);
    }
  }

  #[tokio::test]
  async fn test_onboarding_round_trip() {
    let (_db, trackers) = both().await;
    let form = Onboarding {
      display_name: "Fatimah".into(),
      ramadhan_day: 3,
      quran_target: 2,
      sedekah_target: 250_000,
    };

    for tracker in &trackers {
      let bad = Onboarding { ramadhan_day: 0, ..form.clone() };
      assert!(tracker.complete_onboarding(&bad).await.is_err());
      assert_eq!(tracker.onboarding().await.unwrap(), None);

      tracker.complete_onboarding(&form).await.unwrap();
      assert_eq!(tracker.onboarding().await.unwrap(), Some(form.clone()));
    }
  }
}
