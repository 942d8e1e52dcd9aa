use sea_orm::{
  QuerySelect,
  sea_query::{Expr, OnConflict},
};

use super::{
  Health, HealthPatch, Ibadah, IbadahFlag, IbadahPatch, Mode, MonthRecords,
  Onboarding, SedekahEntry, Tracker, validate_pages,
};
use crate::{
  entity::{account, health, ibadah, quran, sedekah},
  prelude::*,
  sv,
  utils::Month,
};

impl From<ibadah::Model> for Ibadah {
  fn from(row: ibadah::Model) -> Self {
    Self {
      subuh: row.subuh,
      dzuhur: row.dzuhur,
      ashar: row.ashar,
      maghrib: row.maghrib,
      isya: row.isya,
      tahajud: row.tahajud,
      dhuha: row.dhuha,
      rawatib: row.rawatib,
      witir: row.witir,
      tadarus: row.tadarus,
      sahur: row.sahur,
      buka_tepat_waktu: row.buka_tepat_waktu,
    }
  }
}

impl From<health::Model> for Health {
  fn from(row: health::Model) -> Self {
    Self {
      water_glasses: row.water_glasses,
      ate_fruit: row.ate_fruit,
      exercised: row.exercised,
      sleep_hours: row.sleep_hours,
    }
  }
}

impl From<sedekah::Model> for SedekahEntry {
  fn from(row: sedekah::Model) -> Self {
    Self { id: row.id, amount: row.amount, note: row.note, date: row.date }
  }
}

fn column(flag: IbadahFlag) -> ibadah::Column {
  match flag {
    IbadahFlag::Subuh => ibadah::Column::Subuh,
    IbadahFlag::Dzuhur => ibadah::Column::Dzuhur,
    IbadahFlag::Ashar => ibadah::Column::Ashar,
    IbadahFlag::Maghrib => ibadah::Column::Maghrib,
    IbadahFlag::Isya => ibadah::Column::Isya,
    IbadahFlag::Tahajud => ibadah::Column::Tahajud,
    IbadahFlag::Dhuha => ibadah::Column::Dhuha,
    IbadahFlag::Rawatib => ibadah::Column::Rawatib,
    IbadahFlag::Witir => ibadah::Column::Witir,
    IbadahFlag::Tadarus => ibadah::Column::Tadarus,
    IbadahFlag::Sahur => ibadah::Column::Sahur,
    IbadahFlag::BukaTepatWaktu => ibadah::Column::BukaTepatWaktu,
  }
}

fn pages_of(row: Option<quran::Model>) -> u32 {
  row.map_or(0, |row| u32::try_from(row.pages).unwrap_or(0))
}

/// Database-backed records of one signed-in account.
///
/// Every statement is filtered on `account`, so one tracker can never read or
/// write another account's rows. Failures are logged here and returned as
/// is; writes are not retried because page increments are not idempotent.
#[derive(Debug, Clone)]
pub struct RemoteTracker {
  db: DatabaseConnection,
  account: Uuid,
}

impl RemoteTracker {
  pub fn new(db: DatabaseConnection, account: Uuid) -> Self {
    Self { db, account }
  }

  pub fn account(&self) -> Uuid {
    self.account
  }

  fn logged<T>(&self, op: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result
      && !matches!(err, Error::Invalid(_))
    {
      warn!(account = %self.account, "Remote {op} failed: {err}");
    }
    result
  }

  async fn fetch_ibadah(&self, date: Date) -> Result<Ibadah> {
    let row = ibadah::Entity::find_by_id((self.account, date))
      .one(&self.db)
      .await?;
    Ok(row.map(Ibadah::from).unwrap_or_default())
  }

  async fn upsert_ibadah(
    &self,
    date: Date,
    patch: &IbadahPatch,
  ) -> Result<Ibadah> {
    if patch.is_empty() {
      return self.fetch_ibadah(date).await;
    }

    let mut row = Ibadah::default();
    patch.apply(&mut row);
    let now = Utc::now().naive_utc();

    let model = ibadah::ActiveModel {
      account_id: Set(self.account),
      date: Set(date),
      subuh: Set(row.subuh),
      dzuhur: Set(row.dzuhur),
      ashar: Set(row.ashar),
      maghrib: Set(row.maghrib),
      isya: Set(row.isya),
      tahajud: Set(row.tahajud),
      dhuha: Set(row.dhuha),
      rawatib: Set(row.rawatib),
      witir: Set(row.witir),
      tadarus: Set(row.tadarus),
      sahur: Set(row.sahur),
      buka_tepat_waktu: Set(row.buka_tepat_waktu),
      created_at: Set(now),
      updated_at: Set(now),
    };

    let mut columns: Vec<ibadah::Column> =
      patch.flags().iter().map(|&(flag, _)| column(flag)).collect();
    columns.push(ibadah::Column::UpdatedAt);

    ibadah::Entity::insert(model)
      .on_conflict(
        OnConflict::columns([ibadah::Column::AccountId, ibadah::Column::Date])
          .update_columns(columns)
          .to_owned(),
      )
      .exec_without_returning(&self.db)
      .await?;

    self.fetch_ibadah(date).await
  }

  async fn fetch_health(&self, date: Date) -> Result<Health> {
    let row = health::Entity::find_by_id((self.account, date))
      .one(&self.db)
      .await?;
    Ok(row.map(Health::from).unwrap_or_default())
  }

  async fn upsert_health(
    &self,
    date: Date,
    patch: &HealthPatch,
  ) -> Result<Health> {
    patch.validate()?;
    if patch.is_empty() {
      return self.fetch_health(date).await;
    }

    let mut row = Health::default();
    patch.apply(&mut row);
    let now = Utc::now().naive_utc();

    let model = health::ActiveModel {
      account_id: Set(self.account),
      date: Set(date),
      water_glasses: Set(row.water_glasses),
      ate_fruit: Set(row.ate_fruit),
      exercised: Set(row.exercised),
      sleep_hours: Set(row.sleep_hours),
      created_at: Set(now),
      updated_at: Set(now),
    };

    let columns = [
      patch.water_glasses.map(|_| health::Column::WaterGlasses),
      patch.ate_fruit.map(|_| health::Column::AteFruit),
      patch.exercised.map(|_| health::Column::Exercised),
      patch.sleep_hours.map(|_| health::Column::SleepHours),
      Some(health::Column::UpdatedAt),
    ];

    health::Entity::insert(model)
      .on_conflict(
        OnConflict::columns([health::Column::AccountId, health::Column::Date])
          .update_columns(columns.into_iter().flatten())
          .to_owned(),
      )
      .exec_without_returning(&self.db)
      .await?;

    self.fetch_health(date).await
  }

  async fn fetch_pages(&self, date: Date) -> Result<u32> {
    let row =
      quran::Entity::find_by_id((self.account, date)).one(&self.db).await?;
    Ok(pages_of(row))
  }

  async fn sum_pages(&self) -> Result<u32> {
    let total: Option<Option<i64>> = quran::Entity::find()
      .select_only()
      .column_as(quran::Column::Pages.sum(), "total")
      .filter(quran::Column::AccountId.eq(self.account))
      .into_tuple()
      .one(&self.db)
      .await?;

    let total = total.flatten().unwrap_or(0);
    Ok(u32::try_from(total).unwrap_or(u32::MAX))
  }

  async fn increment_pages(&self, date: Date, pages: u32) -> Result<u32> {
    validate_pages(pages)?;
    let pages =
      i32::try_from(pages).map_err(|_| Error::invalid("Too many pages"))?;
    let now = Utc::now().naive_utc();

    let model = quran::ActiveModel {
      account_id: Set(self.account),
      date: Set(date),
      pages: Set(pages),
      created_at: Set(now),
      updated_at: Set(now),
    };

    // the addition happens in the statement, so concurrent adds both count
    quran::Entity::insert(model)
      .on_conflict(
        OnConflict::columns([quran::Column::AccountId, quran::Column::Date])
          .values([
            (
              quran::Column::Pages,
              Expr::col((quran::Entity, quran::Column::Pages)).add(pages),
            ),
            (quran::Column::UpdatedAt, Expr::value(now)),
          ])
          .to_owned(),
      )
      .exec_without_returning(&self.db)
      .await?;

    self.fetch_pages(date).await
  }

  async fn list_sedekah(&self) -> Result<Vec<SedekahEntry>> {
    let rows = sedekah::Entity::find()
      .filter(sedekah::Column::AccountId.eq(self.account))
      .order_by_desc(sedekah::Column::Date)
      .order_by_desc(sedekah::Column::CreatedAt)
      .all(&self.db)
      .await?;
    Ok(rows.into_iter().map(SedekahEntry::from).collect())
  }

  async fn insert_sedekah(
    &self,
    amount: i64,
    note: Option<&str>,
    date: Date,
  ) -> Result<SedekahEntry> {
    let entry = SedekahEntry::new(amount, note, date)?;

    sedekah::ActiveModel {
      id: Set(entry.id),
      account_id: Set(self.account),
      amount: Set(entry.amount),
      note: Set(entry.note.clone()),
      date: Set(entry.date),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&self.db)
    .await?;

    Ok(entry)
  }

  async fn remove_sedekah(&self, id: Uuid) -> Result<bool> {
    let res = sedekah::Entity::delete_many()
      .filter(sedekah::Column::Id.eq(id))
      .filter(sedekah::Column::AccountId.eq(self.account))
      .exec(&self.db)
      .await?;
    Ok(res.rows_affected > 0)
  }

  async fn fetch_month(&self, month: Month) -> Result<MonthRecords> {
    let (first, last) = (month.first_day(), month.last_day());

    let ibadah = ibadah::Entity::find()
      .filter(ibadah::Column::AccountId.eq(self.account))
      .filter(ibadah::Column::Date.between(first, last))
      .order_by_asc(ibadah::Column::Date)
      .all(&self.db)
      .await?;

    let health = health::Entity::find()
      .filter(health::Column::AccountId.eq(self.account))
      .filter(health::Column::Date.between(first, last))
      .order_by_asc(health::Column::Date)
      .all(&self.db)
      .await?;

    let quran = quran::Entity::find()
      .filter(quran::Column::AccountId.eq(self.account))
      .filter(quran::Column::Date.between(first, last))
      .order_by_asc(quran::Column::Date)
      .all(&self.db)
      .await?;

    let sedekah = sedekah::Entity::find()
      .filter(sedekah::Column::AccountId.eq(self.account))
      .filter(sedekah::Column::Date.between(first, last))
      .order_by_asc(sedekah::Column::Date)
      .order_by_asc(sedekah::Column::CreatedAt)
      .all(&self.db)
      .await?;

    Ok(MonthRecords {
      ibadah: ibadah.into_iter().map(|row| (row.date, row.into())).collect(),
      health: health.into_iter().map(|row| (row.date, row.into())).collect(),
      quran: quran
        .into_iter()
        .map(|row| (row.date, pages_of(Some(row))))
        .collect(),
      sedekah: sedekah.into_iter().map(SedekahEntry::from).collect(),
    })
  }

  async fn fetch_onboarding(&self) -> Result<Option<Onboarding>> {
    let account = account::Entity::find_by_id(self.account)
      .one(&self.db)
      .await?
      .ok_or(Error::NotFound("Account"))?;

    if !account.onboarding_done {
      return Ok(None);
    }

    Ok(Some(Onboarding {
      display_name: account.display_name.unwrap_or_default(),
      ramadhan_day: account.ramadhan_day,
      quran_target: account.quran_target,
      sedekah_target: account.sedekah_target,
    }))
  }

  async fn save_onboarding(&self, form: &Onboarding) -> Result<()> {
    form.validate()?;
    sv::Account::new(&self.db).complete_onboarding(self.account, form).await?;
    Ok(())
  }
}

#[async_trait]
impl Tracker for RemoteTracker {
  fn mode(&self) -> Mode {
    Mode::Remote(self.account)
  }

  async fn ibadah(&self, date: Date) -> Result<Ibadah> {
    self.logged("ibadah read", self.fetch_ibadah(date).await)
  }

  async fn write_ibadah(
    &self,
    date: Date,
    patch: &IbadahPatch,
  ) -> Result<Ibadah> {
    self.logged("ibadah write", self.upsert_ibadah(date, patch).await)
  }

  async fn health(&self, date: Date) -> Result<Health> {
    self.logged("health read", self.fetch_health(date).await)
  }

  async fn write_health(
    &self,
    date: Date,
    patch: &HealthPatch,
  ) -> Result<Health> {
    self.logged("health write", self.upsert_health(date, patch).await)
  }

  async fn quran_pages(&self, date: Date) -> Result<u32> {
    self.logged("quran read", self.fetch_pages(date).await)
  }

  async fn quran_total(&self) -> Result<u32> {
    self.logged("quran total", self.sum_pages().await)
  }

  async fn add_pages(&self, date: Date, pages: u32) -> Result<u32> {
    self.logged("quran write", self.increment_pages(date, pages).await)
  }

  async fn sedekah(&self) -> Result<Vec<SedekahEntry>> {
    self.logged("sedekah read", self.list_sedekah().await)
  }

  async fn add_sedekah(
    &self,
    amount: i64,
    note: Option<&str>,
    date: Date,
  ) -> Result<SedekahEntry> {
    self.logged("sedekah write", self.insert_sedekah(amount, note, date).await)
  }

  async fn delete_sedekah(&self, id: Uuid) -> Result<bool> {
    self.logged("sedekah delete", self.remove_sedekah(id).await)
  }

  async fn month(&self, month: Month) -> Result<MonthRecords> {
    self.logged("month read", self.fetch_month(month).await)
  }

  async fn onboarding(&self) -> Result<Option<Onboarding>> {
    self.logged("onboarding read", self.fetch_onboarding().await)
  }

  async fn complete_onboarding(&self, form: &Onboarding) -> Result<()> {
    self.logged("onboarding write", self.save_onboarding(form).await)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing;

  #[tokio::test]
  async fn test_upsert_keeps_one_row_per_day() {
    let db = testing::db().await;
    let account = testing::account(&db, "a@example.com").await;
    let tracker = RemoteTracker::new(db.clone(), account.id);
    let day = Date::from_ymd_opt(2026, 3, 1).unwrap();

    for flag in [IbadahFlag::Subuh, IbadahFlag::Dzuhur, IbadahFlag::Subuh] {
      tracker.toggle_ibadah(day, flag).await.unwrap();
    }
    tracker.add_pages(day, 3).await.unwrap();
    tracker.add_pages(day, 3).await.unwrap();

    let rows = ibadah::Entity::find()
      .filter(ibadah::Column::AccountId.eq(account.id))
      .count(&db)
      .await
      .unwrap();
    assert_eq!(rows, 1);

    let ibadah = tracker.ibadah(day).await.unwrap();
    assert!(!ibadah.subuh);
    assert!(ibadah.dzuhur);

    let pages = quran::Entity::find_by_id((account.id, day)).one(&db).await.unwrap();
    assert_eq!(pages.map(|row| row.pages), Some(6));
  }

  #[tokio::test]
  async fn test_accounts_are_isolated() {
    let db = testing::db().await;
    let a = testing::account(&db, "a@example.com").await;
    let b = testing::account(&db, "b@example.com").await;
    let (ta, tb) = (RemoteTracker::new(db.clone(), a.id), RemoteTracker::new(db.clone(), b.id));
    let day = Date::from_ymd_opt(2026, 3, 1).unwrap();

    ta.toggle_ibadah(day, IbadahFlag::Isya).await.unwrap();
    ta.add_pages(day, 10).await.unwrap();
    let entry = ta.add_sedekah(5_000, None, day).await.unwrap();

    assert_eq!(tb.ibadah(day).await.unwrap(), Ibadah::default());
    assert_eq!(tb.quran_total().await.unwrap(), 0);
    assert!(tb.sedekah().await.unwrap().is_empty());
    assert!(!tb.delete_sedekah(entry.id).await.unwrap());
    assert_eq!(ta.sedekah().await.unwrap(), vec![entry]);
  }

  #[tokio::test]
  async fn test_onboarding_for_missing_account() {
    let db = testing::db().await;
    let tracker = RemoteTracker::new(db, Uuid::new_v4());
    assert!(matches!(tracker.onboarding().await, Err(Error::NotFound(_))));
  }
}
