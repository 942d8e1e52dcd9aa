use sea_orm_migration::prelude::*;

use super::m20260215_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn flag(col: impl IntoIden) -> ColumnDef {
  ColumnDef::new(col).boolean().not_null().default(false).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(DailyIbadah::Table)
          .if_not_exists()
          .col(ColumnDef::new(DailyIbadah::AccountId).uuid().not_null())
          .col(ColumnDef::new(DailyIbadah::Date).date().not_null())
          .col(flag(DailyIbadah::Subuh))
          .col(flag(DailyIbadah::Dzuhur))
          .col(flag(DailyIbadah::Ashar))
          .col(flag(DailyIbadah::Maghrib))
          .col(flag(DailyIbadah::Isya))
          .col(flag(DailyIbadah::Tahajud))
          .col(flag(DailyIbadah::Dhuha))
          .col(flag(DailyIbadah::Rawatib))
          .col(flag(DailyIbadah::Witir))
          .col(flag(DailyIbadah::Tadarus))
          .col(flag(DailyIbadah::Sahur))
          .col(flag(DailyIbadah::BukaTepatWaktu))
          .col(ColumnDef::new(DailyIbadah::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(DailyIbadah::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(DailyIbadah::AccountId).col(DailyIbadah::Date),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_daily_ibadah_account")
              .from(DailyIbadah::Table, DailyIbadah::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(HealthTracker::Table)
          .if_not_exists()
          .col(ColumnDef::new(HealthTracker::AccountId).uuid().not_null())
          .col(ColumnDef::new(HealthTracker::Date).date().not_null())
          .col(
            ColumnDef::new(HealthTracker::WaterGlasses)
              .integer()
              .not_null()
              .default(0),
          )
          .col(flag(HealthTracker::AteFruit))
          .col(flag(HealthTracker::Exercised))
          .col(
            ColumnDef::new(HealthTracker::SleepHours)
              .double()
              .not_null()
              .default(7.0),
          )
          .col(ColumnDef::new(HealthTracker::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(HealthTracker::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(HealthTracker::AccountId)
              .col(HealthTracker::Date),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_health_tracker_account")
              .from(HealthTracker::Table, HealthTracker::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(QuranProgress::Table)
          .if_not_exists()
          .col(ColumnDef::new(QuranProgress::AccountId).uuid().not_null())
          .col(ColumnDef::new(QuranProgress::Date).date().not_null())
          .col(
            ColumnDef::new(QuranProgress::Pages).integer().not_null().default(0),
          )
          .col(ColumnDef::new(QuranProgress::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(QuranProgress::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(QuranProgress::AccountId)
              .col(QuranProgress::Date),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_quran_progress_account")
              .from(QuranProgress::Table, QuranProgress::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(QuranProgress::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(HealthTracker::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(DailyIbadah::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum DailyIbadah {
  Table,
  AccountId,
  Date,
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
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum HealthTracker {
  Table,
  AccountId,
  Date,
  WaterGlasses,
  AteFruit,
  Exercised,
  SleepHours,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum QuranProgress {
  Table,
  AccountId,
  Date,
  Pages,
  CreatedAt,
  UpdatedAt,
}
