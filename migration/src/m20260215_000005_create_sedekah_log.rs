use sea_orm_migration::prelude::*;

use super::m20260215_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(SedekahLog::Table)
          .if_not_exists()
          .col(ColumnDef::new(SedekahLog::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(SedekahLog::AccountId).uuid().not_null())
          .col(ColumnDef::new(SedekahLog::Amount).big_integer().not_null())
          .col(ColumnDef::new(SedekahLog::Note).string().null())
          .col(ColumnDef::new(SedekahLog::Date).date().not_null())
          .col(ColumnDef::new(SedekahLog::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_sedekah_log_account")
              .from(SedekahLog::Table, SedekahLog::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_sedekah_log_account_date")
          .table(SedekahLog::Table)
          .col(SedekahLog::AccountId)
          .col(SedekahLog::Date)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(SedekahLog::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum SedekahLog {
  Table,
  Id,
  AccountId,
  Amount,
  Note,
  Date,
  CreatedAt,
}
