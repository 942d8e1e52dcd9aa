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
          .table(ActivationCodes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ActivationCodes::Id).uuid().not_null().primary_key(),
          )
          .col(
            ColumnDef::new(ActivationCodes::Code)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(
            ColumnDef::new(ActivationCodes::Status)
              .string()
              .not_null()
              .default("available"),
          )
          .col(ColumnDef::new(ActivationCodes::UsedBy).uuid().null())
          .col(ColumnDef::new(ActivationCodes::UsedAt).date_time().null())
          .col(ColumnDef::new(ActivationCodes::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_activation_codes_used_by")
              .from(ActivationCodes::Table, ActivationCodes::UsedBy)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_activation_codes_status")
          .table(ActivationCodes::Table)
          .col(ActivationCodes::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ActivationCodes::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ActivationCodes {
  Table,
  Id,
  Code,
  Status,
  UsedBy,
  UsedAt,
  CreatedAt,
}
