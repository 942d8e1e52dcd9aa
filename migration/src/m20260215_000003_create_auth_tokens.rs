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
          .table(AuthTokens::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AuthTokens::Token).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(AuthTokens::AccountId).uuid().not_null())
          .col(ColumnDef::new(AuthTokens::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(AuthTokens::ExpiresAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_auth_tokens_account")
              .from(AuthTokens::Table, AuthTokens::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_auth_tokens_expires")
          .table(AuthTokens::Table)
          .col(AuthTokens::ExpiresAt)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(AuthTokens::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum AuthTokens {
  Table,
  Token,
  AccountId,
  CreatedAt,
  ExpiresAt,
}
