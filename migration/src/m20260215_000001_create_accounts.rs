use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Accounts::Table)
          .if_not_exists()
          .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Accounts::Email).string().not_null().unique_key())
          .col(ColumnDef::new(Accounts::DisplayName).string().null())
          .col(
            ColumnDef::new(Accounts::RamadhanDay).integer().not_null().default(1),
          )
          .col(
            ColumnDef::new(Accounts::QuranTarget).integer().not_null().default(1),
          )
          .col(
            ColumnDef::new(Accounts::SedekahTarget)
              .big_integer()
              .not_null()
              .default(100_000),
          )
          .col(
            ColumnDef::new(Accounts::PremiumStatus)
              .string()
              .not_null()
              .default("free"),
          )
          .col(ColumnDef::new(Accounts::PremiumActivatedAt).date_time().null())
          .col(
            ColumnDef::new(Accounts::OnboardingDone)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Accounts::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Accounts::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(AccountRoles::Table)
          .if_not_exists()
          .col(ColumnDef::new(AccountRoles::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(AccountRoles::AccountId).uuid().not_null())
          .col(
            ColumnDef::new(AccountRoles::Role)
              .string()
              .not_null()
              .default("user"),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_account_roles_account")
              .from(AccountRoles::Table, AccountRoles::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_account_roles_unique")
          .table(AccountRoles::Table)
          .col(AccountRoles::AccountId)
          .col(AccountRoles::Role)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(AccountRoles::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Accounts::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Accounts {
  Table,
  Id,
  Email,
  DisplayName,
  RamadhanDay,
  QuranTarget,
  SedekahTarget,
  PremiumStatus,
  PremiumActivatedAt,
  OnboardingDone,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum AccountRoles {
  Table,
  Id,
  AccountId,
  Role,
}
