use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Keys read by the upgrade screen, with their initial values.
const DEFAULTS: &[(&str, &str, &str)] = &[
  ("premium_price", "25000", "Premium price in rupiah"),
  ("premium_tagline", "Unlock the full Ramadhan experience", "Upgrade headline"),
  ("saweria_link", "", "Saweria donation page"),
  ("trakteer_link", "", "Trakteer donation page"),
  ("premium_feature_1", "Monthly recap and export", "Premium feature"),
  ("premium_feature_2", "Khatam planner", "Premium feature"),
  ("premium_feature_3", "Health insights", "Premium feature"),
  ("premium_feature_4", "Sedekah history", "Premium feature"),
  ("premium_feature_5", "Support the developers", "Premium feature"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(AppConfig::Table)
          .if_not_exists()
          .col(ColumnDef::new(AppConfig::Key).string().not_null().primary_key())
          .col(ColumnDef::new(AppConfig::Value).string().not_null())
          .col(ColumnDef::new(AppConfig::Description).string().null())
          .col(ColumnDef::new(AppConfig::UpdatedAt).date_time().null())
          .to_owned(),
      )
      .await?;

    for &(key, value, description) in DEFAULTS {
      let insert = Query::insert()
        .into_table(AppConfig::Table)
        .columns([AppConfig::Key, AppConfig::Value, AppConfig::Description])
        .values([key.into(), value.into(), description.into()])
        .map_err(|err| DbErr::Migration(err.to_string()))?
        .to_owned();
      manager.exec_stmt(insert).await?;
    }
    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(AppConfig::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum AppConfig {
  Table,
  Key,
  Value,
  Description,
  UpdatedAt,
}
