pub use sea_orm_migration::prelude::*;

mod m20260215_000001_create_accounts;
mod m20260215_000002_create_activation_codes;
mod m20260215_000003_create_auth_tokens;
mod m20260215_000004_create_daily_records;
mod m20260215_000005_create_sedekah_log;
mod m20260215_000006_create_app_config;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260215_000001_create_accounts::Migration),
      Box::new(m20260215_000002_create_activation_codes::Migration),
      Box::new(m20260215_000003_create_auth_tokens::Migration),
      Box::new(m20260215_000004_create_daily_records::Migration),
      Box::new(m20260215_000005_create_sedekah_log::Migration),
      Box::new(m20260215_000006_create_app_config::Migration),
    ]
  }
}
