//! Shared fixtures for unit tests

use migration::{Migrator, MigratorTrait};

use crate::{
  entity::account,
  identity::{AuthClient, AuthSession},
  prelude::*,
  sv,
};

/// Fresh, migrated in-memory database.
pub async fn db() -> DatabaseConnection {
  let db = Database::connect("sqlite::memory:").await.unwrap();
  Migrator::up(&db, None).await.unwrap();
  db
}

pub async fn account(db: &DatabaseConnection, email: &str) -> account::Model {
  sv::Account::new(db).register(email).await.unwrap()
}

/// Provider that always reports the same session.
pub struct FixedSession(pub Option<AuthSession>);

#[async_trait]
impl AuthClient for FixedSession {
  async fn session(&self) -> Result<Option<AuthSession>> {
    Ok(self.0.clone())
  }

  async fn sign_out(&self) -> Result<()> {
    Ok(())
  }
}
