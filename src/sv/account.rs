use sea_orm::{
  SqlErr,
  sea_query::{Expr, Func, LikeExpr},
};

use crate::{
  entity::{PremiumStatus, Role, account, role},
  prelude::*,
  tracker::Onboarding,
};

pub struct Account<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Account<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates a free account with the `user` role.
  pub async fn register(&self, email: &str) -> Result<account::Model> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
      return Err(Error::invalid("A valid email address is required"));
    }

    if self.by_email(&email).await?.is_some() {
      return Err(Self::taken());
    }

    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    let account = account::ActiveModel {
      id: Set(Uuid::new_v4()),
      email: Set(email),
      display_name: Set(None),
      ramadhan_day: Set(1),
      quran_target: Set(1),
      sedekah_target: Set(100_000),
      premium_status: Set(PremiumStatus::Free),
      premium_activated_at: Set(None),
      onboarding_done: Set(false),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
      // lost a race with a concurrent sign-up
      Some(SqlErr::UniqueConstraintViolation(_)) => Self::taken(),
      _ => Error::from(err),
    })?;

    role::ActiveModel {
      id: Set(Uuid::new_v4()),
      account_id: Set(account.id),
      role: Set(Role::User),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(account)
  }

  fn taken() -> Error {
    Error::invalid("Email is already registered")
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<account::Model>> {
    Ok(account::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_email(&self, email: &str) -> Result<Option<account::Model>> {
    let account = account::Entity::find()
      .filter(account::Column::Email.eq(email.trim().to_lowercase()))
      .one(self.db)
      .await?;
    Ok(account)
  }

  pub async fn is_admin(&self, id: Uuid) -> Result<bool> {
    let count = role::Entity::find()
      .filter(role::Column::AccountId.eq(id))
      .filter(role::Column::Role.eq(Role::Admin))
      .count(self.db)
      .await?;
    Ok(count > 0)
  }

  pub async fn grant_role(&self, id: Uuid, role: Role) -> Result<()> {
    let existing = role::Entity::find()
      .filter(role::Column::AccountId.eq(id))
      .filter(role::Column::Role.eq(role))
      .one(self.db)
      .await?;

    if existing.is_none() {
      role::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(id),
        role: Set(role),
      }
      .insert(self.db)
      .await?;
    }
    Ok(())
  }

  pub async fn complete_onboarding(
    &self,
    id: Uuid,
    form: &Onboarding,
  ) -> Result<account::Model> {
    let account = self.by_id(id).await?.ok_or(Error::NotFound("Account"))?;

    let updated = account::ActiveModel {
      display_name: Set(Some(form.display_name.trim().to_string())),
      ramadhan_day: Set(form.ramadhan_day),
      quran_target: Set(form.quran_target),
      sedekah_target: Set(form.sedekah_target),
      onboarding_done: Set(true),
      updated_at: Set(Utc::now().naive_utc()),
      ..account.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }

  /// Administrative override of the entitlement, in either direction.
  pub async fn set_premium(
    &self,
    id: Uuid,
    premium: bool,
  ) -> Result<account::Model> {
    let account = self.by_id(id).await?.ok_or(Error::NotFound("Account"))?;
    let now = Utc::now().naive_utc();

    let (status, activated_at) = if premium {
      (PremiumStatus::Premium, Some(now))
    } else {
      (PremiumStatus::Free, None)
    };

    let updated = account::ActiveModel {
      premium_status: Set(status),
      premium_activated_at: Set(activated_at),
      updated_at: Set(now),
      ..account.into()
    }
    .update(self.db)
    .await?;

    info!(account = %id, premium, "Premium status overridden");
    Ok(updated)
  }

  /// Newest first, optionally filtered by a case-insensitive name fragment.
  pub async fn all(&self, search: Option<&str>) -> Result<Vec<account::Model>> {
    let mut query =
      account::Entity::find().order_by_desc(account::Column::CreatedAt);

    if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
      let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
      let name = Func::lower(Expr::col(account::Column::DisplayName));
      query = query.filter(
        Expr::expr(name)
          .like(LikeExpr::new(format!("%{escaped}%")).escape('\\')),
      );
    }

    Ok(query.all(self.db).await?)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(account::Entity::find().count(self.db).await?)
  }

  pub async fn count_premium(&self) -> Result<u64> {
    let count = account::Entity::find()
      .filter(account::Column::PremiumStatus.eq(PremiumStatus::Premium))
      .count(self.db)
      .await?;
    Ok(count)
  }
}
