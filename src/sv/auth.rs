//! Bearer tokens for the hosted auth collaborator.
//!
//! Password checks belong to the identity provider; this service only issues,
//! verifies and revokes the opaque tokens it hands out.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{entity::auth_token, prelude::*};

pub struct Auth<'a> {
  db: &'a DatabaseConnection,
}

fn new_token() -> String {
  let mut bytes = [0u8; 32];
  bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
  bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
  URL_SAFE_NO_PAD.encode(bytes)
}

impl<'a> Auth<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn issue(&self, account_id: Uuid, ttl: Duration) -> Result<String> {
    let ttl = TimeDelta::from_std(ttl)
      .map_err(|_| Error::invalid("Token lifetime is out of range"))?;
    let now = Utc::now().naive_utc();

    let token = auth_token::ActiveModel {
      token: Set(new_token()),
      account_id: Set(account_id),
      created_at: Set(now),
      expires_at: Set(now + ttl),
    }
    .insert(self.db)
    .await?;

    Ok(token.token)
  }

  /// Account behind a live token, `None` for unknown or expired tokens.
  pub async fn verify(&self, token: &str) -> Result<Option<Uuid>> {
    let now = Utc::now().naive_utc();
    let token = auth_token::Entity::find_by_id(token).one(self.db).await?;
    Ok(token.filter(|t| t.expires_at > now).map(|t| t.account_id))
  }

  pub async fn revoke(&self, token: &str) -> Result<bool> {
    let res = auth_token::Entity::delete_by_id(token).exec(self.db).await?;
    Ok(res.rows_affected > 0)
  }

  pub async fn purge_expired(&self) -> Result<u64> {
    let now = Utc::now().naive_utc();
    let res = auth_token::Entity::delete_many()
      .filter(auth_token::Column::ExpiresAt.lte(now))
      .exec(self.db)
      .await?;
    Ok(res.rows_affected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{sv, testing};

  #[tokio::test]
  async fn test_issue_verify_revoke() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    let auth = Auth::new(&db);

    let token = auth.issue(account.id, Duration::from_secs(60)).await.unwrap();
    assert_eq!(auth.verify(&token).await.unwrap(), Some(account.id));
    assert_eq!(auth.verify("forged").await.unwrap(), None);

    assert!(auth.revoke(&token).await.unwrap());
    assert_eq!(auth.verify(&token).await.unwrap(), None);
    assert!(!auth.revoke(&token).await.unwrap());
  }

  #[tokio::test]
  async fn test_expired_tokens_are_rejected_and_purged() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    let auth = Auth::new(&db);

    let expired = auth.issue(account.id, Duration::ZERO).await.unwrap();
    let live = auth.issue(account.id, Duration::from_secs(3600)).await.unwrap();

    assert_eq!(auth.verify(&expired).await.unwrap(), None);
    assert_eq!(auth.purge_expired().await.unwrap(), 1);
    assert_eq!(auth.verify(&live).await.unwrap(), Some(account.id));
  }
}
