//! Activation codes: batch issuing and one-time redemption for premium

use std::collections::HashSet;

use serde::Serialize;

use crate::{
  entity::{CodeStatus, PremiumStatus, account, activation_code},
  prelude::*,
};

/// No `I`, `O`, `0` or `1`, so codes survive being read aloud or typed.
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const MAX_BATCH: usize = 100;

/// Random `XXXX-XXXX` code.
pub fn generate_code() -> String {
  let uuid = Uuid::new_v4();
  let bytes = uuid.as_bytes();
  // byte 6 carries the version nibble, byte 8 the variant bits; the low five
  // bits of every other byte are uniformly random
  let picks = [0, 1, 2, 3, 4, 5, 7, 9];

  let mut code = String::with_capacity(9);
  for (i, &at) in picks.iter().enumerate() {
    if i == 4 {
      code.push('-');
    }
    code.push(char::from(ALPHABET[usize::from(bytes[at] & 0x1f)]));
  }
  code
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeCounts {
  pub available: u64,
  pub used: u64,
}

pub struct Activation<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Activation<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn generate(
    &self,
    count: usize,
  ) -> Result<Vec<activation_code::Model>> {
    if count == 0 || count > MAX_BATCH {
      return Err(Error::invalid(format!(
        "Batch size must be between 1 and {MAX_BATCH}"
      )));
    }

    let mut codes: HashSet<String> = HashSet::with_capacity(count);
    while codes.len() < count {
      let batch: Vec<String> = (codes.len()..count)
        .map(|_| generate_code())
        .filter(|code| !codes.contains(code))
        .collect();

      let taken: HashSet<String> = activation_code::Entity::find()
        .filter(activation_code::Column::Code.is_in(batch.clone()))
        .all(self.db)
        .await?
        .into_iter()
        .map(|model| model.code)
        .collect();

      codes.extend(batch.into_iter().filter(|code| !taken.contains(code)));
    }

    let now = Utc::now().naive_utc();
    let models: Vec<activation_code::Model> = codes
      .into_iter()
      .map(|code| activation_code::Model {
        id: Uuid::new_v4(),
        code,
        status: CodeStatus::Available,
        used_by: None,
        used_at: None,
        created_at: now,
      })
      .collect();

    let rows = models.iter().map(|model| activation_code::ActiveModel {
      id: Set(model.id),
      code: Set(model.code.clone()),
      status: Set(model.status),
      used_by: Set(None),
      used_at: Set(None),
      created_at: Set(model.created_at),
    });
    activation_code::Entity::insert_many(rows)
      .exec_without_returning(self.db)
      .await?;

    info!("Generated {} activation codes", models.len());
    Ok(models)
  }

  pub async fn list(
    &self,
    status: Option<CodeStatus>,
  ) -> Result<Vec<activation_code::Model>> {
    let mut query = activation_code::Entity::find()
      .order_by_desc(activation_code::Column::CreatedAt)
      .order_by_asc(activation_code::Column::Code);

    if let Some(status) = status {
      query = query.filter(activation_code::Column::Status.eq(status));
    }

    Ok(query.all(self.db).await?)
  }

  /// Only unused codes can be removed; redeemed ones stay as history.
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let code = activation_code::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Activation code"))?;

    if code.status == CodeStatus::Used {
      return Err(Error::CodeUsed);
    }

    activation_code::Entity::delete_by_id(id).exec(self.db).await?;
    Ok(())
  }

  /// Consumes `raw` for `account_id` and grants premium.
  ///
  /// The conditional update on `status = 'available'` is what makes the code
  /// single-use under concurrent requests; the grant happens in the same
  /// transaction, so a failed grant leaves the code available.
  pub async fn redeem(
    &self,
    account_id: Uuid,
    raw: &str,
  ) -> Result<account::Model> {
    let code = utils::normalize_code(raw);
    if code.is_empty() {
      return Err(Error::EmptyCode);
    }

    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    let consumed = activation_code::Entity::update_many()
      .set(activation_code::ActiveModel {
        status: Set(CodeStatus::Used),
        used_by: Set(Some(account_id)),
        used_at: Set(Some(now)),
        ..Default::default()
      })
      .filter(activation_code::Column::Code.eq(code.as_str()))
      .filter(activation_code::Column::Status.eq(CodeStatus::Available))
      .exec(&txn)
      .await?;

    if consumed.rows_affected == 0 {
      debug!(account = %account_id, "Rejected activation code");
      return Err(Error::InvalidCode);
    }

    let granted = account::Entity::update_many()
      .set(account::ActiveModel {
        premium_status: Set(PremiumStatus::Premium),
        premium_activated_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
      })
      .filter(account::Column::Id.eq(account_id))
      .exec(&txn)
      .await?;

    if granted.rows_affected == 0 {
      error!(account = %account_id, "Code consumed for a missing account, rolling back");
      return Err(Error::Internal(format!("account {account_id} has no profile")));
    }

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or_else(|| Error::Internal(format!("account {account_id} vanished")))?;

    txn.commit().await?;

    info!(account = %account_id, code = %code, "Activation code redeemed");
    Ok(account)
  }

  pub async fn counts(&self) -> Result<CodeCounts> {
    let count = |status: CodeStatus| {
      activation_code::Entity::find()
        .filter(activation_code::Column::Status.eq(status))
        .count(self.db)
    };

    Ok(CodeCounts {
      available: count(CodeStatus::Available).await?,
      used: count(CodeStatus::Used).await?,
    })
  }

  pub async fn export_csv(&self) -> Result<String> {
    let mut csv = String::from("Code,Status,Used At\n");

    for code in self.list(None).await? {
      let used_at = code.used_at.map(utils::format_date);
      csv.push_str(&format!(
        "{},{},{}\n",
        code.code,
        code.status.as_str(),
        used_at.as_deref().unwrap_or("-")
      ));
    }

    Ok(csv)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{sv, testing};

  async fn insert_code(db: &DatabaseConnection, code: &str) {
    activation_code::ActiveModel {
      id: Set(Uuid::new_v4()),
      code: Set(code.to_string()),
      status: Set(CodeStatus::Available),
      used_by: Set(None),
      used_at: Set(None),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap();
  }

  async fn code_row(db: &DatabaseConnection, code: &str) -> activation_code::Model {
    activation_code::Entity::find()
      .filter(activation_code::Column::Code.eq(code))
      .one(db)
      .await
      .unwrap()
      .unwrap()
  }

  #[test]
  fn test_generated_code_shape() {
    for _ in 0..200 {
      let code = generate_code();
      assert_eq!(code.len(), 9);
      assert_eq!(&code[4..5], "-");
      assert!(
        code.bytes().filter(|&b| b != b'-').all(|b| ALPHABET.contains(&b)),
        "{code}"
      );
    }
  }

  #[tokio::test]
  async fn test_generate_batch() {
    let db = testing::db().await;
    let sv = Activation::new(&db);

    let codes = sv.generate(25).await.unwrap();
    let unique: HashSet<_> = codes.iter().map(|c| c.code.clone()).collect();

    assert_eq!(unique.len(), 25);
    assert_eq!(sv.list(Some(CodeStatus::Available)).await.unwrap().len(), 25);
    assert!(matches!(sv.generate(0).await, Err(Error::Invalid(_))));
    assert!(matches!(sv.generate(101).await, Err(Error::Invalid(_))));
  }

  #[tokio::test]
  async fn test_redeem_grants_premium() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    insert_code(&db, "ABCD-2345").await;

    let upgraded =
      Activation::new(&db).redeem(account.id, "ABCD-2345").await.unwrap();

    assert_eq!(upgraded.premium_status, PremiumStatus::Premium);
    assert!(upgraded.premium_activated_at.is_some());

    let row = code_row(&db, "ABCD-2345").await;
    assert_eq!(row.status, CodeStatus::Used);
    assert_eq!(row.used_by, Some(account.id));
    assert!(row.used_at.is_some());
  }

  #[tokio::test]
  async fn test_redeem_normalizes_input() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    insert_code(&db, "ABCD-1234").await;

    let upgraded =
      Activation::new(&db).redeem(account.id, " abcd-1234 ").await.unwrap();
    assert!(upgraded.is_premium());
  }

  #[tokio::test]
  async fn test_redeem_rejections_are_indistinguishable() {
    let db = testing::db().await;
    let accounts = sv::Account::new(&db);
    let a = accounts.register("a@example.com").await.unwrap();
    let b = accounts.register("b@example.com").await.unwrap();
    insert_code(&db, "WXYZ-2345").await;

    let sv = Activation::new(&db);
    sv.redeem(a.id, "WXYZ-2345").await.unwrap();

    let reused = sv.redeem(b.id, "WXYZ-2345").await.unwrap_err();
    let unknown = sv.redeem(b.id, "NOPE-NOPE").await.unwrap_err();
    assert!(matches!(reused, Error::InvalidCode));
    assert!(matches!(unknown, Error::InvalidCode));
    assert_eq!(reused.to_string(), unknown.to_string());

    let b = accounts.by_id(b.id).await.unwrap().unwrap();
    assert!(!b.is_premium());
    assert_eq!(code_row(&db, "WXYZ-2345").await.used_by, Some(a.id));
  }

  #[tokio::test]
  async fn test_redeem_empty_code() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    let sv = Activation::new(&db);

    assert!(matches!(sv.redeem(account.id, "").await, Err(Error::EmptyCode)));
    assert!(matches!(sv.redeem(account.id, "   ").await, Err(Error::EmptyCode)));
  }

  #[tokio::test]
  async fn test_concurrent_redeem_has_one_winner() {
    let db = testing::db().await;
    let accounts = sv::Account::new(&db);
    let a = accounts.register("a@example.com").await.unwrap();
    let b = accounts.register("b@example.com").await.unwrap();
    insert_code(&db, "RACE-2345").await;

    let sv = Activation::new(&db);
    let (first, second) =
      tokio::join!(sv.redeem(a.id, "RACE-2345"), sv.redeem(b.id, "race-2345"));

    let outcomes = [first, second];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
      outcomes.iter().any(|r| matches!(r, Err(Error::InvalidCode))),
      "loser must see the generic rejection"
    );

    let row = code_row(&db, "RACE-2345").await;
    assert_eq!(row.status, CodeStatus::Used);
    assert_eq!(row.used_by, Some(winners[0].id));
    assert_eq!(accounts.count_premium().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_redeem_for_missing_account_rolls_back() {
    let db = testing::db().await;
    insert_code(&db, "LOST-2345").await;

    let err =
      Activation::new(&db).redeem(Uuid::new_v4(), "LOST-2345").await.unwrap_err();

    assert!(matches!(err, Error::Internal(_) | Error::Database(_)));
    assert_eq!(code_row(&db, "LOST-2345").await.status, CodeStatus::Available);
  }

  #[tokio::test]
  async fn test_delete_only_available_codes() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    insert_code(&db, "KEEP-2345").await;
    insert_code(&db, "DROP-2345").await;

    let sv = Activation::new(&db);
    sv.redeem(account.id, "KEEP-2345").await.unwrap();

    let used = code_row(&db, "KEEP-2345").await;
    let spare = code_row(&db, "DROP-2345").await;

    assert!(matches!(sv.delete(used.id).await, Err(Error::CodeUsed)));
    sv.delete(spare.id).await.unwrap();
    assert!(matches!(sv.delete(spare.id).await, Err(Error::NotFound(_))));

    assert_eq!(sv.counts().await.unwrap(), CodeCounts { available: 0, used: 1 });
  }

  #[tokio::test]
  async fn test_export_csv() {
    let db = testing::db().await;
    let account = sv::Account::new(&db).register("a@example.com").await.unwrap();
    insert_code(&db, "USED-2345").await;
    insert_code(&db, "FREE-2345").await;

    let sv = Activation::new(&db);
    sv.redeem(account.id, "USED-2345").await.unwrap();

    let csv = sv.export_csv().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "Code,Status,Used At");
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&"FREE-2345,available,-"));
    assert!(lines.iter().any(|l| l.starts_with("USED-2345,used,20")));
  }
}
