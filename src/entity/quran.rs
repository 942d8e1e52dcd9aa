use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quran_progress")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub account_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub date: Date,
  /// pages read on this date
  pub pages: i32,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
