//! Daily ibadah checklist, one row per account and date

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_ibadah")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub account_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub date: Date,
  pub subuh: bool,
  pub dzuhur: bool,
  pub ashar: bool,
  pub maghrib: bool,
  pub isya: bool,
  pub tahajud: bool,
  pub dhuha: bool,
  pub rawatib: bool,
  pub witir: bool,
  pub tadarus: bool,
  pub sahur: bool,
  pub buka_tepat_waktu: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
