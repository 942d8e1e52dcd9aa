use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "health_tracker")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub account_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub date: Date,
  pub water_glasses: i32,
  pub ate_fruit: bool,
  pub exercised: bool,
  pub sleep_hours: f64,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
