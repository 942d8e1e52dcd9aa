//! Activation code entity - one-time premium codes issued in batches

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
  #[default]
  #[sea_orm(string_value = "available")]
  Available,
  #[sea_orm(string_value = "used")]
  Used,
}

impl CodeStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Available => "available",
      Self::Used => "used",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activation_codes")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  #[sea_orm(unique)]
  pub code: String,
  pub status: CodeStatus,
  pub used_by: Option<Uuid>,
  pub used_at: Option<DateTime>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
