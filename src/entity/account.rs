//! Account entity - profile fields and premium entitlement

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
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
pub enum PremiumStatus {
  #[default]
  #[sea_orm(string_value = "free")]
  Free,
  #[sea_orm(string_value = "premium")]
  Premium,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  #[sea_orm(unique)]
  pub email: String,
  pub display_name: Option<String>,
  pub ramadhan_day: i32,
  pub quran_target: i32,
  pub sedekah_target: i64,
  pub premium_status: PremiumStatus,
  pub premium_activated_at: Option<DateTime>,
  pub onboarding_done: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  pub fn is_premium(&self) -> bool {
    self.premium_status == PremiumStatus::Premium
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::role::Entity")]
  Roles,
  #[sea_orm(has_many = "super::sedekah::Entity")]
  Sedekah,
}

impl Related<super::role::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Roles.def()
  }
}

impl Related<super::sedekah::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sedekah.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
