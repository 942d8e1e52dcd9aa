//! Runtime settings kept in `app_config`, edited from the admin panel

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{entity::app_config, prelude::*};

const FEATURE_PREFIX: &str = "premium_feature_";

pub const DEFAULT_PRICE: u64 = 25_000;

/// What the upgrade screen shows next to the activation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOffer {
  pub price: u64,
  pub tagline: Option<String>,
  pub saweria_link: Option<String>,
  pub trakteer_link: Option<String>,
  /// `premium_feature_*` values in key order, blanks skipped.
  pub features: Vec<String>,
}

impl UpgradeOffer {
  pub fn from_values(values: &BTreeMap<String, String>) -> Self {
    let text = |key: &str| {
      values
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
    };

    let price = match values.get("premium_price").map(|raw| raw.trim().parse()) {
      Some(Ok(price)) => price,
      Some(Err(_)) => {
        warn!("Ignoring malformed premium_price setting");
        DEFAULT_PRICE
      }
      None => DEFAULT_PRICE,
    };

    Self {
      price,
      tagline: text("premium_tagline"),
      saweria_link: text("saweria_link"),
      trakteer_link: text("trakteer_link"),
      features: values
        .range(FEATURE_PREFIX.to_string()..)
        .take_while(|(key, _)| key.starts_with(FEATURE_PREFIX))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect(),
    }
  }
}

pub struct Settings<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Settings<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Ordered by key.
  pub async fn list(&self) -> Result<Vec<app_config::Model>> {
    let settings = app_config::Entity::find()
      .order_by_asc(app_config::Column::Key)
      .all(self.db)
      .await?;
    Ok(settings)
  }

  pub async fn values(&self) -> Result<BTreeMap<String, String>> {
    let values = self
      .list()
      .await?
      .into_iter()
      .map(|setting| (setting.key, setting.value))
      .collect();
    Ok(values)
  }

  pub async fn upgrade_offer(&self) -> Result<UpgradeOffer> {
    Ok(UpgradeOffer::from_values(&self.values().await?))
  }

  /// Only existing keys can be changed.
  pub async fn update(
    &self,
    key: &str,
    value: &str,
  ) -> Result<app_config::Model> {
    let setting = app_config::Entity::find_by_id(key)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Setting"))?;

    if setting.key == "premium_price" && value.trim().parse::<u64>().is_err() {
      return Err(Error::invalid("Premium price must be a whole number"));
    }

    let updated = app_config::ActiveModel {
      value: Set(value.to_string()),
      updated_at: Set(Some(Utc::now().naive_utc())),
      ..setting.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }
}
