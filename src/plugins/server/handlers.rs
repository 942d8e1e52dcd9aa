use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use super::auth::Caller;
use crate::{
  prelude::*,
  state::AppState,
  sv::{prayer::Slot, settings::UpgradeOffer},
};

pub async fn health() -> &'static str {
  "OK"
}

#[derive(Debug, Deserialize)]
pub struct ActivateReq {
  #[serde(default)]
  pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivateRes {
  pub success: bool,
  pub message: String,
}

pub async fn activate(
  State(app): State<Arc<AppState>>,
  Caller(account): Caller,
  req: Result<Json<ActivateReq>, JsonRejection>,
) -> Result<Json<ActivateRes>> {
  let Json(req) =
    req.map_err(|err| Error::invalid(format!("Malformed request: {err}")))?;
  let code = req.code.unwrap_or_default();

  app.sv().activation.redeem(account, &code).await?;

  Ok(Json(ActivateRes {
    success: true,
    message: String::from("Congratulations! Your account is now Premium"),
  }))
}

pub async fn upgrade(
  State(app): State<Arc<AppState>>,
) -> Result<Json<UpgradeOffer>> {
  Ok(Json(app.sv().settings.upgrade_offer().await?))
}

#[derive(Debug, Deserialize)]
pub struct PrayerQuery {
  pub city: String,
  pub country: String,
  pub date: Option<Date>,
  /// Caller's wall clock, `HH:MM`.
  pub time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrayerRes {
  pub date: Date,
  pub schedule: Vec<Slot>,
  pub next: Slot,
}

pub async fn prayer_times(
  State(app): State<Arc<AppState>>,
  Query(query): Query<PrayerQuery>,
) -> Result<Json<PrayerRes>> {
  let date = query.date.unwrap_or_else(utils::today);
  let now = match query.time.as_deref() {
    Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
      .map_err(|_| Error::invalid("time must be HH:MM"))?,
    None => Utc::now().time(),
  };

  let times = app
    .prayer
    .timings(&query.city, &query.country, date)
    .await
    .map_err(|err| {
      warn!("Prayer times unavailable: {err}");
      err
    })?;

  Ok(Json(PrayerRes {
    date,
    schedule: times.schedule(now),
    next: times.next(now),
  }))
}
