//! Administration routes, all behind [`Admin`]

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
  routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};

use super::auth::Admin;
use crate::{
  entity::{CodeStatus, account, activation_code, app_config},
  prelude::*,
  state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
  Router::new()
    .route("/codes", post(generate).get(codes))
    .route("/codes.csv", get(export))
    .route("/codes/{id}", delete(remove))
    .route("/stats", get(stats))
    .route("/accounts", get(accounts))
    .route("/accounts/{id}/premium", post(premium))
    .route("/config", get(settings))
    .route("/config/{key}", put(update_setting))
}

#[derive(Debug, Deserialize)]
pub struct GenerateReq {
  pub count: usize,
}

async fn generate(
  State(app): State<Arc<AppState>>,
  Admin(admin): Admin,
  Json(req): Json<GenerateReq>,
) -> Result<(StatusCode, Json<Vec<activation_code::Model>>)> {
  let codes = app.sv().activation.generate(req.count).await?;
  info!(admin = %admin, "Issued {} activation codes", codes.len());
  Ok((StatusCode::CREATED, Json(codes)))
}

#[derive(Debug, Deserialize)]
pub struct CodesQuery {
  pub status: Option<CodeStatus>,
}

async fn codes(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Query(query): Query<CodesQuery>,
) -> Result<Json<Vec<activation_code::Model>>> {
  Ok(Json(app.sv().activation.list(query.status).await?))
}

async fn remove(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode> {
  app.sv().activation.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

async fn export(
  State(app): State<Arc<AppState>>,
  _: Admin,
) -> Result<impl IntoResponse> {
  let csv = app.sv().activation.export_csv().await?;
  let filename = format!("activation-codes-{}.csv", utils::today());

  Ok((
    [
      (header::CONTENT_TYPE, String::from("text/csv; charset=utf-8")),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    csv,
  ))
}

#[derive(Debug, Serialize)]
pub struct Stats {
  pub accounts: u64,
  pub premium: u64,
  pub available_codes: u64,
  pub used_codes: u64,
}

async fn stats(
  State(app): State<Arc<AppState>>,
  _: Admin,
) -> Result<Json<Stats>> {
  let sv = app.sv();
  let counts = sv.activation.counts().await?;

  Ok(Json(Stats {
    accounts: sv.account.count().await?,
    premium: sv.account.count_premium().await?,
    available_codes: counts.available,
    used_codes: counts.used,
  }))
}

#[derive(Debug, Deserialize)]
pub struct AccountsQuery {
  pub search: Option<String>,
}

async fn accounts(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Query(query): Query<AccountsQuery>,
) -> Result<Json<Vec<account::Model>>> {
  Ok(Json(app.sv().account.all(query.search.as_deref()).await?))
}

#[derive(Debug, Deserialize)]
pub struct PremiumReq {
  pub premium: bool,
}

async fn premium(
  State(app): State<Arc<AppState>>,
  Admin(admin): Admin,
  Path(id): Path<Uuid>,
  Json(req): Json<PremiumReq>,
) -> Result<Json<account::Model>> {
  let account = app.sv().account.set_premium(id, req.premium).await?;
  info!(admin = %admin, account = %id, premium = req.premium, "Premium override");
  Ok(Json(account))
}

async fn settings(
  State(app): State<Arc<AppState>>,
  _: Admin,
) -> Result<Json<Vec<app_config::Model>>> {
  Ok(Json(app.sv().settings.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct SettingReq {
  pub value: String,
}

async fn update_setting(
  State(app): State<Arc<AppState>>,
  Admin(admin): Admin,
  Path(key): Path<String>,
  Json(req): Json<SettingReq>,
) -> Result<Json<app_config::Model>> {
  let setting = app.sv().settings.update(&key, &req.value).await?;
  info!(admin = %admin, key = %key, "Setting updated");
  Ok(Json(setting))
}
