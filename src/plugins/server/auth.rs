//! Bearer-token extractors for protected routes

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};

use crate::{prelude::*, state::AppState};

/// The account behind a valid `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Uuid);

impl FromRequestParts<Arc<AppState>> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    if let Some(caller) = parts.extensions.get::<Caller>() {
      return Ok(*caller);
    }

    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(utils::bearer)
      .ok_or(Error::Unauthorized)?;

    let Some(account) = app.sv().auth.verify(token).await? else {
      debug!(uri = %parts.uri, "Rejected bearer token");
      return Err(Error::Unauthorized);
    };

    let caller = Caller(account);
    parts.extensions.insert(caller);
    Ok(caller)
  }
}

/// A [`Caller`] holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub Uuid);

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    let Caller(account) = Caller::from_request_parts(parts, app).await?;

    if !app.sv().account.is_admin(account).await? {
      warn!(account = %account, uri = %parts.uri, "Admin route refused");
      return Err(Error::Forbidden);
    }
    Ok(Admin(account))
  }
}
