//! Error types for the tracker core and the activation server

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Json(#[from] json::Error),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Unauthorized")]
  Unauthorized,

  #[error("Admin role required")]
  Forbidden,

  #[error("Activation code must not be empty")]
  EmptyCode,

  /// Unknown, already redeemed and never-issued codes all map here.
  #[error("Invalid or already used activation code")]
  InvalidCode,

  #[error("Activation code has already been used")]
  CodeUsed,

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("Invalid input: {0}")]
  Invalid(String),

  /// A 4xx answer from the activation server, carrying its message.
  #[error("{0}")]
  Rejected(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::Invalid(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::EmptyCode
      | Self::InvalidCode
      | Self::Invalid(_)
      | Self::Rejected(_) => StatusCode::BAD_REQUEST,
      Self::CodeUsed => StatusCode::CONFLICT,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Database(_)
      | Self::Io(_)
      | Self::Json(_)
      | Self::Http(_)
      | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    let message = if status.is_server_error() {
      tracing::error!("Request failed: {self}");
      String::from("Internal server error")
    } else {
      self.to_string()
    };

    (status, Json(json::json!({ "error": message }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
