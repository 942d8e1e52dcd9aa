mod admin;
mod auth;
mod handlers;

use std::net::SocketAddr;

use axum::{
  Router,
  http::{HeaderName, Method, header},
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub use self::auth::{Admin, Caller};

/// Routes plus tracing and CORS; rate limiting is added by [`Plugin`].
pub fn router(app: Arc<AppState>) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([
      header::AUTHORIZATION,
      HeaderName::from_static("x-client-info"),
      HeaderName::from_static("apikey"),
      header::CONTENT_TYPE,
    ]);

  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/activate", post(handlers::activate))
    .route("/api/prayer-times", get(handlers::prayer_times))
    .route("/api/upgrade", get(handlers::upgrade))
    .nest("/api/admin", admin::router())
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors),
    )
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "http"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(app.config.rate_per_second)
        .burst_size(app.config.rate_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );
    let limiter = governor.limiter().clone();

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let service = router(app)
      .layer(GovernorLayer::new(governor))
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    let cleanup = async {
      loop {
        time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    tokio::select! {
      result = axum::serve(listener, service) => {
        result.context("HTTP server error")
      }
      _ = cleanup => Ok(()),
    }
  }
}
