//! Caller side of the activation endpoint

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Serialize)]
struct ActivateReq<'a> {
  code: &'a str,
}

#[derive(Deserialize)]
struct ActivateRes {
  message: String,
}

#[derive(Deserialize)]
struct ErrorRes {
  error: String,
}

#[derive(Debug, Clone)]
pub struct ActivationClient {
  client: reqwest::Client,
  base_url: String,
}

impl ActivationClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self::with_client(reqwest::Client::new(), base_url)
  }

  pub fn with_client(
    client: reqwest::Client,
    base_url: impl Into<String>,
  ) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Self { client, base_url }
  }

  /// Redeems `code` for the account behind `token`, returning the server's
  /// confirmation message.
  pub async fn redeem(&self, token: &str, code: &str) -> Result<String> {
    if code.trim().is_empty() {
      return Err(Error::EmptyCode);
    }

    let res = self
      .client
      .post(format!("{}/api/activate", self.base_url))
      .bearer_auth(token)
      .json(&ActivateReq { code })
      .send()
      .await?;

    match res.status() {
      StatusCode::OK => Ok(res.json::<ActivateRes>().await?.message),
      StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
      status if status.is_client_error() => {
        let message = res
          .json::<ErrorRes>()
          .await
          .map(|body| body.error)
          .unwrap_or_else(|_| format!("Activation rejected ({status})"));
        Err(Error::Rejected(message))
      }
      status => {
        warn!("Activation endpoint answered {status}");
        Err(Error::Internal(format!("activation failed with {status}")))
      }
    }
  }
}
