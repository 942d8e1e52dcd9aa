//! Who is using the app right now
//!
//! [`Identity`] follows the auth collaborator's session, caches the signed-in
//! account's profile and admin role, and publishes every phase change on a
//! `watch` channel. It is constructed explicitly and passed to whoever needs
//! it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{
  client::ActivationClient,
  entity::account,
  local::LocalStore,
  prelude::*,
  sv,
  tracker::{self, Tracker},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
  pub account_id: Uuid,
  pub token: String,
}

/// The hosted authentication provider, as seen from the app.
#[async_trait]
pub trait AuthClient: Send + Sync {
  async fn session(&self) -> Result<Option<AuthSession>>;
  async fn sign_out(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signed {
  pub session: AuthSession,
  /// `None` when the profile could not be loaded.
  pub profile: Option<account::Model>,
  pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
  #[default]
  Initializing,
  Anonymous,
  Authenticated(Signed),
}

#[derive(Serialize, Deserialize)]
struct Seen {
  done: bool,
}

fn seen_key(account_id: Uuid) -> String {
  format!("onboarding_{account_id}")
}

pub struct Identity {
  db: DatabaseConnection,
  auth: Arc<dyn AuthClient>,
  phase: watch::Sender<Phase>,
  /// Bumped by every sign-in or sign-out; a slower load started under an
  /// older epoch never gets published.
  epoch: AtomicU64,
}

impl Identity {
  pub fn new(db: DatabaseConnection, auth: Arc<dyn AuthClient>) -> Self {
    Self {
      db,
      auth,
      phase: watch::Sender::new(Phase::Initializing),
      epoch: AtomicU64::new(0),
    }
  }

  fn advance(&self) -> u64 {
    self.epoch.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Publishes `phase` unless a newer sign-in or sign-out happened since
  /// `epoch` was taken.
  fn publish(&self, epoch: u64, phase: Phase) -> bool {
    self.phase.send_if_modified(|current| {
      if self.epoch.load(Ordering::SeqCst) != epoch {
        return false;
      }
      *current = phase;
      true
    })
  }

  /// Resolves the initial phase from the provider's current session.
  pub async fn start(&self) {
    match self.auth.session().await {
      Ok(session) => self.on_auth_change(session).await,
      Err(err) => {
        warn!("Could not restore session, continuing as guest: {err}");
        let epoch = self.advance();
        self.publish(epoch, Phase::Anonymous);
      }
    }
  }

  pub async fn on_auth_change(&self, session: Option<AuthSession>) {
    let epoch = self.advance();
    let phase = match session {
      Some(session) => Phase::Authenticated(self.load(session).await),
      None => Phase::Anonymous,
    };
    if !self.publish(epoch, phase) {
      debug!("Auth change superseded before its profile loaded");
    }
  }

  /// Re-reads profile and role, e.g. after a redemption.
  pub async fn refresh(&self) {
    let epoch = self.epoch.load(Ordering::SeqCst);
    let Some(session) = self.session() else {
      return;
    };

    let signed = self.load(session).await;
    if !self.publish(epoch, Phase::Authenticated(signed)) {
      debug!("Dropping profile refresh for a session that ended");
    }
  }

  /// Ends anonymous, even when the provider call fails. Drops the cached
  /// profile and admin flag.
  pub async fn sign_out(&self) {
    let epoch = self.advance();
    if let Err(err) = self.auth.sign_out().await {
      warn!("Provider sign-out failed: {err}");
    }
    self.publish(epoch, Phase::Anonymous);
  }

  async fn load(&self, session: AuthSession) -> Signed {
    let accounts = sv::Account::new(&self.db);
    let id = session.account_id;

    let profile = accounts.by_id(id).await.unwrap_or_else(|err| {
      warn!(account = %id, "Profile fetch failed: {err}");
      None
    });
    // privilege fails closed
    let is_admin = accounts.is_admin(id).await.unwrap_or_else(|err| {
      warn!(account = %id, "Role lookup failed: {err}");
      false
    });

    Signed { session, profile, is_admin }
  }

  pub fn phase(&self) -> Phase {
    self.phase.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<Phase> {
    self.phase.subscribe()
  }

  fn signed<T>(&self, f: impl FnOnce(&Signed) -> T) -> Option<T> {
    match &*self.phase.borrow() {
      Phase::Authenticated(signed) => Some(f(signed)),
      _ => None,
    }
  }

  pub fn session(&self) -> Option<AuthSession> {
    self.signed(|signed| signed.session.clone())
  }

  pub fn account_id(&self) -> Option<Uuid> {
    self.signed(|signed| signed.session.account_id)
  }

  pub fn profile(&self) -> Option<account::Model> {
    self.signed(|signed| signed.profile.clone()).flatten()
  }

  pub fn is_authenticated(&self) -> bool {
    self.account_id().is_some()
  }

  pub fn is_admin(&self) -> bool {
    self.signed(|signed| signed.is_admin).unwrap_or(false)
  }

  pub fn is_premium(&self) -> bool {
    self.profile().is_some_and(|profile| profile.is_premium())
  }

  /// Record storage for whoever is signed in right now.
  pub fn tracker(&self, device: &LocalStore) -> Box<dyn Tracker> {
    tracker::select(self.account_id(), &self.db, device)
  }

  /// A signed-in account still carrying a placeholder name that has not
  /// dismissed onboarding on this device.
  pub fn needs_onboarding(&self, device: &LocalStore) -> bool {
    let Some(profile) = self.profile() else {
      return false;
    };

    let seen = device.get::<Option<Seen>>(&seen_key(profile.id), None);
    if seen.is_some_and(|seen| seen.done) {
      return false;
    }

    let placeholder: String = profile.id.to_string().chars().take(8).collect();
    match profile.display_name.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(name) => name == placeholder,
    }
  }

  pub fn mark_onboarding_seen(&self, device: &LocalStore) -> Result<()> {
    let id = self.account_id().ok_or(Error::Unauthorized)?;
    device.set(&seen_key(id), &Seen { done: true })
  }

  /// Redeems `code` with the server and reloads the profile on success.
  pub async fn activate(
    &self,
    client: &ActivationClient,
    code: &str,
  ) -> Result<String> {
    let session = self.session().ok_or(Error::Unauthorized)?;
    let message = client.redeem(&session.token, code).await?;
    self.refresh().await;
    Ok(message)
  }
}

/// Token-based stand-in for the hosted provider: credentials come from
/// [`sv::Auth`] and the current session lives in the device store.
pub struct DeviceAuth {
  db: DatabaseConnection,
  device: LocalStore,
  ttl: Duration,
}

const SESSION: &str = "session";

impl DeviceAuth {
  pub fn new(db: DatabaseConnection, device: LocalStore, ttl: Duration) -> Self {
    Self { db, device, ttl }
  }

  pub async fn sign_up(&self, email: &str) -> Result<AuthSession> {
    let account = sv::Account::new(&self.db).register(email).await?;
    self.open(account.id).await
  }

  pub async fn sign_in(&self, email: &str) -> Result<AuthSession> {
    let account = sv::Account::new(&self.db)
      .by_email(email)
      .await?
      .ok_or(Error::Unauthorized)?;
    self.open(account.id).await
  }

  async fn open(&self, account_id: Uuid) -> Result<AuthSession> {
    let token = sv::Auth::new(&self.db).issue(account_id, self.ttl).await?;
    let session = AuthSession { account_id, token };
    self.device.set(SESSION, &session)?;
    Ok(session)
  }
}

#[async_trait]
impl AuthClient for DeviceAuth {
  async fn session(&self) -> Result<Option<AuthSession>> {
    let Some(session) = self.device.get::<Option<AuthSession>>(SESSION, None)
    else {
      return Ok(None);
    };

    match sv::Auth::new(&self.db).verify(&session.token).await? {
      Some(account_id) if account_id == session.account_id => Ok(Some(session)),
      _ => {
        debug!("Dropping stale device session");
        self.device.remove(SESSION)?;
        Ok(None)
      }
    }
  }

  async fn sign_out(&self) -> Result<()> {
    if let Some(session) = self.device.get::<Option<AuthSession>>(SESSION, None)
    {
      sv::Auth::new(&self.db).revoke(&session.token).await?;
    }
    self.device.remove(SESSION)
  }
}
