use std::collections::HashSet;

use migration::{Migrator, MigratorTrait};

use crate::{entity::Role, prelude::*, sv};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub token_ttl: Duration,
  pub sweep_interval: Duration,
  pub prayer_api_url: String,
  pub prayer_method: u32,
  /// Accounts granted the admin role at startup.
  pub admin_emails: HashSet<String>,
  pub rate_per_second: u64,
  pub rate_burst: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:ramadhan.db?mode=rwc"),
      port: 3000,
      token_ttl: Duration::from_secs(30 * 24 * 3600),
      sweep_interval: Duration::from_secs(3600),
      prayer_api_url: String::from("https://api.aladhan.com/v1"),
      prayer_method: 20,
      admin_emails: HashSet::new(),
      rate_per_second: 2,
      rate_burst: 100,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_vars(|key| std::env::var(key).ok())
  }

  /// Unset variables keep their defaults; set but malformed ones are errors.
  pub fn from_vars(
    var: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Some(url) = var("DATABASE_URL") {
      config.database_url = url;
    }
    if let Some(port) = var("PORT") {
      config.port = port.trim().parse().context("PORT must be a port number")?;
    }
    if let Some(ttl) = var("TOKEN_TTL") {
      config.token_ttl = humantime::parse_duration(ttl.trim())
        .context("TOKEN_TTL must be a duration like `30d`")?;
    }
    if let Some(every) = var("SWEEP_INTERVAL") {
      config.sweep_interval = humantime::parse_duration(every.trim())
        .context("SWEEP_INTERVAL must be a duration like `1h`")?;
    }
    if let Some(url) = var("PRAYER_API_URL") {
      config.prayer_api_url = url;
    }
    if let Some(method) = var("PRAYER_METHOD") {
      config.prayer_method =
        method.trim().parse().context("PRAYER_METHOD must be a number")?;
    }
    if let Some(emails) = var("ADMIN_EMAILS") {
      config.admin_emails = emails
        .split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect();
    }
    if let Some(rate) = var("RATE_PER_SECOND") {
      config.rate_per_second =
        rate.trim().parse().context("RATE_PER_SECOND must be a number")?;
    }
    if let Some(burst) = var("RATE_BURST") {
      config.rate_burst =
        burst.trim().parse().context("RATE_BURST must be a number")?;
    }

    if config.sweep_interval.is_zero() {
      anyhow::bail!("SWEEP_INTERVAL must be positive");
    }
    Ok(config)
  }
}

pub struct Services<'a> {
  pub account: sv::Account<'a>,
  pub auth: sv::Auth<'a>,
  pub activation: sv::Activation<'a>,
  pub settings: sv::Settings<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub prayer: sv::Prayer,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let app = Self::with_db(db, config);
    app.grant_admins().await?;
    Ok(app)
  }

  /// State over an already migrated connection.
  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    let prayer = sv::Prayer::new(&config.prayer_api_url, config.prayer_method);
    Self { db, config, prayer }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      account: sv::Account::new(&self.db),
      auth: sv::Auth::new(&self.db),
      activation: sv::Activation::new(&self.db),
      settings: sv::Settings::new(&self.db),
    }
  }

  async fn grant_admins(&self) -> anyhow::Result<()> {
    for email in &self.config.admin_emails {
      match self.sv().account.by_email(email).await? {
        Some(account) => {
          self.sv().account.grant_role(account.id, Role::Admin).await?;
          info!("Admin role ensured for {email}");
        }
        None => warn!("Admin {email} has no account yet"),
      }
    }
    Ok(())
  }
}
