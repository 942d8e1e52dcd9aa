pub use std::{collections::HashMap, sync::Arc, time::Duration};

pub use anyhow::Context;
pub use async_trait::async_trait;
pub use chrono::{
  Datelike, NaiveDate as Date, NaiveDateTime as DateTime, NaiveTime, TimeDelta,
  Utc,
};
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
  TransactionTrait,
};
pub use tokio::time;
pub use tracing::{debug, error, info, warn};
pub use uuid::Uuid;

pub use crate::error::{Error, Result};
pub(crate) use crate::utils;
