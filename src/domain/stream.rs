use std::fmt;
use std::time::Duration;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// Auto-refresh period of the account pages.
pub const ACCOUNT_REFRESH_PERIOD: Duration = Duration::from_secs(30);
/// Auto-refresh period of the chart pages.
pub const CHART_REFRESH_PERIOD: Duration = Duration::from_secs(10);

/// One independently refreshable data feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKey {
    Accounts,
    Balance { exchange: String, account_id: String },
    Positions,
    Orders,
    Charts,
    Trend,
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKey::Accounts => write!(f, "accounts"),
            StreamKey::Balance { exchange, account_id } => {
                write!(f, "balance:{exchange}/{account_id}")
            }
            StreamKey::Positions => write!(f, "positions"),
            StreamKey::Orders => write!(f, "orders"),
            StreamKey::Charts => write!(f, "charts"),
            StreamKey::Trend => write!(f, "trend"),
        }
    }
}

/// Tab panels of the account detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ViewKey {
    Positions,
    Orders,
}

impl ViewKey {
    pub const ALL: [ViewKey; 2] = [ViewKey::Positions, ViewKey::Orders];

    pub fn stream(self) -> StreamKey {
        match self {
            ViewKey::Positions => StreamKey::Positions,
            ViewKey::Orders => StreamKey::Orders,
        }
    }
}

/// Dashboard API routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Positions { exchange: String, account_id: String },
    Orders { exchange: String, account_id: String },
    AccountsRefresh,
    Balance { exchange: String, account_id: String },
    Chart { indicator_id: String, timeframe: String },
}

/// A ready-to-send POST: path plus optional JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub body: Option<String>,
}

#[derive(Serialize)]
struct BalanceBody<'a> {
    exchange: &'a str,
    account_id: &'a str,
}

#[derive(Serialize)]
struct ChartBody<'a> {
    timeframe: &'a str,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Positions { exchange, account_id } => {
                format!("/accounts/{exchange}/{account_id}/api/positions/")
            }
            Endpoint::Orders { exchange, account_id } => {
                format!("/accounts/{exchange}/{account_id}/api/orders/")
            }
            Endpoint::AccountsRefresh => "/accounts/api/refresh/".to_string(),
            Endpoint::Balance { .. } => "/accounts/api/balance/".to_string(),
            Endpoint::Chart { indicator_id, .. } => format!("/metrics/{indicator_id}/api/chart/"),
        }
    }

    pub fn request(&self) -> Result<ApiRequest, serde_json::Error> {
        let body = match self {
            Endpoint::Balance { exchange, account_id } => {
                Some(serde_json::to_string(&BalanceBody { exchange, account_id })?)
            }
            Endpoint::Chart { timeframe, .. } => Some(serde_json::to_string(&ChartBody { timeframe })?),
            _ => None,
        };
        Ok(ApiRequest { path: self.path(), body })
    }
}
