//! Records carried in envelope payloads.
//!
//! Exchange drivers are loose about numeric types: quantities and prices
//! arrive either as JSON numbers or as numeric strings, ids as numbers or
//! strings. The lenient deserializers below accept both.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::EnumString;

/// Status label the accounts API uses for a healthy account.
pub const HEALTHY_STATUS: &str = "正常";
/// Substring the accounts API puts in failing account statuses.
pub const ERROR_STATUS_MARKER: &str = "错误";

/// Quantities below this are treated as a flat position.
pub const FLAT_QUANTITY_EPSILON: f64 = 0.0001;

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mark_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pnl_unrealized: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pnl_realized: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub leverage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidation_price: Option<f64>,
}

impl Position {
    pub fn side_or_flat(&self) -> &str {
        self.side.as_deref().unwrap_or("flat")
    }

    /// A zero leverage reading means "not reported" and shows as 1x.
    pub fn leverage_or_one(&self) -> f64 {
        self.leverage.filter(|l| *l != 0.0).unwrap_or(1.0)
    }

    pub fn is_open(&self) -> bool {
        self.quantity.unwrap_or(0.0).abs() > FLAT_QUANTITY_EPSILON
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, alias = "created_at", deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub credentials_configured: bool,
}

impl AccountRecord {
    pub fn id(&self) -> &str {
        self.account_id.as_deref().unwrap_or("")
    }

    pub fn balance_or_zero(&self) -> f64 {
        self.balance.unwrap_or(0.0)
    }

    pub fn health(&self) -> AccountHealth {
        if self.status == HEALTHY_STATUS {
            AccountHealth::Healthy
        } else if self.status.contains(ERROR_STATUS_MARKER) {
            AccountHealth::Failing
        } else {
            AccountHealth::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AccountHealth {
    Healthy,
    Failing,
    Unknown,
}

/// One chart card: an image path or the reason it could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSlot {
    pub timeframe: String,
    /// 1-based position in the configured timeframe list, 0 when not listed.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum OrderStatus {
    #[strum(serialize = "open", serialize = "active", serialize = "live")]
    Active,
    #[strum(serialize = "filled", serialize = "completed")]
    Filled,
    #[strum(serialize = "cancelled", serialize = "canceled")]
    Cancelled,
    #[strum(serialize = "pending")]
    Pending,
}

/// Display label for a known value, the raw value upper-cased otherwise.
fn label_or_upper<T: std::str::FromStr>(raw: &str, label: impl Fn(T) -> &'static str) -> String {
    raw.parse::<T>().map(label).map(str::to_string).unwrap_or_else(|_| raw.to_uppercase())
}

pub fn position_side_label(raw: &str) -> String {
    label_or_upper(raw, |side: PositionSide| match side {
        PositionSide::Long => "Long",
        PositionSide::Short => "Short",
        PositionSide::Flat => "Flat",
    })
}

pub fn order_side_label(raw: &str) -> String {
    label_or_upper(raw, |side: OrderSide| match side {
        OrderSide::Buy => "Buy",
        OrderSide::Sell => "Sell",
    })
}

pub fn order_type_label(raw: &str) -> String {
    label_or_upper(raw, |kind: OrderType| match kind {
        OrderType::Limit => "Limit",
        OrderType::Market => "Market",
        OrderType::Stop => "Stop",
        OrderType::StopLimit => "Stop Limit",
    })
}

pub fn order_status_label(raw: &str) -> String {
    label_or_upper(raw, |status: OrderStatus| match status {
        OrderStatus::Active => "Active",
        OrderStatus::Filled => "Filled",
        OrderStatus::Cancelled => "Cancelled",
        OrderStatus::Pending => "Pending",
    })
}
