use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// 默认币种（FIXR 以英镑标价）
pub const DEFAULT_CURRENCY: &str = "GBP";

/// 活动 ID，接口里有时是整数有时是字符串
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        EventId(id.to_string())
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        EventId(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub results: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<EventId>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub start_time: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub end_time: Option<String>,

    #[serde(default, deserialize_with = "lenient::venue")]
    pub venue: Option<Venue>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_sold_out: Option<bool>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub min_price: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub max_price: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub fixr_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub tickets: Vec<Ticket>,
}

impl Event {
    pub fn sold_out(&self) -> bool {
        self.is_sold_out.unwrap_or(false)
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn link(&self) -> Option<&str> {
        non_empty(&self.url).or_else(|| non_empty(&self.fixr_url))
    }

    pub fn image_link(&self) -> Option<&str> {
        non_empty(&self.image_url).or_else(|| non_empty(&self.image))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Venue {
    Detailed(VenueDetails),
    Named(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VenueDetails {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::address")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "lenient::string")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ticket {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<EventId>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub sold_out: Option<bool>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_sold_out: Option<bool>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub available: Option<bool>,

    #[serde(default, deserialize_with = "lenient::count")]
    pub max_per_user: Option<u32>,
}

impl Ticket {
    /// 未售罄且没有被明确标记为不可购买
    pub fn is_available(&self) -> bool {
        let sold_out = self.sold_out.unwrap_or(false) || self.is_sold_out.unwrap_or(false);
        !sold_out && self.available != Some(false)
    }

    /// 票种未给出币种时沿用活动的币种
    pub fn currency_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(fallback)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// 宽松的字段解析：类型不符时视为缺失，而不是让整条记录失败
mod lenient {
    use super::*;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EventId>, D::Error> {
        Ok(string(d)?.filter(|s| !s.is_empty()).map(EventId))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            _ => None,
        })
    }

    pub fn venue<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Venue>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.is_empty() => Some(Venue::Named(s)),
            v @ Value::Object(_) => serde_json::from_value(v).ok().map(Venue::Detailed),
            _ => None,
        })
    }

    pub fn address<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Address>, D::Error> {
        Ok(match Value::deserialize(d)? {
            v @ Value::Object(_) => serde_json::from_value(v).ok(),
            _ => None,
        })
    }

    /// 逐项解析列表，跳过无法解析的元素
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}
