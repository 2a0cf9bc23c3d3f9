use crate::error::{BotError, Result};
use crate::types::EventId;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LAT: f64 = -25.9655;
pub const DEFAULT_LON: f64 = 32.5832;
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
pub const DEFAULT_POLL_MIN_SECS: u64 = 60;
pub const DEFAULT_POLL_MAX_SECS: u64 = 75;
pub const DEFAULT_FALLBACK_EVENT_ID: u64 = 378646080;

/// 购物车转化请求所需的静态凭据（不会自动刷新）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartCredentials {
    pub auth_token: String,
    pub session_cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub lat: f64,
    pub lon: f64,
    pub search_limit: u32,
    pub poll_min: Duration,
    pub poll_max: Duration,
    /// 第一个可用活动缺少 ID 时使用的活动 ID
    pub fallback_event_id: Option<EventId>,
    pub cart: Option<CartCredentials>,
    pub cart_url: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT,
            lon: DEFAULT_LON,
            search_limit: DEFAULT_SEARCH_LIMIT,
            poll_min: Duration::from_secs(DEFAULT_POLL_MIN_SECS),
            poll_max: Duration::from_secs(DEFAULT_POLL_MAX_SECS),
            fallback_event_id: Some(EventId::from(DEFAULT_FALLBACK_EVENT_ID)),
            cart: None,
            cart_url: None,
        }
    }
}

impl BotConfig {
    /// 从进程环境变量加载配置（调用方应先执行 dotenv）
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let poll_min = parse_or(
            get("POLL_INTERVAL_MIN"),
            "POLL_INTERVAL_MIN",
            DEFAULT_POLL_MIN_SECS,
        )?;
        let poll_max = parse_or(
            get("POLL_INTERVAL_MAX"),
            "POLL_INTERVAL_MAX",
            DEFAULT_POLL_MAX_SECS,
        )?;
        if poll_min > poll_max {
            return Err(BotError::ConfigError(format!(
                "POLL_INTERVAL_MIN ({}) 大于 POLL_INTERVAL_MAX ({})",
                poll_min, poll_max
            )));
        }

        // 显式设置为空字符串表示禁用回退 ID
        let fallback_event_id = match vars.get("FIXR_FALLBACK_EVENT_ID").map(|v| v.trim()) {
            None => defaults.fallback_event_id,
            Some("") => None,
            Some(id) => Some(EventId::from(id)),
        };

        let cart = get("FIXR_AUTH_TOKEN").map(|token| CartCredentials {
            auth_token: token.to_string(),
            session_cookie: get("FIXR_SESSION_COOKIE").map(str::to_string),
        });

        Ok(Self {
            lat: parse_or(get("FIXR_LAT"), "FIXR_LAT", DEFAULT_LAT)?,
            lon: parse_or(get("FIXR_LON"), "FIXR_LON", DEFAULT_LON)?,
            search_limit: parse_or(
                get("FIXR_SEARCH_LIMIT"),
                "FIXR_SEARCH_LIMIT",
                DEFAULT_SEARCH_LIMIT,
            )?,
            poll_min: Duration::from_secs(poll_min),
            poll_max: Duration::from_secs(poll_max),
            fallback_event_id,
            cart,
            cart_url: get("FIXR_CART_URL").map(str::to_string),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<&str>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| BotError::ConfigError(format!("{} 的值无效: {:?}", key, value))),
    }
}
