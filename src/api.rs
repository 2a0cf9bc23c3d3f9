use crate::config::CartCredentials;
use crate::error::{BotError, Result};
use crate::format::render_event_details;
use crate::types::{Event, EventId, SearchResponse};
use chrono::Utc;
use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, COOKIE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const FIXR_API_BASE: &str = "https://api.fixr.co";
const CONVERSION_PATH: &str = "/api/v2/app/conversion-events";

const SEARCH_ACCEPT: &str = "application/json; version=3.0";
const DETAIL_ACCEPT: &str = "application/json";

/// FIXR 网页端发出的固定请求头
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:146.0) Gecko/20100101 Firefox/146.0",
    ),
    ("accept-language", "en-US"),
    ("referer", "https://fixr.co/"),
    ("origin", "https://fixr.co"),
    ("fixr-platform", "web"),
    ("fixr-platform-version", "Firefox/146.0"),
    ("fixr-app-version", "7.51.28"),
    ("fixr-tracking", "{}"),
    ("fixr-channel", "fixr-website"),
    ("fixr-channel-meta", "e30="),
];

fn browser_headers(accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers
}

/// "加入购物车" 转化事件
#[derive(Debug, Serialize)]
struct ConversionEvent<'a> {
    event_name: &'static str,
    event_id: &'a str,
    ticket_id: &'a str,
    ticket_name: &'a str,
    currency: &'a str,
    timestamp: String,
}

pub struct FixrClient {
    client: Client,
    api_base: String,
    conversion_url: String,
}

impl FixrClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(FIXR_API_BASE)
    }

    /// 指定 API 根地址（测试时指向本地 mock 服务）
    pub fn with_base_url(api_base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let api_base = api_base.trim_end_matches('/').to_string();
        let conversion_url = format!("{}{}", api_base, CONVERSION_PATH);

        Ok(Self {
            client,
            api_base,
            conversion_url,
        })
    }

    /// 覆盖转化事件的上报地址
    pub fn with_conversion_url(mut self, url: impl Into<String>) -> Self {
        self.conversion_url = url.into();
        self
    }

    /// 按坐标搜索附近活动
    ///
    /// 无论成功与否都会先打印状态码和响应体；非 2xx 在打印之后返回错误，
    /// 响应体无法解析时返回 `None`。
    pub async fn search_events(
        &self,
        lat: f64,
        lon: f64,
        limit: u32,
    ) -> Result<Option<Vec<Event>>> {
        let url = format!("{}/search/events", self.api_base);

        debug!("请求活动列表: {} lat={} lon={} limit={}", url, lat, lon, limit);

        let response = self
            .client
            .get(&url)
            .headers(browser_headers(SEARCH_ACCEPT))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("limit", limit.to_string()),
                ("offset", "0".to_string()),
                ("ordering", "distance".to_string()),
                ("min_boost", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        println!("[API] Status code: {}", status.as_u16());

        let body = response.text().await.unwrap_or_default();
        let data = dump_json("Response", &body);

        if !status.is_success() {
            warn!("活动搜索失败 [{}]", status);
            return Err(BotError::HttpStatus { status, url });
        }

        let events = data
            .filter(Value::is_object)
            .and_then(|v| serde_json::from_value::<SearchResponse>(v).ok())
            .map(|resp| resp.results);

        if let Some(events) = &events {
            debug!("成功获取 {} 个活动", events.len());
        }

        Ok(events)
    }

    /// 获取单个活动详情（含票种列表），并打印格式化报告
    pub async fn get_event_details(&self, event_id: &EventId) -> Result<Option<Event>> {
        let url = format!("{}/api/v2/app/event/{}", self.api_base, event_id);

        debug!("请求活动详情: {}", url);

        let response = self
            .client
            .get(&url)
            .headers(browser_headers(DETAIL_ACCEPT))
            .send()
            .await?;

        let status = response.status();
        println!("Event Details Status: {}", status.as_u16());

        let body = response.text().await.unwrap_or_default();
        let event = dump_json("Event Details Response", &body)
            .filter(Value::is_object)
            .and_then(|v| serde_json::from_value::<Event>(v).ok());

        if let Some(event) = &event {
            print!("{}", render_event_details(event));
        }

        if !status.is_success() {
            warn!("活动详情请求失败 [{}]: {}", status, event_id);
            return Err(BotError::HttpStatus { status, url });
        }

        Ok(event)
    }

    /// 上报 "加入购物车" 转化事件
    ///
    /// 返回 HTTP 状态码；请求本身失败时记录日志并返回 `None`，从不向上传播错误。
    pub async fn add_to_cart(
        &self,
        credentials: &CartCredentials,
        event_id: &EventId,
        ticket_id: &EventId,
        ticket_name: &str,
        currency: &str,
    ) -> Option<u16> {
        let payload = ConversionEvent {
            event_name: "add_to_cart",
            event_id: &event_id.0,
            ticket_id: &ticket_id.0,
            ticket_name,
            currency,
            timestamp: Utc::now().to_rfc3339(),
        };

        debug!("上报转化事件: {}", self.conversion_url);

        let mut request = self
            .client
            .post(&self.conversion_url)
            .headers(browser_headers(DETAIL_ACCEPT))
            .header(AUTHORIZATION, format!("Bearer {}", credentials.auth_token))
            .json(&payload);

        if let Some(cookie) = &credentials.session_cookie {
            request = request.header(COOKIE, cookie.as_str());
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    info!("🛒 已加入购物车: {} ({}) [{}]", ticket_name, ticket_id, status.as_u16());
                } else {
                    let text = response.text().await.unwrap_or_default();
                    warn!("加入购物车失败 [{}]: {}", status, text);
                }
                Some(status.as_u16())
            }
            Err(e) => {
                error!("加入购物车请求异常: {}", e);
                None
            }
        }
    }
}

/// 打印响应体：能解析为 JSON 时美化输出，否则原样输出文本
fn dump_json(label: &str, body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string());
            println!("{}:\n{}", label, pretty);
            Some(value)
        }
        Err(e) => {
            debug!("JSON 解析错误: {}", e);
            println!("{} (text):\n{}", label, body);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn search_sends_query_and_parses_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/events")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "-25.9655".into()),
                Matcher::UrlEncoded("lon".into(), "32.5832".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("ordering".into(), "distance".into()),
                Matcher::UrlEncoded("min_boost".into(), "1".into()),
            ]))
            .match_header("accept", SEARCH_ACCEPT)
            .match_header("fixr-channel", "fixr-website")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"results": [
                    {"id": 1, "name": "Sold", "is_sold_out": true},
                    {"id": 2, "name": "Open"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let events = client
            .search_events(-25.9655, 32.5832, 50)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name.as_deref(), Some("Open"));
    }

    #[tokio::test]
    async fn search_returns_none_for_unparseable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/events")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>challenge</html>")
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let events = client.search_events(0.0, 0.0, 10).await.unwrap();
        assert!(events.is_none());
    }

    #[tokio::test]
    async fn search_errors_on_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/events")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"detail": "forbidden"}"#)
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let err = client.search_events(0.0, 0.0, 10).await.unwrap_err();
        assert!(err.is_auth_failure());
    }

    #[tokio::test]
    async fn event_details_parse_tickets() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/app/event/378646080")
            .match_header("accept", DETAIL_ACCEPT)
            .with_status(200)
            .with_body(
                json!({
                    "id": 378646080,
                    "name": "Warehouse Night",
                    "tickets": [
                        {"id": 11, "name": "Early bird", "price": 5.0, "sold_out": true},
                        {"id": 12, "name": "General", "price": 12.5}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let event = client
            .get_event_details(&EventId::from(378646080))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.tickets.len(), 2);
        assert_eq!(event.tickets[1].price, Some(12.5));
    }

    #[tokio::test]
    async fn event_details_error_on_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/app/event/9")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let err = client.get_event_details(&EventId::from(9)).await.unwrap_err();
        assert!(matches!(err, BotError::HttpStatus { status, .. } if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn add_to_cart_posts_conversion_with_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", CONVERSION_PATH)
            .match_header("authorization", "Bearer secret")
            .match_header("cookie", "sessionid=abc")
            .match_body(Matcher::PartialJson(json!({
                "event_name": "add_to_cart",
                "event_id": "7",
                "ticket_id": "12",
                "ticket_name": "General",
                "currency": "GBP"
            })))
            .with_status(201)
            .create_async()
            .await;

        let client = FixrClient::with_base_url(&server.url()).unwrap();
        let credentials = CartCredentials {
            auth_token: "secret".to_string(),
            session_cookie: Some("sessionid=abc".to_string()),
        };
        let status = client
            .add_to_cart(&credentials, &EventId::from(7), &EventId::from(12), "General", "GBP")
            .await;

        mock.assert_async().await;
        assert_eq!(status, Some(201));
    }

    #[test]
    fn add_to_cart_swallows_transport_errors() {
        let client = FixrClient::with_base_url("http://127.0.0.1:1").unwrap();
        let credentials = CartCredentials {
            auth_token: "secret".to_string(),
            session_cookie: None,
        };
        let status = tokio_test::block_on(client.add_to_cart(
            &credentials,
            &EventId::from(1),
            &EventId::from(2),
            "General",
            "GBP",
        ));
        assert_eq!(status, None);
    }
}
