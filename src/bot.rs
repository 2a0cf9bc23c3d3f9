use crate::api::FixrClient;
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::format::render_event_summary;
use crate::types::{Event, EventId, Ticket};
use chrono::Local;
use log::{error, info, warn};
use rand::Rng;
use std::time::Duration;

/// 第一个未售罄的活动
pub fn first_available_event(events: &[Event]) -> Option<&Event> {
    events.iter().find(|event| !event.sold_out())
}

/// 第一个可购买的票种
pub fn first_available_ticket(tickets: &[Ticket]) -> Option<&Ticket> {
    tickets.iter().find(|ticket| ticket.is_available())
}

/// 单轮轮询的结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    /// 搜索响应无法解析时为 `None`
    pub events_found: Option<usize>,
    pub selected_event: Option<EventId>,
    pub details_fetched: bool,
    pub cart_status: Option<u16>,
}

pub struct TicketBot {
    client: FixrClient,
    config: BotConfig,
}

impl TicketBot {
    pub fn new(client: FixrClient, config: BotConfig) -> Self {
        Self { client, config }
    }

    /// 持续轮询，直到收到 Ctrl+C
    pub async fn run(&self) -> Result<()> {
        info!("[BOT STARTED] 🚀 Bot is running...");
        info!(
            "[CONFIG] Random interval between {}s and {}s",
            self.config.poll_min.as_secs(),
            self.config.poll_max.as_secs()
        );
        info!(
            "[CONFIG] Search coordinates: lat={}, lon={}",
            self.config.lat, self.config.lon
        );
        if self.config.cart.is_none() {
            warn!("[CONFIG] 未设置 FIXR_AUTH_TOKEN，将跳过加入购物车步骤");
        }

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("[STOP] 👋 Bot stopped by user.");
                    return Ok(());
                }
                _ = self.cycle_then_wait() => {}
            }
        }
    }

    async fn cycle_then_wait(&self) {
        let failed = match self.run_cycle().await {
            Ok(_) => false,
            Err(e) => {
                error!("[ERROR] ❌ Error: {}", e);
                report_auth_failure(&e);
                true
            }
        };

        let interval = self.next_interval();
        let next_at = Local::now() + chrono::Duration::seconds(interval.as_secs() as i64);
        if failed {
            info!("[RETRY] 🔄 Retrying in {}s...", interval.as_secs());
        } else {
            info!(
                "[WAITING] ⏳ Waiting {}s before next request (next at {})...",
                interval.as_secs(),
                next_at.format("%H:%M:%S")
            );
        }
        tokio::time::sleep(interval).await;
    }

    /// 在 [poll_min, poll_max] 内均匀取一个秒数
    pub fn next_interval(&self) -> Duration {
        let min = self.config.poll_min.as_secs();
        let max = self.config.poll_max.as_secs().max(min);
        Duration::from_secs(rand::thread_rng().gen_range(min..=max))
    }

    /// 执行一轮：搜索、打印、获取详情、加入购物车
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        info!("[SEARCHING] 🔍 Searching for events...");
        let events = match self
            .client
            .search_events(self.config.lat, self.config.lon, self.config.search_limit)
            .await?
        {
            Some(events) => events,
            None => {
                warn!("搜索响应无法解析，跳过本轮");
                return Ok(report);
            }
        };

        info!("[RESULTS] ✅ Found {} events", events.len());
        report.events_found = Some(events.len());

        info!("[PARSING] 📊 Parsing event details...");
        for event in &events {
            println!("{}", render_event_summary(event));
        }

        let available = match first_available_event(&events) {
            Some(event) => event,
            None => {
                info!("[INFO] ⚠️  No available events found at this moment");
                return Ok(report);
            }
        };

        // 可用活动缺少 ID 时才使用回退 ID
        let fallback = || self.config.fallback_event_id.clone();
        let event_id = match available.id.clone().or_else(fallback) {
            Some(id) => id,
            None => {
                warn!("可用活动缺少 ID，且未配置回退 ID: {:?}", available.name);
                return Ok(report);
            }
        };
        report.selected_event = Some(event_id.clone());

        info!(
            "[FETCHING] 📋 Fetching details for first available event (ID: {})...",
            event_id
        );
        let event = match self.client.get_event_details(&event_id).await {
            Ok(Some(event)) => {
                info!("[SUCCESS] ✅ Event details retrieved successfully");
                event
            }
            Ok(None) => {
                warn!("活动详情无法解析: {}", event_id);
                return Ok(report);
            }
            Err(e) => {
                error!("[ERROR] ❌ Error fetching event details: {}", e);
                report_auth_failure(&e);
                return Ok(report);
            }
        };
        report.details_fetched = true;

        report.cart_status = self.add_first_ticket_to_cart(&event_id, &event).await;
        Ok(report)
    }

    async fn add_first_ticket_to_cart(&self, event_id: &EventId, event: &Event) -> Option<u16> {
        let ticket = match first_available_ticket(&event.tickets) {
            Some(ticket) => ticket,
            None => {
                info!("[INFO] ⚠️  No available tickets for event {}", event_id);
                return None;
            }
        };

        let ticket_id = match &ticket.id {
            Some(id) => id,
            None => {
                warn!("票种缺少 ID，无法加入购物车: {:?}", ticket.name);
                return None;
            }
        };

        let credentials = match &self.config.cart {
            Some(credentials) => credentials,
            None => {
                warn!("未配置购物车凭据，跳过加入购物车: {}", ticket_id);
                return None;
            }
        };

        let event_id = event.id.as_ref().unwrap_or(event_id);
        let name = ticket.name.as_deref().unwrap_or("");
        let currency = ticket.currency_or(event.currency());

        info!("[CART] 🛒 Adding ticket {} ({}) to cart...", name, ticket_id);
        self.client
            .add_to_cart(credentials, event_id, ticket_id, name, currency)
            .await
    }
}

fn report_auth_failure(e: &BotError) {
    if e.is_auth_failure() {
        error!("请求被拒绝（401/403）：请求头中的凭据可能已过期，需要手动更新");
    }
}
