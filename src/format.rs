use crate::types::{Event, Venue};

const BANNER_WIDTH: usize = 80;
const DESCRIPTION_LIMIT: usize = 200;
const TICKET_PREVIEW: usize = 5;

/// 币种代码对应的符号
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "GBP" => Some("£"),
        "EUR" => Some("€"),
        "USD" => Some("$"),
        "ZAR" => Some("R"),
        _ => None,
    }
}

/// 价格为空或为 0 时显示 "Free"，否则为币种符号加两位小数
pub fn format_price(price: Option<f64>, currency: &str) -> String {
    match price {
        Some(p) if p != 0.0 => match currency_symbol(currency) {
            Some(symbol) => format!("{}{:.2}", symbol, p),
            None => format!("{} {:.2}", currency, p),
        },
        _ => "Free".to_string(),
    }
}

/// 价格区间；两端都缺失时返回 `None`
pub fn format_price_range(min: Option<f64>, max: Option<f64>, currency: &str) -> Option<String> {
    if min.is_none() && max.is_none() {
        return None;
    }

    let mut out = format_price(min, currency);
    if min != max {
        if let Some(max) = max.filter(|m| *m != 0.0) {
            out.push_str(" - ");
            out.push_str(&format_price(Some(max), currency));
        }
    }
    Some(out)
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("N/A")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// 搜索结果中单个活动的摘要
pub fn render_event_summary(event: &Event) -> String {
    let mut out = String::new();

    line(&mut out, format!("• {}", display_name(&event.name)));
    let id = event.id.as_ref().map(|id| id.0.as_str()).unwrap_or("None");
    line(&mut out, format!("  ID: {}", id));

    if let Some(Venue::Detailed(venue)) = &event.venue {
        line(&mut out, format!("  Venue: {}", display_name(&venue.name)));
    }

    let status = if event.sold_out() { "🔴 SOLD OUT" } else { "🟢 AVAILABLE" };
    line(&mut out, format!("  Status: {}", status));

    if let Some(price) = format_price_range(event.min_price, event.max_price, event.currency()) {
        line(&mut out, format!("  Price: {}", price));
    }
    if let Some(start) = event.start_time.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("  Start: {}", start));
    }
    if let Some(end) = event.end_time.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("  End: {}", end));
    }
    if let Some(status) = event.status.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("  Event Status: {}", status));
    }
    if let Some(url) = event.link() {
        line(&mut out, format!("  URL: {}", url));
    }

    out
}

/// 活动详情报告
pub fn render_event_details(event: &Event) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut out = String::new();

    line(&mut out, format!("\n{}", banner));
    line(&mut out, "📋 EVENT DETAILS");
    line(&mut out, format!("{}\n", banner));

    line(&mut out, format!("Name: {}", display_name(&event.name)));
    let id = event.id.as_ref().map(|id| id.0.as_str()).unwrap_or("N/A");
    line(&mut out, format!("ID: {}", id));

    if let Some(desc) = event.description.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("Description: {}", truncate(desc, DESCRIPTION_LIMIT)));
    }
    if let Some(start) = event.start_time.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("Start: {}", start));
    }
    if let Some(end) = event.end_time.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("End: {}", end));
    }

    match &event.venue {
        Some(Venue::Detailed(venue)) => {
            line(&mut out, format!("Venue: {}", display_name(&venue.name)));
            if let Some(address) = &venue.address {
                let city = address.city.as_deref().unwrap_or("");
                let country = address.country.as_deref().unwrap_or("");
                if !city.is_empty() || !country.is_empty() {
                    line(&mut out, format!("Location: {}, {}", city, country));
                }
            }
        }
        Some(Venue::Named(name)) => {
            line(&mut out, format!("Venue: {}", name));
        }
        None => {}
    }

    let status = if event.sold_out() { "🔴 SOLD OUT" } else { "🟢 Available" };
    line(&mut out, format!("Status: {}", status));

    if let Some(price) = format_price_range(event.min_price, event.max_price, event.currency()) {
        line(&mut out, format!("Price: {}", price));
    }
    if let Some(status) = event.status.as_deref().filter(|s| !s.is_empty()) {
        line(&mut out, format!("Event Status: {}", status));
    }
    if let Some(url) = event.link() {
        line(&mut out, format!("URL: {}", url));
    }
    if let Some(image) = event.image_link() {
        line(&mut out, format!("Image: {}", image));
    }

    if !event.tickets.is_empty() {
        line(&mut out, format!("\nTickets ({} types):", event.tickets.len()));
        for ticket in event.tickets.iter().take(TICKET_PREVIEW) {
            // 仅 `available: true` 显示为可购买，售罄标记不参与展示
            let icon = if ticket.available == Some(true) { "🟢" } else { "🔴" };
            let price = format_price(ticket.price, ticket.currency_or(event.currency()));
            line(&mut out, format!("  {} {} - {}", icon, display_name(&ticket.name), price));
        }
    }

    line(&mut out, format!("\n{}\n", banner));
    out
}
