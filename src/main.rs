use anyhow::Result;
use fixr_watcher::{BotConfig, FixrClient, TicketBot};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv::dotenv().ok();

    // 初始化日志，默认 info 级别
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BotConfig::from_env()?;

    let mut client = FixrClient::new()?;
    if let Some(url) = &config.cart_url {
        info!("使用自定义转化事件地址: {}", url);
        client = client.with_conversion_url(url.clone());
    }

    let bot = TicketBot::new(client, config);

    match bot.run().await {
        Ok(_) => info!("轮询正常结束"),
        Err(e) => error!("轮询错误: {}", e),
    }

    Ok(())
}
