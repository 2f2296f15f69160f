//! Pushes one sample message through the configured SMS notifier so the
//! transport can be smoke-tested without waiting for a real event.

use feed_sentinel::config::Config;
use feed_sentinel::notify::{Notifier, SmsNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::from_env()?;
    let notifier = SmsNotifier::new(
        &cfg.sms.api_base,
        cfg.sms.account_sid.clone(),
        cfg.sms.auth_token.clone(),
        cfg.sms.from_number.clone(),
        cfg.sms.to_number.clone(),
    )
    .with_timeout(cfg.http_timeout.as_secs());

    let message = format!("{}notify-demo test message", cfg.message_prefix);
    match notifier.deliver(&message).await {
        Ok(()) => println!("notify-demo: delivered"),
        Err(e) => println!("notify-demo: delivery failed: {e}"),
    }
    Ok(())
}
