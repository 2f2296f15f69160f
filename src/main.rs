//! feed-sentinel — Binary Entrypoint
//! Boots the two polling workers (stream watcher and slot dispatcher),
//! wires collaborators from configuration, and handles shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_sentinel::config::Config;
use feed_sentinel::notify::{Notifier, SmsNotifier};
use feed_sentinel::source::{StatusFeedSource, WeatherXmlSource};
use feed_sentinel::summarize::ChatSummarizer;
use feed_sentinel::worker::{SlotWorker, StreamWorker};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // ConfigError is the only fatal class; bail before any loop starts.
    let cfg = Config::from_env().context("loading configuration")?;
    tracing::info!(
        interval_secs = cfg.poll_interval.as_secs(),
        slots = cfg.slots.len(),
        "feed-sentinel starting"
    );

    let summarizer = Arc::new(
        ChatSummarizer::new(
            cfg.summarizer.endpoint.clone(),
            cfg.summarizer.api_key.clone(),
            cfg.summarizer.model.clone(),
            cfg.http_timeout,
        )
        .context("building summarizer client")?,
    );
    let notifier: Arc<dyn Notifier> = Arc::new(
        SmsNotifier::new(
            &cfg.sms.api_base,
            cfg.sms.account_sid.clone(),
            cfg.sms.auth_token.clone(),
            cfg.sms.from_number.clone(),
            cfg.sms.to_number.clone(),
        )
        .with_timeout(cfg.http_timeout.as_secs()),
    );
    let source = Arc::new(
        StatusFeedSource::from_url(cfg.feed_url.clone(), cfg.http_timeout)
            .context("building status feed client")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let stream_worker = StreamWorker::new(
        source,
        summarizer.clone(),
        notifier.clone(),
        cfg.message_prefix.clone(),
        cfg.max_fetch_items,
    );
    let mut handles = vec![tokio::spawn(
        stream_worker.run(cfg.poll_interval, shutdown_rx.clone()),
    )];

    if !cfg.slots.is_empty() {
        let forecast_url = cfg
            .forecast_url
            .clone()
            .expect("validated at config load: slots require FORECAST_URL");
        let forecast = Arc::new(
            WeatherXmlSource::from_url(forecast_url, cfg.http_timeout)
                .context("building forecast client")?,
        );
        let slot_worker = SlotWorker::new(forecast, summarizer, notifier, cfg.slots.clone());
        handles.push(tokio::spawn(
            slot_worker.run(cfg.poll_interval, shutdown_rx),
        ));
    }

    // Translate ctrl-c / SIGTERM into the shutdown watch channel.
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
        // Keep the sender alive so receivers observe the final value.
        std::future::pending::<()>().await;
    });

    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("feed-sentinel stopped");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "cannot install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
