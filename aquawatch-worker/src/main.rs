use chrono::Duration as ChronoDuration;

mod config;
mod database;
mod notify;
mod worker;

use aquawatch_core::{AlarmEngine, DefaultLimits, DirectionPolicy, EngineConfig};
use config::WorkerConfig;
use database::Database;
use notify::{EmailChannel, FanOutDispatcher, WhatsAppChannel};
use worker::PollLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing with environment filter
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting AquaWatch alarm worker");

    let config = match WorkerConfig::from_env() {
        Ok(config) => {
            tracing::info!(
                poll_interval_secs = config.poll_interval.as_secs(),
                cooldown_min = config.cooldown_minutes,
                config_table = %config.config_table,
                email_recipients = config.email.recipients.len(),
                whatsapp_recipients = config.whatsapp.recipients.len(),
                "configuration loaded"
            );
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if config.email.api_key.is_none() {
        tracing::warn!("BREVO_API_KEY not set; email channel will report failures");
    }
    if config.whatsapp.token.is_none() || config.whatsapp.phone_number_id.is_none() {
        tracing::warn!("WhatsApp credentials not set; messaging channel will report failures");
    }

    let db = match Database::connect(&config.database_url, &config.config_table).await {
        Ok(db) => {
            tracing::info!("database connection established");
            db
        }
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    let dispatcher = FanOutDispatcher::new(
        Box::new(EmailChannel::new(config.email.clone())),
        Box::new(WhatsAppChannel::new(config.whatsapp.clone())),
    );

    let engine = AlarmEngine::new(
        EngineConfig {
            cooldown_window: ChronoDuration::minutes(config.cooldown_minutes),
            register_on_failure: config.register_on_failure,
        },
        DefaultLimits::default(),
        DirectionPolicy::default(),
    );

    let poll_loop = PollLoop::new(db, engine, dispatcher, config.poll_interval);

    tokio::select! {
        result = poll_loop.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received; stopping alarm worker");
            Ok(())
        }
    }
}
