//! Command handlers for CLI subcommands.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use pickntrust_api::{create_router, serve_with, ApiConfig, AppState};
use pickntrust_core::{config, ChannelRegistry, Settings};
use pickntrust_links::{OfflineProductSource, ProductSource, WebProductSource};
use pickntrust_store::{Database, MaintenanceReport};
use pickntrust_telegram::{
    create_shared_state, photo_router, IngestMessage, IngestOutcome, Ingestor, LogNotifier,
    Notifier, TelegramBot, TelegramError, TelegramNotifier,
};
use tracing::{info, warn};

use crate::cli::{ChannelsAction, Commands, MaintTask};
use crate::error::{CliError, Result};

/// Execute a CLI command.
pub async fn execute(command: Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Serve { host, port, webhook } => cmd_serve(settings, host, port, webhook).await,
        Commands::Bot => cmd_bot(settings).await,
        Commands::Ingest {
            chat_id,
            message_id,
            offline,
            text,
        } => cmd_ingest(&settings, chat_id, message_id, offline, text).await,
        Commands::Maint { task } => cmd_maint(&settings, task),
        Commands::Backup { dir } => cmd_backup(&settings, dir.as_deref()),
        Commands::Channels { action } => cmd_channels(action),
        Commands::Stats => cmd_stats(&settings),
    }
}

fn open_db(settings: &Settings) -> Result<Arc<Database>> {
    Ok(Arc::new(Database::open(&settings.database_path)?))
}

/// Alert sink: the alert chat when both a token and a chat are configured.
fn notifier(settings: &Settings) -> Arc<dyn Notifier> {
    match (&settings.bot_token, settings.alert_chat_id) {
        (Some(token), Some(chat_id)) => Arc::new(TelegramNotifier::from_token(token, chat_id)),
        _ => Arc::new(LogNotifier),
    }
}

fn ingestor(settings: &Settings, db: Arc<Database>, source: Arc<dyn ProductSource>) -> Result<Ingestor> {
    let channels = ChannelRegistry::load_default()?;
    info!(channels = channels.len(), "Loaded monitored channels");
    Ok(Ingestor::new(db, Arc::new(channels), source, notifier(settings)))
}

fn web_source() -> Result<Arc<dyn ProductSource>> {
    Ok(Arc::new(WebProductSource::new()?))
}

async fn cmd_serve(
    settings: Settings,
    host: Option<String>,
    port: Option<u16>,
    webhook: bool,
) -> Result<()> {
    let db = open_db(&settings)?;

    let mut config = ApiConfig::from_settings(&settings);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let state = AppState::new(config.clone(), Arc::clone(&db), settings.clone());
    let mut app = create_router(state);

    match settings.bot_token.as_deref() {
        Some(token) => {
            let ingestor = ingestor(&settings, Arc::clone(&db), web_source()?)?;
            let bot = TelegramBot::new(token, create_shared_state(ingestor, settings.alert_chat_id));
            app = app.merge(photo_router(bot.bot()));

            if webhook {
                let base = settings
                    .public_base_url
                    .as_deref()
                    .ok_or(TelegramError::NoPublicUrl)?;
                let secret = settings
                    .webhook_secret
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
                let listen: SocketAddr = config
                    .bind_address()
                    .parse()
                    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.port)));

                let (webhook_router, dispatch) = bot.webhook(base, listen, &secret).await?;
                app = app.merge(webhook_router);
                tokio::spawn(dispatch);
            }
        }
        None if webhook => warn!("MASTER_BOT_TOKEN not set; serving without webhook"),
        None => {}
    }

    println!("PickNTrust API listening on http://{}", config.bind_address());
    serve_with(&config, app).await?;
    Ok(())
}

async fn cmd_bot(settings: Settings) -> Result<()> {
    let db = open_db(&settings)?;
    let ingestor = ingestor(&settings, db, web_source()?)?;
    let bot = TelegramBot::from_settings(
        &settings,
        create_shared_state(ingestor, settings.alert_chat_id),
    )?;

    let username = bot.get_me().await?;
    println!("\nPickNTrust ingestion bot");
    println!("   Bot: @{}", username);
    println!("   Mode: polling");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;
    Ok(())
}

async fn cmd_ingest(
    settings: &Settings,
    chat_id: i64,
    message_id: Option<i64>,
    offline: bool,
    text: String,
) -> Result<()> {
    let db = open_db(settings)?;
    let source = if offline {
        Arc::new(OfflineProductSource) as Arc<dyn ProductSource>
    } else {
        web_source()?
    };
    let ingestor = ingestor(settings, Arc::clone(&db), source)?;

    let message_id = message_id.unwrap_or_else(|| chrono::Utc::now().timestamp());
    let msg = IngestMessage::text(chat_id, message_id, text);

    match ingestor.process(&msg).await? {
        IngestOutcome::Stored { content_id, post_id } => {
            let item = db.get_content(content_id)?;
            println!("Stored content {} (channel post {})", content_id, post_id);
            if let Some(item) = item {
                println!("  Title: {}", item.title);
                println!("  Price: {}", item.price.as_deref().unwrap_or("-"));
                println!("  Link: {}", item.affiliate_url);
                println!("  Category: {}", item.category.as_deref().unwrap_or("-"));
                println!("  Pages: {}", item.display_pages.as_slice().join(", "));
            }
        }
        IngestOutcome::Skipped(reason) => println!("Skipped: {}", reason),
    }
    Ok(())
}

fn print_report(report: &MaintenanceReport) {
    println!("  display_pages normalized: {}", report.display_pages);
    println!("  processing_status normalized: {}", report.processing_status);
    println!("  timers expired: {}", report.expired);
    println!("  duplicates removed: {}", report.duplicates);
    println!("  categories standardized: {}", report.categories);
    println!("  defaults backfilled: {}", report.backfilled);
    println!("  total rows changed: {}", report.total());
}

fn cmd_maint(settings: &Settings, task: MaintTask) -> Result<()> {
    let db = open_db(settings)?;
    let now = chrono::Utc::now().timestamp();

    let changed = match task {
        MaintTask::NormalizePages => db.normalize_display_pages()?,
        MaintTask::NormalizeStatus => db.normalize_processing_status()?,
        MaintTask::Expire => db.expire_timers(now)?,
        MaintTask::Dedupe => db.dedupe_content()?,
        MaintTask::Categories => db.standardize_categories()?,
        MaintTask::Backfill => db.backfill_defaults()?,
        MaintTask::All => {
            let report = db.run_all_maintenance(now)?;
            println!("Maintenance complete:");
            print_report(&report);
            return Ok(());
        }
    };

    info!(?task, changed, "Maintenance task finished");
    println!("{:?}: {} rows changed", task, changed);
    Ok(())
}

fn cmd_backup(settings: &Settings, dir: Option<&Path>) -> Result<()> {
    let db = open_db(settings)?;
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(config::backups_dir);
    let path = db.export_json(&dir)?;
    println!("Exported unified_content to {}", path.display());
    Ok(())
}

fn cmd_channels(action: ChannelsAction) -> Result<()> {
    let path = config::channels_file();

    match action {
        ChannelsAction::List => {
            let registry = ChannelRegistry::load(&path)?;
            if !path.exists() {
                println!("(built-in defaults; run `pickntrust channels init` to customize)");
            }
            println!("{:<16} {:<14} {:<10} {}", "CHANNEL", "PAGE", "NETWORK", "NAME");
            println!("{}", "-".repeat(60));
            for channel in registry.channels() {
                let network = if channel.convert_links {
                    channel.effective_network().to_string()
                } else {
                    "none".to_string()
                };
                println!(
                    "{:<16} {:<14} {:<10} {}",
                    channel.channel_id, channel.page_slug, network, channel.page_name
                );
            }
            Ok(())
        }
        ChannelsAction::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::AlreadyExists(path));
            }
            ChannelRegistry::defaults().save(&path)?;
            println!("Wrote default channels to {}", path.display());
            Ok(())
        }
    }
}

fn cmd_stats(settings: &Settings) -> Result<()> {
    let db = open_db(settings)?;
    let stats = db.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::ContentBuilder;
    use tempfile::tempdir;

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            database_path: dir.join("db").join("pickntrust.sqlite"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_maint_and_backup() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        {
            let db = open_db(&settings).unwrap();
            db.insert_content(&ContentBuilder::new("Boat Airdopes", "https://amzn.to/a").build())
                .unwrap();
        }

        cmd_maint(&settings, MaintTask::All).unwrap();
        cmd_backup(&settings, Some(&dir.path().join("out"))).unwrap();

        let exported: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(exported.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_ingest() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        std::env::set_var(config::CHANNELS_FILE_ENV, dir.path().join("channels.json"));

        cmd_ingest(
            &settings,
            -1002955338551,
            Some(1),
            true,
            "boAt Rockerz 450 Bluetooth Headphones\nDeal @ ₹1,299\nhttps://www.amazon.in/dp/B07PR1CL3S".to_string(),
        )
        .await
        .unwrap();

        let db = open_db(&settings).unwrap();
        let items = db.all_content().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price.as_deref(), Some("1299"));
    }
}
