//! Main entry point for the Pithos Discord bot.

use std::sync::Arc;

use pithos_bot::Bot;
use pithos_persistence::{PersistenceService, SqlPersistService};
use pithos_server::{
    config::Configuration,
    discord::{DiscordHandler, SerenityMessenger, build_client},
    startup, sweeper,
};
use serenity::all::Http;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    if let Err(e) = configuration.validate() {
        error!("{:#}", e);
        return Err(e);
    }

    let db_url = configuration.db_url();
    let persistence: Arc<dyn PersistenceService> = Arc::new(
        SqlPersistService::connect(&db_url, configuration.db_max_connections()).await?,
    );
    persistence.health_check().await?;

    let token = configuration.discord_token()?;
    let messenger = Arc::new(SerenityMessenger::new(Arc::new(Http::new(&token))));
    let bot = Arc::new(Bot::new(
        configuration.bot_settings()?,
        persistence,
        messenger,
    ));
    info!(
        prefix = %bot.settings().command_prefix,
        motion_channel = bot.settings().motion_channel_id,
        archive_channel = bot.settings().archive_channel_id,
        "Bot engine ready"
    );

    let shutdown = startup::wait_for_shutdown_signal();
    let sweeper = sweeper::spawn_sweeper(bot.clone(), configuration.sweep_interval(), shutdown.clone());

    let handler = DiscordHandler::new(bot, configuration.server_id()?)?
        .with_client_id(configuration.client_id());
    let mut client = build_client(&token, handler).await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("Discord client stopped: {}", e);
            }
            shutdown.shutdown();
        }
        _ = shutdown.wait() => {
            info!("Stopping Discord shards");
            shard_manager.shutdown_all().await;
        }
    }

    if let Err(e) = sweeper.await {
        error!("Motion sweeper task failed: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}
