use poise::serenity_prelude as serenity;
use regulus_bot::commands;
use regulus_bot::config::Config;
use regulus_bot::event::roles::RoleSync;
use regulus_bot::event::store::EntryStore;
use regulus_bot::event::{EventHub, EventKind};
use regulus_bot::events;
use regulus_bot::gateway::SerenityGateway;
use regulus_bot::health;
use regulus_bot::Data;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regulus_bot=info".parse().unwrap()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let rs_store = open_store(&config, EventKind::Rs).await;
    let ws_store = open_store(&config, EventKind::Ws).await;
    info!(data_dir = %config.data_dir.display(), "Event data loaded");

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!(port, error = %e, "Health check server stopped");
        }
    });

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;
    let token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    events::interaction::handle_event(ctx, event, data).await;
                    Ok(())
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            let embed = regulus_bot::utils::embeds::error_embed()
                                .title("Error")
                                .description(error.user_message());
                            let _ = ctx
                                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                                .await;
                            tracing::error!(
                                command = ctx.command().name,
                                error = %error,
                                "Command error"
                            );
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                tracing::error!(error = %e, "Error handling error");
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready!");

                // Register slash commands (guild-specific if GUILD_ID set, otherwise global)
                if let Some(guild_id) = config.guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    info!(guild_id = %guild_id, "Slash commands registered to guild");
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Slash commands registered globally");
                }

                ctx.set_activity(Some(serenity::ActivityData::watching("the event signups")));

                let gateway = SerenityGateway::new(ctx.http.clone(), ctx.cache.clone());
                let rs = EventHub::new(
                    EventKind::Rs,
                    rs_store,
                    RoleSync::new(gateway.clone(), config.rs_role_name.clone()),
                );
                let ws = EventHub::new(
                    EventKind::Ws,
                    ws_store,
                    RoleSync::new(gateway.clone(), config.ws_role_name.clone()),
                );

                Ok(Data {
                    config,
                    gateway,
                    rs,
                    ws,
                    start_time: std::time::Instant::now(),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Failed to create Discord client");

    // Graceful shutdown on SIGINT/SIGTERM
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping bot...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!(error = %why, "Client error");
    }
    info!("Bot has shut down cleanly");
}

/// Load the stored entries of one event kind, exiting if they cannot be read.
async fn open_store(config: &Config, kind: EventKind) -> EntryStore {
    match EntryStore::open(&config.data_dir, kind).await {
        Ok(store) => store,
        Err(e) => {
            error!(kind = %kind, error = %e, "Failed to load event data");
            std::process::exit(1);
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
