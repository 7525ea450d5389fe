use crate::utils::embeds;
use crate::Context;

type Error = crate::error::Error;

/// Check bot latency.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let start = std::time::Instant::now();
    let msg = ctx.say("Pong!").await?;
    let api_latency = start.elapsed().as_millis();

    let embed = embeds::regulus_embed().title("Pong!").field(
        "API Latency",
        format!("{}ms", api_latency),
        true,
    );

    msg.edit(ctx, poise::CreateReply::default().content("").embed(embed))
        .await?;

    Ok(())
}

/// Show bot info and uptime.
#[poise::command(slash_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), Error> {
    let uptime = ctx.data().start_time.elapsed();
    let hours = uptime.as_secs() / 3600;
    let minutes = (uptime.as_secs() % 3600) / 60;
    let seconds = uptime.as_secs() % 60;

    let embed = embeds::regulus_embed()
        .title("About Regulus-Bot")
        .description("Signup and leaderboard bot for RS and WS events.")
        .field("Version", &ctx.data().config.bot_version, true)
        .field("Uptime", format!("{hours}h {minutes}m {seconds}s"), true)
        .field("Language", "Rust + Serenity/Poise", true);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// List all available commands.
#[poise::command(slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to get help for"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "Regulus-Bot: run /rs-event-setup or /ws-event-setup to get started",
            ephemeral: true,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}
