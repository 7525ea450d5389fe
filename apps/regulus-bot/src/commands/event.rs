//! Administrative commands shared by the RS and WS events.
//!
//! The slash commands themselves live in [`super::rs`] and [`super::ws`] and
//! forward here with their [`EventKind`].

use std::future::Future;
use std::time::Duration;

use serenity::all::{
    ButtonStyle, ChannelType, ComponentInteractionCollector, ComponentInteractionDataKind,
    CreateActionRow, CreateButton, CreateChannel, CreateEmbed, CreateInteractionResponseFollowup,
    CreateMessage, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, GuildChannel,
    GuildId, Mentionable, Role, RoleId,
};
use tracing::{info, warn};

use crate::error::Error;
use crate::event::entry::EventConfig;
use crate::event::leaderboard::{self, format_points, Leaderboard};
use crate::event::store::MAX_TEAM_ROLES;
use crate::event::{EventKind, ResetSummary};
use crate::gateway::classify;
use crate::utils::{components, embeds};
use crate::Context;

/// How long the reset role menu stays valid.
const MENU_TIMEOUT_SECS: u64 = 180;

fn guild_of(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Error::Config("This command can only be used in a server.".into()))
}

async fn reply(ctx: Context<'_>, embed: CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Runs `first` then `second`. When `second` fails, `undo` is handed what
/// `first` produced before the error is returned.
async fn both_or_neither<T, U>(
    first: impl Future<Output = Result<T, Error>>,
    second: impl Future<Output = Result<T, Error>>,
    undo: impl FnOnce(T) -> U,
) -> Result<(T, T), Error>
where
    U: Future<Output = ()>,
{
    let first = first.await?;
    match second.await {
        Ok(second) => Ok((first, second)),
        Err(e) => {
            undo(first).await;
            Err(e)
        }
    }
}

async fn create_text_channel(
    ctx: Context<'_>,
    guild_id: GuildId,
    category: &GuildChannel,
    kind: EventKind,
    suffix: &str,
) -> Result<GuildChannel, Error> {
    let builder = CreateChannel::new(format!("{}-{suffix}", kind.prefix()))
        .kind(ChannelType::Text)
        .category(category.id);
    guild_id
        .create_channel(ctx.http(), builder)
        .await
        .map_err(|e| classify(e, "The category"))
}

/// Create the entry and admin channels and start a fresh event.
pub async fn setup(ctx: Context<'_>, kind: EventKind, category: GuildChannel) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    if category.kind != ChannelType::Category {
        return Err(Error::Config(format!("{} is not a category.", category.mention())));
    }

    let http = ctx.http();
    let (entry, admin) = both_or_neither(
        create_text_channel(ctx, guild_id, &category, kind, "entry"),
        create_text_channel(ctx, guild_id, &category, kind, "admin"),
        |created: GuildChannel| async move {
            if let Err(e) = created.delete(http).await {
                warn!(channel_id = %created.id, error = %e, "Failed to remove half-created channel");
            }
        },
    )
    .await?;

    ctx.data()
        .hub(kind)
        .store
        .configure(guild_id, entry.id, admin.id)
        .await?;
    info!(kind = %kind, guild_id = %guild_id, entry = %entry.id, admin = %admin.id, "Event set up");

    let embed = embeds::success_embed()
        .title(format!("✅ {kind} event setup complete!"))
        .description(format!(
            "Created {} and {}.\nSet the participant role with `/{}-commonrole`, then post the signup message with `/{}-entrypost`.",
            entry.mention(),
            admin.mention(),
            kind.prefix(),
            kind.prefix()
        ));
    reply(ctx, embed).await
}

/// Use `role` as the marker role for signups.
pub async fn common_role(ctx: Context<'_>, kind: EventKind, role: Role) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    ctx.data()
        .hub(kind)
        .store
        .set_marker_role(guild_id, role.id)
        .await?;
    info!(kind = %kind, guild_id = %guild_id, role_id = %role.id, "Marker role set");

    reply(
        ctx,
        embeds::success_embed().description(format!("🏁 Participant role set to {}.", role.mention())),
    )
    .await
}

/// Offer `role` in the reset menu alongside the marker role.
pub async fn team_role(ctx: Context<'_>, kind: EventKind, role: Role) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    ctx.data()
        .hub(kind)
        .store
        .add_team_role(guild_id, role.name.clone(), role.id)
        .await?;

    reply(
        ctx,
        embeds::success_embed().description(format!(
            "👥 {} will be offered when resetting the {kind} event.",
            role.mention()
        )),
    )
    .await
}

fn signup_text(kind: EventKind) -> String {
    let intro = match kind {
        EventKind::Rs => {
            "The RS event is back! Let the galaxy hear of our courage and bring the crystals home.\n\
             Pick your expected activity and enter your predicted points 🙋"
        }
        EventKind::Ws => "Report your activity and sign up for the WS!",
    };
    let tiers: Vec<String> = kind
        .tiers()
        .iter()
        .map(|tier| format!("{} {}", tier.label, tier.description))
        .collect();
    format!("{intro}\n\n{}", tiers.join("\n"))
}

/// Post the signup message with one button per tier in the entry channel.
pub async fn entry_post(ctx: Context<'_>, kind: EventKind) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let config = ctx.data().hub(kind).store.require_config(guild_id).await?;

    let embed = embeds::event_embed(kind)
        .title(format!("💎 {kind} event signup"))
        .description(signup_text(kind));
    let message = CreateMessage::new()
        .embed(embed)
        .components(components::signup_buttons(kind));

    config
        .entry_channel
        .send_message(ctx.http(), message)
        .await
        .map_err(|e| classify(e, "The entry channel"))?;

    reply(
        ctx,
        embeds::success_embed().description(format!(
            "✅ Signup message posted in {}.",
            config.entry_channel.mention()
        )),
    )
    .await
}

fn leaderboard_embed(kind: EventKind, board: &Leaderboard) -> CreateEmbed {
    let tiers: Vec<String> = board
        .tier_counts(kind)
        .into_iter()
        .map(|(tier, count)| format!("{} {count}", tier.label))
        .collect();

    embeds::leaderboard_embed()
        .title(format!("🏆 {kind} event leaderboard"))
        .description(board.render_lines(kind))
        .field("📊 Participants", board.count.to_string(), true)
        .field("💎 Total pts", format_points(board.total_points), true)
        .field("Tiers", tiers.join(" · "), false)
}

/// Show the ranked entries, optionally posting them in the admin channel.
pub async fn list(ctx: Context<'_>, kind: EventKind, post: bool) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let hub = ctx.data().hub(kind);
    let config = hub.store.require_config(guild_id).await?;

    let board = leaderboard::project(hub.store.list_active(guild_id).await);
    if board.is_empty() {
        let embed = embeds::warning_embed().description("📭 No one has signed up yet.");
        return reply(ctx, embed).await;
    }

    let embed = leaderboard_embed(kind, &board);
    if post {
        config
            .admin_channel
            .send_message(ctx.http(), CreateMessage::new().embed(embed.clone()))
            .await
            .map_err(|e| classify(e, "The admin channel"))?;
    }
    reply(ctx, embed).await
}

/// Team roles offered in the reset menu, in name order.
fn team_role_options(config: &EventConfig) -> Vec<CreateSelectMenuOption> {
    config
        .team_roles
        .iter()
        .take(MAX_TEAM_ROLES)
        .map(|(name, id)| {
            CreateSelectMenuOption::new(name, id.to_string())
                .description("Also remove this role from every member")
        })
        .collect()
}

fn reset_report(summary: &ResetSummary) -> String {
    let mut text = format!(
        "✅ Removed {} role assignments and cleared {} entries.",
        summary.removed, summary.cleared
    );
    if summary.skipped > 0 {
        text.push_str(&format!(
            "\n⚠️ {} role assignments could not be removed (missing permission).",
            summary.skipped
        ));
    }
    text
}

async fn report_skipped(
    ctx: Context<'_>,
    kind: EventKind,
    config: &EventConfig,
    summary: &ResetSummary,
) {
    if summary.skipped == 0 {
        return;
    }
    let notice = embeds::warning_embed().description(format!(
        "⚠️ {kind} reset skipped {} role assignments the bot is not allowed to change.",
        summary.skipped
    ));
    if let Err(e) = config
        .admin_channel
        .send_message(ctx.http(), CreateMessage::new().embed(notice))
        .await
    {
        warn!(kind = %kind, error = %e, "Failed to report skipped role removals");
    }
}

/// Strip the participant role (and any team roles the caller picks) from
/// everyone, then clear all entries.
pub async fn reset(ctx: Context<'_>, kind: EventKind) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let hub = ctx.data().hub(kind);
    let config = hub.store.require_config(guild_id).await?;

    let options = team_role_options(&config);
    if options.is_empty() {
        // Revoking walks every member holding the role and can outlast the 3s reply window.
        ctx.defer_ephemeral().await?;
        let summary = hub.reset(guild_id, &[]).await?;
        report_skipped(ctx, kind, &config, &summary).await;
        return reply(ctx, embeds::success_embed().description(reset_report(&summary))).await;
    }

    let menu_id = format!("reset:{}:{}:roles", kind.prefix(), ctx.id());
    let confirm_id = format!("reset:{}:{}:confirm", kind.prefix(), ctx.id());
    let max_values = options.len() as u8;
    let menu = CreateSelectMenu::new(&menu_id, CreateSelectMenuKind::String { options })
        .placeholder("Team roles to reset (optional)")
        .min_values(0)
        .max_values(max_values);
    let confirm = CreateButton::new(&confirm_id)
        .label("Reset")
        .style(ButtonStyle::Danger);
    let handle = ctx
        .send(
            poise::CreateReply::default()
                .content(format!(
                    "The {kind} participant role is removed from everyone and all entries are cleared. \
                     Pick any team roles to remove as well, then press Reset."
                ))
                .components(vec![
                    CreateActionRow::SelectMenu(menu),
                    CreateActionRow::Buttons(vec![confirm]),
                ])
                .ephemeral(true),
        )
        .await?;

    let mut selected: Vec<RoleId> = Vec::new();
    let confirmation = loop {
        let (menu, button) = (menu_id.clone(), confirm_id.clone());
        let Some(interaction) = ComponentInteractionCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .filter(move |i| i.data.custom_id == menu || i.data.custom_id == button)
            .timeout(Duration::from_secs(MENU_TIMEOUT_SECS))
            .await
        else {
            handle
                .edit(
                    ctx,
                    poise::CreateReply::default()
                        .content("⌛ The reset menu timed out. Nothing was changed.")
                        .components(vec![]),
                )
                .await?;
            return Ok(());
        };

        if let ComponentInteractionDataKind::StringSelect { values } = &interaction.data.kind {
            selected = config
                .team_roles
                .values()
                .copied()
                .filter(|id| values.contains(&id.to_string()))
                .collect();
            interaction.defer(ctx.http()).await?;
            continue;
        }
        break interaction;
    };

    confirmation.defer_ephemeral(ctx.http()).await?;
    let summary = hub.reset(guild_id, &selected).await?;
    report_skipped(ctx, kind, &config, &summary).await;

    confirmation
        .create_followup(
            ctx.http(),
            CreateInteractionResponseFollowup::new()
                .content(reset_report(&summary))
                .ephemeral(true),
        )
        .await?;
    handle
        .edit(
            ctx,
            poise::CreateReply::default()
                .content(format!("{kind} event reset."))
                .components(vec![]),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_text_lists_every_tier() {
        for kind in EventKind::ALL {
            let text = signup_text(kind);
            for tier in kind.tiers() {
                assert!(text.contains(tier.label), "{kind} text misses {}", tier.label);
                assert!(text.contains(tier.description));
            }
        }
    }

    fn config_with_team_roles(count: u64) -> EventConfig {
        EventConfig {
            entry_channel: serenity::all::ChannelId::new(1),
            admin_channel: serenity::all::ChannelId::new(2),
            marker_role: Some(RoleId::new(1_000)),
            team_roles: (1..=count)
                .map(|id| (format!("Team {id:02}"), RoleId::new(id)))
                .collect(),
        }
    }

    #[test]
    fn reset_menu_offers_only_team_roles_within_the_limit() {
        assert!(team_role_options(&config_with_team_roles(0)).is_empty());
        assert_eq!(team_role_options(&config_with_team_roles(3)).len(), 3);
        assert_eq!(
            team_role_options(&config_with_team_roles(40)).len(),
            MAX_TEAM_ROLES
        );
    }

    #[test]
    fn reset_report_mentions_skipped_removals() {
        let clean = ResetSummary {
            removed: 4,
            skipped: 0,
            cleared: 3,
        };
        assert_eq!(
            reset_report(&clean),
            "✅ Removed 4 role assignments and cleared 3 entries."
        );

        let partial = ResetSummary { skipped: 2, ..clean };
        assert!(reset_report(&partial).contains("2 role assignments could not be removed"));
    }

    #[tokio::test]
    async fn failed_second_step_undoes_the_first() {
        use std::sync::{Arc, Mutex};

        let undone = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&undone);
        let result = both_or_neither(
            async { Ok(1) },
            async { Err(Error::Permission("admin channel".into())) },
            move |made| async move { log.lock().unwrap().push(made) },
        )
        .await;

        assert!(matches!(result, Err(Error::Permission(_))));
        assert_eq!(*undone.lock().unwrap(), [1]);
    }

    #[tokio::test]
    async fn both_steps_succeeding_undo_nothing() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let undone = AtomicBool::new(false);
        let result = both_or_neither(
            async { Ok("entry") },
            async { Ok("admin") },
            |_| async { undone.store(true, Ordering::SeqCst) },
        )
        .await;

        assert_eq!(result.unwrap(), ("entry", "admin"));
        assert!(!undone.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_first_step_skips_the_second() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let second_ran = AtomicBool::new(false);
        let result = both_or_neither(
            async { Err(Error::NotFound("The category".into())) },
            async {
                second_ran.store(true, Ordering::SeqCst);
                Ok(2u8)
            },
            |_| async {},
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!second_ran.load(Ordering::SeqCst));
    }
}
