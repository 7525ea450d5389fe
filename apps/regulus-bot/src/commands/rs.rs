//! `/rs-…` slash commands for the RS event.

use serenity::all::{GuildChannel, Role};

use super::event;
use crate::error::Error;
use crate::event::EventKind;
use crate::Context;

const KIND: EventKind = EventKind::Rs;

/// Create the RS entry and admin channels and start a fresh event.
#[poise::command(
    slash_command,
    rename = "rs-event-setup",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_event_setup(
    ctx: Context<'_>,
    #[description = "Category to create the event channels in"]
    #[channel_types("Category")]
    category: GuildChannel,
) -> Result<(), Error> {
    event::setup(ctx, KIND, category).await
}

/// Set the role given to everyone who signs up for the RS event.
#[poise::command(
    slash_command,
    rename = "rs-commonrole",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_commonrole(
    ctx: Context<'_>,
    #[description = "Participant role"] role: Role,
) -> Result<(), Error> {
    event::common_role(ctx, KIND, role).await
}

/// Add a team role that the RS reset should offer to clear.
#[poise::command(
    slash_command,
    rename = "rs-teamrole",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_teamrole(
    ctx: Context<'_>,
    #[description = "Team role"] role: Role,
) -> Result<(), Error> {
    event::team_role(ctx, KIND, role).await
}

/// Post the RS signup message in the entry channel.
#[poise::command(
    slash_command,
    rename = "rs-entrypost",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_entrypost(ctx: Context<'_>) -> Result<(), Error> {
    event::entry_post(ctx, KIND).await
}

/// Show the RS participant ranking.
#[poise::command(
    slash_command,
    rename = "rs-list",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_list(
    ctx: Context<'_>,
    #[description = "Also post the ranking in the admin channel"] post: Option<bool>,
) -> Result<(), Error> {
    event::list(ctx, KIND, post.unwrap_or(false)).await
}

/// Remove RS roles from every member and clear all entries.
#[poise::command(
    slash_command,
    rename = "rs-reset",
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn rs_reset(ctx: Context<'_>) -> Result<(), Error> {
    event::reset(ctx, KIND).await
}
