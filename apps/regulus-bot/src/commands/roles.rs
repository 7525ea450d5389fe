//! Role membership utilities for administrators.

use serenity::all::{CreateMessage, Member, Mentionable, MessageFlags, Role};

use crate::error::Error;
use crate::utils::embeds;
use crate::Context;

/// Discord's message content limit.
const CONTENT_LIMIT: usize = 2000;
const DESCRIPTION_LIMIT: usize = 4096;

async fn human_holders(ctx: Context<'_>, role: &Role) -> Result<Vec<Member>, Error> {
    let members = ctx
        .data()
        .gateway
        .members_with_role(role.guild_id, role.id)
        .await?;
    Ok(members.into_iter().filter(|m| !m.user.bot).collect())
}

/// Split `items` into newline- or space-joined chunks no longer than `limit`.
fn chunk_joined(items: &[String], separator: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for item in items {
        if !current.is_empty() && current.len() + separator.len() + item.len() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(item);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Silently mention every member of a role.
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn pingrole(
    ctx: Context<'_>,
    #[description = "Role whose members should be mentioned"] role: Role,
) -> Result<(), Error> {
    // Listing walks every guild member, which can outlast the 3s reply window.
    ctx.defer_ephemeral().await?;
    let members = human_holders(ctx, &role).await?;
    if members.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("⚠️ {} has no members.", role.name))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let mentions: Vec<String> = members.iter().map(|m| m.mention().to_string()).collect();
    for chunk in chunk_joined(&mentions, " ", CONTENT_LIMIT) {
        let message = CreateMessage::new()
            .content(chunk)
            .flags(MessageFlags::SUPPRESS_NOTIFICATIONS);
        ctx.channel_id().send_message(ctx.http(), message).await?;
    }

    ctx.send(
        poise::CreateReply::default()
            .content(format!("📣 Mentioned {} members of {}.", members.len(), role.name))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// List the members of a role.
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    check = "crate::utils::permissions::admin_only"
)]
pub async fn listrole(
    ctx: Context<'_>,
    #[description = "Role to list"] role: Role,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let members = human_holders(ctx, &role).await?;
    if members.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("📭 No members have {}.", role.name))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let names: Vec<String> = members
        .iter()
        .map(|m| format!("・{}", m.display_name()))
        .collect();
    let mut pages = chunk_joined(&names, "\n", DESCRIPTION_LIMIT).into_iter();
    let first = pages.next().unwrap_or_default();
    let hidden = names.len() - first.lines().count();

    let mut embed = embeds::leaderboard_embed()
        .title(format!("📋 Members of {}", role.name))
        .description(first)
        .field("Total", members.len().to_string(), true);
    if hidden > 0 {
        embed = embed.field("Not shown", hidden.to_string(), true);
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item{i:03}")).collect()
    }

    #[test]
    fn chunks_respect_the_limit() {
        let chunks = chunk_joined(&items(100), " ", 50);
        assert!(chunks.iter().all(|c| c.len() <= 50));
        assert_eq!(chunks.join(" "), items(100).join(" "));
    }

    #[test]
    fn small_input_is_one_chunk() {
        assert_eq!(chunk_joined(&items(2), "\n", 100), ["item000\nitem001"]);
        assert!(chunk_joined(&[], " ", 10).is_empty());
    }
}
