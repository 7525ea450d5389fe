use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, FullEvent, Interaction, Mentionable, ModalInteraction,
};
use tracing::{debug, error, info, warn};

use crate::event::leaderboard::format_points;
use crate::event::roles::RoleGrant;
use crate::event::session::SignupSession;
use crate::utils::components::{self, ComponentId};
use crate::utils::embeds;
use crate::Data;

/// Route signup button presses and points dialogs into signup sessions.
pub async fn handle_event(ctx: &Context, event: &FullEvent, data: &Data) {
    if let FullEvent::InteractionCreate { interaction } = event {
        match interaction {
            Interaction::Component(press) => handle_press(ctx, press, data).await,
            Interaction::Modal(submit) => handle_submit(ctx, submit, data).await,
            _ => {}
        }
    }
}

fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

async fn answer_press(
    ctx: &Context,
    press: &ComponentInteraction,
    response: CreateInteractionResponse,
) {
    if let Err(e) = press.create_response(&ctx.http, response).await {
        error!(error = %e, user = %press.user.name, "Failed to answer signup button");
    }
}

async fn handle_press(ctx: &Context, press: &ComponentInteraction, data: &Data) {
    let Some(ComponentId::Signup { kind, tier }) = ComponentId::parse(&press.data.custom_id) else {
        debug!(custom_id = %press.data.custom_id, "Ignoring component interaction");
        return;
    };
    let Some(guild_id) = press.guild_id else {
        return;
    };

    let hub = data.hub(kind);
    let held = press
        .member
        .as_ref()
        .map(|member| member.roles.clone())
        .unwrap_or_default();

    // Discord drops the interaction after 3s, so the dialog goes out before any role calls.
    if let Err(e) = hub.store.require_config(guild_id).await {
        answer_press(ctx, press, ephemeral(e.user_message())).await;
        return;
    }
    let dialog = components::points_modal(kind, tier);
    answer_press(ctx, press, CreateInteractionResponse::Modal(dialog)).await;

    let mut session = SignupSession::new(kind, guild_id, press.user.id);
    let grant = match session.press(tier, &held, hub).await {
        Ok(grant) => grant,
        Err(e) => {
            warn!(kind = %kind, guild_id = %guild_id, error = %e, "Signup press failed after the dialog was shown");
            return;
        }
    };

    if let RoleGrant::Skipped(reason) = grant {
        warn!(kind = %kind, guild_id = %guild_id, user = %press.user.name, reason = %reason, "Signup continued without marker role");
        let Some(config) = hub.store.config(guild_id).await else {
            return;
        };
        let notice = embeds::warning_embed().description(format!(
            "⚠️ Could not give the {kind} participant role to {}. Check the bot's role permissions.",
            press.user.mention()
        ));
        if let Err(e) = config
            .admin_channel
            .send_message(&ctx.http, CreateMessage::new().embed(notice))
            .await
        {
            error!(error = %e, "Failed to report skipped role grant");
        }
    }
}

async fn handle_submit(ctx: &Context, submit: &ModalInteraction, data: &Data) {
    let Some(ComponentId::Points { kind, tier }) = ComponentId::parse(&submit.data.custom_id) else {
        debug!(custom_id = %submit.data.custom_id, "Ignoring modal submission");
        return;
    };
    let Some(guild_id) = submit.guild_id else {
        return;
    };

    let raw = components::points_value(&submit.data).unwrap_or_default();
    let display_name = submit
        .member
        .as_ref()
        .map(|member| member.display_name().to_string())
        .unwrap_or_else(|| submit.user.display_name().to_string());

    let mut session = SignupSession::awaiting(kind, guild_id, submit.user.id, tier);
    let content = match session.submit(&raw, &display_name, &data.hub(kind).store).await {
        Ok(entry) => format!(
            "✅ {} pts registered for {}!",
            format_points(entry.points),
            tier.label
        ),
        Err(e) => {
            info!(kind = %kind, user = %submit.user.name, error = %e, "Signup rejected");
            e.user_message()
        }
    };

    if let Err(e) = submit.create_response(&ctx.http, ephemeral(content)).await {
        error!(error = %e, user = %submit.user.name, "Failed to answer points dialog");
    }
}
