use serenity::all::CreateEmbed;

use crate::event::EventKind;

/// Regulus brand colors used across all bot embeds.
pub struct Colors;

impl Colors {
    pub const REGULUS: u32 = 0x3B82F6;
    pub const SUCCESS: u32 = 0x2ECC71;
    pub const WARNING: u32 = 0xFFD700;
    pub const ERROR: u32 = 0xFF4444;
    pub const LEADERBOARD: u32 = 0xF1C40F;
    pub const RS: u32 = 0x3498DB;
    pub const WS: u32 = 0x1ABC9C;
}

/// Create a standard Regulus-themed embed with default color, footer, and timestamp.
pub fn regulus_embed() -> CreateEmbed {
    base_embed(Colors::REGULUS)
}

/// Create a success-themed embed (green).
pub fn success_embed() -> CreateEmbed {
    base_embed(Colors::SUCCESS)
}

/// Create a warning-themed embed (gold).
pub fn warning_embed() -> CreateEmbed {
    base_embed(Colors::WARNING)
}

/// Create an error-themed embed (red).
pub fn error_embed() -> CreateEmbed {
    base_embed(Colors::ERROR)
}

/// Create a leaderboard embed (amber).
pub fn leaderboard_embed() -> CreateEmbed {
    base_embed(Colors::LEADERBOARD)
}

/// Create the signup embed for an event, colored per event kind.
pub fn event_embed(kind: EventKind) -> CreateEmbed {
    base_embed(match kind {
        EventKind::Rs => Colors::RS,
        EventKind::Ws => Colors::WS,
    })
}

fn base_embed(color: u32) -> CreateEmbed {
    CreateEmbed::default()
        .color(color)
        .footer(serenity::all::CreateEmbedFooter::new("Regulus-Bot"))
        .timestamp(serenity::model::Timestamp::now())
}
