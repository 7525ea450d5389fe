pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod events;
pub mod gateway;
pub mod health;
pub mod utils;

use event::{EventHub, EventKind};
use gateway::SerenityGateway;

/// Shared data accessible across all Poise commands and event handlers.
pub struct Data {
    pub config: config::Config,
    pub gateway: SerenityGateway,
    pub rs: EventHub<SerenityGateway>,
    pub ws: EventHub<SerenityGateway>,
    pub start_time: std::time::Instant,
}

impl Data {
    pub fn hub(&self, kind: EventKind) -> &EventHub<SerenityGateway> {
        match kind {
            EventKind::Rs => &self.rs,
            EventKind::Ws => &self.ws,
        }
    }
}

/// Poise context alias used throughout the bot.
pub type Context<'a> = poise::Context<'a, Data, error::Error>;
