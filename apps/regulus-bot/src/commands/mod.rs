pub mod event;
pub mod general;
pub mod roles;
pub mod rs;
pub mod ws;

use crate::error::Error;
use crate::Data;

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        general::about(),
        general::help(),
        roles::pingrole(),
        roles::listrole(),
        rs::rs_event_setup(),
        rs::rs_commonrole(),
        rs::rs_teamrole(),
        rs::rs_entrypost(),
        rs::rs_list(),
        rs::rs_reset(),
        ws::ws_event_setup(),
        ws::ws_commonrole(),
        ws::ws_teamrole(),
        ws::ws_entrypost(),
        ws::ws_list(),
        ws::ws_reset(),
    ]
}
