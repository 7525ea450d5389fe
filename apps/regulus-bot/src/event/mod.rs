//! Event signup engine shared by the RS and WS events.
//!
//! A member presses a tier button, which grants the event's marker role and
//! opens a points dialog. Submitting the dialog commits an [`entry::Entry`] to
//! the [`store::EntryStore`]. Administrators read the committed entries through
//! the [`leaderboard`] projection and wipe them with [`EventHub::reset`].

pub mod entry;
pub mod leaderboard;
pub mod roles;
pub mod session;
pub mod store;
pub mod tier;

use std::fmt;

use serenity::all::{GuildId, RoleId};
use tracing::info;

use crate::error::Error;
use roles::{RoleGateway, RoleSync};
use store::EntryStore;

/// The recurring events the bot runs signups for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Rs,
    Ws,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Rs, EventKind::Ws];

    /// Lowercase prefix used for command names, component ids and data directories.
    pub fn prefix(self) -> &'static str {
        match self {
            EventKind::Rs => "rs",
            EventKind::Ws => "ws",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    pub fn tiers(self) -> &'static [tier::Tier] {
        tier::tiers_for(self)
    }

    /// Command an administrator has to run before signups work.
    pub fn setup_command(self) -> String {
        format!("/{}-event-setup", self.prefix())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Rs => f.write_str("RS"),
            EventKind::Ws => f.write_str("WS"),
        }
    }
}

/// Everything one event kind needs: its entries and its role bookkeeping.
pub struct EventHub<G> {
    pub kind: EventKind,
    pub store: EntryStore,
    pub roles: RoleSync<G>,
}

/// Outcome of an administrative reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Role removals that went through.
    pub removed: usize,
    /// Role removals the bot was not allowed to perform.
    pub skipped: usize,
    /// Entries deleted from the store.
    pub cleared: usize,
}

impl<G: RoleGateway> EventHub<G> {
    pub fn new(kind: EventKind, store: EntryStore, roles: RoleSync<G>) -> Self {
        Self { kind, store, roles }
    }

    /// Revokes the marker role and the `selected` team roles from every holder,
    /// then clears all entries.
    ///
    /// Individual role failures are counted in [`ResetSummary::skipped`]; only a
    /// missing setup or a failure to persist the cleared entries is an error.
    pub async fn reset(
        &self,
        guild_id: GuildId,
        selected: &[RoleId],
    ) -> Result<ResetSummary, Error> {
        let config = self.store.require_config(guild_id).await?;
        let role_ids = config.reset_roles(selected);
        let revoked = self.roles.revoke_roles(guild_id, &role_ids).await;
        let cleared = self.store.clear(guild_id).await?;

        info!(
            kind = %self.kind,
            guild_id = %guild_id,
            removed = revoked.removed,
            skipped = revoked.skipped,
            cleared,
            "Event reset"
        );

        Ok(ResetSummary {
            removed: revoked.removed,
            skipped: revoked.skipped,
            cleared,
        })
    }
}
