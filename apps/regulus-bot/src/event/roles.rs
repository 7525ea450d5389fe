//! Keeps the event's marker role in step with signups.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::all::{GuildId, RoleId, UserId};
use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::store::EntryStore;
use crate::error::Error;

/// The role operations the signup engine needs from Discord.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    /// All roles of the guild as `(id, name)` pairs, possibly from a cache.
    async fn roles(&self, guild_id: GuildId) -> Result<Vec<(RoleId, String)>, Error>;

    async fn create_role(&self, guild_id: GuildId, name: &str) -> Result<RoleId, Error>;

    async fn grant_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId)
        -> Result<(), Error>;

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), Error>;

    /// Every member currently holding the role.
    async fn role_members(&self, guild_id: GuildId, role_id: RoleId)
        -> Result<Vec<UserId>, Error>;
}

/// Result of [`RoleSync::ensure_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrant {
    Granted(RoleId),
    AlreadyHeld(RoleId),
    /// The role could not be resolved or granted; signup continues without it.
    Skipped(String),
}

/// Result of [`RoleSync::revoke_roles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevokeSummary {
    pub removed: usize,
    pub skipped: usize,
}

pub struct RoleSync<G> {
    gateway: G,
    role_name: String,
    // One lock per guild, held only while a missing role is being created.
    creating: Mutex<HashMap<GuildId, Arc<Mutex<()>>>>,
}

impl<G: RoleGateway> RoleSync<G> {
    /// `role_name` is used when the marker role has to be found or created by name.
    pub fn new(gateway: G, role_name: impl Into<String>) -> Self {
        Self {
            gateway,
            role_name: role_name.into(),
            creating: Mutex::new(HashMap::new()),
        }
    }

    /// Makes sure `user_id` holds the event's marker role.
    ///
    /// `held` are the roles the member already has, as delivered with the
    /// interaction. Only a missing event setup is an error; Discord failures
    /// come back as [`RoleGrant::Skipped`].
    pub async fn ensure_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        held: &[RoleId],
        store: &EntryStore,
    ) -> Result<RoleGrant, Error> {
        let role_id = match self.resolve_marker_role(guild_id, store).await {
            Ok(role_id) => role_id,
            Err(e @ Error::ConfigurationMissing { .. }) => return Err(e),
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Could not resolve marker role");
                return Ok(RoleGrant::Skipped(e.to_string()));
            }
        };

        if held.contains(&role_id) {
            return Ok(RoleGrant::AlreadyHeld(role_id));
        }

        match self.gateway.grant_role(guild_id, user_id, role_id).await {
            Ok(()) => {
                info!(guild_id = %guild_id, user_id = %user_id, role_id = %role_id, "Granted marker role");
                Ok(RoleGrant::Granted(role_id))
            }
            Err(e) => {
                warn!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    role_id = %role_id,
                    error = %e,
                    "Failed to grant marker role"
                );
                Ok(RoleGrant::Skipped(e.to_string()))
            }
        }
    }

    /// Configured marker role if it still exists, otherwise the role named
    /// `role_name`, created when missing. A newly found role is saved as the
    /// configured one.
    async fn resolve_marker_role(
        &self,
        guild_id: GuildId,
        store: &EntryStore,
    ) -> Result<RoleId, Error> {
        let config = store.require_config(guild_id).await?;
        let roles = self.gateway.roles(guild_id).await?;

        if let Some(configured) = config.marker_role {
            if roles.iter().any(|(id, _)| *id == configured) {
                return Ok(configured);
            }
            warn!(guild_id = %guild_id, role_id = %configured, "Configured marker role no longer exists");
        }

        if let Some((id, _)) = roles.iter().find(|(_, name)| *name == self.role_name) {
            self.save_marker_role(guild_id, *id, store).await;
            return Ok(*id);
        }

        let lock = self.creation_lock(guild_id).await;
        let _guard = lock.lock().await;

        // A press that held the lock before this one may have made the role already.
        let current = store.require_config(guild_id).await?;
        if let Some(resolved) = current
            .marker_role
            .filter(|id| Some(*id) != config.marker_role)
        {
            return Ok(resolved);
        }

        let role_id = self.gateway.create_role(guild_id, &self.role_name).await?;
        info!(guild_id = %guild_id, role_id = %role_id, name = %self.role_name, "Created marker role");
        self.save_marker_role(guild_id, role_id, store).await;
        Ok(role_id)
    }

    async fn save_marker_role(&self, guild_id: GuildId, role_id: RoleId, store: &EntryStore) {
        if let Err(e) = store.set_marker_role(guild_id, role_id).await {
            warn!(guild_id = %guild_id, error = %e, "Failed to save marker role");
        }
    }

    async fn creation_lock(&self, guild_id: GuildId) -> Arc<Mutex<()>> {
        let mut locks = self.creating.lock().await;
        Arc::clone(locks.entry(guild_id).or_default())
    }

    /// Removes each role from every member holding it.
    ///
    /// Failures never abort the batch: a role whose members cannot be listed
    /// is skipped entirely, a member the bot cannot edit counts as skipped.
    pub async fn revoke_roles(&self, guild_id: GuildId, role_ids: &[RoleId]) -> RevokeSummary {
        let mut summary = RevokeSummary::default();

        for &role_id in role_ids {
            let members = match self.gateway.role_members(guild_id, role_id).await {
                Ok(members) => members,
                Err(e) => {
                    warn!(guild_id = %guild_id, role_id = %role_id, error = %e, "Failed to list role members");
                    continue;
                }
            };

            for user_id in members {
                match self.gateway.revoke_role(guild_id, user_id, role_id).await {
                    Ok(()) => summary.removed += 1,
                    Err(e) => {
                        warn!(
                            guild_id = %guild_id,
                            user_id = %user_id,
                            role_id = %role_id,
                            error = %e,
                            "Failed to revoke role"
                        );
                        summary.skipped += 1;
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::{BTreeSet, HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct State {
        lookup_delay: Duration,
        roles: Vec<(RoleId, String)>,
        holders: HashMap<RoleId, BTreeSet<UserId>>,
        protected: HashSet<UserId>,
        next_id: u64,
        grants: usize,
        creates: usize,
    }

    /// In-memory guild that behaves like Discord for role calls.
    #[derive(Clone, Default)]
    pub(crate) struct FakeGateway {
        state: Arc<Mutex<State>>,
    }

    impl FakeGateway {
        pub(crate) fn with_role(role_id: RoleId, name: &str) -> Self {
            let gateway = Self::default();
            gateway.add_role(role_id, name);
            gateway
        }

        pub(crate) fn add_role(&self, role_id: RoleId, name: &str) {
            self.state
                .lock()
                .unwrap()
                .roles
                .push((role_id, name.to_string()));
        }

        pub(crate) fn give(&self, role_id: RoleId, user_id: UserId) {
            self.state
                .lock()
                .unwrap()
                .holders
                .entry(role_id)
                .or_default()
                .insert(user_id);
        }

        /// Every role lookup takes `delay`, like a round trip to Discord.
        pub(crate) fn slow_lookups(&self, delay: Duration) {
            self.state.lock().unwrap().lookup_delay = delay;
        }

        /// Role edits on this member fail as if the bot lacked permission.
        pub(crate) fn protect(&self, user_id: UserId) {
            self.state.lock().unwrap().protected.insert(user_id);
        }

        pub(crate) fn holders(&self, role_id: RoleId) -> Vec<UserId> {
            self.state
                .lock()
                .unwrap()
                .holders
                .get(&role_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        }

        pub(crate) fn role_ids(&self) -> Vec<RoleId> {
            self.state.lock().unwrap().roles.iter().map(|(id, _)| *id).collect()
        }

        pub(crate) fn grant_calls(&self) -> usize {
            self.state.lock().unwrap().grants
        }

        pub(crate) fn create_calls(&self) -> usize {
            self.state.lock().unwrap().creates
        }
    }

    fn denied(user_id: UserId) -> Error {
        Error::Permission(format!("cannot edit roles of {user_id}"))
    }

    #[async_trait]
    impl RoleGateway for FakeGateway {
        async fn roles(&self, _guild_id: GuildId) -> Result<Vec<(RoleId, String)>, Error> {
            let delay = self.state.lock().unwrap().lookup_delay;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(self.state.lock().unwrap().roles.clone())
        }

        async fn create_role(&self, _guild_id: GuildId, name: &str) -> Result<RoleId, Error> {
            // Yield so concurrent callers can interleave like real HTTP calls.
            tokio::task::yield_now().await;
            let mut state = self.state.lock().unwrap();
            state.creates += 1;
            state.next_id += 1;
            let id = RoleId::new(9_000 + state.next_id);
            state.roles.push((id, name.to_string()));
            Ok(id)
        }

        async fn grant_role(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
            role_id: RoleId,
        ) -> Result<(), Error> {
            let mut state = self.state.lock().unwrap();
            if state.protected.contains(&user_id) {
                return Err(denied(user_id));
            }
            state.grants += 1;
            state.holders.entry(role_id).or_default().insert(user_id);
            Ok(())
        }

        async fn revoke_role(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
            role_id: RoleId,
        ) -> Result<(), Error> {
            let mut state = self.state.lock().unwrap();
            if state.protected.contains(&user_id) {
                return Err(denied(user_id));
            }
            if let Some(holders) = state.holders.get_mut(&role_id) {
                holders.remove(&user_id);
            }
            Ok(())
        }

        async fn role_members(
            &self,
            _guild_id: GuildId,
            role_id: RoleId,
        ) -> Result<Vec<UserId>, Error> {
            let state = self.state.lock().unwrap();
            if !state.roles.iter().any(|(id, _)| *id == role_id) {
                return Err(Error::NotFound(format!("role {role_id}")));
            }
            Ok(state
                .holders
                .get(&role_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default())
        }
    }
}
