//! Discord-backed [`RoleGateway`].

use std::sync::Arc;

use serenity::all::{Cache, EditRole, GuildId, Http, Member, RoleId, UserId};
use serenity::async_trait;
use serenity::http::HttpError;

use crate::error::Error;
use crate::event::roles::RoleGateway;

const AUDIT_REASON: &str = "Event signup";
/// Largest page Discord returns from the list-members endpoint.
const MEMBER_PAGE: u64 = 1000;

#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    fn cached_roles(&self, guild_id: GuildId) -> Option<Vec<(RoleId, String)>> {
        let guild = self.cache.guild(guild_id)?;
        let roles = guild
            .roles
            .values()
            .map(|role| (role.id, role.name.clone()))
            .collect();
        Some(roles)
    }

    /// Every guild member holding `role_id`, fetched page by page.
    pub async fn members_with_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
    ) -> Result<Vec<Member>, Error> {
        let mut holders = Vec::new();
        let mut after = None;
        loop {
            let page = guild_id
                .members(&self.http, Some(MEMBER_PAGE), after)
                .await
                .map_err(|e| classify(e, format!("Members of server {guild_id}")))?;
            let len = page.len() as u64;
            after = page.last().map(|member| member.user.id);
            holders.extend(page.into_iter().filter(|m| m.roles.contains(&role_id)));
            if len < MEMBER_PAGE {
                return Ok(holders);
            }
        }
    }
}

/// Maps Discord's 403 and 404 answers onto [`Error::Permission`] and
/// [`Error::NotFound`]; everything else stays a Discord error.
pub fn classify(err: serenity::Error, what: impl Into<String>) -> Error {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        match response.status_code.as_u16() {
            403 => return Error::Permission(what.into()),
            404 => return Error::NotFound(what.into()),
            _ => {}
        }
    }
    Error::from(err)
}

#[async_trait]
impl RoleGateway for SerenityGateway {
    async fn roles(&self, guild_id: GuildId) -> Result<Vec<(RoleId, String)>, Error> {
        if let Some(roles) = self.cached_roles(guild_id) {
            return Ok(roles);
        }
        let roles = guild_id.roles(&self.http).await?;
        Ok(roles.into_values().map(|role| (role.id, role.name)).collect())
    }

    async fn create_role(&self, guild_id: GuildId, name: &str) -> Result<RoleId, Error> {
        let role = guild_id
            .create_role(
                self.http.as_ref(),
                EditRole::new().name(name).audit_log_reason(AUDIT_REASON),
            )
            .await
            .map_err(|e| classify(e, format!("Role '{name}'")))?;
        Ok(role.id)
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), Error> {
        self.http
            .add_member_role(guild_id, user_id, role_id, Some(AUDIT_REASON))
            .await
            .map_err(|e| classify(e, format!("Role <@&{role_id}> for <@{user_id}>")))
    }

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), Error> {
        self.http
            .remove_member_role(guild_id, user_id, role_id, Some("Event reset"))
            .await
            .map_err(|e| classify(e, format!("Role <@&{role_id}> for <@{user_id}>")))
    }

    async fn role_members(&self, guild_id: GuildId, role_id: RoleId) -> Result<Vec<UserId>, Error> {
        let members = self.members_with_role(guild_id, role_id).await?;
        Ok(members.into_iter().map(|member| member.user.id).collect())
    }
}
