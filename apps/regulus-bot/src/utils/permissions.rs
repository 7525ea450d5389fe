use serenity::all::{Member, Permissions};

use crate::error::Error;
use crate::Context;

/// Check if a member has admin-level permissions.
pub fn is_admin(member: &Member) -> bool {
    has_admin(member.permissions)
}

fn has_admin(permissions: Option<Permissions>) -> bool {
    permissions.unwrap_or(Permissions::empty()).administrator()
}

/// Poise check for administrator-only commands.
pub async fn admin_only(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };
    Ok(is_admin(&member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_administrator_counts() {
        assert!(has_admin(Some(Permissions::ADMINISTRATOR)));
        assert!(!has_admin(Some(
            Permissions::MANAGE_ROLES | Permissions::KICK_MEMBERS
        )));
        assert!(!has_admin(None));
    }
}
