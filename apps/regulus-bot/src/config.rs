use std::path::PathBuf;

use crate::error::Error;
use serenity::all::GuildId;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub data_dir: PathBuf,
    pub guild_id: Option<GuildId>,
    pub port: u16,
    pub rs_role_name: String,
    pub ws_role_name: String,
    pub bot_version: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN` — Bot token from Discord Developer Portal
    ///
    /// Optional:
    /// - `DATA_DIR` — Where event data is saved (default `data`)
    /// - `GUILD_ID` — Register slash commands to this guild only
    /// - `PORT` — Liveness probe port (default 8080)
    /// - `RS_ROLE_NAME` / `WS_ROLE_NAME` — Marker role names used when no role is configured
    pub fn from_env() -> Result<Self, Error> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| Error::Config("DISCORD_TOKEN environment variable is required".into()))?;

        let data_dir = std::env::var("DATA_DIR")
            .ok()
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let guild_id = parse_optional_id::<GuildId>("GUILD_ID", std::env::var("GUILD_ID").ok())?;
        let port = parse_port(std::env::var("PORT").ok())?;

        Ok(Self {
            discord_token,
            data_dir,
            guild_id,
            port,
            rs_role_name: var_or("RS_ROLE_NAME", "RS Event Runner"),
            ws_role_name: var_or("WS_ROLE_NAME", "WS Pilot"),
            bot_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

fn var_or(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

fn parse_optional_id<T>(var: &str, value: Option<String>) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    match value {
        Some(val) if !val.is_empty() => {
            let id = val
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .ok_or_else(|| Error::Config(format!("Invalid ID for {var}: '{val}'")))?;
            Ok(Some(T::from(id)))
        }
        _ => Ok(None),
    }
}

fn parse_port(value: Option<String>) -> Result<u16, Error> {
    match value {
        Some(val) if !val.is_empty() => val
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("Invalid PORT: '{val}'"))),
        _ => Ok(8080),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_ids() {
        assert_eq!(
            parse_optional_id::<GuildId>("GUILD_ID", Some(" 1234 ".into())).unwrap(),
            Some(GuildId::new(1234))
        );
        assert_eq!(parse_optional_id::<GuildId>("GUILD_ID", None).unwrap(), None);
        assert_eq!(parse_optional_id::<GuildId>("GUILD_ID", Some(String::new())).unwrap(), None);
        assert!(parse_optional_id::<GuildId>("GUILD_ID", Some("0".into())).is_err());
        assert!(parse_optional_id::<GuildId>("GUILD_ID", Some("guild".into())).is_err());
    }

    #[test]
    fn port_defaults_to_8080() {
        assert_eq!(parse_port(None).unwrap(), 8080);
        assert_eq!(parse_port(Some("3000".into())).unwrap(), 3000);
        assert!(matches!(parse_port(Some("http".into())), Err(Error::Config(_))));
    }
}
