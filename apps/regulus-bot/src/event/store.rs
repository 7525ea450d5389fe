//! Durable per-guild entry storage.
//!
//! Each guild's [`GuildRecord`] lives in `<data dir>/<event prefix>/<guild id>.json`.
//! All guilds are held in memory behind one mutex; every mutation rewrites the
//! affected guild's file before the lock is released, so a read-modify-write is
//! a single critical section and concurrent submissions never lose updates.
//! The in-memory record only changes after its file was written.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serenity::all::{ChannelId, GuildId, RoleId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::entry::{Entry, EventConfig, GuildRecord};
use super::EventKind;
use crate::error::Error;

/// A reset offers team roles in one select menu, which holds at most 25 options.
pub const MAX_TEAM_ROLES: usize = 25;

pub struct EntryStore {
    kind: EventKind,
    dir: PathBuf,
    guilds: Mutex<HashMap<GuildId, GuildRecord>>,
}

impl EntryStore {
    /// Opens the store for `kind` under `data_dir`, loading every saved guild.
    ///
    /// An unreadable or malformed guild file is an error rather than being
    /// skipped, so a bad file can never be overwritten with an empty record.
    pub async fn open(data_dir: impl AsRef<Path>, kind: EventKind) -> Result<Self, Error> {
        let dir = data_dir.as_ref().join(kind.prefix());
        tokio::fs::create_dir_all(&dir).await?;

        let mut guilds = HashMap::new();
        let mut files = tokio::fs::read_dir(&dir).await?;
        while let Some(file) = files.next_entry().await? {
            let path = file.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(guild_id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<NonZeroU64>().ok())
                .map(|id| GuildId::new(id.get()))
            else {
                warn!(path = %path.display(), "Ignoring data file without a guild id name");
                continue;
            };

            let text = tokio::fs::read_to_string(&path).await?;
            let record: GuildRecord = serde_json::from_str(&text).map_err(|e| {
                Error::Config(format!("Malformed data file {}: {e}", path.display()))
            })?;
            guilds.insert(guild_id, record);
        }

        info!(kind = %kind, guilds = guilds.len(), dir = %dir.display(), "Entry store loaded");

        Ok(Self {
            kind,
            dir,
            guilds: Mutex::new(guilds),
        })
    }

    /// Configuration of a set-up event, or `None` before `/<prefix>-event-setup`.
    pub async fn config(&self, guild_id: GuildId) -> Option<EventConfig> {
        self.guilds.lock().await.get(&guild_id)?.config()
    }

    /// Like [`Self::config`] but fails with [`Error::ConfigurationMissing`].
    pub async fn require_config(&self, guild_id: GuildId) -> Result<EventConfig, Error> {
        self.config(guild_id)
            .await
            .ok_or(Error::ConfigurationMissing { kind: self.kind })
    }

    /// Replaces the guild's record with a freshly set up one.
    pub async fn configure(
        &self,
        guild_id: GuildId,
        entry_channel: ChannelId,
        admin_channel: ChannelId,
    ) -> Result<(), Error> {
        self.update(guild_id, |record| {
            *record = GuildRecord::configured(entry_channel, admin_channel);
        })
        .await
    }

    pub async fn set_marker_role(&self, guild_id: GuildId, role_id: RoleId) -> Result<(), Error> {
        self.update_configured(guild_id, |record| {
            record.common_role = Some(role_id);
            Ok(())
        })
        .await
    }

    pub async fn add_team_role(
        &self,
        guild_id: GuildId,
        name: impl Into<String>,
        role_id: RoleId,
    ) -> Result<(), Error> {
        let name = name.into();
        self.update_configured(guild_id, |record| {
            record.team_roles.retain(|_, id| *id != role_id);
            if record.team_roles.len() >= MAX_TEAM_ROLES
                && !record.team_roles.contains_key(&name)
            {
                return Err(Error::Config(format!(
                    "An event can have at most {MAX_TEAM_ROLES} team roles."
                )));
            }
            record.team_roles.insert(name, role_id);
            Ok(())
        })
        .await
    }

    /// Inserts or replaces the member's entry. Returns the replaced entry.
    pub async fn upsert(&self, guild_id: GuildId, entry: Entry) -> Result<Option<Entry>, Error> {
        let member_id = entry.member_id;
        let previous = self
            .update(guild_id, |record| record.entries.upsert(entry))
            .await?;
        debug!(
            kind = %self.kind,
            guild_id = %guild_id,
            member_id = %member_id,
            replaced = previous.is_some(),
            "Entry stored"
        );
        Ok(previous)
    }

    /// All committed entries for the guild in first-submission order.
    pub async fn list_active(&self, guild_id: GuildId) -> Vec<Entry> {
        self.guilds
            .lock()
            .await
            .get(&guild_id)
            .map(|record| record.entries.to_vec())
            .unwrap_or_default()
    }

    /// Drops every entry for the guild, keeping its configuration.
    pub async fn clear(&self, guild_id: GuildId) -> Result<usize, Error> {
        self.update(guild_id, |record| record.entries.clear()).await
    }

    /// Applies `mutate` to a copy of the guild's record and keeps the copy only
    /// once it is on disk, so a failed write leaves memory unchanged.
    async fn update<T>(
        &self,
        guild_id: GuildId,
        mutate: impl FnOnce(&mut GuildRecord) -> T,
    ) -> Result<T, Error> {
        let mut guilds = self.guilds.lock().await;
        let mut record = guilds.get(&guild_id).cloned().unwrap_or_default();
        let out = mutate(&mut record);
        self.flush(guild_id, &record).await?;
        guilds.insert(guild_id, record);
        Ok(out)
    }

    async fn update_configured<T>(
        &self,
        guild_id: GuildId,
        mutate: impl FnOnce(&mut GuildRecord) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut guilds = self.guilds.lock().await;
        let Some(mut record) = guilds
            .get(&guild_id)
            .filter(|record| record.config().is_some())
            .cloned()
        else {
            return Err(Error::ConfigurationMissing { kind: self.kind });
        };
        let out = mutate(&mut record)?;
        self.flush(guild_id, &record).await?;
        guilds.insert(guild_id, record);
        Ok(out)
    }

    /// Writes the record next to its final path and renames it into place.
    async fn flush(&self, guild_id: GuildId, record: &GuildRecord) -> Result<(), Error> {
        let path = self.dir.join(format!("{guild_id}.json"));
        let tmp = self.dir.join(format!("{guild_id}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
impl EntryStore {
    /// Opens a store in a fresh directory under the system temp dir.
    pub(crate) async fn temp(kind: EventKind) -> Self {
        Self::open(temp_data_dir(), kind).await.unwrap()
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
pub(crate) fn temp_data_dir() -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);
    std::env::temp_dir().join(format!(
        "regulus-bot-test-{}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ))
}
