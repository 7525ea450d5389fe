//! Signup entries and the per-guild record they are persisted in.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serenity::all::{ChannelId, RoleId, UserId};

/// A member's committed tier and points prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub member_id: UserId,
    /// Display name captured at submission time.
    pub display_name: String,
    /// Key of the chosen [`super::tier::Tier`].
    pub tier: String,
    pub points: u64,
}

impl Entry {
    pub fn new(
        member_id: UserId,
        display_name: impl Into<String>,
        tier: impl Into<String>,
        points: u64,
    ) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            tier: tier.into(),
            points,
        }
    }
}

/// Entries of one guild, keyed by member and kept in first-submission order.
///
/// Serialized as a JSON object `{ "<member id>": { name, tier, points } }`.
/// Document order is preserved when reading so leaderboard ties stay stable
/// across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries(Vec<Entry>);

impl Entries {
    /// Inserts `entry`, replacing the member's previous entry in place.
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        match self.0.iter_mut().find(|e| e.member_id == entry.member_id) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.0.push(entry);
                None
            }
        }
    }

    pub fn get(&self, member_id: UserId) -> Option<&Entry> {
        self.0.iter().find(|e| e.member_id == member_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.0.iter()
    }

    /// Removes every entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.0.len();
        self.0.clear();
        count
    }

    pub fn to_vec(&self) -> Vec<Entry> {
        self.0.clone()
    }
}

#[derive(Serialize)]
struct EntryBodyRef<'a> {
    name: &'a str,
    tier: &'a str,
    points: u64,
}

#[derive(Deserialize)]
struct EntryBody {
    name: String,
    tier: String,
    points: u64,
}

impl Serialize for Entries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(
                &entry.member_id.get().to_string(),
                &EntryBodyRef {
                    name: &entry.display_name,
                    tier: &entry.tier,
                    points: entry.points,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of member ids to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Entries, A::Error> {
                let mut entries = Entries::default();
                while let Some((key, body)) = access.next_entry::<String, EntryBody>()? {
                    let id = key
                        .parse::<NonZeroU64>()
                        .map_err(|_| de::Error::custom(format!("invalid member id '{key}'")))?;
                    entries.upsert(Entry {
                        member_id: UserId::new(id.get()),
                        display_name: body.name,
                        tier: body.tier,
                        points: body.points,
                    });
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Persisted state of one event in one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    pub entry_channel: Option<ChannelId>,
    pub admin_channel: Option<ChannelId>,
    /// Marker role granted to everyone who pressed a signup button.
    pub common_role: Option<RoleId>,
    #[serde(default)]
    pub entries: Entries,
    /// Extra roles offered by the reset flow, keyed by role name.
    #[serde(default)]
    pub team_roles: BTreeMap<String, RoleId>,
}

impl GuildRecord {
    /// A fresh record for a newly set up event. Entries and roles start empty.
    pub fn configured(entry_channel: ChannelId, admin_channel: ChannelId) -> Self {
        Self {
            entry_channel: Some(entry_channel),
            admin_channel: Some(admin_channel),
            ..Self::default()
        }
    }

    pub fn config(&self) -> Option<EventConfig> {
        Some(EventConfig {
            entry_channel: self.entry_channel?,
            admin_channel: self.admin_channel?,
            marker_role: self.common_role,
            team_roles: self.team_roles.clone(),
        })
    }
}

/// Channels and roles of a set-up event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    pub entry_channel: ChannelId,
    pub admin_channel: ChannelId,
    pub marker_role: Option<RoleId>,
    pub team_roles: BTreeMap<String, RoleId>,
}

impl EventConfig {
    /// Roles a reset strips: always the marker role, plus whichever of the
    /// configured team roles were `selected`. Marker first, no duplicates.
    pub fn reset_roles(&self, selected: &[RoleId]) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = self.marker_role.into_iter().collect();
        for role in self.team_roles.values() {
            if selected.contains(role) && !roles.contains(role) {
                roles.push(*role);
            }
        }
        roles
    }
}
