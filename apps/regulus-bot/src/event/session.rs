//! Signup flow for one button press.
//!
//! ```text
//! Idle --press(tier)--> AwaitingPoints --submit(valid)--> Committed
//!   ^                        |      \
//!   +----submit(invalid)-----+       +--abandon--> Abandoned
//! ```
//!
//! Pressing grants the marker role right away, before any points are known.
//! Membership records intent; the committed entry records the prediction. An
//! abandoned dialog therefore leaves the role in place with no entry.
//!
//! Discord delivers the press and the dialog submission as two separate
//! interactions. The session is rebuilt for the second one with
//! [`SignupSession::awaiting`] from the tier encoded in the dialog's id.

use serenity::all::{GuildId, RoleId, UserId};
use tracing::info;

use super::entry::Entry;
use super::roles::{RoleGateway, RoleGrant};
use super::store::EntryStore;
use super::tier::Tier;
use super::{EventHub, EventKind};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingPoints { tier: &'static Tier },
    Committed(Entry),
    Abandoned,
}

#[derive(Debug)]
pub struct SignupSession {
    kind: EventKind,
    guild_id: GuildId,
    member_id: UserId,
    state: SessionState,
}

impl SignupSession {
    pub fn new(kind: EventKind, guild_id: GuildId, member_id: UserId) -> Self {
        Self {
            kind,
            guild_id,
            member_id,
            state: SessionState::Idle,
        }
    }

    /// A session whose tier was already chosen by an earlier press.
    pub fn awaiting(
        kind: EventKind,
        guild_id: GuildId,
        member_id: UserId,
        tier: &'static Tier,
    ) -> Self {
        Self {
            state: SessionState::AwaitingPoints { tier },
            ..Self::new(kind, guild_id, member_id)
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// `Idle -> AwaitingPoints`, granting the marker role on the way.
    ///
    /// `held` are the member's current roles. Fails only when the event is not
    /// set up; a role that cannot be granted is reported in the returned
    /// [`RoleGrant`] and the session still advances.
    pub async fn press<G: RoleGateway>(
        &mut self,
        tier: &'static Tier,
        held: &[RoleId],
        hub: &EventHub<G>,
    ) -> Result<RoleGrant, Error> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidTransition("a tier was already chosen"));
        }

        let grant = hub
            .roles
            .ensure_role(self.guild_id, self.member_id, held, &hub.store)
            .await?;
        self.state = SessionState::AwaitingPoints { tier };
        Ok(grant)
    }

    /// `AwaitingPoints -> Committed` on a valid number, back to `Idle` otherwise.
    pub async fn submit(
        &mut self,
        raw: &str,
        display_name: &str,
        store: &EntryStore,
    ) -> Result<Entry, Error> {
        let SessionState::AwaitingPoints { tier } = self.state else {
            return Err(Error::InvalidTransition("no tier has been chosen"));
        };

        store.require_config(self.guild_id).await?;

        let points = match parse_points(raw) {
            Ok(points) => points,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };

        let entry = Entry::new(self.member_id, display_name, tier.key, points);
        store.upsert(self.guild_id, entry.clone()).await?;
        info!(
            kind = %self.kind,
            guild_id = %self.guild_id,
            member_id = %self.member_id,
            tier = tier.key,
            points,
            "Signup committed"
        );

        self.state = SessionState::Committed(entry.clone());
        Ok(entry)
    }

    /// The dialog was dismissed. The role granted on press stays.
    pub fn abandon(&mut self) {
        if matches!(self.state, SessionState::AwaitingPoints { .. }) {
            self.state = SessionState::Abandoned;
        }
    }
}

/// Parses a points prediction typed into the dialog.
///
/// Surrounding whitespace and thousands separators (`,` and full-width `，`)
/// are ignored, full-width digits are accepted. Signs, decimals and values
/// beyond `u64` are rejected.
pub fn parse_points(raw: &str) -> Result<u64, Error> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，'))
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation(raw.to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| Error::Validation(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::roles::fake::FakeGateway;
    use crate::event::roles::RoleSync;
    use crate::event::tier;
    use serenity::all::ChannelId;

    const GUILD: GuildId = GuildId::new(1);
    const A: UserId = UserId::new(100);
    const B: UserId = UserId::new(200);
    const MARKER: RoleId = RoleId::new(50);

    async fn hub() -> (EventHub<FakeGateway>, FakeGateway) {
        let store = EntryStore::temp(EventKind::Rs).await;
        store
            .configure(GUILD, ChannelId::new(2), ChannelId::new(3))
            .await
            .unwrap();
        store.set_marker_role(GUILD, MARKER).await.unwrap();
        let gateway = FakeGateway::with_role(MARKER, "RS Event Runner");
        let hub = EventHub::new(
            EventKind::Rs,
            store,
            RoleSync::new(gateway.clone(), "RS Event Runner"),
        );
        (hub, gateway)
    }

    fn rs_tier(key: &str) -> &'static Tier {
        tier::find(EventKind::Rs, key).unwrap()
    }

    #[test]
    fn parses_points_with_separators() {
        assert_eq!(parse_points("250,000").unwrap(), 250_000);
        assert_eq!(parse_points("  90000 \n").unwrap(), 90_000);
        assert_eq!(parse_points("１２，３４５").unwrap(), 12_345);
        assert_eq!(parse_points("0").unwrap(), 0);
    }

    #[test]
    fn rejects_non_numeric_points() {
        for raw in ["abc", "", "   ", "-5", "+5", "1.5", "12 000", ",", "99999999999999999999999"] {
            assert!(
                matches!(parse_points(raw), Err(Error::Validation(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn member_changes_tier_by_resubmitting() {
        let (hub, gateway) = hub().await;

        let mut first = SignupSession::new(EventKind::Rs, GUILD, A);
        let grant = first.press(rs_tier("1"), &[], &hub).await.unwrap();
        assert_eq!(grant, RoleGrant::Granted(MARKER));
        let entry = first.submit("500000", "Alice", &hub.store).await.unwrap();
        assert_eq!(entry, Entry::new(A, "Alice", "1", 500_000));

        let mut second = SignupSession::new(EventKind::Rs, GUILD, A);
        let grant = second.press(rs_tier("3"), &[MARKER], &hub).await.unwrap();
        assert_eq!(grant, RoleGrant::AlreadyHeld(MARKER));
        second.submit("90000", "Alice", &hub.store).await.unwrap();

        let entries = hub.store.list_active(GUILD).await;
        assert_eq!(entries, [Entry::new(A, "Alice", "3", 90_000)]);
        assert_eq!(gateway.holders(MARKER), [A]);
        assert_eq!(gateway.grant_calls(), 1);

        let board = crate::event::leaderboard::project(entries);
        assert_eq!((board.count, board.total_points), (1, 90_000));
    }

    #[tokio::test]
    async fn abandoned_dialog_keeps_role_without_entry() {
        let (hub, gateway) = hub().await;

        let mut session = SignupSession::new(EventKind::Rs, GUILD, B);
        session.press(rs_tier("2"), &[], &hub).await.unwrap();
        session.abandon();

        assert_eq!(session.state(), &SessionState::Abandoned);
        assert!(hub.store.list_active(GUILD).await.is_empty());
        assert_eq!(gateway.holders(MARKER), [B]);
    }

    #[tokio::test]
    async fn invalid_points_return_to_idle_without_entry() {
        let (hub, _gateway) = hub().await;

        let mut session = SignupSession::awaiting(EventKind::Rs, GUILD, A, rs_tier("4"));
        for raw in ["abc", "", "-5"] {
            let mut attempt = SignupSession::awaiting(EventKind::Rs, GUILD, A, rs_tier("4"));
            assert!(matches!(
                attempt.submit(raw, "Alice", &hub.store).await,
                Err(Error::Validation(_))
            ));
            assert_eq!(attempt.state(), &SessionState::Idle);
        }
        assert!(hub.store.list_active(GUILD).await.is_empty());

        session.submit("60,000", "Alice", &hub.store).await.unwrap();
        assert_eq!(hub.store.list_active(GUILD).await[0].points, 60_000);
    }

    #[tokio::test]
    async fn submit_requires_a_chosen_tier() {
        let (hub, _gateway) = hub().await;
        let mut session = SignupSession::new(EventKind::Rs, GUILD, A);

        let result = session.submit("10", "Alice", &hub.store).await;

        assert!(matches!(result, Err(Error::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn press_without_setup_grants_nothing() {
        let store = EntryStore::temp(EventKind::Ws).await;
        let gateway = FakeGateway::default();
        let hub = EventHub::new(EventKind::Ws, store, RoleSync::new(gateway.clone(), "WS Pilot"));

        let tier = tier::find(EventKind::Ws, "captain").unwrap();
        let mut session = SignupSession::new(EventKind::Ws, GUILD, A);
        let result = session.press(tier, &[], &hub).await;

        assert!(matches!(result, Err(Error::ConfigurationMissing { kind: EventKind::Ws })));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn display_name_is_a_snapshot() {
        let (hub, _gateway) = hub().await;

        let mut session = SignupSession::awaiting(EventKind::Rs, GUILD, A, rs_tier("1"));
        session.submit("1", "Old Name", &hub.store).await.unwrap();

        assert_eq!(hub.store.list_active(GUILD).await[0].display_name, "Old Name");
    }
}
