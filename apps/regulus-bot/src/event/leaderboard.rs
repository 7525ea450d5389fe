//! Ranked view over committed entries.

use super::entry::Entry;
use super::tier::{self, Tier};
use super::EventKind;

/// Discord caps embed descriptions at 4096 characters.
const DESCRIPTION_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    /// Entries by points, highest first. Ties keep submission order.
    pub ranked: Vec<Entry>,
    pub count: usize,
    pub total_points: u64,
}

/// Ranks `entries` by points, highest first.
pub fn project(entries: Vec<Entry>) -> Leaderboard {
    let mut ranked = entries;
    ranked.sort_by(|a, b| b.points.cmp(&a.points));

    Leaderboard {
        count: ranked.len(),
        total_points: ranked
            .iter()
            .fold(0u64, |sum, entry| sum.saturating_add(entry.points)),
        ranked,
    }
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Head-count per tier, in button order.
    pub fn tier_counts(&self, kind: EventKind) -> Vec<(&'static Tier, usize)> {
        kind.tiers()
            .iter()
            .map(|tier| {
                let count = self.ranked.iter().filter(|e| e.tier == tier.key).count();
                (tier, count)
            })
            .collect()
    }

    /// One line per entry, `1. Name — 500,000 pts (1️⃣)`, cut short with a
    /// trailing count when it would not fit in an embed.
    pub fn render_lines(&self, kind: EventKind) -> String {
        let mut out = String::new();
        for (index, entry) in self.ranked.iter().enumerate() {
            let line = format!(
                "{}. {} — {} pts ({})\n",
                index + 1,
                entry.display_name,
                format_points(entry.points),
                tier::label_for(kind, &entry.tier)
            );
            // Leave room for the overflow notice.
            if out.len() + line.len() > DESCRIPTION_LIMIT - 32 {
                out.push_str(&format!("…and {} more", self.ranked.len() - index));
                return out;
            }
            out.push_str(&line);
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// `1234567` → `1,234,567`.
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::UserId;

    fn entry(id: u64, points: u64, tier: &str) -> Entry {
        Entry::new(UserId::new(id), format!("member{id}"), tier, points)
    }

    #[test]
    fn ranks_by_points_descending_with_stable_ties() {
        let board = project(vec![
            entry(1, 100, "4"),
            entry(2, 500, "1"),
            entry(3, 100, "4"),
            entry(4, 300, "2"),
        ]);

        let order: Vec<_> = board.ranked.iter().map(|e| e.member_id.get()).collect();
        assert_eq!(order, [2, 4, 1, 3]);
        assert_eq!(board.count, 4);
        assert_eq!(board.total_points, 1_000);
    }

    #[test]
    fn projection_is_idempotent_and_order_independent() {
        let entries = vec![entry(1, 10, "5"), entry(2, 30, "5"), entry(3, 20, "5")];
        let once = project(entries.clone());
        assert_eq!(project(entries.clone()), once);
        assert_eq!(project(once.ranked.clone()), once);

        let mut reversed = entries;
        reversed.reverse();
        let points: Vec<_> = project(reversed).ranked.iter().map(|e| e.points).collect();
        assert_eq!(points, [30, 20, 10]);
    }

    #[test]
    fn empty_board() {
        let board = project(Vec::new());
        assert!(board.is_empty());
        assert_eq!((board.count, board.total_points), (0, 0));
        assert_eq!(board.render_lines(EventKind::Rs), "");
    }

    #[test]
    fn counts_tiers_in_button_order() {
        let board = project(vec![entry(1, 1, "captain"), entry(2, 2, "3"), entry(3, 3, "3")]);
        let counts: Vec<_> = board
            .tier_counts(EventKind::Ws)
            .into_iter()
            .map(|(tier, count)| (tier.key, count))
            .collect();
        assert_eq!(
            counts,
            [("captain", 1), ("1", 0), ("2", 0), ("3", 2), ("4", 0)]
        );
    }

    #[test]
    fn renders_ranked_lines() {
        let board = project(vec![entry(1, 90_000, "3"), entry(2, 500_000, "1")]);
        assert_eq!(
            board.render_lines(EventKind::Rs),
            "1. member2 — 500,000 pts (1️⃣)\n2. member1 — 90,000 pts (3️⃣)"
        );
    }

    #[test]
    fn long_boards_are_cut_to_embed_size() {
        let board = project((1..=500).map(|id| entry(id, id, "5")).collect());
        let text = board.render_lines(EventKind::Rs);
        assert!(text.len() <= DESCRIPTION_LIMIT);
        assert!(text.ends_with("more"));
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_points(0), "0");
        assert_eq!(format_points(999), "999");
        assert_eq!(format_points(1_000), "1,000");
        assert_eq!(format_points(250_000), "250,000");
        assert_eq!(format_points(1_234_567), "1,234,567");
    }
}
