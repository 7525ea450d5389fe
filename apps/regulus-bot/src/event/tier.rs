//! Fixed effort tiers offered on each event's signup message.

use super::EventKind;

/// One signup button and the dialog it opens.
#[derive(Debug, PartialEq, Eq)]
pub struct Tier {
    /// Stable key stored with entries and encoded in component ids.
    pub key: &'static str,
    /// Button label.
    pub label: &'static str,
    pub description: &'static str,
    /// Label of the points field in the follow-up dialog.
    pub prompt: &'static str,
}

const RS_PROMPT: &str = "Your expected RS points";
const WS_PROMPT: &str = "Your expected WS points";

const RS_TIERS: &[Tier] = &[
    Tier {
        key: "1",
        label: "1️⃣",
        description: "500k pts or more",
        prompt: RS_PROMPT,
    },
    Tier {
        key: "2",
        label: "2️⃣",
        description: "250k to 500k pts",
        prompt: RS_PROMPT,
    },
    Tier {
        key: "3",
        label: "3️⃣",
        description: "100k to 250k pts",
        prompt: RS_PROMPT,
    },
    Tier {
        key: "4",
        label: "4️⃣",
        description: "50k to 100k pts",
        prompt: RS_PROMPT,
    },
    Tier {
        key: "5",
        label: "5️⃣",
        description: "Under 50k pts",
        prompt: RS_PROMPT,
    },
];

const WS_TIERS: &[Tier] = &[
    Tier {
        key: "captain",
        label: "⭐️",
        description: "Captain: interested in tactics and leading the match, can run \
                      wskill and relic math (press regardless of activity)",
        prompt: WS_PROMPT,
    },
    Tier {
        key: "1",
        label: "1️⃣",
        description: "Superman: checks the WS often on their own, responds within 30 minutes to 2 hours",
        prompt: WS_PROMPT,
    },
    Tier {
        key: "2",
        label: "2️⃣",
        description: "Active: answers pings quickly, watches teleports and leap landings while awake",
        prompt: WS_PROMPT,
    },
    Tier {
        key: "3",
        label: "3️⃣",
        description: "Casual: checks in about four times a day, responds within 4 to 6 hours",
        prompt: WS_PROMPT,
    },
    Tier {
        key: "4",
        label: "4️⃣",
        description: "Relaxed: checks in morning and evening, here for a laid-back WS",
        prompt: WS_PROMPT,
    },
];

/// Tiers for `kind`, in button order.
pub fn tiers_for(kind: EventKind) -> &'static [Tier] {
    match kind {
        EventKind::Rs => RS_TIERS,
        EventKind::Ws => WS_TIERS,
    }
}

pub fn find(kind: EventKind, key: &str) -> Option<&'static Tier> {
    tiers_for(kind).iter().find(|tier| tier.key == key)
}

/// Button label for a stored tier key, falling back to the key itself.
pub fn label_for(kind: EventKind, key: &str) -> String {
    find(kind, key).map_or_else(|| key.to_string(), |tier| tier.label.to_string())
}
