//! Custom ids and builders for the signup buttons and points dialog.
//!
//! The whole signup state that has to outlive one interaction is encoded in
//! the component's custom id: `signup:<event>:<tier>` on buttons and
//! `points:<event>:<tier>` on the dialog.

use serenity::all::{
    ActionRowComponent, ButtonStyle, CreateActionRow, CreateButton, CreateInputText, CreateModal,
    InputTextStyle, ModalInteractionData,
};

use crate::event::tier::{self, Tier};
use crate::event::EventKind;

const SIGNUP: &str = "signup";
const POINTS: &str = "points";
const POINTS_FIELD: &str = "points_value";
/// Discord allows at most five buttons per action row.
const BUTTONS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    Signup {
        kind: EventKind,
        tier: &'static Tier,
    },
    Points {
        kind: EventKind,
        tier: &'static Tier,
    },
}

impl ComponentId {
    /// Decodes a custom id, `None` for ids this bot did not issue.
    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.splitn(3, ':');
        let (action, prefix, key) = (parts.next()?, parts.next()?, parts.next()?);
        let kind = EventKind::from_prefix(prefix)?;
        let tier = tier::find(kind, key)?;
        match action {
            SIGNUP => Some(Self::Signup { kind, tier }),
            POINTS => Some(Self::Points { kind, tier }),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        let (action, kind, tier) = match self {
            Self::Signup { kind, tier } => (SIGNUP, kind, tier),
            Self::Points { kind, tier } => (POINTS, kind, tier),
        };
        format!("{action}:{}:{}", kind.prefix(), tier.key)
    }
}

/// One button per tier, in tier order.
pub fn signup_buttons(kind: EventKind) -> Vec<CreateActionRow> {
    let buttons: Vec<CreateButton> = kind
        .tiers()
        .iter()
        .map(|tier| {
            CreateButton::new(ComponentId::Signup { kind, tier }.encode())
                .label(tier.label)
                .style(ButtonStyle::Primary)
        })
        .collect();

    buttons
        .chunks(BUTTONS_PER_ROW)
        .map(|row| CreateActionRow::Buttons(row.to_vec()))
        .collect()
}

/// Dialog asking for the points prediction of `tier`.
pub fn points_modal(kind: EventKind, tier: &'static Tier) -> CreateModal {
    let input = CreateInputText::new(InputTextStyle::Short, tier.prompt, POINTS_FIELD)
        .placeholder("e.g. 250000")
        .required(true)
        .max_length(32);

    CreateModal::new(
        ComponentId::Points { kind, tier }.encode(),
        format!("{kind} event: {} points", tier.label),
    )
    .components(vec![CreateActionRow::InputText(input)])
}

/// The raw text typed into the points field.
pub fn points_value(data: &ModalInteractionData) -> Option<String> {
    data.components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == POINTS_FIELD => {
                Some(input.value.clone().unwrap_or_default())
            }
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_for_every_tier() {
        for kind in EventKind::ALL {
            for tier in kind.tiers() {
                for id in [ComponentId::Signup { kind, tier }, ComponentId::Points { kind, tier }] {
                    assert_eq!(ComponentId::parse(&id.encode()), Some(id));
                }
            }
        }
    }

    #[test]
    fn encodes_readable_ids() {
        let tier = tier::find(EventKind::Ws, "captain").unwrap();
        assert_eq!(
            ComponentId::Signup { kind: EventKind::Ws, tier }.encode(),
            "signup:ws:captain"
        );
    }

    #[test]
    fn foreign_ids_are_ignored() {
        for id in ["", "signup", "signup:rs", "signup:xx:1", "signup:rs:captain", "reset:rs:1"] {
            assert_eq!(ComponentId::parse(id), None, "{id}");
        }
    }

    #[test]
    fn one_row_holds_all_tiers() {
        assert_eq!(signup_buttons(EventKind::Rs).len(), 1);
        assert_eq!(signup_buttons(EventKind::Ws).len(), 1);
    }
}
