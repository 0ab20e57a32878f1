//! Equipment slots and full-loadout snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An equipment slot, including the familiar item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Hat,
    Weapon,
    Offhand,
    Shirt,
    Pants,
    Acc1,
    Acc2,
    Acc3,
    Familiar,
}

impl Slot {
    pub const ALL: [Self; 9] = [
        Self::Hat,
        Self::Weapon,
        Self::Offhand,
        Self::Shirt,
        Self::Pants,
        Self::Acc1,
        Self::Acc2,
        Self::Acc3,
        Self::Familiar,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hat => "hat",
            Self::Weapon => "weapon",
            Self::Offhand => "offhand",
            Self::Shirt => "shirt",
            Self::Pants => "pants",
            Self::Acc1 => "acc1",
            Self::Acc2 => "acc2",
            Self::Acc3 => "acc3",
            Self::Familiar => "familiar",
        }
    }

    /// Parses the slot names used by the `equip`/`unequip` commands.
    pub fn from_command(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hat" => Some(Self::Hat),
            "weapon" => Some(Self::Weapon),
            "offhand" | "off-hand" => Some(Self::Offhand),
            "shirt" => Some(Self::Shirt),
            "pants" => Some(Self::Pants),
            "acc1" => Some(Self::Acc1),
            "acc2" => Some(Self::Acc2),
            "acc3" => Some(Self::Acc3),
            "familiar" | "familiarequip" => Some(Self::Familiar),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The complete loadout in effect from `turn` onward.
///
/// Every change is stored as a full snapshot derived from the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EquipmentChange {
    pub turn: u32,
    pub hat: Option<String>,
    pub weapon: Option<String>,
    pub offhand: Option<String>,
    pub shirt: Option<String>,
    pub pants: Option<String>,
    pub acc1: Option<String>,
    pub acc2: Option<String>,
    pub acc3: Option<String>,
    pub familiar_item: Option<String>,
    /// Set when the loadout came from an unresolvable custom outfit.
    #[serde(skip)]
    pub from_custom_outfit: bool,
}

impl EquipmentChange {
    /// An empty loadout at the given turn.
    pub fn empty(turn: u32) -> Self {
        Self {
            turn,
            ..Self::default()
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Hat => self.hat.as_deref(),
            Slot::Weapon => self.weapon.as_deref(),
            Slot::Offhand => self.offhand.as_deref(),
            Slot::Shirt => self.shirt.as_deref(),
            Slot::Pants => self.pants.as_deref(),
            Slot::Acc1 => self.acc1.as_deref(),
            Slot::Acc2 => self.acc2.as_deref(),
            Slot::Acc3 => self.acc3.as_deref(),
            Slot::Familiar => self.familiar_item.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Hat => &mut self.hat,
            Slot::Weapon => &mut self.weapon,
            Slot::Offhand => &mut self.offhand,
            Slot::Shirt => &mut self.shirt,
            Slot::Pants => &mut self.pants,
            Slot::Acc1 => &mut self.acc1,
            Slot::Acc2 => &mut self.acc2,
            Slot::Acc3 => &mut self.acc3,
            Slot::Familiar => &mut self.familiar_item,
        }
    }

    /// Returns a copy re-keyed to `turn` with one slot replaced.
    #[must_use]
    pub fn with_slot(&self, turn: u32, slot: Slot, item: Option<String>) -> Self {
        let mut next = self.clone();
        next.turn = turn;
        next.from_custom_outfit = false;
        *next.slot_mut(slot) = item;
        next
    }

    /// Returns a copy re-keyed to `turn` with several slots replaced.
    #[must_use]
    pub fn with_slots<'a, I>(&self, turn: u32, items: I) -> Self
    where
        I: IntoIterator<Item = (Slot, &'a String)>,
    {
        let mut next = self.clone();
        next.turn = turn;
        next.from_custom_outfit = false;
        for (slot, item) in items {
            *next.slot_mut(slot) = Some(item.clone());
        }
        next
    }

    /// Whether any slot holds the item (case-insensitive).
    pub fn is_wearing(&self, item: &str) -> bool {
        Slot::ALL
            .iter()
            .filter_map(|slot| self.get(*slot))
            .any(|worn| worn.eq_ignore_ascii_case(item))
    }

    /// Whether two snapshots hold the same items, ignoring their turns.
    pub fn same_loadout(&self, other: &Self) -> bool {
        Slot::ALL.iter().all(|slot| self.get(*slot) == other.get(*slot))
    }

    /// Iterates the occupied slots.
    pub fn worn(&self) -> impl Iterator<Item = (Slot, &str)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|item| (slot, item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_slot_keeps_other_slots() {
        let base = EquipmentChange::empty(0).with_slot(3, Slot::Pants, Some("jeans".into()));
        let next = base.with_slot(5, Slot::Hat, Some("iron helm".into()));

        assert_eq!(next.turn, 5);
        assert_eq!(next.get(Slot::Pants), Some("jeans"));
        assert_eq!(next.get(Slot::Hat), Some("iron helm"));
        assert_eq!(base.get(Slot::Hat), None);
    }

    #[test]
    fn test_same_loadout_ignores_turn() {
        let a = EquipmentChange::empty(0).with_slot(1, Slot::Acc1, Some("ring".into()));
        let b = EquipmentChange::empty(7).with_slot(9, Slot::Acc1, Some("ring".into()));
        assert!(a.same_loadout(&b));
        assert!(!a.same_loadout(&EquipmentChange::empty(1)));
    }

    #[test]
    fn test_slot_command_names() {
        assert_eq!(Slot::from_command("off-hand"), Some(Slot::Offhand));
        assert_eq!(Slot::from_command("FAMILIAR"), Some(Slot::Familiar));
        assert_eq!(Slot::from_command("cape"), None);
    }

    #[test]
    fn test_is_wearing_case_insensitive() {
        let eq = EquipmentChange::empty(0).with_slot(0, Slot::Pants, Some("Greatest American Pants".into()));
        assert!(eq.is_wearing("greatest american pants"));
        assert_eq!(eq.worn().count(), 1);
    }
}
