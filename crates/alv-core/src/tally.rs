//! Per-turn and per-interval accumulators.
//!
//! A `TurnTally` is attached to every `SingleTurn` and to every
//! `TurnInterval` (for data that is not tied to one turn). Interval totals are
//! the interval tally plus the tallies of its turns.

use std::ops::AddAssign;

use serde::Serialize;

use crate::types::Stat;

/// Substat gains split by stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatGain {
    pub muscle: i32,
    pub mysticality: i32,
    pub moxie: i32,
}

impl StatGain {
    pub const fn new(muscle: i32, mysticality: i32, moxie: i32) -> Self {
        Self {
            muscle,
            mysticality,
            moxie,
        }
    }

    pub const fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Muscle => self.muscle,
            Stat::Mysticality => self.mysticality,
            Stat::Moxie => self.moxie,
        }
    }

    pub fn add_stat(&mut self, stat: Stat, amount: i32) {
        match stat {
            Stat::Muscle => self.muscle += amount,
            Stat::Mysticality => self.mysticality += amount,
            Stat::Moxie => self.moxie += amount,
        }
    }

    pub const fn total(&self) -> i32 {
        self.muscle + self.mysticality + self.moxie
    }

    pub const fn is_zero(&self) -> bool {
        self.muscle == 0 && self.mysticality == 0 && self.moxie == 0
    }
}

impl AddAssign for StatGain {
    fn add_assign(&mut self, rhs: Self) {
        self.muscle += rhs.muscle;
        self.mysticality += rhs.mysticality;
        self.moxie += rhs.moxie;
    }
}

/// Meat gained and spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeatFlow {
    pub gained: i64,
    pub spent: i64,
}

impl MeatFlow {
    pub const fn net(&self) -> i64 {
        self.gained - self.spent
    }
}

impl AddAssign for MeatFlow {
    fn add_assign(&mut self, rhs: Self) {
        self.gained += rhs.gained;
        self.spent += rhs.spent;
    }
}

/// Where an MP gain came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MpSource {
    Encounter,
    Resting,
    Starfish,
    Consumable,
    #[default]
    Other,
}

/// MP gains split by source.
///
/// The encounter accumulator can go negative inside a turn: starfish MP is
/// subtracted from it before the after-battle total is added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MpGain {
    pub encounter: i32,
    pub resting: i32,
    pub starfish: i32,
    pub consumable: i32,
    pub other: i32,
}

impl MpGain {
    pub fn add(&mut self, source: MpSource, amount: i32) {
        match source {
            MpSource::Encounter => self.encounter += amount,
            MpSource::Resting => self.resting += amount,
            MpSource::Starfish => self.starfish += amount,
            MpSource::Consumable => self.consumable += amount,
            MpSource::Other => self.other += amount,
        }
    }

    pub const fn total(&self) -> i32 {
        self.encounter + self.resting + self.starfish + self.consumable + self.other
    }
}

impl AddAssign for MpGain {
    fn add_assign(&mut self, rhs: Self) {
        self.encounter += rhs.encounter;
        self.resting += rhs.resting;
        self.starfish += rhs.starfish;
        self.consumable += rhs.consumable;
        self.other += rhs.other;
    }
}

/// An acquired item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub name: String,
    pub amount: i32,
    pub turn: u32,
}

/// Consumable category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumableKind {
    Food,
    Booze,
    Other,
}

impl ConsumableKind {
    /// Maps the log verb (`eat`, `drink`, `use`, `Buy`) to a kind.
    pub fn from_verb(verb: &str) -> Self {
        match verb.to_ascii_lowercase().as_str() {
            "eat" => Self::Food,
            "drink" => Self::Booze,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Booze => "booze",
            Self::Other => "other",
        }
    }
}

/// A used consumable, tagged with the day it was used on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consumable {
    pub name: String,
    pub amount: i32,
    pub kind: ConsumableKind,
    pub turn: u32,
    pub day: u32,
    pub adventure_gain: i32,
    pub stat_gain: StatGain,
}

impl Consumable {
    pub fn new(name: impl Into<String>, amount: i32, kind: ConsumableKind, turn: u32, day: u32) -> Self {
        Self {
            name: name.into(),
            amount,
            kind,
            turn,
            day,
            adventure_gain: 0,
            stat_gain: StatGain::default(),
        }
    }

    /// Whether two records refer to the same consumable, ignoring the day.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// Casts of one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCast {
    pub name: String,
    pub amount: i32,
    pub turn: u32,
}

/// Everything that can be gained or spent during a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnTally {
    pub meat: MeatFlow,
    pub stat_gain: StatGain,
    pub mp_gain: MpGain,
    pub adventures_gained: i32,
    pub drops: Vec<Item>,
    pub consumables: Vec<Consumable>,
    pub skills: Vec<SkillCast>,
}

impl TurnTally {
    /// Moves all of `other` into `self`.
    pub fn absorb(&mut self, other: Self) {
        self.meat += other.meat;
        self.stat_gain += other.stat_gain;
        self.mp_gain += other.mp_gain;
        self.adventures_gained += other.adventures_gained;
        self.drops.extend(other.drops);
        self.consumables.extend(other.consumables);
        self.skills.extend(other.skills);
    }

    /// Adds `other` into `self` without consuming it.
    pub fn merge_from(&mut self, other: &Self) {
        self.absorb(other.clone());
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn add_drop(&mut self, name: impl Into<String>, amount: i32, turn: u32) {
        self.drops.push(Item {
            name: name.into(),
            amount,
            turn,
        });
    }

    pub fn add_skill(&mut self, name: impl Into<String>, amount: i32, turn: u32) {
        self.skills.push(SkillCast {
            name: name.into(),
            amount,
            turn,
        });
    }

    /// Whether a skill (case-insensitive) was cast during this tally.
    pub fn cast(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.name.eq_ignore_ascii_case(skill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_sums_and_concatenates() {
        let mut a = TurnTally::default();
        a.meat.gained = 10;
        a.add_drop("tomato", 1, 3);

        let mut b = TurnTally::default();
        b.meat.gained = 5;
        b.meat.spent = 2;
        b.stat_gain.add_stat(Stat::Moxie, 4);
        b.add_drop("seal tooth", 2, 4);

        a.absorb(b);
        assert_eq!(a.meat, MeatFlow { gained: 15, spent: 2 });
        assert_eq!(a.stat_gain.moxie, 4);
        assert_eq!(a.drops.len(), 2);
    }

    #[test]
    fn test_mp_gain_by_source() {
        let mut mp = MpGain::default();
        mp.add(MpSource::Encounter, 10);
        mp.add(MpSource::Starfish, 4);
        mp.add(MpSource::Encounter, -4);
        assert_eq!(mp.encounter, 6);
        assert_eq!(mp.starfish, 4);
        assert_eq!(mp.total(), 10);
    }

    #[test]
    fn test_consumable_identity_ignores_day_and_case() {
        let a = Consumable::new("Hell Ramen", 1, ConsumableKind::Food, 10, 1);
        let b = Consumable::new("hell ramen", 2, ConsumableKind::Food, 300, 3);
        let c = Consumable::new("hell ramen", 1, ConsumableKind::Other, 300, 3);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_kind_from_verb() {
        assert_eq!(ConsumableKind::from_verb("eat"), ConsumableKind::Food);
        assert_eq!(ConsumableKind::from_verb("drink"), ConsumableKind::Booze);
        assert_eq!(ConsumableKind::from_verb("Buy"), ConsumableKind::Other);
    }

    #[test]
    fn test_empty_tally() {
        let mut tally = TurnTally::default();
        assert!(tally.is_empty());
        tally.add_skill("saucy salve", 1, 0);
        assert!(!tally.is_empty());
        assert!(tally.cast("Saucy Salve"));
    }
}
