//! Bundled, read-only game lookup tables.
//!
//! The tables are compiled into the binary and parsed once on first use.
//! Parsers receive them as `&GameData` rather than reaching for a global.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use serde::Deserialize;

use crate::equipment::Slot;
use crate::types::CharacterClass;

const BUNDLED_GAME_DATA: &str = include_str!("../data/game_data.json");

static BUNDLED: LazyLock<GameData> = LazyLock::new(|| {
    GameData::from_json(BUNDLED_GAME_DATA).expect("bundled game data is valid JSON")
});

/// An area the session log records without a turn counter.
///
/// The encounter name is the only reliable marker, so the area, turn cost and
/// meat cost have to come from this table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokenArea {
    pub area: String,
    pub turns: u32,
    #[serde(default)]
    pub meat: i64,
}

/// On-disk shape of the game data document.
#[derive(Debug, Deserialize)]
struct RawGameData {
    outfits: HashMap<String, BTreeMap<Slot, String>>,
    skills: HashMap<String, i32>,
    guild_rewards: HashMap<String, CharacterClass>,
    semirares: Vec<String>,
    bad_moon: Vec<String>,
    broken_areas: HashMap<String, BrokenArea>,
}

/// Lookup tables shared by all parsers and the summary reducer.
///
/// All keys are stored lowercase; lookups are case-insensitive.
#[derive(Debug)]
pub struct GameData {
    outfits: HashMap<String, BTreeMap<Slot, String>>,
    skill_mp_costs: HashMap<String, i32>,
    guild_rewards: HashMap<String, CharacterClass>,
    semirares: HashSet<String>,
    bad_moon: HashSet<String>,
    broken_areas: HashMap<String, BrokenArea>,
}

fn lowercase_keys<V>(map: HashMap<String, V>) -> HashMap<String, V> {
    map.into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

fn lowercase_set(values: Vec<String>) -> HashSet<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

impl GameData {
    /// Returns the tables compiled into the crate.
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    /// Parses a game data document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawGameData = serde_json::from_str(json)?;
        Ok(Self {
            outfits: lowercase_keys(raw.outfits),
            skill_mp_costs: lowercase_keys(raw.skills),
            guild_rewards: lowercase_keys(raw.guild_rewards),
            semirares: lowercase_set(raw.semirares),
            bad_moon: lowercase_set(raw.bad_moon),
            broken_areas: lowercase_keys(raw.broken_areas),
        })
    }

    /// Slot membership of a named outfit.
    pub fn outfit(&self, name: &str) -> Option<&BTreeMap<Slot, String>> {
        self.outfits.get(&name.trim().to_lowercase())
    }

    /// MP cost of a single cast, 0 for unknown skills.
    pub fn skill_mp_cost(&self, skill: &str) -> i32 {
        self.skill_mp_costs
            .get(&skill.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// The class whose guild quest rewards this item, if any.
    pub fn guild_reward_class(&self, item: &str) -> Option<CharacterClass> {
        self.guild_rewards.get(&item.to_lowercase()).copied()
    }

    pub fn is_semirare(&self, encounter: &str) -> bool {
        self.semirares.contains(&encounter.to_lowercase())
    }

    pub fn is_bad_moon(&self, encounter: &str) -> bool {
        self.bad_moon.contains(&encounter.to_lowercase())
    }

    /// Looks up an encounter name in the known-broken area table.
    pub fn broken_area(&self, encounter: &str) -> Option<&BrokenArea> {
        self.broken_areas.get(&encounter.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_data_loads() {
        let data = GameData::bundled();
        assert!(data.outfit("Knob Goblin Elite Guard Uniform").is_some());
        assert_eq!(data.skill_mp_cost("Transcendent Olfaction"), 40);
        assert_eq!(data.skill_mp_cost("no such skill"), 0);
    }

    #[test]
    fn test_outfit_slots() {
        let outfit = GameData::bundled().outfit("mining gear").unwrap();
        assert_eq!(outfit.get(&Slot::Hat).map(String::as_str), Some("miner's helmet"));
        assert_eq!(outfit.get(&Slot::Pants).map(String::as_str), Some("miner's pants"));
        assert!(outfit.get(&Slot::Shirt).is_none());
    }

    #[test]
    fn test_guild_rewards_map_to_classes() {
        let data = GameData::bundled();
        assert_eq!(
            data.guild_reward_class("Disco Banjo"),
            Some(CharacterClass::DiscoBandit)
        );
        assert_eq!(data.guild_reward_class("seal tooth"), None);
    }

    #[test]
    fn test_broken_area_lookup() {
        let data = GameData::bundled();
        let vacation = data.broken_area("Vacation").unwrap();
        assert_eq!(vacation.turns, 3);
        assert_eq!(vacation.meat, 500);
        assert!(data.broken_area("Haunted Pantry").is_none());
    }

    #[test]
    fn test_special_encounter_sets() {
        let data = GameData::bundled();
        assert!(data.is_semirare("Knob Goblin Embezzler"));
        assert!(data.is_bad_moon("heart of darkness"));
        assert!(!data.is_semirare("Heart of Darkness"));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(GameData::from_json("{}").is_err());
    }
}
