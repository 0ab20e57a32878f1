//! Turns spent on quests, measured over windows of the interval sequence.

use serde::Serialize;

use crate::turn::TurnInterval;

fn same_area(interval: &TurnInterval, area: &str) -> bool {
    interval.area().eq_ignore_ascii_case(area)
}

/// Turns spent in any of `areas`.
pub fn turns_in_areas(intervals: &[TurnInterval], areas: &[&str]) -> u32 {
    intervals
        .iter()
        .filter(|interval| areas.iter().any(|area| same_area(interval, area)))
        .map(TurnInterval::turn_count)
        .sum()
}

/// Turns spent in `area` before `until` first appears.
pub fn turns_in_area_until(intervals: &[TurnInterval], area: &str, until: &str) -> u32 {
    intervals
        .iter()
        .take_while(|interval| !same_area(interval, until))
        .filter(|interval| same_area(interval, area))
        .map(TurnInterval::turn_count)
        .sum()
}

/// Turns spent in `area` once `prerequisite` has appeared, optionally only
/// until `until` first appears after that.
pub fn turns_in_area_after(
    intervals: &[TurnInterval],
    area: &str,
    prerequisite: &str,
    until: Option<&str>,
) -> u32 {
    let Some(opened) = intervals
        .iter()
        .position(|interval| same_area(interval, prerequisite))
    else {
        return 0;
    };
    intervals[opened..]
        .iter()
        .take_while(|interval| until.is_none_or(|until| !same_area(interval, until)))
        .filter(|interval| same_area(interval, area))
        .map(TurnInterval::turn_count)
        .sum()
}

const BAT_HOLE: [&str; 4] = [
    "Guano Junction",
    "The Batrat and Ratbat Burrow",
    "The Beanbat Chamber",
    "The Boss Bat's Lair",
];

const KNOB_KING: [&str; 2] = ["Cobb's Knob Harem", "Throne Room"];

const FRIARS: [&str; 3] = [
    "The Dark Neck of the Woods",
    "The Dark Heart of the Woods",
    "The Dark Elbow of the Woods",
];

const CYRPT: [&str; 5] = [
    "The Defiled Alcove",
    "The Defiled Cranny",
    "The Defiled Niche",
    "The Defiled Nook",
    "Haert of the Cyrpt",
];

const TRAPZOR: [&str; 5] = [
    "Itznotyerzitz Mine",
    "The Goatlet",
    "Lair of the Ninja Snowmen",
    "The eXtreme Slope",
    "Mist-Shrouded Peak",
];

const CASTLE: [&str; 3] = [
    "The Castle in the Clouds in the Sky (Basement)",
    "The Castle in the Clouds in the Sky (Ground Floor)",
    "The Castle in the Clouds in the Sky (Top Floor)",
];

const HIDDEN_CITY: [&str; 6] = [
    "The Hidden Park",
    "The Hidden Apartment Building",
    "The Hidden Hospital",
    "The Hidden Office Building",
    "The Hidden Bowling Alley",
    "A Massive Ziggurat",
];

const SPOOKYRAVEN_CELLAR: [&str; 4] = [
    "The Haunted Wine Cellar",
    "The Haunted Laundry Room",
    "The Haunted Boiler Room",
    "Summoning Chamber",
];

const DESERT: [&str; 2] = ["The Arid, Extra-Dry Desert", "The Oasis"];

const PYRAMID: [&str; 4] = [
    "The Upper Chamber",
    "The Middle Chamber",
    "The Lower Chambers",
    "The Ancient Buried Pyramid",
];

const BATTLEFIELD: [&str; 2] = [
    "The Battlefield (Frat Uniform)",
    "The Battlefield (Hippy Uniform)",
];

const FILTHWORMS: [&str; 4] = [
    "The Hatching Chamber",
    "The Feeding Chamber",
    "The Royal Guard Chamber",
    "The Filthworm Queen's Chamber",
];

const JUNKYARD: [&str; 4] = [
    "Next to that Barrel with Something Burning in it",
    "Near an Abandoned Refrigerator",
    "Over Where the Old Tires Are",
    "Out By that Rusted-Out Car",
];

/// Turns spent on each tracked quest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuestTurns {
    pub mosquito: u32,
    pub tavern: u32,
    pub bat: u32,
    pub knob_goblin_king: u32,
    pub friars: u32,
    pub cyrpt: u32,
    pub trapzor: u32,
    pub chasm: u32,
    pub airship: u32,
    pub castle: u32,
    pub ballroom: u32,
    pub spookyraven_cellar: u32,
    pub pirates: u32,
    pub black_forest: u32,
    pub hidden_city: u32,
    pub palindome: u32,
    pub desert: u32,
    pub pyramid: u32,
    pub war: u32,
    pub filthworms: u32,
    pub nuns: u32,
    pub junkyard: u32,
    pub lighthouse: u32,
}

impl QuestTurns {
    pub fn from_intervals(intervals: &[TurnInterval]) -> Self {
        Self {
            mosquito: turns_in_area_until(intervals, "The Spooky Forest", "The Hidden Temple"),
            tavern: turns_in_areas(intervals, &["The Typical Tavern Cellar"]),
            bat: turns_in_areas(intervals, &BAT_HOLE),
            knob_goblin_king: turns_in_areas(intervals, &KNOB_KING),
            friars: turns_in_areas(intervals, &FRIARS),
            cyrpt: turns_in_areas(intervals, &CYRPT),
            trapzor: turns_in_areas(intervals, &TRAPZOR),
            chasm: turns_in_areas(intervals, &["The Smut Orc Logging Camp"]),
            airship: turns_in_area_until(
                intervals,
                "The Penultimate Fantasy Airship",
                "The Castle in the Clouds in the Sky (Basement)",
            ),
            castle: turns_in_areas(intervals, &CASTLE),
            ballroom: turns_in_area_after(
                intervals,
                "The Haunted Ballroom",
                "The Haunted Bedroom",
                Some("The Haunted Wine Cellar"),
            ),
            spookyraven_cellar: turns_in_areas(intervals, &SPOOKYRAVEN_CELLAR),
            pirates: turns_in_area_after(intervals, "The F'c'le", "Barrrney's Barrr", None),
            black_forest: turns_in_areas(intervals, &["The Black Forest"]),
            hidden_city: turns_in_areas(intervals, &HIDDEN_CITY),
            palindome: turns_in_areas(intervals, &["Inside the Palindome"]),
            desert: turns_in_areas(intervals, &DESERT),
            pyramid: turns_in_areas(intervals, &PYRAMID),
            war: turns_in_areas(intervals, &BATTLEFIELD),
            filthworms: turns_in_areas(intervals, &FILTHWORMS),
            nuns: turns_in_areas(intervals, &["The Themthar Hills"]),
            junkyard: turns_in_areas(intervals, &JUNKYARD),
            lighthouse: turns_in_areas(intervals, &["Sonofa Beach"]),
        }
    }

    /// Quest names paired with their turn counts, in quest order.
    pub const fn entries(&self) -> [(&'static str, u32); 23] {
        [
            ("Mosquito", self.mosquito),
            ("Tavern", self.tavern),
            ("Bat", self.bat),
            ("Knob Goblin King", self.knob_goblin_king),
            ("Friars", self.friars),
            ("Cyrpt", self.cyrpt),
            ("Trapzor", self.trapzor),
            ("Orc Chasm", self.chasm),
            ("Airship", self.airship),
            ("Castle", self.castle),
            ("Ballroom", self.ballroom),
            ("Spookyraven Cellar", self.spookyraven_cellar),
            ("Pirates", self.pirates),
            ("Black Forest", self.black_forest),
            ("Hidden City", self.hidden_city),
            ("Palindome", self.palindome),
            ("Desert", self.desert),
            ("Pyramid", self.pyramid),
            ("War", self.war),
            ("Filthworms", self.filthworms),
            ("Nuns", self.nuns),
            ("Junkyard", self.junkyard),
            ("Lighthouse", self.lighthouse),
        ]
    }
}
