//! Line and block patterns shared by the readers and parsers.
//!
//! Everything here is compiled once and read-only, so it can be shared
//! freely between worker threads.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Stat;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// Tail shared by every MP gain notation.
const MP_POINTS: &str = r"(?:Mana|Mojo|Muscularity) Points?";

// ========== Block boundaries ==========

/// `[123] The Haunted Pantry`
pub static TURN_START: LazyLock<Regex> = LazyLock::new(|| compile(r"^\[(\d+)\] (.+?)\s*$"));

pub const ENCOUNTER_PREFIX: &str = "Encounter: ";

/// Every combat round line starts with this.
pub const COMBAT_PREFIX: &str = "Round ";

/// The first combat round; marks a turn as a combat.
pub const COMBAT_START_PREFIX: &str = "Round 0: ";

/// `Round 3: Tester attacks!`
pub static COMBAT_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"^Round (\d+): (.*)$"));

pub const AFTER_BATTLE_PREFIX: &str = "After Battle: ";

pub const CONSUMABLE_VERBS: [&str; 4] = ["use ", "eat ", "drink ", "Buy "];

/// `eat 1 Hell ramen`, `Buy 3 tomato for 40 each from The General Store`
pub static CONSUMABLE_USED: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(use|eat|drink|Buy) (\d+) (.+?)(?: for ([\d,]+) each from .+)?\s*$")
});

/// First line of a player snapshot block.
pub const PLAYER_SNAPSHOT_SEPARATOR: &str = "                   Player Snapshot                   ";

/// Lines consumed unconditionally at the start of a snapshot block.
pub const PLAYER_SNAPSHOT_HEADER_LINES: usize = 3;

/// `Adventures left: 40` inside a snapshot block.
pub static SNAPSHOT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*([A-Za-z][A-Za-z ]*?):\s*(.+?)\s*$"));

/// `120 (85)`: buffed value with the base value in parentheses.
pub static SNAPSHOT_STAT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^([\d,]+)(?:\s*\(([\d,]+)\))?"));

/// Legacy familiar weight notation that is followed by a spurious blank line.
pub static LEGACY_FAMILIAR_POUND: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:After Battle: )?.+ gains a pound!\s*$"));

// ========== Line notations ==========

pub static DAY_CHANGE: LazyLock<Regex> = LazyLock::new(|| compile(r"^===Day (\d+)===\s*$"));

pub static ITEM_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You acquire an item: (.+?)\s*$"));

pub static ITEM_COUNT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You acquire (.+?) \(([\d,]+)\)\s*$"));

pub static ITEM_COUNT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You acquire (\d+) (.+?)\s*$"));

/// `cast 2 Saucy Salve`
pub static SKILL_CAST: LazyLock<Regex> = LazyLock::new(|| compile(r"^cast (\d+) (.+?)\s*$"));

/// Combat body: `Tester casts SAUCEGEYSER!` with an optional auto-attack tag.
pub static COMBAT_SKILL_CAST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^.+? casts (.+?)!(?: \(auto-attack\))?\s*$"));

pub static EQUIP: LazyLock<Regex> = LazyLock::new(|| compile(r"^equip (\S+) (.+?)\s*$"));

pub static UNEQUIP: LazyLock<Regex> = LazyLock::new(|| compile(r"^unequip (\S+)\s*$"));

pub static OUTFIT: LazyLock<Regex> = LazyLock::new(|| compile(r"^outfit (.+?)\s*$"));

pub static CUSTOM_OUTFIT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^custom outfit (.+?)\s*$"));

/// Custom outfits that restore the last known loadout instead of clearing it.
pub const CUSTOM_OUTFIT_ROLLBACKS: [&str; 2] = ["backup", "your previous outfit"];

/// `familiar Hovering Sombrero (5 lbs)`
pub static FAMILIAR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^familiar (.+?) \((\d+) lbs?\)\s*$"));

pub const FAMILIAR_NONE: &str = "familiar none";

pub const FAMILIAR_LOCK: &str = "familiar lock";

pub static MEAT_GAINED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You gain ([\d,]+) Meat\.?\s*$"));

pub static MEAT_SPENT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You (?:spent|lose) ([\d,]+) Meat\.?\s*$"));

pub static MP_GAINED: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^You gain ([\d,]+) {MP_POINTS}\.?\s*$")));

pub static STAT_GAINED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You gain ([\d,]+) ([A-Za-z]+)\.?\s*$"));

pub static ADVENTURES_GAINED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^You gain (\d+) Adventures?\.?\s*$"));

/// `pull: 1 Sneaky Pete's leather jacket`
pub static PULL: LazyLock<Regex> = LazyLock::new(|| compile(r"^pull: (\d+) (.+?)\s*$"));

pub static REST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(?:campground )?rest(?: \d+)?\s*$"));

pub const LOST_COMBAT: &str = "You lose. You slink away, dejected and defeated.";

pub static NOTE: LazyLock<Regex> = LazyLock::new(|| compile(r"^Note: (.+?)\s*$"));

pub static CLASS_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"^Class: (.+?)\s*$"));

// ========== Combat flavor texts ==========

/// The five yellow-ray flavor texts; any of them means the monster was
/// disintegrated.
pub static DISINTEGRATION: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        compile(r"(?i)a bright yellow light washes over"),
        compile(r"(?i)eye glows yellow and fires a ray"),
        compile(r"(?i)fires a yellow ray"),
        compile(r"(?i)disintegrates? in a flash of yellow"),
        compile(r"(?i)pull(?:s)? the yellow trigger"),
    ]
});

/// Starfish-family attacks. The first capture is the MP siphoned to the
/// player, which is also part of the after-battle MP total.
pub static STARFISH_ATTACKS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(&format!(
            r"(?i)^.+ floats around you, (?:glowing|twinkling)[^.]*\. You gain (\d+) {MP_POINTS}"
        )),
        compile(&format!(r"(?i)^.+ spins (?:around|in place)[^.]*\. You gain (\d+) {MP_POINTS}")),
        compile(&format!(
            r"(?i)^.+ points one of its arms at you[^.]*\. You gain (\d+) {MP_POINTS}"
        )),
    ]
});

/// Familiar runaways that never cost a turn.
pub static FREE_RUNAWAY_FAMILIAR: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"(?i)^Your .+ stomps? .+ and you run away"),
        compile(r"(?i)^Your .+ (?:distracts|frightens) .+ and you slip away"),
    ]
});

/// Any runaway attempt.
pub static RUNAWAY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bruns? away\b"));

/// Skill whose use marks a hunted encounter.
pub const OLFACTION: &str = "transcendent olfaction";

/// Equipment whose free runaways are only visible as a repeated turn number.
pub const FREE_RUNAWAY_EQUIPMENT: [&str; 2] =
    ["navel ring of navel gazing", "greatest american pants"];

pub const FREE_RUNAWAY_FAMILIARS: [&str; 2] = ["pair of stomping boots", "frumious bandersnatch"];

// ========== Stitching ==========

/// The ascend confirmation request; everything after it is a new ascension.
pub static ASCEND_CONFIRMATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"ascend\.php\?.*action=ascend.*confirm=on"));

/// `05/21/13 23:59:12` at the start of a line.
pub static DATE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\d{2})/(\d{2})/(\d{2}) \d{2}:\d{2}:\d{2}"));

/// Unparsed daily session log, `Tester_20130521.txt`.
pub static DAILY_LOG_FILE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(.+)_(\d{8})\.txt$"));

/// Marker of already parsed logs, `Tester_ascend20130521.txt`.
pub const PREPARSED_MARKER: &str = "_ascend";

/// Stitched ascension, `Tester-20130521.txt`.
pub static CONDENSED_LOG_FILE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(.+)-(\d{8})(?:-\d+)?\.txt$"));

/// Turn range of a finished log, `[12] Noob Cave` or `[13-20] Noob Cave`.
pub static PREPARSED_INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\[(\d+)(?:-(\d+))?\] (.+?)\s*$"));

// ========== Helpers ==========

const SUBSTATS: [(&str, Stat); 14] = [
    ("beefiness", Stat::Muscle),
    ("fortitude", Stat::Muscle),
    ("muscleboundness", Stat::Muscle),
    ("strengthliness", Stat::Muscle),
    ("strongness", Stat::Muscle),
    ("enchantedness", Stat::Mysticality),
    ("magicalness", Stat::Mysticality),
    ("mysteriousness", Stat::Mysticality),
    ("wizardliness", Stat::Mysticality),
    ("cheek", Stat::Moxie),
    ("chutzpah", Stat::Moxie),
    ("roguishness", Stat::Moxie),
    ("sarcasm", Stat::Moxie),
    ("smarm", Stat::Moxie),
];

/// Maps a substat name (`Strongness`, `Chutzpah`, ...) to its stat.
pub fn substat(name: &str) -> Option<Stat> {
    let name = name.to_ascii_lowercase();
    SUBSTATS
        .iter()
        .find(|(substat, _)| *substat == name)
        .map(|(_, stat)| *stat)
}

/// Parses a log number, which may carry thousands separators.
pub fn parse_number(text: &str) -> Option<i64> {
    text.trim().replace(',', "").parse().ok()
}

/// Removes the `After Battle: ` prefix some notations carry.
pub fn strip_after_battle(line: &str) -> &str {
    line.strip_prefix(AFTER_BATTLE_PREFIX).unwrap_or(line)
}

pub fn is_combat_line(line: &str) -> bool {
    line.starts_with(COMBAT_PREFIX) && COMBAT_LINE.is_match(line)
}

pub fn is_turn_start(line: &str) -> bool {
    line.starts_with('[') && TURN_START.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_start() {
        let caps = TURN_START.captures("[123] The Haunted Pantry").unwrap();
        assert_eq!(&caps[1], "123");
        assert_eq!(&caps[2], "The Haunted Pantry");
        assert!(!is_turn_start("[abc] nothing"));
    }

    #[test]
    fn test_consumable_with_purchase_price() {
        let caps = CONSUMABLE_USED
            .captures("Buy 3 tomato for 1,040 each from The General Store")
            .unwrap();
        assert_eq!(&caps[1], "Buy");
        assert_eq!(&caps[3], "tomato");
        assert_eq!(parse_number(&caps[4]), Some(1040));

        let caps = CONSUMABLE_USED.captures("eat 1 Hell ramen").unwrap();
        assert_eq!(&caps[3], "Hell ramen");
        assert!(caps.get(4).is_none());
    }

    #[test]
    fn test_item_variants() {
        assert_eq!(&ITEM_SINGLE.captures("You acquire an item: seal tooth").unwrap()[1], "seal tooth");
        let caps = ITEM_COUNT_SUFFIX.captures("You acquire tomato (3)").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("tomato", "3"));
        let caps = ITEM_COUNT_PREFIX.captures("You acquire 2 bottle of gin").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("2", "bottle of gin"));
        assert!(ITEM_COUNT_PREFIX.captures("You acquire 7-Foot Dwarven mattock").is_none());
    }

    #[test]
    fn test_combat_skill_cast_auto_attack() {
        let caps = COMBAT_SKILL_CAST
            .captures("Tester casts LUNGE SMACK! (auto-attack)")
            .unwrap();
        assert_eq!(&caps[1], "LUNGE SMACK");
    }

    #[test]
    fn test_substats() {
        assert_eq!(substat("Strongness"), Some(Stat::Muscle));
        assert_eq!(substat("wizardliness"), Some(Stat::Mysticality));
        assert_eq!(substat("Smarm"), Some(Stat::Moxie));
        assert_eq!(substat("Meat"), None);
    }

    #[test]
    fn test_mp_gained_names() {
        for line in [
            "You gain 10 Mana Points",
            "You gain 1 Mojo Point",
            "You gain 1,200 Muscularity Points",
        ] {
            assert!(MP_GAINED.is_match(line), "{line}");
        }
        assert!(!MP_GAINED.is_match("You gain 10 Hit Points"));
    }

    #[test]
    fn test_starfish_attack_captures_amount() {
        let body = "Your Star Starfish floats around you, glowing softly. You gain 6 Mojo Points.";
        let amount = STARFISH_ATTACKS
            .iter()
            .find_map(|re| re.captures(body))
            .map(|caps| caps[1].to_string());
        assert_eq!(amount.as_deref(), Some("6"));
    }

    #[test]
    fn test_disintegration_patterns_are_distinct() {
        let samples = [
            "A bright yellow light washes over the monster.",
            "Your He-Boulder's eye glows yellow and fires a ray at the monster.",
            "Tester fires a yellow ray.",
            "The monster disintegrates in a flash of yellow.",
            "You pull the yellow trigger.",
        ];
        for (pattern, sample) in DISINTEGRATION.iter().zip(samples) {
            assert!(pattern.is_match(sample), "{sample}");
        }
    }

    #[test]
    fn test_ascend_confirmation() {
        assert!(ASCEND_CONFIRMATION.is_match(
            "ascend.php?pwd&action=ascend&confirm=on&confirm2=on&whichclass=1"
        ));
        assert!(!ASCEND_CONFIRMATION.is_match("ascend.php?action=ascend"));
    }

    #[test]
    fn test_daily_log_file_name() {
        let caps = DAILY_LOG_FILE.captures("Tester_20130521.txt").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("Tester", "20130521"));
        assert!(DAILY_LOG_FILE.captures("Tester-20130521.txt").is_none());
        let caps = CONDENSED_LOG_FILE.captures("Tester-20130521.txt").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("Tester", "20130521"));
        let caps = CONDENSED_LOG_FILE.captures("Tester-20130521-2.txt").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("Tester", "20130521"));
    }

    #[test]
    fn test_snapshot_fields() {
        let caps = SNAPSHOT_FIELD.captures("Adventures left: 40").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("Adventures left", "40"));
        let caps = SNAPSHOT_STAT.captures("120 (85)").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("120", "85"));
        assert!(SNAPSHOT_STAT.captures("15").unwrap().get(2).is_none());
    }

    #[test]
    fn test_parse_number_and_prefix() {
        assert_eq!(parse_number("1,234"), Some(1234));
        assert_eq!(parse_number("x"), None);
        assert_eq!(strip_after_battle("After Battle: You gain 5 Meat"), "You gain 5 Meat");
        assert!(is_combat_line("Round 2: Tester attacks!"));
        assert!(!is_combat_line("Rounding error"));
    }
}
