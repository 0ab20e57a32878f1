//! Single forward pass over a finished timeline.
//!
//! The reducer keeps independent accumulators (areas, items, skills,
//! consumables, special encounters, meat, MP, free runaways) plus one level
//! tracker per main stat, so the level history is available even when the
//! class has to be inferred at the end of the pass.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::game_data::GameData;
use crate::patterns::OLFACTION;
use crate::quest::QuestTurns;
use crate::tally::{Consumable, ConsumableKind, MeatFlow, MpGain, StatGain, TurnTally};
use crate::timeline::{LostCombat, Timeline};
use crate::turn::{FreeRunaways, NOT_AN_ADVENTURE, SingleTurn, TurnKind};
use crate::types::{CharacterClass, Stat};

/// Highest level the threshold table covers.
pub const MAX_LEVEL: u32 = 35;

const LEVEL_COUNT: usize = 35;

/// Starting stat values, in the class's stat priority order.
const STARTING_STAT_VALUES: [i32; 3] = [15, 10, 5];

const LEVEL_THRESHOLDS: [u32; LEVEL_COUNT] = {
    let mut table = [0; LEVEL_COUNT];
    let mut level = 2;
    while level <= MAX_LEVEL {
        table[(level - 1) as usize] = (level - 1) * (level - 1) + 4;
        level += 1;
    }
    table
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("level {level} is outside the level table (1-{MAX_LEVEL})")]
    LevelOutOfRange { level: u32 },
}

/// Main-stat value needed to reach `level`.
pub fn level_threshold(level: u32) -> Result<u32, SummaryError> {
    level
        .checked_sub(1)
        .and_then(|idx| LEVEL_THRESHOLDS.get(idx as usize))
        .copied()
        .ok_or(SummaryError::LevelOutOfRange { level })
}

/// Turn counts by classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnKindCounts {
    pub combat: u32,
    pub noncombat: u32,
    pub other: u32,
    pub undefined: u32,
}

impl TurnKindCounts {
    pub const fn add(&mut self, kind: TurnKind, count: u32) {
        match kind {
            TurnKind::Combat => self.combat += count,
            TurnKind::Noncombat => self.noncombat += count,
            TurnKind::Other => self.other += count,
            TurnKind::Undefined => self.undefined += count,
        }
    }

    pub const fn total(&self) -> u32 {
        self.combat + self.noncombat + self.other + self.undefined
    }
}

/// A level and what happened while the character was at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelData {
    pub level: u32,
    pub turn_reached: u32,
    pub combat_turns: u32,
    pub noncombat_turns: u32,
    pub other_turns: u32,
    /// Substats of all stats gained per turn spent at this level.
    pub stat_gain_per_turn: f64,
}

impl LevelData {
    const fn reached(level: u32, turn: u32) -> Self {
        Self {
            level,
            turn_reached: turn,
            combat_turns: 0,
            noncombat_turns: 0,
            other_turns: 0,
            stat_gain_per_turn: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaTurns {
    pub area: String,
    pub turns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamiliarUsage {
    pub familiar: String,
    pub combat_turns: u32,
}

/// A turn whose encounter was special in some way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialEncounter {
    pub turn: u32,
    pub area: String,
    pub encounter: String,
}

impl SpecialEncounter {
    fn of(turn: &SingleTurn) -> Self {
        Self {
            turn: turn.turn,
            area: turn.area.clone(),
            encounter: turn.encounter.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCount {
    pub name: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillUsage {
    pub name: String,
    pub casts: i32,
    pub mp_cost: i64,
}

/// A consumable summed over every day it was used on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumableUsage {
    pub name: String,
    pub kind: ConsumableKind,
    pub amount: i32,
    pub adventure_gain: i32,
    pub stat_gain: StatGain,
}

/// Everything derived from a finished timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub character_class: Option<CharacterClass>,
    /// Whether the class was inferred rather than read from the log.
    pub class_inferred: bool,
    pub total_turns: u32,
    pub days: u32,
    pub starting_stats: StatGain,
    pub stat_gains: StatGain,
    pub final_stats: StatGain,
    pub levels: BTreeMap<u32, LevelData>,
    pub turn_kinds: TurnKindCounts,
    pub turns_per_area: Vec<AreaTurns>,
    pub familiar_usage: Vec<FamiliarUsage>,
    pub consumables: Vec<ConsumableUsage>,
    pub consumables_by_day: BTreeMap<u32, Vec<Consumable>>,
    pub adventures_from_consumables: i32,
    pub drops: Vec<ItemCount>,
    pub skills: Vec<SkillUsage>,
    pub mp_spent_on_skills: i64,
    pub hunted: Vec<SpecialEncounter>,
    pub disintegrated: Vec<SpecialEncounter>,
    pub semirares: Vec<SpecialEncounter>,
    pub bad_moon: Vec<SpecialEncounter>,
    pub lost_combats: Vec<LostCombat>,
    pub meat: MeatFlow,
    pub mp: MpGain,
    pub free_runaways: FreeRunaways,
    pub pulls_per_day: BTreeMap<u32, i32>,
    pub quests: QuestTurns,
}

#[expect(clippy::cast_precision_loss, reason = "per-turn averages are display values")]
fn per_turn(amount: i64, turns: u32) -> f64 {
    if turns == 0 {
        0.0
    } else {
        amount as f64 / f64::from(turns)
    }
}

/// Level progression driven by one main stat.
#[derive(Debug)]
struct LevelTracker {
    stat: Stat,
    substats: i64,
    level: u32,
    counts: TurnKindCounts,
    gained_at_level: i64,
    levels: BTreeMap<u32, LevelData>,
    table_exhausted: bool,
}

impl LevelTracker {
    fn new(stat: Stat) -> Self {
        Self {
            stat,
            substats: 0,
            level: 1,
            counts: TurnKindCounts::default(),
            gained_at_level: 0,
            levels: BTreeMap::from([(1, LevelData::reached(1, 0))]),
            table_exhausted: false,
        }
    }

    const fn record_turns(&mut self, kind: TurnKind, count: u32) {
        self.counts.add(kind, count);
    }

    fn record_gain(&mut self, turn: u32, gain: &StatGain) {
        if gain.is_zero() {
            return;
        }
        self.substats += i64::from(gain.get(self.stat));
        self.gained_at_level += i64::from(gain.total());

        loop {
            let next = self.level + 1;
            let threshold = match level_threshold(next) {
                Ok(threshold) => i64::from(threshold),
                Err(err) => {
                    if !self.table_exhausted {
                        tracing::warn!(stat = %self.stat, error = %err, "level table exhausted");
                        self.table_exhausted = true;
                    }
                    return;
                }
            };
            // sqrt(substats) >= threshold
            if self.substats < threshold * threshold {
                return;
            }
            self.close_level();
            self.level = next;
            self.levels.insert(next, LevelData::reached(next, turn));
        }
    }

    fn close_level(&mut self) {
        if let Some(data) = self.levels.get_mut(&self.level) {
            data.combat_turns = self.counts.combat;
            data.noncombat_turns = self.counts.noncombat;
            data.other_turns = self.counts.other;
            data.stat_gain_per_turn = per_turn(self.gained_at_level, self.counts.total());
        }
        self.counts = TurnKindCounts::default();
        self.gained_at_level = 0;
    }

    fn finish(mut self) -> BTreeMap<u32, LevelData> {
        self.close_level();
        self.levels
    }
}

/// Accumulators that do not depend on turn granularity.
#[derive(Debug, Default)]
struct TallyTotals {
    stat_gains: StatGain,
    meat: MeatFlow,
    mp: MpGain,
    drops: BTreeMap<String, i32>,
    skills: BTreeMap<String, SkillUsage>,
    consumables: Vec<ConsumableUsage>,
    consumables_by_day: BTreeMap<u32, Vec<Consumable>>,
    guild_class: Option<CharacterClass>,
}

impl TallyTotals {
    fn add(&mut self, tally: &TurnTally, data: &GameData) {
        self.stat_gains += tally.stat_gain;
        self.meat += tally.meat;
        self.mp += tally.mp_gain;

        for item in &tally.drops {
            *self.drops.entry(item.name.clone()).or_default() += item.amount;
            if self.guild_class.is_none() {
                self.guild_class = data.guild_reward_class(&item.name);
            }
        }

        for skill in &tally.skills {
            let cost = i64::from(data.skill_mp_cost(&skill.name)) * i64::from(skill.amount);
            let usage = self
                .skills
                .entry(skill.name.to_lowercase())
                .or_insert_with(|| SkillUsage {
                    name: skill.name.clone(),
                    casts: 0,
                    mp_cost: 0,
                });
            usage.casts += skill.amount;
            usage.mp_cost += cost;
        }

        for consumable in &tally.consumables {
            self.consumables_by_day
                .entry(consumable.day)
                .or_default()
                .push(consumable.clone());
            let existing = self.consumables.iter_mut().find(|usage| {
                usage.kind == consumable.kind && usage.name.eq_ignore_ascii_case(&consumable.name)
            });
            match existing {
                Some(usage) => {
                    usage.amount += consumable.amount;
                    usage.adventure_gain += consumable.adventure_gain;
                    usage.stat_gain += consumable.stat_gain;
                }
                None => self.consumables.push(ConsumableUsage {
                    name: consumable.name.clone(),
                    kind: consumable.kind,
                    amount: consumable.amount,
                    adventure_gain: consumable.adventure_gain,
                    stat_gain: consumable.stat_gain,
                }),
            }
        }
    }
}

fn dominant_stat(gains: &StatGain) -> Stat {
    Stat::ALL
        .into_iter()
        .fold(Stat::Muscle, |best, stat| {
            if gains.get(stat) > gains.get(best) {
                stat
            } else {
                best
            }
        })
}

fn starting_stats(class: Option<CharacterClass>) -> StatGain {
    let mut stats = StatGain::default();
    if let Some(class) = class {
        for (stat, value) in class.stat_priority().into_iter().zip(STARTING_STAT_VALUES) {
            stats.add_stat(stat, value);
        }
    }
    stats
}

/// Stat value after gaining `gained` substats on top of `start`.
fn final_stat(start: i32, gained: i32) -> i32 {
    let substats = i64::from(start).pow(2) + i64::from(gained);
    i32::try_from(substats.max(0).isqrt()).unwrap_or(i32::MAX)
}

fn sorted_by_count<T>(mut entries: Vec<T>, count: impl Fn(&T) -> u32) -> Vec<T> {
    entries.sort_by_key(|entry| std::cmp::Reverse(count(entry)));
    entries
}

impl Summary {
    /// Reduces a finished timeline. Idempotent for an unchanged timeline.
    pub fn reduce(timeline: &Timeline, data: &GameData) -> Self {
        let mut totals = TallyTotals::default();
        let mut trackers = Stat::ALL.map(LevelTracker::new);
        let mut turn_kinds = TurnKindCounts::default();
        let mut area_turns: BTreeMap<String, u32> = BTreeMap::new();
        let mut familiar_turns: BTreeMap<String, u32> = BTreeMap::new();
        let mut free_runaways = FreeRunaways::default();
        let (mut hunted, mut disintegrated, mut semirares, mut bad_moon) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());

        for interval in timeline.intervals() {
            let counted = interval.area() != NOT_AN_ADVENTURE;
            if counted {
                *area_turns.entry(interval.area().to_string()).or_default() +=
                    interval.turn_count();
            }

            if !interval.has_turns() && counted {
                turn_kinds.add(TurnKind::Undefined, interval.turn_count());
                for tracker in &mut trackers {
                    tracker.record_turns(TurnKind::Undefined, interval.turn_count());
                }
            }

            for turn in interval.turns() {
                if counted {
                    turn_kinds.add(turn.kind, 1);
                    for tracker in &mut trackers {
                        tracker.record_turns(turn.kind, 1);
                    }
                }
                if turn.kind == TurnKind::Combat {
                    if let Some(familiar) = &turn.familiar {
                        *familiar_turns.entry(familiar.clone()).or_default() += 1;
                    }
                }
                if turn.tally.cast(OLFACTION) {
                    hunted.push(SpecialEncounter::of(turn));
                }
                if turn.disintegrated {
                    disintegrated.push(SpecialEncounter::of(turn));
                }
                if data.is_semirare(&turn.encounter) {
                    semirares.push(SpecialEncounter::of(turn));
                }
                if data.is_bad_moon(&turn.encounter) {
                    bad_moon.push(SpecialEncounter::of(turn));
                }

                totals.add(&turn.tally, data);
                for tracker in &mut trackers {
                    tracker.record_gain(turn.turn, &turn.tally.stat_gain);
                }
            }

            totals.add(interval.tally(), data);
            for tracker in &mut trackers {
                tracker.record_gain(interval.end_turn(), &interval.tally().stat_gain);
            }
            free_runaways += interval.free_runaways();
        }

        let (character_class, class_inferred) = match timeline.character_class() {
            Some(class) => (Some(class), false),
            None if totals.guild_class.is_some() => (totals.guild_class, true),
            None if totals.stat_gains.is_zero() => (None, false),
            None => (
                Some(CharacterClass::default_for(dominant_stat(&totals.stat_gains))),
                true,
            ),
        };
        if class_inferred {
            tracing::debug!(class = ?character_class, "character class inferred");
        }

        let main_stat = character_class.map_or(Stat::Muscle, CharacterClass::main_stat);
        let levels = trackers
            .into_iter()
            .find(|tracker| tracker.stat == main_stat)
            .map(LevelTracker::finish)
            .unwrap_or_default();

        let starting_stats = starting_stats(character_class);
        let gains = totals.stat_gains;
        let final_stats = StatGain::new(
            final_stat(starting_stats.muscle, gains.muscle),
            final_stat(starting_stats.mysticality, gains.mysticality),
            final_stat(starting_stats.moxie, gains.moxie),
        );

        let mut pulls_per_day = BTreeMap::new();
        for pull in timeline.pulls() {
            *pulls_per_day.entry(pull.day).or_insert(0) += pull.amount;
        }

        let skills: Vec<SkillUsage> = totals.skills.into_values().collect();
        let mp_spent_on_skills = skills.iter().map(|skill| skill.mp_cost).sum();
        let adventures_from_consumables = totals
            .consumables
            .iter()
            .map(|usage| usage.adventure_gain)
            .sum();

        Self {
            character_class,
            class_inferred,
            total_turns: timeline.last_turn_number(),
            days: timeline.current_day(),
            starting_stats,
            stat_gains: gains,
            final_stats,
            levels,
            turn_kinds,
            turns_per_area: sorted_by_count(
                area_turns
                    .into_iter()
                    .map(|(area, turns)| AreaTurns { area, turns })
                    .collect(),
                |entry| entry.turns,
            ),
            familiar_usage: sorted_by_count(
                familiar_turns
                    .into_iter()
                    .map(|(familiar, combat_turns)| FamiliarUsage {
                        familiar,
                        combat_turns,
                    })
                    .collect(),
                |entry| entry.combat_turns,
            ),
            consumables: totals.consumables,
            consumables_by_day: totals.consumables_by_day,
            adventures_from_consumables,
            drops: totals
                .drops
                .into_iter()
                .map(|(name, amount)| ItemCount { name, amount })
                .collect(),
            skills,
            mp_spent_on_skills,
            hunted,
            disintegrated,
            semirares,
            bad_moon,
            lost_combats: timeline.lost_combats().to_vec(),
            meat: totals.meat,
            mp: totals.mp,
            free_runaways,
            pulls_per_day,
            quests: QuestTurns::from_intervals(timeline.intervals()),
        }
    }
}
