//! The reconstructed ascension: ordered turn intervals plus the side tables
//! parsers fill while reading a log.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::OnceLock;

use serde::Serialize;

use crate::equipment::EquipmentChange;
use crate::game_data::GameData;
use crate::patterns::FREE_RUNAWAY_EQUIPMENT;
use crate::summary::{LevelData, Summary};
use crate::tally::TurnTally;
use crate::turn::{FreeRunaways, NOT_AN_ADVENTURE, SingleTurn, TurnInterval};
use crate::types::{CharacterClass, Username};

/// A new turn trailing the last recorded turn by at least this much is
/// treated as a corrupted turn counter.
pub const TURN_REGRESSION_THRESHOLD: u32 = 100;

/// The familiar in use from `turn` onward; `None` for no familiar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamiliarChange {
    pub turn: u32,
    pub familiar: Option<String>,
}

/// An item pulled from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pull {
    pub turn: u32,
    pub day: u32,
    pub item: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LostCombat {
    pub name: String,
    pub turn: u32,
}

/// Buffed and base value of one stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatValue {
    pub buffed: i32,
    pub base: i32,
}

/// Character state printed by the automation tool on request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub turn: u32,
    pub class: Option<CharacterClass>,
    pub level: Option<u32>,
    pub muscle: StatValue,
    pub mysticality: StatValue,
    pub moxie: StatValue,
    pub adventures_left: Option<i32>,
    pub meat: Option<i64>,
}

/// One ascension, built incrementally by the parsers.
///
/// Turn 0 always has an interval, a day, a familiar state and an equipment
/// state. Every mutation drops the cached summary.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    name: String,
    username: Option<Username>,
    character_class: Option<CharacterClass>,
    intervals: Vec<TurnInterval>,
    familiars: BTreeMap<u32, FamiliarChange>,
    days: BTreeMap<u32, u32>,
    snapshots: BTreeMap<u32, PlayerSnapshot>,
    equipment: BTreeMap<u32, EquipmentChange>,
    #[serde(skip)]
    last_non_custom: EquipmentChange,
    pulls: Vec<Pull>,
    lost_combats: Vec<LostCombat>,
    #[serde(skip)]
    summary: OnceLock<Summary>,
}

fn donate(interval: &mut TurnInterval, runaways: FreeRunaways, notes: Vec<String>) {
    *interval.free_runaways_mut() += runaways;
    for note in notes {
        interval.add_note(note);
    }
}

fn seed_interval() -> TurnInterval {
    TurnInterval::starting_with(0, SingleTurn::new(0, NOT_AN_ADVENTURE))
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: None,
            character_class: None,
            intervals: vec![seed_interval()],
            familiars: BTreeMap::from([(
                0,
                FamiliarChange {
                    turn: 0,
                    familiar: None,
                },
            )]),
            days: BTreeMap::from([(1, 0)]),
            snapshots: BTreeMap::new(),
            equipment: BTreeMap::from([(0, EquipmentChange::empty(0))]),
            last_non_custom: EquipmentChange::empty(0),
            pulls: Vec::new(),
            lost_combats: Vec::new(),
            summary: OnceLock::new(),
        }
    }

    fn invalidate(&mut self) {
        if self.summary.take().is_some() {
            tracing::trace!(timeline = %self.name, "summary invalidated");
        }
    }

    // ========== Accessors ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    pub const fn character_class(&self) -> Option<CharacterClass> {
        self.character_class
    }

    /// Intervals ordered by `(start_turn, end_turn)`.
    pub fn intervals(&self) -> &[TurnInterval] {
        &self.intervals
    }

    pub const fn familiars(&self) -> &BTreeMap<u32, FamiliarChange> {
        &self.familiars
    }

    /// Day number to the turn it started after.
    pub const fn days(&self) -> &BTreeMap<u32, u32> {
        &self.days
    }

    pub const fn snapshots(&self) -> &BTreeMap<u32, PlayerSnapshot> {
        &self.snapshots
    }

    pub const fn equipment(&self) -> &BTreeMap<u32, EquipmentChange> {
        &self.equipment
    }

    pub fn pulls(&self) -> &[Pull] {
        &self.pulls
    }

    pub fn lost_combats(&self) -> &[LostCombat] {
        &self.lost_combats
    }

    /// End turn of the last interval.
    pub fn last_turn_number(&self) -> u32 {
        self.intervals.last().map_or(0, TurnInterval::end_turn)
    }

    pub fn current_day(&self) -> u32 {
        self.days.keys().next_back().copied().unwrap_or(1)
    }

    /// Day a turn was spent on. A day change logged after turn `n` means
    /// turn `n` still belongs to the previous day.
    pub fn day_of_turn(&self, turn: u32) -> u32 {
        self.days
            .iter()
            .rev()
            .find(|(_, start)| **start < turn)
            .map_or(1, |(day, _)| *day)
    }

    /// Familiar active at `turn`.
    pub fn familiar_at(&self, turn: u32) -> Option<&str> {
        self.familiars
            .range(..=turn)
            .next_back()
            .and_then(|(_, change)| change.familiar.as_deref())
    }

    pub fn current_familiar(&self) -> Option<&str> {
        self.familiars
            .values()
            .next_back()
            .and_then(|change| change.familiar.as_deref())
    }

    /// Loadout active at `turn`.
    pub fn equipment_at(&self, turn: u32) -> Option<&EquipmentChange> {
        self.equipment.range(..=turn).next_back().map(|(_, eq)| eq)
    }

    pub fn current_equipment(&self) -> EquipmentChange {
        self.equipment
            .values()
            .next_back()
            .cloned()
            .unwrap_or_default()
    }

    /// Most recent loadout that did not come from an unresolvable custom
    /// outfit, even if a later change at the same turn replaced it.
    pub fn last_non_custom_equipment(&self) -> EquipmentChange {
        self.last_non_custom.clone()
    }

    /// Summary of the timeline as it is now, computed on first use.
    ///
    /// The cache does not track which `GameData` built it; callers use one
    /// table set per timeline.
    pub fn summary(&self, data: &GameData) -> &Summary {
        self.summary.get_or_init(|| Summary::reduce(self, data))
    }

    /// Level reached to the turn it was reached on, seeded with level 1 at
    /// turn 0.
    pub fn levels(&self, data: &GameData) -> &BTreeMap<u32, LevelData> {
        &self.summary(data).levels
    }

    // ========== Mutation ==========

    pub fn set_username(&mut self, username: Username) {
        self.invalidate();
        self.username = Some(username);
    }

    pub fn set_character_class(&mut self, class: CharacterClass) {
        self.invalidate();
        self.character_class = Some(class);
    }

    /// A turn pre-filled with the familiar and loadout in effect now.
    pub fn new_turn(&self, number: u32, area: impl Into<String>) -> SingleTurn {
        let mut turn = SingleTurn::new(number, area);
        turn.familiar = self.current_familiar().map(str::to_string);
        turn.equipment = self.current_equipment();
        turn
    }

    fn last_interval_index(&mut self) -> usize {
        if self.intervals.is_empty() {
            self.intervals.push(seed_interval());
        }
        self.intervals.len() - 1
    }

    pub fn current_interval_mut(&mut self) -> &mut TurnInterval {
        self.invalidate();
        let idx = self.last_interval_index();
        &mut self.intervals[idx]
    }

    pub fn current_turn_mut(&mut self) -> Option<&mut SingleTurn> {
        self.current_interval_mut().last_turn_mut()
    }

    /// Tally new per-turn data is booked against.
    pub fn current_tally_mut(&mut self) -> &mut TurnTally {
        self.current_interval_mut().current_tally_mut()
    }

    fn discard_regressed(&mut self, turn: u32) {
        let last_end = self.last_turn_number();
        if last_end.saturating_sub(turn) < TURN_REGRESSION_THRESHOLD {
            return;
        }
        let mut dropped = 0_usize;
        while self.intervals.last().is_some_and(|i| i.end_turn() > turn) {
            self.intervals.pop();
            dropped += 1;
        }
        tracing::debug!(
            turn,
            last_end,
            dropped,
            "turn counter regressed, discarded trailing intervals"
        );
    }

    /// Adds one parsed turn.
    ///
    /// Same-area turns extend the last interval. A turn number logged twice
    /// under different areas replaces the earlier record and inherits its
    /// data. A turn that trails the log by [`TURN_REGRESSION_THRESHOLD`] or
    /// more first discards the intervals past it; a smaller slip is booked at
    /// the last end turn so start turns never decrease.
    pub fn add_turn(&mut self, mut turn: SingleTurn) {
        self.invalidate();
        self.discard_regressed(turn.turn);

        if let Some(last) = self.intervals.last_mut() {
            if last.area() == turn.area {
                last.push_turn(turn);
                return;
            }
        }

        let mut carried: Option<(FreeRunaways, Vec<String>)> = None;
        if let Some(last) = self.intervals.last_mut() {
            if let Some(removed) = last.remove_last_turn_numbered(turn.turn) {
                let free_runaway = removed.ran_away
                    && FREE_RUNAWAY_EQUIPMENT
                        .iter()
                        .any(|item| removed.equipment.is_wearing(item));
                turn.tally.absorb(removed.tally);

                let mut runaways = FreeRunaways::default();
                let mut notes = Vec::new();
                if !last.has_turns() {
                    if let Some(emptied) = self.intervals.pop() {
                        let data = emptied.into_data();
                        turn.tally.absorb(data.tally);
                        runaways = data.free_runaways;
                        notes = data.notes;
                    }
                }
                if free_runaway {
                    runaways.successes += 1;
                }
                tracing::debug!(
                    turn = turn.turn,
                    area = %turn.area,
                    free_runaway,
                    "turn logged twice, replacing earlier record"
                );
                carried = Some((runaways, notes));
            }
        }

        if let Some(last) = self.intervals.last_mut() {
            if let Some((runaways, notes)) = carried.take() {
                donate(last, runaways, notes);
            }
            if last.area() == turn.area {
                last.push_turn(turn);
                return;
            }
        }

        let start = self
            .intervals
            .last()
            .map_or_else(|| turn.turn.saturating_sub(1), TurnInterval::end_turn);
        if turn.turn < start {
            tracing::debug!(
                turn = turn.turn,
                last_end = start,
                "turn counter slipped back, booking turn at the last end turn"
            );
            turn.turn = start;
        }
        let mut interval = TurnInterval::starting_with(start, turn);
        if let Some((runaways, notes)) = carried {
            donate(&mut interval, runaways, notes);
        }
        self.intervals.push(interval);
    }

    /// Adds a pre-aggregated interval.
    ///
    /// An interval in the same area as the last one extends it. Otherwise the
    /// interval is inserted by key; an interval already holding the exact key
    /// is replaced and its data goes to its predecessor, or to the new
    /// interval when there is none.
    pub fn add_interval(&mut self, mut interval: TurnInterval) {
        self.invalidate();

        if let Some(last) = self.intervals.last_mut() {
            if last.area() == interval.area() {
                last.extend_with(interval);
                return;
            }
        }

        match self
            .intervals
            .binary_search_by_key(&interval.key(), TurnInterval::key)
        {
            Ok(idx) => {
                let replaced = self.intervals.remove(idx).into_data();
                tracing::debug!(key = ?interval.key(), "interval key collision, merging");
                if idx > 0 {
                    self.intervals[idx - 1].receive(replaced);
                } else {
                    interval.receive(replaced);
                }
                self.intervals.insert(idx, interval);
            }
            Err(idx) => self.intervals.insert(idx, interval),
        }
    }

    /// Records a day change; the first turn seen for a day wins.
    pub fn add_day_change(&mut self, day: u32, turn: u32) {
        self.invalidate();
        self.days.entry(day).or_insert(turn);
    }

    /// Records a familiar change, keeping consecutive entries distinct.
    pub fn add_familiar_change(&mut self, change: FamiliarChange) {
        self.invalidate();
        let turn = change.turn;
        let current = change.familiar.clone();
        self.familiars.insert(turn, change);

        let repeats_previous = self
            .familiars
            .range(..turn)
            .next_back()
            .is_some_and(|(_, prev)| prev.familiar == current);
        if repeats_previous {
            self.familiars.remove(&turn);
        }

        let next = self
            .familiars
            .range((Bound::Excluded(turn), Bound::Unbounded))
            .next()
            .filter(|(_, next)| next.familiar == current)
            .map(|(next_turn, _)| *next_turn);
        if let Some(next_turn) = next {
            self.familiars.remove(&next_turn);
        }
    }

    /// Records a full loadout; a later change at the same turn replaces it.
    pub fn add_equipment_change(&mut self, change: EquipmentChange) {
        self.invalidate();
        if !change.from_custom_outfit {
            self.last_non_custom = change.clone();
        }
        self.equipment.insert(change.turn, change);
    }

    /// Records a snapshot and takes the class from it if none is known yet.
    pub fn add_snapshot(&mut self, snapshot: PlayerSnapshot) {
        self.invalidate();
        if self.character_class.is_none() {
            self.character_class = snapshot.class;
        }
        self.snapshots.insert(snapshot.turn, snapshot);
    }

    pub fn add_pull(&mut self, pull: Pull) {
        self.invalidate();
        self.pulls.push(pull);
    }

    pub fn add_lost_combat(&mut self, lost: LostCombat) {
        self.invalidate();
        self.lost_combats.push(lost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::Slot;

    fn add(timeline: &mut Timeline, number: u32, area: &str) {
        let turn = timeline.new_turn(number, area);
        timeline.add_turn(turn);
    }

    fn ends(timeline: &Timeline) -> Vec<u32> {
        timeline.intervals().iter().map(TurnInterval::end_turn).collect()
    }

    #[test]
    fn test_seeded_state() {
        let timeline = Timeline::new("run");
        assert_eq!(timeline.intervals().len(), 1);
        assert_eq!(timeline.intervals()[0].area(), NOT_AN_ADVENTURE);
        assert_eq!(timeline.days().get(&1), Some(&0));
        assert!(timeline.equipment_at(0).is_some());
        assert_eq!(timeline.familiar_at(0), None);
        assert_eq!(timeline.familiars().len(), 1);
    }

    #[test]
    fn test_same_area_turns_coalesce() {
        let mut timeline = Timeline::new("run");
        for n in 1..=5 {
            add(&mut timeline, n, "The Haunted Pantry");
        }
        assert_eq!(timeline.intervals().len(), 2);
        let pantry = &timeline.intervals()[1];
        assert_eq!(pantry.turns().len(), 5);
        assert_eq!(pantry.key(), (0, 5));
    }

    #[test]
    fn test_intervals_are_contiguous_and_ordered() {
        let mut timeline = Timeline::new("run");
        let areas = ["Noob Cave", "The Spooky Forest", "Noob Cave", "The Sleazy Back Alley"];
        let mut number = 0;
        for (i, area) in areas.iter().cycle().take(12).enumerate() {
            number += 1 + u32::try_from(i % 3).unwrap();
            add(&mut timeline, number, area);
        }

        let intervals = timeline.intervals();
        for pair in intervals.windows(2) {
            assert!(pair[0].start_turn() <= pair[1].start_turn());
            assert_ne!(pair[0].key(), pair[1].key());
            assert_eq!(pair[0].end_turn(), pair[1].start_turn());
        }
    }

    #[test]
    fn test_turn_regression_discards_trailing_intervals() {
        let mut timeline = Timeline::new("run");
        add(&mut timeline, 50, "Noob Cave");
        add(&mut timeline, 120, "The Spooky Forest");
        add(&mut timeline, 200, "The Sleazy Back Alley");
        assert_eq!(ends(&timeline), vec![0, 50, 120, 200]);

        add(&mut timeline, 10, "The Haunted Pantry");
        assert_eq!(ends(&timeline), vec![0, 10]);
        assert_eq!(timeline.intervals()[1].area(), "The Haunted Pantry");
    }

    #[test]
    fn test_small_regression_is_kept_in_order() {
        let mut timeline = Timeline::new("run");
        add(&mut timeline, 50, "Noob Cave");
        add(&mut timeline, 120, "The Spooky Forest");
        add(&mut timeline, 30, "The Haunted Pantry");

        let keys: Vec<_> = timeline.intervals().iter().map(TurnInterval::key).collect();
        assert_eq!(keys, vec![(0, 0), (0, 50), (50, 120), (120, 120)]);
        assert_eq!(timeline.intervals()[3].area(), "The Haunted Pantry");
        assert_eq!(timeline.intervals()[3].turns().len(), 1);
        for pair in timeline.intervals().windows(2) {
            assert!(pair[0].start_turn() <= pair[1].start_turn());
        }

        add(&mut timeline, 31, "Noob Cave");
        for pair in timeline.intervals().windows(2) {
            assert!(pair[0].start_turn() <= pair[1].start_turn());
        }
        assert_eq!(timeline.last_turn_number(), 120);
    }

    #[test]
    fn test_duplicate_turn_moves_data_to_new_turn() {
        let mut timeline = Timeline::new("run");
        add(&mut timeline, 5, "Noob Cave");
        add(&mut timeline, 6, "Noob Cave");
        timeline.current_tally_mut().add_drop("seal tooth", 1, 6);
        add(&mut timeline, 6, "The Spooky Forest");

        assert_eq!(ends(&timeline), vec![0, 5, 6]);
        let cave = &timeline.intervals()[1];
        assert_eq!(cave.turns().len(), 1);
        let forest = &timeline.intervals()[2];
        assert_eq!(forest.key(), (5, 6));
        assert_eq!(forest.turns()[0].tally.drops[0].name, "seal tooth");
    }

    #[test]
    fn test_emptied_interval_is_folded_and_removed() {
        let mut timeline = Timeline::new("run");
        add(&mut timeline, 5, "Noob Cave");
        add(&mut timeline, 6, "The Spooky Forest");
        timeline.current_tally_mut().meat.gained = 30;
        timeline.current_interval_mut().free_runaways_mut().successes = 2;
        add(&mut timeline, 6, "The Sleazy Back Alley");

        let areas: Vec<_> = timeline.intervals().iter().map(TurnInterval::area).collect();
        assert_eq!(areas, vec![NOT_AN_ADVENTURE, "Noob Cave", "The Sleazy Back Alley"]);
        assert_eq!(timeline.intervals()[1].free_runaways().successes, 2);
        assert_eq!(timeline.intervals()[2].totals().meat.gained, 30);
    }

    #[test]
    fn test_duplicate_turn_rejoins_previous_area() {
        let mut timeline = Timeline::new("run");
        add(&mut timeline, 5, "Noob Cave");
        add(&mut timeline, 6, "The Spooky Forest");
        add(&mut timeline, 6, "Noob Cave");

        assert_eq!(ends(&timeline), vec![0, 6]);
        assert_eq!(timeline.intervals()[1].turns().len(), 2);
    }

    #[test]
    fn test_equipment_runaway_credited_on_duplicate_turn() {
        let mut timeline = Timeline::new("run");
        let pants = timeline
            .current_equipment()
            .with_slot(0, Slot::Pants, Some("Greatest American Pants".into()));
        timeline.add_equipment_change(pants);

        add(&mut timeline, 5, "Noob Cave");
        add(&mut timeline, 6, "Noob Cave");
        if let Some(turn) = timeline.current_turn_mut() {
            turn.ran_away = true;
        }
        add(&mut timeline, 6, "The Spooky Forest");

        assert_eq!(timeline.intervals()[1].free_runaways().successes, 1);
    }

    #[test]
    fn test_add_interval_key_collision_donates_to_predecessor() {
        let mut timeline = Timeline::new("run");
        timeline.add_interval(TurnInterval::aggregated(0, 5, "Noob Cave"));
        let mut alley = TurnInterval::aggregated(5, 8, "The Sleazy Back Alley");
        alley.tally_mut().meat.gained = 40;
        timeline.add_interval(alley);
        timeline.add_interval(TurnInterval::aggregated(12, 20, "The Haunted Pantry"));

        timeline.add_interval(TurnInterval::aggregated(5, 8, "The Spooky Forest"));

        let areas: Vec<_> = timeline.intervals().iter().map(TurnInterval::area).collect();
        assert_eq!(
            areas,
            vec![NOT_AN_ADVENTURE, "Noob Cave", "The Spooky Forest", "The Haunted Pantry"]
        );
        assert_eq!(timeline.intervals()[1].tally().meat.gained, 40);
    }

    #[test]
    fn test_add_interval_same_area_extends_last() {
        let mut timeline = Timeline::new("run");
        timeline.add_interval(TurnInterval::aggregated(0, 5, "Noob Cave"));
        timeline.add_interval(TurnInterval::aggregated(5, 9, "Noob Cave"));
        assert_eq!(timeline.intervals().len(), 2);
        assert_eq!(timeline.intervals()[1].key(), (0, 9));
    }

    #[test]
    fn test_familiar_changes_never_repeat() {
        let mut timeline = Timeline::new("run");
        let change = |turn, name: Option<&str>| FamiliarChange {
            turn,
            familiar: name.map(str::to_string),
        };
        timeline.add_familiar_change(change(3, Some("Hovering Sombrero")));
        timeline.add_familiar_change(change(7, Some("Hovering Sombrero")));
        timeline.add_familiar_change(change(9, None));
        timeline.add_familiar_change(change(1, Some("Hovering Sombrero")));

        let turns: Vec<_> = timeline.familiars().keys().copied().collect();
        assert_eq!(turns, vec![0, 1, 9]);
        assert_eq!(timeline.familiar_at(8), Some("Hovering Sombrero"));
        assert_eq!(timeline.familiar_at(9), None);
    }

    #[test]
    fn test_day_of_turn() {
        let mut timeline = Timeline::new("run");
        timeline.add_day_change(2, 40);
        timeline.add_day_change(3, 85);
        timeline.add_day_change(2, 60);

        assert_eq!(timeline.current_day(), 3);
        assert_eq!(timeline.day_of_turn(40), 1);
        assert_eq!(timeline.day_of_turn(41), 2);
        assert_eq!(timeline.day_of_turn(200), 3);
    }

    #[test]
    fn test_snapshot_sets_class_once() {
        let mut timeline = Timeline::new("run");
        timeline.add_snapshot(PlayerSnapshot {
            turn: 0,
            class: Some(CharacterClass::Sauceror),
            ..PlayerSnapshot::default()
        });
        timeline.add_snapshot(PlayerSnapshot {
            turn: 10,
            class: Some(CharacterClass::TurtleTamer),
            ..PlayerSnapshot::default()
        });
        assert_eq!(timeline.character_class(), Some(CharacterClass::Sauceror));
        assert_eq!(timeline.snapshots().len(), 2);
    }

    #[test]
    fn test_new_turn_copies_current_state() {
        let mut timeline = Timeline::new("run");
        timeline.add_familiar_change(FamiliarChange {
            turn: 0,
            familiar: Some("Mosquito".into()),
        });
        let hat = timeline
            .current_equipment()
            .with_slot(0, Slot::Hat, Some("iron helm".into()));
        timeline.add_equipment_change(hat);

        let turn = timeline.new_turn(1, "Noob Cave");
        assert_eq!(turn.familiar.as_deref(), Some("Mosquito"));
        assert_eq!(turn.equipment.get(Slot::Hat), Some("iron helm"));
    }
}
