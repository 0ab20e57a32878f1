//! Single turns and the intervals that group them.

use serde::Serialize;

use crate::equipment::EquipmentChange;
use crate::tally::TurnTally;

/// Area name of the seed interval that holds data logged before the first
/// adventure.
pub const NOT_AN_ADVENTURE: &str = "Not an adventure";

/// Classification of a spent turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Combat,
    Noncombat,
    Other,
    /// The source had no per-turn information (pre-aggregated intervals).
    #[default]
    Undefined,
}

/// One spent turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleTurn {
    pub turn: u32,
    pub area: String,
    pub encounter: String,
    pub kind: TurnKind,
    /// Familiar in use when the turn started; `None` for no familiar.
    pub familiar: Option<String>,
    /// Loadout in use when the turn started.
    pub equipment: EquipmentChange,
    pub tally: TurnTally,
    pub disintegrated: bool,
    pub ran_away: bool,
}

impl SingleTurn {
    /// A turn in `area` whose encounter name defaults to the area name.
    pub fn new(turn: u32, area: impl Into<String>) -> Self {
        let area = area.into();
        Self {
            turn,
            encounter: area.clone(),
            area,
            kind: TurnKind::Other,
            familiar: None,
            equipment: EquipmentChange::default(),
            tally: TurnTally::default(),
            disintegrated: false,
            ran_away: false,
        }
    }

    #[must_use]
    pub fn with_encounter(mut self, encounter: impl Into<String>) -> Self {
        self.encounter = encounter.into();
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: TurnKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Free runaway counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FreeRunaways {
    pub attempts: i32,
    pub successes: i32,
}

impl std::ops::AddAssign for FreeRunaways {
    fn add_assign(&mut self, rhs: Self) {
        self.attempts += rhs.attempts;
        self.successes += rhs.successes;
    }
}

/// Data that can be moved from one interval into another when intervals are
/// merged or discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalData {
    pub tally: TurnTally,
    pub free_runaways: FreeRunaways,
    pub notes: Vec<String>,
}

/// Consecutive turns spent in one area, covering `(start_turn, end_turn]`.
///
/// Intervals built from session logs carry their turns; intervals read from
/// pre-aggregated sources have no `SingleTurn`s and keep all their data in
/// the interval-level tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnInterval {
    start_turn: u32,
    end_turn: u32,
    area: String,
    turns: Vec<SingleTurn>,
    tally: TurnTally,
    free_runaways: FreeRunaways,
    notes: Vec<String>,
}

impl TurnInterval {
    /// Opens an interval that starts after `start_turn` and holds `turn`.
    pub fn starting_with(start_turn: u32, turn: SingleTurn) -> Self {
        Self {
            start_turn: start_turn.min(turn.turn),
            end_turn: turn.turn,
            area: turn.area.clone(),
            turns: vec![turn],
            tally: TurnTally::default(),
            free_runaways: FreeRunaways::default(),
            notes: Vec::new(),
        }
    }

    /// An interval without per-turn granularity.
    pub fn aggregated(start_turn: u32, end_turn: u32, area: impl Into<String>) -> Self {
        Self {
            start_turn: start_turn.min(end_turn),
            end_turn,
            area: area.into(),
            turns: Vec::new(),
            tally: TurnTally::default(),
            free_runaways: FreeRunaways::default(),
            notes: Vec::new(),
        }
    }

    pub const fn start_turn(&self) -> u32 {
        self.start_turn
    }

    pub const fn end_turn(&self) -> u32 {
        self.end_turn
    }

    /// Ordering key: start turn, then end turn as tie-break.
    pub const fn key(&self) -> (u32, u32) {
        (self.start_turn, self.end_turn)
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn turns(&self) -> &[SingleTurn] {
        &self.turns
    }

    /// Number of turns covered, whether or not they were logged individually.
    pub const fn turn_count(&self) -> u32 {
        self.end_turn - self.start_turn
    }

    /// Interval-level data not attached to any single turn.
    pub const fn tally(&self) -> &TurnTally {
        &self.tally
    }

    pub const fn free_runaways(&self) -> FreeRunaways {
        self.free_runaways
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn last_turn(&self) -> Option<&SingleTurn> {
        self.turns.last()
    }

    pub fn last_turn_mut(&mut self) -> Option<&mut SingleTurn> {
        self.turns.last_mut()
    }

    /// Interval-level tally plus every turn's tally.
    pub fn totals(&self) -> TurnTally {
        let mut totals = self.tally.clone();
        for turn in &self.turns {
            totals.merge_from(&turn.tally);
        }
        totals
    }

    /// The tally new data should be booked against: the last turn if there
    /// is one, the interval itself otherwise.
    pub fn current_tally_mut(&mut self) -> &mut TurnTally {
        match self.turns.last_mut() {
            Some(turn) => &mut turn.tally,
            None => &mut self.tally,
        }
    }

    pub const fn tally_mut(&mut self) -> &mut TurnTally {
        &mut self.tally
    }

    pub const fn free_runaways_mut(&mut self) -> &mut FreeRunaways {
        &mut self.free_runaways
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Appends a turn of the same area, extending the end turn.
    pub(crate) fn push_turn(&mut self, turn: SingleTurn) {
        self.end_turn = self.end_turn.max(turn.turn);
        self.turns.push(turn);
    }

    /// Removes the last turn if it has the given turn number, pulling the end
    /// turn back to the new last turn.
    pub(crate) fn remove_last_turn_numbered(&mut self, number: u32) -> Option<SingleTurn> {
        if self.turns.last().is_none_or(|t| t.turn != number) {
            return None;
        }
        let removed = self.turns.pop()?;
        if let Some(last) = self.turns.last() {
            self.end_turn = last.turn.max(self.start_turn);
        } else {
            self.end_turn = self.start_turn;
        }
        Some(removed)
    }

    /// Extends this interval to cover `other` and takes over its data.
    pub(crate) fn extend_with(&mut self, other: Self) {
        self.start_turn = self.start_turn.min(other.start_turn);
        self.end_turn = self.end_turn.max(other.end_turn);
        self.turns.extend(other.turns);
        self.tally.absorb(other.tally);
        self.free_runaways += other.free_runaways;
        self.notes.extend(other.notes);
    }

    /// Consumes the interval, returning all its data flattened.
    pub(crate) fn into_data(self) -> IntervalData {
        let mut tally = self.tally;
        for turn in self.turns {
            tally.absorb(turn.tally);
        }
        IntervalData {
            tally,
            free_runaways: self.free_runaways,
            notes: self.notes,
        }
    }

    /// Adds donated data to the interval-level accumulators.
    pub(crate) fn receive(&mut self, data: IntervalData) {
        self.tally.absorb(data.tally);
        self.free_runaways += data.free_runaways;
        self.notes.extend(data.notes);
    }

    pub fn has_turns(&self) -> bool {
        !self.turns.is_empty()
    }
}
