//! Block parsers and the per-log orchestrator.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::block::{BlockKind, BlockReader, LogBlock};
use crate::game_data::GameData;
use crate::line::{ParseContext, dispatch};
use crate::patterns::{
    COMBAT_START_PREFIX, CONDENSED_LOG_FILE, CONSUMABLE_USED, ENCOUNTER_PREFIX,
    PLAYER_SNAPSHOT_HEADER_LINES, SNAPSHOT_FIELD, SNAPSHOT_STAT, TURN_START, parse_number,
};
use crate::tally::{Consumable, ConsumableKind, MpSource};
use crate::timeline::{PlayerSnapshot, StatValue, Timeline};
use crate::turn::TurnKind;
use crate::types::{CharacterClass, Username};

/// Failure to read a log. Carries the last turn parsed before the failure.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path} after turn {last_turn}")]
    Read {
        path: PathBuf,
        last_turn: u32,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => path,
        }
    }

    pub const fn last_turn(&self) -> Option<u32> {
        match self {
            Self::Open { .. } => None,
            Self::Read { last_turn, .. } => Some(*last_turn),
        }
    }
}

/// Parses one encounter block: opens the turn, then hands the remaining
/// lines to the line chain.
fn parse_encounter(lines: &[String], ctx: &mut ParseContext<'_>) {
    let Some((first, rest)) = lines.split_first() else {
        return;
    };

    if let Some(caps) = TURN_START.captures(first) {
        let Ok(number) = caps[1].parse::<u32>() else {
            tracing::debug!(line = %first, "turn number out of range, block skipped");
            return;
        };
        let turn = ctx.timeline.new_turn(number, &caps[2]);
        ctx.timeline.add_turn(turn);
    } else {
        let data = ctx.data;
        let Some(broken) = lines.iter().find_map(|line| {
            line.strip_prefix(ENCOUNTER_PREFIX)
                .and_then(|name| data.broken_area(name))
        }) else {
            return;
        };
        let Some(number) = ctx.timeline.last_turn_number().checked_add(broken.turns) else {
            tracing::debug!(area = %broken.area, "turn number out of range, block skipped");
            return;
        };
        let turn = ctx.timeline.new_turn(number, &broken.area);
        ctx.timeline.add_turn(turn);
        ctx.timeline.current_tally_mut().meat.spent += broken.meat;
    }

    ctx.begin_block(MpSource::Encounter);
    for line in rest {
        if let Some(name) = line.strip_prefix(ENCOUNTER_PREFIX) {
            if let Some(turn) = ctx.timeline.current_turn_mut() {
                turn.encounter = name.trim().to_string();
                if turn.kind != TurnKind::Combat {
                    turn.kind = TurnKind::Noncombat;
                }
            }
            continue;
        }
        if line.starts_with(COMBAT_START_PREFIX) {
            if let Some(turn) = ctx.timeline.current_turn_mut() {
                turn.kind = TurnKind::Combat;
            }
        }
        dispatch(line, ctx);
    }
}

/// Parses a consumable block. Later lines of the block are credited to the
/// consumable.
fn parse_consumable(lines: &[String], ctx: &mut ParseContext<'_>) {
    let Some((first, rest)) = lines.split_first() else {
        return;
    };
    let Some(caps) = CONSUMABLE_USED.captures(first) else {
        parse_other(lines, ctx);
        return;
    };

    let amount = parse_number(&caps[2])
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(1);
    let kind = ConsumableKind::from_verb(&caps[1]);
    let turn = ctx.timeline.last_turn_number();
    let day = ctx.timeline.current_day();
    let price = caps.get(4).and_then(|m| parse_number(m.as_str()));

    let tally = ctx.timeline.current_tally_mut();
    tally
        .consumables
        .push(Consumable::new(caps[3].trim(), amount, kind, turn, day));
    let index = tally.consumables.len() - 1;
    if let Some(price) = price {
        tally.meat.spent += price * i64::from(amount);
    }

    ctx.begin_block(MpSource::Consumable);
    ctx.consumable = Some(index);
    for line in rest {
        dispatch(line, ctx);
    }
    ctx.consumable = None;
}

fn stat_value(text: &str) -> StatValue {
    SNAPSHOT_STAT.captures(text).map_or_else(StatValue::default, |caps| {
        let buffed = parse_number(&caps[1])
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0);
        let base = caps
            .get(2)
            .and_then(|m| parse_number(m.as_str()))
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(buffed);
        StatValue { buffed, base }
    })
}

/// Parses the fixed snapshot layout into a snapshot at the current turn.
fn parse_snapshot(lines: &[String], ctx: &mut ParseContext<'_>) {
    let mut snapshot = PlayerSnapshot {
        turn: ctx.timeline.last_turn_number(),
        ..PlayerSnapshot::default()
    };
    for line in lines.iter().skip(PLAYER_SNAPSHOT_HEADER_LINES) {
        let Some(caps) = SNAPSHOT_FIELD.captures(line) else {
            continue;
        };
        let value = &caps[2];
        match caps[1].to_ascii_lowercase().as_str() {
            "class" => snapshot.class = CharacterClass::from_str(value).ok(),
            "level" => snapshot.level = value.trim().parse().ok(),
            "muscle" => snapshot.muscle = stat_value(value),
            "mysticality" => snapshot.mysticality = stat_value(value),
            "moxie" => snapshot.moxie = stat_value(value),
            "adventures left" => {
                snapshot.adventures_left = parse_number(value).and_then(|n| i32::try_from(n).ok());
            }
            "meat" => snapshot.meat = parse_number(value),
            _ => {}
        }
    }
    ctx.timeline.add_snapshot(snapshot);
}

fn parse_other(lines: &[String], ctx: &mut ParseContext<'_>) {
    ctx.begin_block(MpSource::Other);
    for line in lines {
        dispatch(line, ctx);
    }
}

/// Applies one classified block to the timeline.
pub fn parse_block(block: &LogBlock, ctx: &mut ParseContext<'_>) {
    match block.kind {
        BlockKind::Encounter => parse_encounter(&block.lines, ctx),
        BlockKind::Consumable => parse_consumable(&block.lines, ctx),
        BlockKind::PlayerSnapshot => parse_snapshot(&block.lines, ctx),
        BlockKind::Other => parse_other(&block.lines, ctx),
    }
}

/// Reads session logs into timelines.
#[derive(Debug, Clone, Copy)]
pub struct LogParser<'d> {
    data: &'d GameData,
    parse_notes: bool,
}

impl<'d> LogParser<'d> {
    pub const fn new(data: &'d GameData) -> Self {
        Self {
            data,
            parse_notes: false,
        }
    }

    #[must_use]
    pub const fn with_notes(mut self, parse_notes: bool) -> Self {
        self.parse_notes = parse_notes;
        self
    }

    /// Parses a log from any buffered reader. `source` names the log in
    /// errors and supplies the timeline name.
    pub fn parse_reader<R: BufRead>(&self, source: &Path, reader: R) -> Result<Timeline, IngestError> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let name = source
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name);
        let mut timeline = Timeline::new(name);
        if let Some(username) = CONDENSED_LOG_FILE
            .captures(file_name)
            .and_then(|caps| Username::new(&caps[1]).ok())
        {
            timeline.set_username(username);
        }

        let mut ctx = ParseContext::new(&mut timeline, self.data).with_notes(self.parse_notes);
        let mut blocks = 0_usize;
        for block in BlockReader::new(reader, self.data) {
            let block = block.map_err(|source_err| IngestError::Read {
                path: source.to_path_buf(),
                last_turn: ctx.timeline.last_turn_number(),
                source: source_err,
            })?;
            parse_block(&block, &mut ctx);
            blocks += 1;
        }

        tracing::debug!(
            log = %source.display(),
            blocks,
            last_turn = timeline.last_turn_number(),
            "log parsed"
        );
        Ok(timeline)
    }

    pub fn parse_file(&self, path: &Path) -> Result<Timeline, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader(path, BufReader::new(file))
    }

    pub fn parse_str(&self, name: &str, text: &str) -> Timeline {
        // Reading from memory cannot fail.
        self.parse_reader(Path::new(name), text.as_bytes())
            .unwrap_or_else(|_| Timeline::new(name))
    }
}
