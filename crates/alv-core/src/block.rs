//! Splits a session log into classified blocks.
//!
//! Blocks are runs of lines separated by blank lines. Classification only
//! ever looks ahead (at most two lines); encounter blocks additionally use a
//! bounded look-ahead to skip blank lines injected into combat.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use serde::Serialize;

use crate::game_data::GameData;
use crate::patterns::{
    CONSUMABLE_USED, CONSUMABLE_VERBS, ENCOUNTER_PREFIX, LEGACY_FAMILIAR_POUND,
    PLAYER_SNAPSHOT_HEADER_LINES, PLAYER_SNAPSHOT_SEPARATOR, is_combat_line, is_turn_start,
};

/// Lines consumed after a legacy "gains a pound" line and its blank.
const LEGACY_POUND_SKIP_LINES: usize = 3;

/// Lines inspected after a blank line inside an encounter.
const COMBAT_LOOKAHEAD_LINES: usize = 3;

/// Type tag of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Encounter,
    Consumable,
    PlayerSnapshot,
    Other,
}

/// An ordered run of raw lines with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBlock {
    pub kind: BlockKind,
    pub lines: Vec<String>,
}

/// Forward-only line stream with mark/reset replay.
struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    replay: VecDeque<String>,
    recording: Option<Vec<String>>,
}

impl<R: BufRead> LineSource<R> {
    const fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            replay: VecDeque::new(),
            recording: None,
        }
    }

    fn read_raw(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let line = match self.replay.pop_front() {
            Some(line) => Some(line),
            None => self.read_raw()?,
        };
        if let (Some(recording), Some(line)) = (self.recording.as_mut(), line.as_ref()) {
            recording.push(line.clone());
        }
        Ok(line)
    }

    /// Starts recording consumed lines so they can be replayed.
    fn mark(&mut self) {
        self.recording = Some(Vec::new());
    }

    /// Replays everything consumed since `mark`.
    fn reset(&mut self) {
        if let Some(recorded) = self.recording.take() {
            for line in recorded.into_iter().rev() {
                self.replay.push_front(line);
            }
        }
    }

    /// Keeps everything consumed since `mark`.
    fn commit(&mut self) {
        self.recording = None;
    }

    fn peek(&mut self) -> io::Result<Option<String>> {
        self.mark();
        let line = self.next_line()?;
        self.reset();
        Ok(line)
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Lazy iterator of classified blocks.
///
/// A clean end of input ends iteration; a read error is yielded once and then
/// iteration stops.
pub struct BlockReader<'d, R> {
    source: LineSource<R>,
    data: &'d GameData,
    exhausted: bool,
}

impl<'d, R: BufRead> BlockReader<'d, R> {
    pub const fn new(reader: R, data: &'d GameData) -> Self {
        Self {
            source: LineSource::new(reader),
            data,
            exhausted: false,
        }
    }

    fn is_broken_encounter(&self, line: &str) -> bool {
        line.strip_prefix(ENCOUNTER_PREFIX)
            .is_some_and(|name| self.data.broken_area(name).is_some())
    }

    fn classify(&mut self, first: &str) -> io::Result<BlockKind> {
        if is_turn_start(first) || self.is_broken_encounter(first) {
            return Ok(BlockKind::Encounter);
        }
        if first.trim() == PLAYER_SNAPSHOT_SEPARATOR.trim() {
            return Ok(BlockKind::PlayerSnapshot);
        }
        if CONSUMABLE_VERBS.iter().any(|verb| first.starts_with(verb))
            && CONSUMABLE_USED.is_match(first)
        {
            return Ok(BlockKind::Consumable);
        }
        if let Some(next) = self.source.peek()? {
            if self.is_broken_encounter(&next) {
                return Ok(BlockKind::Encounter);
            }
        }
        Ok(BlockKind::Other)
    }

    /// Reads until a blank line. Returns `false` if input ended first.
    fn read_until_blank(&mut self, lines: &mut Vec<String>) -> io::Result<bool> {
        while let Some(line) = self.source.next_line()? {
            if is_blank(&line) {
                return Ok(true);
            }
            lines.push(line);
        }
        Ok(false)
    }

    fn read_snapshot(&mut self, lines: &mut Vec<String>) -> io::Result<bool> {
        for _ in 1..PLAYER_SNAPSHOT_HEADER_LINES {
            match self.source.next_line()? {
                Some(line) => lines.push(line),
                None => return Ok(false),
            }
        }
        self.read_until_blank(lines)
    }

    /// Looks past a blank line for a combat round that continues the block.
    /// Scanning resumes from that round, so any non-combat lines between the
    /// blank and the round are dropped.
    fn find_continued_combat(&mut self) -> io::Result<Option<String>> {
        self.source.mark();
        for _ in 0..COMBAT_LOOKAHEAD_LINES {
            let Some(line) = self.source.next_line()? else {
                break;
            };
            if is_turn_start(&line) {
                break;
            }
            if is_combat_line(&line) {
                self.source.commit();
                return Ok(Some(line));
            }
        }
        self.source.reset();
        Ok(None)
    }

    fn read_encounter(&mut self, lines: &mut Vec<String>) -> io::Result<bool> {
        loop {
            let Some(line) = self.source.next_line()? else {
                return Ok(false);
            };
            if !is_blank(&line) {
                lines.push(line);
                continue;
            }

            if lines.last().is_some_and(|last| LEGACY_FAMILIAR_POUND.is_match(last)) {
                tracing::trace!("skipping blank line after legacy familiar weight notation");
                for _ in 0..LEGACY_POUND_SKIP_LINES {
                    match self.source.next_line()? {
                        Some(extra) if !is_blank(&extra) => lines.push(extra),
                        Some(_) => {}
                        None => return Ok(false),
                    }
                }
                continue;
            }

            if let Some(combat) = self.find_continued_combat()? {
                tracing::debug!(line = %combat, "blank line inside combat treated as noise");
                lines.push(combat);
                continue;
            }
            return Ok(true);
        }
    }

    fn read_block(&mut self) -> io::Result<Option<LogBlock>> {
        let first = loop {
            match self.source.next_line()? {
                None => return Ok(None),
                Some(line) if is_blank(&line) => {}
                Some(line) => break line,
            }
        };

        let kind = self.classify(&first)?;
        let mut lines = vec![first];
        let complete = match kind {
            BlockKind::Encounter => self.read_encounter(&mut lines)?,
            BlockKind::PlayerSnapshot => self.read_snapshot(&mut lines)?,
            BlockKind::Consumable | BlockKind::Other => self.read_until_blank(&mut lines)?,
        };
        if !complete {
            self.exhausted = true;
        }
        Ok(Some(LogBlock { kind, lines }))
    }
}

impl<R: BufRead> Iterator for BlockReader<'_, R> {
    type Item = io::Result<LogBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(text: &str) -> Vec<LogBlock> {
        BlockReader::new(text.as_bytes(), GameData::bundled())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    fn kinds(blocks: &[LogBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_classifies_each_kind() {
        let text = "\
[1] The Haunted Pantry
Encounter: possessed can of tomatoes

eat 1 Hell ramen
You gain 6 Adventures

                   Player Snapshot
-----------------------------------------------------

Class: Sauceror
Level: 3

equip hat iron helm
familiar Hovering Sombrero (5 lbs)
";
        let blocks = blocks(text);
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Encounter,
                BlockKind::Consumable,
                BlockKind::PlayerSnapshot,
                BlockKind::Other,
            ]
        );
        assert_eq!(blocks[2].lines.len(), 5);
        assert_eq!(blocks[3].lines.len(), 2);
    }

    #[test]
    fn test_blank_inside_combat_is_noise() {
        let text = "\
[2] Noob Cave
Encounter: crate
Round 0: Tester wins initiative!
Round 1: Tester attacks!

Round 2: Tester wins the fight!
You acquire an item: seal tooth

[3] Noob Cave
";
        let blocks = blocks(text);
        assert_eq!(kinds(&blocks), vec![BlockKind::Encounter, BlockKind::Encounter]);
        assert_eq!(blocks[0].lines.len(), 6);
        assert_eq!(blocks[0].lines[4], "Round 2: Tester wins the fight!");
    }

    #[test]
    fn test_lines_between_noise_blank_and_round_are_dropped() {
        let text = "\
[2] Noob Cave
Round 0: Tester wins initiative!

Tester's hat falls off.
Round 1: Tester wins the fight!

[3] Noob Cave
";
        let blocks = blocks(text);
        assert_eq!(kinds(&blocks), vec![BlockKind::Encounter, BlockKind::Encounter]);
        assert_eq!(
            blocks[0].lines,
            vec![
                "[2] Noob Cave",
                "Round 0: Tester wins initiative!",
                "Round 1: Tester wins the fight!",
            ]
        );
        assert_eq!(blocks[1].lines, vec!["[3] Noob Cave"]);
    }

    #[test]
    fn test_blank_before_new_turn_ends_block() {
        let text = "\
[2] Noob Cave
Round 0: Tester wins initiative!

[3] Noob Cave
Round 0: Tester wins initiative!
";
        let blocks = blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].lines[0], "[3] Noob Cave");
    }

    #[test]
    fn test_rejected_lookahead_lines_are_replayed() {
        let text = "\
[2] Noob Cave
Round 0: Tester wins initiative!

equip hat iron helm
cast 1 Saucy Salve
";
        let blocks = blocks(text);
        assert_eq!(kinds(&blocks), vec![BlockKind::Encounter, BlockKind::Other]);
        assert_eq!(
            blocks[1].lines,
            vec!["equip hat iron helm".to_string(), "cast 1 Saucy Salve".to_string()]
        );
    }

    #[test]
    fn test_legacy_familiar_pound_skips_blank() {
        let text = "\
[4] The Spooky Forest
Round 0: Tester wins initiative!
Hovering Sombrero gains a pound!

You acquire an item: tree-holed coin
You gain 12 Meat
You gain 2 Strongness
Round 3: unreachable only via skip

[5] The Spooky Forest
";
        let blocks = blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 7);
        assert_eq!(blocks[0].lines[3], "You acquire an item: tree-holed coin");
    }

    #[test]
    fn test_eof_mid_block_ends_iteration() {
        let text = "[6] Noob Cave\nEncounter: crate\nRound 0: Tester wins initiative!";
        let mut reader = BlockReader::new(text.as_bytes(), GameData::bundled());
        let block = reader.next().unwrap().unwrap();
        assert_eq!(block.lines.len(), 3);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_broken_area_begins_encounter() {
        let text = "\
Visiting the travel agency
Encounter: Vacation
You spent 500 Meat
";
        let blocks = blocks(text);
        assert_eq!(kinds(&blocks), vec![BlockKind::Encounter]);
        assert_eq!(blocks[0].lines.len(), 3);
    }

    #[test]
    fn test_snapshot_header_lines_consumed_unconditionally() {
        let text = "\
                   Player Snapshot

\nClass: Seal Clubber

cast 1 Saucy Salve
";
        let blocks = blocks(text);
        assert_eq!(kinds(&blocks), vec![BlockKind::PlayerSnapshot, BlockKind::Other]);
        assert_eq!(blocks[0].lines.last().unwrap(), "Class: Seal Clubber");
    }

    #[test]
    fn test_crlf_and_invalid_utf8() {
        let bytes = b"[1] Noob Cave\r\nEncounter: cr\xe2te\r\n\r\n";
        let blocks: Vec<_> = BlockReader::new(&bytes[..], GameData::bundled())
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(blocks[0].lines[0], "[1] Noob Cave");
        assert!(blocks[0].lines[1].starts_with("Encounter: cr"));
    }
}
