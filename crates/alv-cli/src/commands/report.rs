//! Plain text and JSON rendering of ascension summaries.

use std::fmt::{self, Write};
use std::path::Path;

use alv_core::{LogFailure, Summary};
use serde::Serialize;

/// Areas listed in the text report.
const AREA_LIMIT: usize = 10;

/// Familiars listed in the text report.
const FAMILIAR_LIMIT: usize = 5;

/// One ascension in JSON output.
#[derive(Debug, Serialize)]
pub struct SummaryEntry<'a> {
    pub log: &'a str,
    pub summary: &'a Summary,
}

/// A log that could not be read, in JSON output.
#[derive(Debug, Serialize)]
pub struct FailureEntry<'a> {
    pub file: &'a Path,
    pub last_turn: Option<u32>,
    pub message: &'a str,
}

impl<'a> From<&'a LogFailure> for FailureEntry<'a> {
    fn from(failure: &'a LogFailure) -> Self {
        Self {
            file: &failure.file,
            last_turn: failure.last_turn,
            message: &failure.message,
        }
    }
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "─".repeat(title.chars().count()))
}

const fn plural(count: u32) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn write_summary(out: &mut String, name: &str, summary: &Summary) -> fmt::Result {
    writeln!(out, "ASCENSION: {name}")?;
    match summary.character_class {
        Some(class) if summary.class_inferred => writeln!(out, "Class: {class} (inferred)")?,
        Some(class) => writeln!(out, "Class: {class}")?,
        None => writeln!(out, "Class: unknown")?,
    }
    writeln!(
        out,
        "Turns: {} over {} day{}",
        summary.total_turns,
        summary.days,
        plural(summary.days)
    )?;
    let gains = summary.stat_gains;
    writeln!(
        out,
        "Substats gained: muscle {}, mysticality {}, moxie {}",
        gains.muscle, gains.mysticality, gains.moxie
    )?;

    section(out, "LEVELS")?;
    for level in summary.levels.values() {
        writeln!(out, "  Level {:<3} turn {}", level.level, level.turn_reached)?;
    }

    section(out, "TURNS")?;
    let kinds = summary.turn_kinds;
    writeln!(
        out,
        "  combat {}, noncombat {}, other {}, no detail {}",
        kinds.combat, kinds.noncombat, kinds.other, kinds.undefined
    )?;

    section(out, "AREAS")?;
    if summary.turns_per_area.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for entry in summary.turns_per_area.iter().take(AREA_LIMIT) {
        writeln!(out, "  {:>4}  {}", entry.turns, entry.area)?;
    }

    section(out, "FAMILIARS")?;
    if summary.familiar_usage.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for entry in summary.familiar_usage.iter().take(FAMILIAR_LIMIT) {
        writeln!(out, "  {:>4}  {}", entry.combat_turns, entry.familiar)?;
    }

    section(out, "QUESTS")?;
    let mut any_quest = false;
    for (quest, turns) in summary.quests.entries() {
        if turns > 0 {
            any_quest = true;
            writeln!(out, "  {quest:<20}{turns}")?;
        }
    }
    if !any_quest {
        writeln!(out, "  (no quest areas visited)")?;
    }

    section(out, "CONSUMABLES")?;
    if summary.consumables_by_day.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (day, consumables) in &summary.consumables_by_day {
        writeln!(out, "  Day {day}")?;
        for consumable in consumables {
            write!(
                out,
                "    {:<6} {} {}",
                consumable.kind.as_str(),
                consumable.amount,
                consumable.name
            )?;
            if consumable.adventure_gain != 0 {
                write!(out, " (+{} adventures)", consumable.adventure_gain)?;
            }
            writeln!(out)?;
        }
    }

    section(out, "RESOURCES")?;
    let meat = summary.meat;
    writeln!(
        out,
        "  Meat: {} gained, {} spent, net {}",
        meat.gained,
        meat.spent,
        meat.net()
    )?;
    let mp = summary.mp;
    writeln!(
        out,
        "  MP: {} gained (encounter {}, resting {}, starfish {}, consumables {}, other {})",
        mp.total(),
        mp.encounter,
        mp.resting,
        mp.starfish,
        mp.consumable,
        mp.other
    )?;
    writeln!(out, "  MP spent on skills: {}", summary.mp_spent_on_skills)?;
    writeln!(
        out,
        "  Adventures from consumables: {}",
        summary.adventures_from_consumables
    )?;
    writeln!(
        out,
        "  Free runaways: {} of {}",
        summary.free_runaways.successes, summary.free_runaways.attempts
    )?;
    if summary.pulls_per_day.is_empty() {
        writeln!(out, "  Pulls: none")?;
    } else {
        let pulls: Vec<String> = summary
            .pulls_per_day
            .iter()
            .map(|(day, amount)| format!("day {day}: {amount}"))
            .collect();
        writeln!(out, "  Pulls: {}", pulls.join(", "))?;
    }

    if !summary.lost_combats.is_empty() {
        section(out, "LOST COMBATS")?;
        for lost in &summary.lost_combats {
            writeln!(out, "  turn {}: {}", lost.turn, lost.name)?;
        }
    }
    Ok(())
}

/// Formats the human-readable summary of one ascension.
pub fn format_summary(name: &str, summary: &Summary) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_summary(&mut out, name, summary);
    out
}

/// Formats the failures of a batch run.
pub fn format_failures(failures: &[LogFailure]) -> String {
    let mut out = String::new();
    if failures.is_empty() {
        return out;
    }
    let _ = writeln!(out, "FAILED LOGS\n───────────");
    for failure in failures {
        let _ = match failure.last_turn {
            Some(turn) => writeln!(
                out,
                "  {} (after turn {turn}): {}",
                failure.file.display(),
                failure.message
            ),
            None => writeln!(out, "  {}: {}", failure.file.display(), failure.message),
        };
    }
    out
}
