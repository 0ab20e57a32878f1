//! Single-line recognizers.
//!
//! Every line of a block is offered to [`LineParser::CHAIN`] in order; the
//! first recognizer that accepts it applies its change and the line is done.
//! Lines nobody accepts are ignored.

use std::str::FromStr;

use crate::equipment::{EquipmentChange, Slot};
use crate::game_data::GameData;
use crate::patterns::{
    ADVENTURES_GAINED, CLASS_LINE, COMBAT_LINE, COMBAT_SKILL_CAST, CUSTOM_OUTFIT,
    CUSTOM_OUTFIT_ROLLBACKS, DAY_CHANGE, DISINTEGRATION, EQUIP, FAMILIAR, FAMILIAR_LOCK,
    FAMILIAR_NONE, FREE_RUNAWAY_EQUIPMENT, FREE_RUNAWAY_FAMILIAR, FREE_RUNAWAY_FAMILIARS,
    ITEM_COUNT_PREFIX, ITEM_COUNT_SUFFIX, ITEM_SINGLE, LOST_COMBAT, MEAT_GAINED, MEAT_SPENT,
    MP_GAINED, NOTE, OUTFIT, PULL, REST, RUNAWAY, SKILL_CAST, STARFISH_ATTACKS, STAT_GAINED,
    UNEQUIP, is_combat_line, parse_number, strip_after_battle, substat,
};
use crate::tally::{MpSource, TurnTally};
use crate::timeline::{FamiliarChange, LostCombat, Pull, Timeline};
use crate::types::CharacterClass;

/// Mutable state shared by the recognizers while one log is parsed.
pub struct ParseContext<'a> {
    pub timeline: &'a mut Timeline,
    pub data: &'a GameData,
    /// Source MP gains are booked against.
    pub mp_source: MpSource,
    pub parse_notes: bool,
    /// Index of the consumable the current block is about, in the current
    /// tally's consumable list.
    pub consumable: Option<usize>,
}

impl<'a> ParseContext<'a> {
    pub const fn new(timeline: &'a mut Timeline, data: &'a GameData) -> Self {
        Self {
            timeline,
            data,
            mp_source: MpSource::Other,
            parse_notes: false,
            consumable: None,
        }
    }

    #[must_use]
    pub const fn with_notes(mut self, parse_notes: bool) -> Self {
        self.parse_notes = parse_notes;
        self
    }

    /// Clears per-block state before a new block starts.
    pub const fn begin_block(&mut self, mp_source: MpSource) {
        self.mp_source = mp_source;
        self.consumable = None;
    }

    fn tally(&mut self) -> &mut TurnTally {
        self.timeline.current_tally_mut()
    }
}

/// One recognizer of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineParser {
    DayChange,
    Pull,
    Equipment,
    Familiar,
    Item,
    SkillCast,
    MeatGained,
    MeatSpent,
    MpGained,
    Adventures,
    StatGained,
    Rest,
    LostCombat,
    Class,
    Combat,
    Note,
}

impl LineParser {
    /// Consultation order.
    pub const CHAIN: [Self; 16] = [
        Self::DayChange,
        Self::Pull,
        Self::Equipment,
        Self::Familiar,
        Self::Item,
        Self::SkillCast,
        Self::MeatGained,
        Self::MeatSpent,
        Self::MpGained,
        Self::Adventures,
        Self::StatGained,
        Self::Rest,
        Self::LostCombat,
        Self::Class,
        Self::Combat,
        Self::Note,
    ];

    pub fn is_compatible(self, line: &str) -> bool {
        match self {
            Self::DayChange => line.starts_with("===") && DAY_CHANGE.is_match(line),
            Self::Pull => line.starts_with("pull: ") && PULL.is_match(line),
            Self::Equipment => {
                EQUIP.is_match(line)
                    || UNEQUIP.is_match(line)
                    || OUTFIT.is_match(line)
                    || CUSTOM_OUTFIT.is_match(line)
            }
            Self::Familiar => {
                line == FAMILIAR_LOCK || line == FAMILIAR_NONE || FAMILIAR.is_match(line)
            }
            Self::Item => {
                line.starts_with("You acquire ")
                    && (ITEM_SINGLE.is_match(line)
                        || ITEM_COUNT_SUFFIX.is_match(line)
                        || ITEM_COUNT_PREFIX.is_match(line))
            }
            Self::SkillCast => SKILL_CAST.is_match(line),
            Self::MeatGained => MEAT_GAINED.is_match(line),
            Self::MeatSpent => MEAT_SPENT.is_match(line),
            Self::MpGained => MP_GAINED.is_match(line),
            Self::Adventures => ADVENTURES_GAINED.is_match(line),
            Self::StatGained => STAT_GAINED
                .captures(line)
                .is_some_and(|caps| substat(&caps[2]).is_some()),
            Self::Rest => REST.is_match(line),
            Self::LostCombat => line.trim_end() == LOST_COMBAT,
            Self::Class => CLASS_LINE.is_match(line),
            Self::Combat => is_combat_line(line),
            Self::Note => NOTE.is_match(line),
        }
    }

    /// Applies a compatible line to the timeline.
    pub fn apply(self, line: &str, ctx: &mut ParseContext<'_>) {
        match self {
            Self::DayChange => apply_day_change(line, ctx),
            Self::Pull => apply_pull(line, ctx),
            Self::Equipment => apply_equipment(line, ctx),
            Self::Familiar => apply_familiar(line, ctx),
            Self::Item => apply_item(line, ctx),
            Self::SkillCast => {
                if let Some(caps) = SKILL_CAST.captures(line) {
                    let amount = count(&caps[1]);
                    let turn = ctx.timeline.last_turn_number();
                    ctx.tally().add_skill(caps[2].trim(), amount, turn);
                }
            }
            Self::MeatGained => {
                if let Some(amount) = MEAT_GAINED.captures(line).and_then(|c| parse_number(&c[1])) {
                    ctx.tally().meat.gained += amount;
                }
            }
            Self::MeatSpent => {
                if let Some(amount) = MEAT_SPENT.captures(line).and_then(|c| parse_number(&c[1])) {
                    ctx.tally().meat.spent += amount;
                }
            }
            Self::MpGained => {
                if let Some(caps) = MP_GAINED.captures(line) {
                    let amount = count(&caps[1]);
                    let source = ctx.mp_source;
                    ctx.tally().mp_gain.add(source, amount);
                }
            }
            Self::Adventures => apply_adventures(line, ctx),
            Self::StatGained => apply_stat_gain(line, ctx),
            Self::Rest => ctx.mp_source = MpSource::Resting,
            Self::LostCombat => {
                let turn = ctx.timeline.last_turn_number();
                let name = ctx
                    .timeline
                    .current_turn_mut()
                    .map(|t| t.encounter.clone())
                    .unwrap_or_default();
                ctx.timeline.add_lost_combat(LostCombat { name, turn });
            }
            Self::Class => {
                let class = CLASS_LINE
                    .captures(line)
                    .and_then(|caps| CharacterClass::from_str(&caps[1]).ok());
                if let Some(class) = class {
                    if ctx.timeline.character_class().is_none() {
                        ctx.timeline.set_character_class(class);
                    }
                }
            }
            Self::Combat => apply_combat(line, ctx),
            Self::Note => {
                if ctx.parse_notes {
                    if let Some(caps) = NOTE.captures(line) {
                        ctx.timeline.current_interval_mut().add_note(&caps[1]);
                    }
                }
            }
        }
    }
}

/// Runs a line through the chain, returning the recognizer that took it.
pub fn dispatch(line: &str, ctx: &mut ParseContext<'_>) -> Option<LineParser> {
    let line = strip_after_battle(line.trim_end());
    let parser = LineParser::CHAIN
        .into_iter()
        .find(|parser| parser.is_compatible(line))?;
    parser.apply(line, ctx);
    Some(parser)
}

fn count(text: &str) -> i32 {
    parse_number(text)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0)
}

fn apply_day_change(line: &str, ctx: &mut ParseContext<'_>) {
    let Some(day) = DAY_CHANGE
        .captures(line)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    else {
        return;
    };
    let turn = ctx.timeline.last_turn_number();
    ctx.timeline.add_day_change(day, turn);
}

fn apply_pull(line: &str, ctx: &mut ParseContext<'_>) {
    let Some(caps) = PULL.captures(line) else {
        return;
    };
    let pull = Pull {
        turn: ctx.timeline.last_turn_number(),
        day: ctx.timeline.current_day(),
        item: caps[2].to_string(),
        amount: count(&caps[1]),
    };
    ctx.timeline.add_pull(pull);
}

fn apply_equipment(line: &str, ctx: &mut ParseContext<'_>) {
    let turn = ctx.timeline.last_turn_number();
    let current = ctx.timeline.current_equipment();

    let next = if let Some(caps) = CUSTOM_OUTFIT.captures(line) {
        let name = caps[1].trim();
        if CUSTOM_OUTFIT_ROLLBACKS
            .iter()
            .any(|rollback| rollback.eq_ignore_ascii_case(name))
        {
            EquipmentChange {
                turn,
                ..ctx.timeline.last_non_custom_equipment()
            }
        } else {
            EquipmentChange {
                from_custom_outfit: true,
                ..EquipmentChange::empty(turn)
            }
        }
    } else if let Some(caps) = OUTFIT.captures(line) {
        let Some(outfit) = ctx.data.outfit(&caps[1]) else {
            tracing::debug!(outfit = &caps[1], "unknown outfit ignored");
            return;
        };
        current.with_slots(turn, outfit.iter().map(|(slot, item)| (*slot, item)))
    } else if let Some(caps) = EQUIP.captures(line) {
        let Some(slot) = Slot::from_command(&caps[1]) else {
            return;
        };
        current.with_slot(turn, slot, Some(caps[2].to_string()))
    } else if let Some(caps) = UNEQUIP.captures(line) {
        let Some(slot) = Slot::from_command(&caps[1]) else {
            return;
        };
        current.with_slot(turn, slot, None)
    } else {
        return;
    };
    ctx.timeline.add_equipment_change(next);
}

fn apply_familiar(line: &str, ctx: &mut ParseContext<'_>) {
    let familiar = if line == FAMILIAR_LOCK {
        return;
    } else if line == FAMILIAR_NONE {
        None
    } else if let Some(caps) = FAMILIAR.captures(line) {
        Some(caps[1].to_string())
    } else {
        return;
    };
    let turn = ctx.timeline.last_turn_number();
    ctx.timeline
        .add_familiar_change(FamiliarChange { turn, familiar });
}

fn apply_item(line: &str, ctx: &mut ParseContext<'_>) {
    let item = if let Some(caps) = ITEM_SINGLE.captures(line) {
        Some((caps[1].to_string(), 1))
    } else if let Some(caps) = ITEM_COUNT_SUFFIX.captures(line) {
        Some((caps[1].to_string(), count(&caps[2])))
    } else {
        ITEM_COUNT_PREFIX
            .captures(line)
            .map(|caps| (caps[2].to_string(), count(&caps[1])))
    };
    if let Some((name, amount)) = item {
        let turn = ctx.timeline.last_turn_number();
        ctx.tally().add_drop(name, amount, turn);
    }
}

fn apply_adventures(line: &str, ctx: &mut ParseContext<'_>) {
    let Some(amount) = ADVENTURES_GAINED.captures(line).map(|caps| count(&caps[1])) else {
        return;
    };
    let consumable = ctx.consumable;
    let tally = ctx.tally();
    tally.adventures_gained += amount;
    if let Some(consumable) = consumable.and_then(|idx| tally.consumables.get_mut(idx)) {
        consumable.adventure_gain += amount;
    }
}

fn apply_stat_gain(line: &str, ctx: &mut ParseContext<'_>) {
    let Some(caps) = STAT_GAINED.captures(line) else {
        return;
    };
    let Some(stat) = substat(&caps[2]) else {
        return;
    };
    let amount = count(&caps[1]);
    let consumable = ctx.consumable;
    let tally = ctx.tally();
    tally.stat_gain.add_stat(stat, amount);
    if let Some(consumable) = consumable.and_then(|idx| tally.consumables.get_mut(idx)) {
        consumable.stat_gain.add_stat(stat, amount);
    }
}

/// Flavor texts inside a combat round.
fn apply_combat(line: &str, ctx: &mut ParseContext<'_>) {
    let Some(caps) = COMBAT_LINE.captures(line) else {
        return;
    };
    let body = caps[2].trim();

    if DISINTEGRATION.iter().any(|re| re.is_match(body)) {
        if let Some(turn) = ctx.timeline.current_turn_mut() {
            turn.disintegrated = true;
        }
        return;
    }

    if let Some(amount) = STARFISH_ATTACKS
        .iter()
        .find_map(|re| re.captures(body))
        .map(|caps| count(&caps[1]))
    {
        // The after-battle MP total already includes the siphoned amount.
        let mp = &mut ctx.tally().mp_gain;
        mp.add(MpSource::Starfish, amount);
        mp.add(MpSource::Encounter, -amount);
        return;
    }

    if FREE_RUNAWAY_FAMILIAR.iter().any(|re| re.is_match(body)) {
        if let Some(turn) = ctx.timeline.current_turn_mut() {
            turn.ran_away = true;
        }
        let runaways = ctx.timeline.current_interval_mut().free_runaways_mut();
        runaways.attempts += 1;
        runaways.successes += 1;
        return;
    }

    if let Some(caps) = COMBAT_SKILL_CAST.captures(body) {
        let turn = ctx.timeline.last_turn_number();
        ctx.tally().add_skill(caps[1].trim(), 1, turn);
        return;
    }

    if RUNAWAY.is_match(body) {
        let mut free_source = false;
        if let Some(turn) = ctx.timeline.current_turn_mut() {
            turn.ran_away = true;
            free_source = FREE_RUNAWAY_EQUIPMENT
                .iter()
                .any(|item| turn.equipment.is_wearing(item))
                || turn.familiar.as_deref().is_some_and(|familiar| {
                    FREE_RUNAWAY_FAMILIARS
                        .iter()
                        .any(|free| free.eq_ignore_ascii_case(familiar))
                });
        }
        if free_source {
            ctx.timeline.current_interval_mut().free_runaways_mut().attempts += 1;
        }
    }
}
