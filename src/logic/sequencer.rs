//! Turn order: which side acts at each step of each phase, and what follows the last step.

use crate::models::{DraftPhase, Side};
use Side::{Blue, Red};

const BAN1_ORDER: [Side; 6] = [Blue, Red, Blue, Red, Blue, Red];
const PICK1_ORDER: [Side; 6] = [Blue, Red, Red, Blue, Blue, Red];
// Phase two opens with red, so the side that went first in phase one closes it.
const BAN2_ORDER: [Side; 4] = [Red, Blue, Red, Blue];
const PICK2_ORDER: [Side; 4] = [Red, Blue, Blue, Red];

/// Position in the draft after an action: phase, step within it, and the side to act.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Turn {
    pub phase: DraftPhase,
    pub step: usize,
    pub team: Option<Side>,
}

/// Side for each step of the phase. Empty for `waiting` and `completed`.
pub fn turn_order(phase: DraftPhase) -> &'static [Side] {
    match phase {
        DraftPhase::Ban1 => &BAN1_ORDER,
        DraftPhase::Pick1 => &PICK1_ORDER,
        DraftPhase::Ban2 => &BAN2_ORDER,
        DraftPhase::Pick2 => &PICK2_ORDER,
        DraftPhase::Waiting | DraftPhase::Completed => &[],
    }
}

/// Number of actions in the phase (6 for ban1/pick1, 4 for ban2/pick2).
pub fn phase_len(phase: DraftPhase) -> usize {
    turn_order(phase).len()
}

/// Side that acts at `step` of `phase`, if the phase has such a step.
pub fn team_for_step(phase: DraftPhase, step: usize) -> Option<Side> {
    turn_order(phase).get(step).copied()
}

/// Phase that follows `phase`. `completed` is terminal.
pub fn next_phase(phase: DraftPhase) -> DraftPhase {
    match phase {
        DraftPhase::Waiting => DraftPhase::Ban1,
        DraftPhase::Ban1 => DraftPhase::Pick1,
        DraftPhase::Pick1 => DraftPhase::Ban2,
        DraftPhase::Ban2 => DraftPhase::Pick2,
        DraftPhase::Pick2 | DraftPhase::Completed => DraftPhase::Completed,
    }
}

/// Where the draft stands once the action at `step` of `phase` has been taken.
///
/// Stays in the phase while steps remain, otherwise moves to step 0 of the next phase
/// with that phase's opening side. Returns `None` for phases that take no actions.
pub fn advance(phase: DraftPhase, step: usize) -> Option<Turn> {
    let len = phase_len(phase);
    if len == 0 || step >= len {
        return None;
    }
    if step + 1 < len {
        return Some(Turn {
            phase,
            step: step + 1,
            team: team_for_step(phase, step + 1),
        });
    }
    let next = next_phase(phase);
    Some(Turn {
        phase: next,
        step: 0,
        team: team_for_step(next, 0),
    })
}

/// Opening position of a freshly started draft.
pub fn opening_turn() -> Turn {
    Turn {
        phase: DraftPhase::Ban1,
        step: 0,
        team: team_for_step(DraftPhase::Ban1, 0),
    }
}
