use std::collections::VecDeque;

use super::error::{GestureError, GestureResult};
use super::{event::GestureTransition, GestureEvent, GestureState};

const TRANSITION_HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct GestureMachine {
    state: GestureState,
    transition_history: VecDeque<GestureTransition>,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self {
            state: GestureState::default(),
            transition_history: VecDeque::with_capacity(TRANSITION_HISTORY_LIMIT),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn can_transition(&self, event: GestureEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: GestureEvent) -> Option<GestureState> {
        use GestureEvent::*;
        match (self.state, event) {
            (GestureState::Idle, DragStart) => Some(GestureState::Dragging),
            (GestureState::Idle | GestureState::Dragging, PinchStart) => {
                Some(GestureState::Pinching)
            }
            (GestureState::Dragging | GestureState::Pinching, Release | Cancel) => {
                Some(GestureState::Idle)
            }
            _ => None,
        }
    }

    pub fn transition(&mut self, event: GestureEvent) -> GestureResult<GestureState> {
        tracing::debug!(from = ?self.state, event = ?event, "request gesture transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::debug!(from = ?from, event = ?event, "gesture event ignored");
            GestureError::InvalidTransition { from, event }
        })?;

        let record = GestureTransition::new(Some(self.state), event, next);
        self.state = next;
        if self.transition_history.len() == TRANSITION_HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history.push_back(record);

        Ok(self.state)
    }

    /// Returns to idle from any state without recording an event.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}

#[cfg(test)]
impl GestureMachine {
    fn history(&self) -> Vec<GestureTransition> {
        self.transition_history.iter().copied().collect()
    }
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GestureMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GestureState::{:?}", self.state)
    }
}
