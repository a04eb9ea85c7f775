use super::event::GestureEvent;
use super::model::GestureState;
use thiserror::Error;

pub type GestureResult<T> = std::result::Result<T, GestureError>;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("invalid gesture transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: GestureState,
        event: GestureEvent,
    },
}
