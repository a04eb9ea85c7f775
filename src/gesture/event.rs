use super::model::GestureState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Pointer down or single-finger touch inside the frame.
    DragStart,
    /// Two-finger touch start; preempts a running drag.
    PinchStart,
    /// Pointer up, touch end or any finger lifted during a pinch.
    Release,
    /// Pointer cancel, touch cancel or pointer leaving the canvas.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTransition {
    pub from: Option<GestureState>,
    pub event: GestureEvent,
    pub to: GestureState,
}

impl GestureTransition {
    pub const fn new(from: Option<GestureState>, event: GestureEvent, to: GestureState) -> Self {
        Self { from, event, to }
    }
}
