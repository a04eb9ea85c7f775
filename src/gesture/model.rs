/// Active gesture of one editing session. Drag and pinch never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging,
    Pinching,
}

impl GestureState {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}
