pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{GestureError, GestureResult};
pub use event::{GestureEvent, GestureTransition};
pub use machine::GestureMachine;
pub use model::GestureState;
