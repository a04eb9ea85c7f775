//! Interactive placement: turns pointer, touch, wheel and slider input into
//! clamped [`PlacementState`] updates.
//!
//! Input is never rejected with an error. Events that make no sense in the
//! current state (no photo loaded, pointer outside the frame, release
//! without a gesture) are no-ops, and out-of-range requests are clamped.

use crate::geometry::{
    display_scale, frame_rect, logical_frame_rect, FrameFormat, NormalizedFrame, Offset,
    PixelRect, Point, Size,
};
use crate::gesture::{GestureEvent, GestureMachine, GestureState};
use crate::placement::{PlacementBounds, PlacementState, DEFAULT_MAX_ZOOM_FACTOR};

const DEFAULT_WHEEL_ZOOM_STEP: f64 = 1.1;
const DEFAULT_NUDGE_STEP: f64 = 10.0;
// Fingers closer than this cannot give a stable ratio.
const MIN_PINCH_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Upper zoom bound as a multiple of cover scale.
    pub max_zoom_factor: f64,
    /// Scale multiplier per wheel notch.
    pub wheel_zoom_step: f64,
    /// Frame pixels moved per keyboard nudge.
    pub nudge_step: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_zoom_factor: DEFAULT_MAX_ZOOM_FACTOR,
            wheel_zoom_step: DEFAULT_WHEEL_ZOOM_STEP,
            nudge_step: DEFAULT_NUDGE_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchAnchor {
    distance: f64,
    scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Left,
    Right,
    Up,
    Down,
}

pub type PlacementObserver = Box<dyn FnMut(&PlacementState)>;

pub struct PlacementController {
    settings: ControllerSettings,
    format: FrameFormat,
    frame: NormalizedFrame,
    image: Option<Size>,
    bounds: Option<PlacementBounds>,
    state: Option<PlacementState>,
    viewport: Size,
    machine: GestureMachine,
    drag_anchor: Option<Point>,
    pinch: Option<PinchAnchor>,
    observers: Vec<PlacementObserver>,
}

impl std::fmt::Debug for PlacementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementController")
            .field("format", &self.format)
            .field("frame", &self.frame)
            .field("image", &self.image)
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .field("gesture", &self.machine.state())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl PlacementController {
    pub fn new(settings: ControllerSettings, format: FrameFormat, frame: NormalizedFrame) -> Self {
        Self {
            settings,
            format,
            frame,
            image: None,
            bounds: None,
            state: None,
            viewport: format.dimensions(),
            machine: GestureMachine::new(),
            drag_anchor: None,
            pinch: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: PlacementObserver) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> Option<PlacementState> {
        self.state
    }

    pub fn gesture_state(&self) -> GestureState {
        self.machine.state()
    }

    pub fn bounds(&self) -> Option<&PlacementBounds> {
        self.bounds.as_ref()
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn frame(&self) -> NormalizedFrame {
        self.frame
    }

    pub fn cover_scale(&self) -> Option<f64> {
        self.bounds.map(|bounds| bounds.cover_scale())
    }

    pub fn zoom_percent(&self) -> Option<f64> {
        let bounds = self.bounds?;
        let state = self.state?;
        Some(bounds.zoom_percent(state.scale))
    }

    /// Frame size in frame pixels.
    pub fn frame_size(&self) -> Size {
        logical_frame_rect(self.format, &self.frame).size()
    }

    /// Template swap: cover scale is recomputed and the photo re-centered.
    pub fn set_template(&mut self, format: FrameFormat, frame: NormalizedFrame) {
        let resize_viewport = self.viewport == self.format.dimensions();
        self.format = format;
        self.frame = frame;
        if resize_viewport {
            self.viewport = format.dimensions();
        }
        self.reinitialize();
    }

    /// Photo swap (`None` when the photo is removed or failed to load).
    pub fn set_image(&mut self, natural_size: Option<Size>) {
        self.image = natural_size;
        self.reinitialize();
    }

    /// Display size of the canvas receiving pointer events.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            tracing::debug!(width, height, "ignoring degenerate viewport");
            return;
        }
        self.viewport = Size::new(width, height);
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Applies a stored placement (admin placeholder path), clamped against
    /// the current photo.
    pub fn restore(&mut self, state: PlacementState) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        self.commit(bounds.clamp(state))
    }

    pub fn reset(&mut self) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        self.commit(bounds.initial())
    }

    pub fn pointer_down(&mut self, point: Point) -> bool {
        let Some(state) = self.state else {
            tracing::debug!("pointer down ignored: no photo loaded");
            return false;
        };
        let frame = self.frame_on_canvas();
        if !frame.contains(point) {
            return false;
        }
        if self.machine.transition(GestureEvent::DragStart).is_err() {
            return false;
        }
        let scale = self.display_scale();
        self.drag_anchor = Some(Point::new(
            point.x - frame.x - state.offset.x * scale,
            point.y - frame.y - state.offset.y * scale,
        ));
        true
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        if self.machine.state() != GestureState::Dragging {
            return false;
        }
        let (Some(anchor), Some(state), Some(bounds)) = (self.drag_anchor, self.state, self.bounds)
        else {
            return false;
        };
        let frame = self.frame_on_canvas();
        let scale = self.display_scale();
        let requested = Offset::new(
            (point.x - frame.x - anchor.x) / scale,
            (point.y - frame.y - anchor.y) / scale,
        );
        self.commit(state.with_offset(bounds.clamp_offset(state.scale, requested)))
    }

    pub fn pointer_up(&mut self) -> bool {
        self.end_gesture(GestureEvent::Release)
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.end_gesture(GestureEvent::Cancel)
    }

    pub fn pointer_cancel(&mut self) -> bool {
        self.end_gesture(GestureEvent::Cancel)
    }

    /// `touches` holds every finger currently down. Two or more fingers
    /// always start a pinch, even over a running drag.
    pub fn touch_start(&mut self, touches: &[Point]) -> bool {
        match touches {
            [] => false,
            [single] => {
                if self.machine.state() != GestureState::Idle {
                    return false;
                }
                self.pointer_down(*single)
            }
            [first, second, ..] => self.start_pinch(*first, *second),
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> bool {
        match (self.machine.state(), touches) {
            (GestureState::Dragging, [first, ..]) => self.pointer_move(*first),
            (GestureState::Pinching, [first, second, ..]) => self.pinch_move(*first, *second),
            _ => false,
        }
    }

    /// Any lifted finger ends the current gesture.
    pub fn touch_end(&mut self) -> bool {
        self.end_gesture(GestureEvent::Release)
    }

    pub fn touch_cancel(&mut self) -> bool {
        self.end_gesture(GestureEvent::Cancel)
    }

    /// Slider path. Same relative range and re-clamp as pinch.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        let (Some(state), Some(bounds)) = (self.state, self.bounds) else {
            return false;
        };
        self.commit_under_drag(state, bounds.rescale(state, scale, None))
    }

    pub fn set_zoom_percent(&mut self, percent: f64) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        self.set_scale(bounds.scale_for_percent(percent))
    }

    /// Positive `steps` zoom in. The photo point under `pointer` stays put
    /// when the pointer is over the frame; otherwise zoom centers on the frame.
    pub fn wheel(&mut self, steps: f64, pointer: Point) -> bool {
        let (Some(state), Some(bounds)) = (self.state, self.bounds) else {
            return false;
        };
        if !steps.is_finite() || steps == 0.0 || self.machine.state() == GestureState::Pinching {
            return false;
        }
        let frame = self.frame_on_canvas();
        let anchor = if frame.contains(pointer) {
            let scale = self.display_scale();
            Offset::new((pointer.x - frame.x) / scale, (pointer.y - frame.y) / scale)
        } else {
            let size = bounds.frame();
            Offset::new(size.width / 2.0, size.height / 2.0)
        };
        let requested = state.scale * self.settings.wheel_zoom_step.powf(steps);
        self.commit_under_drag(state, bounds.rescale(state, requested, Some(anchor)))
    }

    /// Moves the photo by `dx`/`dy` frame pixels, clamped.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> bool {
        let (Some(state), Some(bounds)) = (self.state, self.bounds) else {
            return false;
        };
        if !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        let requested = Offset::new(state.offset.x + dx, state.offset.y + dy);
        self.commit_under_drag(
            state,
            state.with_offset(bounds.clamp_offset(state.scale, requested)),
        )
    }

    /// Arrow-key variant of [`Self::nudge`] using the configured step.
    pub fn nudge_toward(&mut self, direction: NudgeDirection) -> bool {
        let step = self.settings.nudge_step;
        let (dx, dy) = match direction {
            NudgeDirection::Left => (-step, 0.0),
            NudgeDirection::Right => (step, 0.0),
            NudgeDirection::Up => (0.0, -step),
            NudgeDirection::Down => (0.0, step),
        };
        self.nudge(dx, dy)
    }

    fn start_pinch(&mut self, first: Point, second: Point) -> bool {
        let Some(state) = self.state else {
            tracing::debug!("pinch ignored: no photo loaded");
            return false;
        };
        let distance = first.distance_to(second);
        if !distance.is_finite() || distance < MIN_PINCH_DISTANCE {
            return false;
        }
        if self.machine.transition(GestureEvent::PinchStart).is_err() {
            return false;
        }
        self.drag_anchor = None;
        self.pinch = Some(PinchAnchor {
            distance,
            scale: state.scale,
        });
        true
    }

    fn pinch_move(&mut self, first: Point, second: Point) -> bool {
        let (Some(anchor), Some(state), Some(bounds)) = (self.pinch, self.state, self.bounds)
        else {
            return false;
        };
        let distance = first.distance_to(second);
        if !distance.is_finite() {
            return false;
        }
        let requested = anchor.scale * (distance / anchor.distance);
        self.commit(bounds.rescale(state, requested, None))
    }

    fn end_gesture(&mut self, event: GestureEvent) -> bool {
        if self.machine.transition(event).is_err() {
            return false;
        }
        self.drag_anchor = None;
        self.pinch = None;
        true
    }

    fn frame_on_canvas(&self) -> PixelRect {
        frame_rect(&self.frame, self.viewport.width, self.viewport.height)
    }

    fn display_scale(&self) -> f64 {
        display_scale(self.viewport.width, self.format.dimensions().width)
    }

    fn reinitialize(&mut self) {
        self.machine.reset();
        self.drag_anchor = None;
        self.pinch = None;
        let frame = self.frame_size();
        self.bounds = self.image.and_then(|image| {
            PlacementBounds::new(frame, image, self.settings.max_zoom_factor)
        });
        match self.bounds {
            Some(bounds) => {
                tracing::debug!(
                    cover_scale = bounds.cover_scale(),
                    max_scale = bounds.max_scale(),
                    "placement bounds recomputed"
                );
                self.commit(bounds.initial());
            }
            None => self.state = None,
        }
    }

    /// Commit for input that is not the drag itself. A running drag's anchor
    /// moves with the offset so the next pointer move continues from here.
    fn commit_under_drag(&mut self, previous: PlacementState, next: PlacementState) -> bool {
        if !self.commit(next) {
            return false;
        }
        if let Some(anchor) = self.drag_anchor {
            let scale = self.display_scale();
            self.drag_anchor = Some(Point::new(
                anchor.x - (next.offset.x - previous.offset.x) * scale,
                anchor.y - (next.offset.y - previous.offset.y) * scale,
            ));
        }
        true
    }

    fn commit(&mut self, next: PlacementState) -> bool {
        if self.state == Some(next) {
            return false;
        }
        self.state = Some(next);
        for observer in &mut self.observers {
            observer(&next);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPS: f64 = 1e-9;

    fn centered_frame() -> NormalizedFrame {
        NormalizedFrame::new(0.2, 0.2, 0.6, 0.6).expect("frame should be valid")
    }

    fn loaded_controller() -> PlacementController {
        let mut controller = PlacementController::new(
            ControllerSettings::default(),
            FrameFormat::Square,
            centered_frame(),
        );
        controller.set_image(Some(Size::new(2000.0, 1000.0)));
        controller
    }

    fn state(controller: &PlacementController) -> PlacementState {
        controller.state().expect("photo should be placed")
    }

    #[test]
    fn loading_photo_centers_at_cover_scale() {
        let controller = loaded_controller();
        let placed = state(&controller);
        assert!((placed.scale - 0.648).abs() < EPS);
        assert!((placed.offset.x + 324.0).abs() < EPS);
        assert!(placed.offset.y.abs() < EPS);
    }

    #[test]
    fn drag_past_top_left_clamps_to_origin() {
        let mut controller = loaded_controller();
        assert!(controller.pointer_down(Point::new(540.0, 540.0)));
        assert_eq!(controller.gesture_state(), GestureState::Dragging);

        // Anchor is (648, 324); this pointer asks for offset (50, 50).
        controller.pointer_move(Point::new(914.0, 590.0));
        let placed = state(&controller);
        assert_eq!(placed.offset, Offset::new(0.0, 0.0));

        assert!(controller.pointer_up());
        assert_eq!(controller.gesture_state(), GestureState::Idle);
    }

    #[test]
    fn drag_on_half_size_canvas_moves_twice_as_far_in_frame_pixels() {
        let mut controller = loaded_controller();
        controller.set_viewport(540.0, 540.0);
        let before = state(&controller);

        assert!(controller.pointer_down(Point::new(270.0, 270.0)));
        assert!(controller.pointer_move(Point::new(280.0, 270.0)));
        let after = state(&controller);
        assert!((after.offset.x - (before.offset.x + 20.0)).abs() < EPS);
        assert!((after.offset.y - before.offset.y).abs() < EPS);
    }

    #[test]
    fn pointer_down_outside_frame_does_not_start_drag() {
        let mut controller = loaded_controller();
        assert!(!controller.pointer_down(Point::new(10.0, 10.0)));
        assert_eq!(controller.gesture_state(), GestureState::Idle);
        assert!(!controller.pointer_move(Point::new(500.0, 500.0)));
    }

    #[test]
    fn input_without_photo_is_a_noop() {
        let mut controller = PlacementController::new(
            ControllerSettings::default(),
            FrameFormat::Square,
            centered_frame(),
        );
        assert!(!controller.pointer_down(Point::new(540.0, 540.0)));
        assert!(!controller.touch_start(&[Point::new(300.0, 300.0), Point::new(600.0, 600.0)]));
        assert!(!controller.set_scale(2.0));
        assert!(!controller.wheel(1.0, Point::new(540.0, 540.0)));
        assert!(!controller.pointer_up());
        assert!(controller.state().is_none());
        assert_eq!(controller.gesture_state(), GestureState::Idle);
    }

    #[test]
    fn pinch_scales_by_finger_distance_ratio_within_bounds() {
        let mut controller = loaded_controller();
        assert!(controller.touch_start(&[Point::new(400.0, 500.0), Point::new(500.0, 500.0)]));
        assert_eq!(controller.gesture_state(), GestureState::Pinching);

        controller.touch_move(&[Point::new(400.0, 500.0), Point::new(600.0, 500.0)]);
        assert!((state(&controller).scale - 1.296).abs() < EPS);

        controller.touch_move(&[Point::new(0.0, 500.0), Point::new(1000.0, 500.0)]);
        assert!((state(&controller).scale - 1.944).abs() < EPS);

        controller.touch_move(&[Point::new(500.0, 500.0), Point::new(510.0, 500.0)]);
        assert!((state(&controller).scale - 0.648).abs() < EPS);

        assert!(controller.touch_end());
        assert_eq!(controller.gesture_state(), GestureState::Idle);
    }

    #[test]
    fn pinch_sequences_never_leave_cover_relative_range() {
        let mut controller = loaded_controller();
        let bounds = *controller.bounds().expect("bounds should exist");
        let mut seed: u64 = 0x5eed;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % 1000) as f64 + 1.0
        };

        for _ in 0..50 {
            let start = next();
            controller.touch_start(&[Point::new(0.0, 0.0), Point::new(start, 0.0)]);
            for _ in 0..10 {
                let distance = next();
                controller.touch_move(&[Point::new(0.0, 0.0), Point::new(distance, 0.0)]);
                let placed = state(&controller);
                assert!(placed.scale >= bounds.cover_scale() - EPS);
                assert!(placed.scale <= bounds.cover_scale() * 3.0 + EPS);
                assert!(bounds.covers(&placed));
            }
            controller.touch_end();
        }
    }

    #[test]
    fn second_finger_takes_over_running_drag() {
        let mut controller = loaded_controller();
        assert!(controller.touch_start(&[Point::new(540.0, 540.0)]));
        assert_eq!(controller.gesture_state(), GestureState::Dragging);

        assert!(controller.touch_start(&[Point::new(540.0, 540.0), Point::new(640.0, 540.0)]));
        assert_eq!(controller.gesture_state(), GestureState::Pinching);

        let before = state(&controller);
        // Moving only the first finger now pinches rather than drags.
        controller.touch_move(&[Point::new(440.0, 540.0), Point::new(640.0, 540.0)]);
        assert!(state(&controller).scale > before.scale);
    }

    #[test]
    fn pointer_leave_cancels_without_undoing_applied_moves() {
        let mut controller = loaded_controller();
        assert!(controller.pointer_down(Point::new(540.0, 540.0)));
        controller.pointer_move(Point::new(600.0, 540.0));
        let moved = state(&controller);

        assert!(controller.pointer_leave());
        assert_eq!(controller.gesture_state(), GestureState::Idle);
        assert_eq!(state(&controller), moved);
        assert!(!controller.pointer_move(Point::new(100.0, 540.0)));
    }

    #[test]
    fn slider_scale_is_clamped_and_offset_reclamped() {
        let mut controller = loaded_controller();
        assert!(controller.set_scale(10.0));
        assert!((state(&controller).scale - 1.944).abs() < EPS);

        controller.nudge(-5000.0, 0.0);
        for _ in 0..500 {
            controller.nudge_toward(NudgeDirection::Left);
            controller.nudge_toward(NudgeDirection::Up);
        }
        let far = state(&controller);
        assert!((far.offset.x - (648.0 - 2000.0 * 1.944)).abs() < EPS);

        assert!(controller.set_scale(0.0));
        let shrunk = state(&controller);
        assert!((shrunk.scale - 0.648).abs() < EPS);
        assert!((shrunk.offset.x + 648.0).abs() < EPS);
        assert!(controller.bounds().expect("bounds").covers(&shrunk));
    }

    #[test]
    fn zoom_percent_round_trips_through_slider() {
        let mut controller = loaded_controller();
        assert_eq!(controller.zoom_percent().map(f64::round), Some(100.0));
        controller.set_zoom_percent(250.0);
        assert!((state(&controller).scale - 0.648 * 2.5).abs() < EPS);
        controller.set_zoom_percent(1000.0);
        assert_eq!(controller.zoom_percent().map(f64::round), Some(300.0));
    }

    #[test]
    fn wheel_zooms_in_steps_and_stays_in_range() {
        let mut controller = loaded_controller();
        assert!(controller.wheel(1.0, Point::new(540.0, 540.0)));
        assert!((state(&controller).scale - 0.648 * 1.1).abs() < EPS);

        for _ in 0..50 {
            controller.wheel(1.0, Point::new(540.0, 540.0));
        }
        assert!((state(&controller).scale - 1.944).abs() < EPS);

        for _ in 0..50 {
            controller.wheel(-1.0, Point::new(5.0, 5.0));
        }
        assert!((state(&controller).scale - 0.648).abs() < EPS);
    }

    #[test]
    fn wheel_keeps_photo_point_under_pointer() {
        let mut controller = loaded_controller();
        let pointer = Point::new(400.0, 700.0);
        // Viewport matches the format, so canvas and frame pixels agree.
        let under_pointer = |placed: PlacementState| {
            (
                (pointer.x - 216.0 - placed.offset.x) / placed.scale,
                (pointer.y - 216.0 - placed.offset.y) / placed.scale,
            )
        };
        let before = under_pointer(state(&controller));

        assert!(controller.wheel(1.0, pointer));
        let zoomed = state(&controller);
        assert!((zoomed.scale - 0.7128).abs() < EPS);
        let after = under_pointer(zoomed);
        assert!((after.0 - before.0).abs() < 1e-6);
        assert!((after.1 - before.1).abs() < 1e-6);
    }

    #[test]
    fn drag_continues_from_wheel_zoom() {
        let mut controller = loaded_controller();
        assert!(controller.pointer_down(Point::new(540.0, 540.0)));
        assert!(controller.wheel(1.0, Point::new(540.0, 540.0)));
        let zoomed = state(&controller);
        assert!((zoomed.offset.x + 388.8).abs() < 1e-6);
        assert!((zoomed.offset.y + 32.4).abs() < 1e-6);

        assert!(controller.pointer_move(Point::new(550.0, 545.0)));
        let moved = state(&controller);
        assert!((moved.scale - zoomed.scale).abs() < EPS);
        assert!((moved.offset.x + 378.8).abs() < 1e-6);
        assert!((moved.offset.y + 27.4).abs() < 1e-6);
    }

    #[test]
    fn touch_cancel_ends_pinch_and_keeps_applied_scale() {
        let mut controller = loaded_controller();
        assert!(controller.touch_start(&[Point::new(400.0, 500.0), Point::new(500.0, 500.0)]));
        controller.touch_move(&[Point::new(400.0, 500.0), Point::new(650.0, 500.0)]);
        let pinched = state(&controller);
        assert!((pinched.scale - 1.62).abs() < EPS);

        assert!(controller.touch_cancel());
        assert_eq!(controller.gesture_state(), GestureState::Idle);
        assert_eq!(state(&controller), pinched);
        assert!(!controller.touch_move(&[Point::new(400.0, 500.0), Point::new(900.0, 500.0)]));
        assert!(!controller.touch_cancel());
    }

    #[test]
    fn observers_see_every_committed_change_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut controller = PlacementController::new(
            ControllerSettings::default(),
            FrameFormat::Square,
            centered_frame(),
        );
        let seen_for_observer = seen.clone();
        controller.subscribe(Box::new(move |state| {
            seen_for_observer.borrow_mut().push(*state);
        }));

        controller.set_image(Some(Size::new(2000.0, 1000.0)));
        assert_eq!(seen.borrow().len(), 1);

        // Already at cover scale: no change, no notification.
        assert!(!controller.set_scale(0.1));
        assert_eq!(seen.borrow().len(), 1);

        controller.set_scale(1.0);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow().last().copied(), controller.state());
    }

    #[test]
    fn template_swap_recomputes_cover_scale() {
        let mut controller = loaded_controller();
        controller.set_scale(1.5);
        let story_frame = NormalizedFrame::new(0.0, 0.0, 1.0, 0.5).expect("frame should be valid");
        controller.set_template(FrameFormat::Story, story_frame);

        // Frame is 1080x960 in story pixels.
        let placed = state(&controller);
        assert!((placed.scale - 0.96).abs() < EPS);
        assert_eq!(controller.viewport(), FrameFormat::Story.dimensions());
    }

    #[test]
    fn restore_clamps_persisted_placement() {
        let mut controller = loaded_controller();
        assert!(controller.restore(PlacementState::new(0.2, Offset::new(30.0, -9000.0))));
        let placed = state(&controller);
        assert!((placed.scale - 0.648).abs() < EPS);
        assert_eq!(placed.offset.x, 0.0);
        assert!(placed.offset.y.abs() < EPS);
    }

    #[test]
    fn removing_photo_clears_placement() {
        let mut controller = loaded_controller();
        controller.set_image(None);
        assert!(controller.state().is_none());
        assert!(controller.cover_scale().is_none());
    }
}
