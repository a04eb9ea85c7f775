//! One editing session: one template, one uploaded photo, one placement.
//!
//! Wires loading, the placement controller, the live preview and export.
//! Everything runs on the caller's thread; only image decoding happens on
//! worker threads and is picked up by [`EditorSession::poll_loads`].

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::controller::{ControllerSettings, PlacementController};
use crate::export::{ExportOutcome, ExportPipeline, ExportRequest, ExportResult, ExportTarget};
use crate::geometry::Size;
use crate::loader::{spawn_load, LoadPoll, LoadedImage, PendingLoad};
use crate::notification::Notifier;
use crate::placement::PlacementState;
use crate::preview::{PreviewInput, PreviewOutcome, PreviewRenderer};
use crate::storage::{PlacementStore, StorageResult};
use crate::template::Template;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub id: String,
    pub slug: String,
}

#[derive(Debug)]
pub struct EditorSession {
    event: EventInfo,
    template: Template,
    template_image: Option<LoadedImage>,
    photo: Option<LoadedImage>,
    pending_template: Option<PendingLoad>,
    pending_photo: Option<PendingLoad>,
    controller: PlacementController,
    preview: PreviewRenderer,
    changed: Rc<Cell<Option<PlacementState>>>,
}

impl EditorSession {
    pub fn new(
        event: EventInfo,
        template: Template,
        settings: ControllerSettings,
        mut preview: PreviewRenderer,
    ) -> Self {
        let mut controller =
            PlacementController::new(settings, template.format, template.photo_frame);
        preview.set_format(template.format);
        let display = preview.display_size();
        controller.set_viewport(display.width, display.height);

        let changed = Rc::new(Cell::new(None));
        let sink = Rc::clone(&changed);
        controller.subscribe(Box::new(move |state: &PlacementState| sink.set(Some(*state))));

        Self {
            event,
            template,
            template_image: None,
            photo: None,
            pending_template: None,
            pending_photo: None,
            controller,
            preview,
            changed,
        }
    }

    pub fn event(&self) -> &EventInfo {
        &self.event
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn controller(&self) -> &PlacementController {
        &self.controller
    }

    pub fn preview(&self) -> &PreviewRenderer {
        &self.preview
    }

    pub fn placement(&self) -> Option<PlacementState> {
        self.controller.state()
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_template.is_some() || self.pending_photo.is_some()
    }

    /// Replaces the template; the photo stays and is re-fitted to the new
    /// frame once the overlay arrives.
    pub fn swap_template(&mut self, template: Template) {
        tracing::info!(template_id = %template.id, format = %template.format, "template swapped");
        self.controller.set_template(template.format, template.photo_frame);
        self.preview.set_format(template.format);
        self.sync_viewport();
        self.template = template;
        self.template_image = None;
        self.pending_template = None;
        self.render();
    }

    pub fn load_template_image(&mut self, path: PathBuf) {
        self.track_template_load(spawn_load(path));
    }

    pub fn track_template_load(&mut self, pending: PendingLoad) {
        self.pending_template = Some(pending);
    }

    pub fn set_template_image(&mut self, image: LoadedImage) {
        self.template_image = Some(image);
        self.render();
    }

    pub fn load_photo(&mut self, path: PathBuf) {
        self.track_photo_load(spawn_load(path));
    }

    pub fn track_photo_load(&mut self, pending: PendingLoad) {
        self.pending_photo = Some(pending);
    }

    /// New upload (or `None` to remove it). Placement restarts at cover
    /// scale, centered.
    pub fn set_photo(&mut self, photo: Option<LoadedImage>) {
        self.controller
            .set_image(photo.as_ref().map(LoadedImage::natural_size));
        self.photo = photo;
        self.render();
    }

    /// Picks up finished decodes. Failures blank the preview and notify.
    /// Returns whether anything completed.
    pub fn poll_loads(&mut self, notifier: &dyn Notifier) -> bool {
        let mut completed = false;

        let template_poll = self.pending_template.as_mut().map(PendingLoad::poll);
        if let Some(LoadPoll::Ready(result)) = template_poll {
            self.pending_template = None;
            completed = true;
            match result {
                Ok(image) => self.set_template_image(image),
                Err(err) => {
                    self.template_image = None;
                    self.preview.show_load_failure(notifier, "template", &err);
                }
            }
        }

        let photo_poll = self.pending_photo.as_mut().map(PendingLoad::poll);
        if let Some(LoadPoll::Ready(result)) = photo_poll {
            self.pending_photo = None;
            completed = true;
            match result {
                Ok(image) => self.set_photo(Some(image)),
                Err(err) => {
                    self.photo = None;
                    self.controller.set_image(None);
                    self.preview.show_load_failure(notifier, "photo", &err);
                }
            }
        }

        completed
    }

    /// Runs one input handler against the controller and redraws if the
    /// placement changed.
    pub fn apply_input<F>(&mut self, input: F) -> bool
    where
        F: FnOnce(&mut PlacementController) -> bool,
    {
        let handled = input(&mut self.controller);
        self.flush();
        handled
    }

    /// Redraws when an observer notification is outstanding.
    pub fn flush(&mut self) -> Option<PreviewOutcome> {
        self.changed.take().map(|_| self.render())
    }

    /// `available` is the on-screen area; the canvas inside it keeps the
    /// template's aspect ratio.
    pub fn set_viewport(&mut self, available: Size, device_pixel_ratio: f64) -> PreviewOutcome {
        self.preview.set_viewport(available, device_pixel_ratio);
        self.sync_viewport();
        self.render()
    }

    fn sync_viewport(&mut self) {
        let display = self.preview.display_size();
        self.controller.set_viewport(display.width, display.height);
    }

    pub fn render(&mut self) -> PreviewOutcome {
        self.changed.set(None);
        let input = PreviewInput {
            format: self.template.format,
            frame: self.template.photo_frame,
            template: self.template_image.as_ref(),
            photo: self.photo.as_ref(),
            placement: self.controller.state(),
        };
        self.preview.render(&input)
    }

    /// Admin path: apply the stored sample placement for this template.
    pub fn restore_placement(&mut self, store: &dyn PlacementStore) -> StorageResult<bool> {
        let Some(state) = store.load_placement(&self.template.id)? else {
            return Ok(false);
        };
        let applied = self.controller.restore(state);
        self.flush();
        Ok(applied)
    }

    /// Admin path. Returns `false` when there is nothing placed yet.
    pub fn save_placement(&self, store: &dyn PlacementStore) -> StorageResult<bool> {
        let Some(state) = self.controller.state() else {
            return Ok(false);
        };
        store.save_placement(&self.template.id, &state)?;
        Ok(true)
    }

    pub fn export_request(&self) -> ExportRequest<'_> {
        ExportRequest {
            event_id: &self.event.id,
            event_slug: &self.event.slug,
            template_id: &self.template.id,
            template_name: &self.template.name,
            format: self.template.format,
            frame: self.template.photo_frame,
            template: self.template_image.as_ref(),
            photo: self.photo.as_ref(),
            placement: self.controller.state(),
        }
    }

    pub fn export(
        &self,
        pipeline: &ExportPipeline<'_>,
        target: &ExportTarget,
    ) -> ExportResult<ExportOutcome> {
        pipeline.run(&self.export_request(), target)
    }
}
