// ABOUTME: Status item controller: popover visibility state machine, placement and dismissal
// ABOUTME: Reacts to PopoverEvents from the backend and keeps icon, window and callbacks consistent

use crate::events::{EventSink, EventSource, PopoverEvent};
use crate::geometry::Rect;
use crate::icon::{IconSpec, StatusIcon};
use crate::platform::{MenuTracking, StatusBarBackend};
use crate::positioning::{PlacementRequest, WINDOW_BORDER_OFFSET, place_popover};
use crate::state::{AnimationToken, FADE_OUT_DURATION, FadeOut, PopoverState};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

type Callback = Box<dyn FnMut()>;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusItemOptions {
    pub title: String,
    pub icon: Option<IconSpec>,
}

impl StatusItemOptions {
    /// Text-only status icon.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
        }
    }

    pub fn named_image(title: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self::titled(title).with_icon(Some(IconSpec::named(image_name)))
    }

    pub fn symbol(title: impl Into<String>, symbol_name: impl Into<String>) -> Self {
        Self::titled(title).with_icon(Some(IconSpec::symbol(symbol_name)))
    }

    pub fn with_icon(mut self, icon: Option<IconSpec>) -> Self {
        self.icon = icon;
        self
    }
}

/// Tunables for placement and dismissal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverSettings {
    pub border_offset: f64,
    pub fade_out: Duration,
}

impl Default for PopoverSettings {
    fn default() -> Self {
        Self {
            border_offset: WINDOW_BORDER_OFFSET,
            fade_out: FADE_OUT_DURATION,
        }
    }
}

#[derive(Default)]
pub struct Callbacks {
    on_appear: Option<Callback>,
    on_disappear: Option<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_appear<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_appear = Some(Box::new(callback));
        self
    }

    pub fn on_disappear<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_disappear = Some(Box::new(callback));
        self
    }

    fn appeared(&mut self) {
        if let Some(ref mut callback) = self.on_appear {
            callback();
        }
    }

    fn disappeared(&mut self) {
        if let Some(ref mut callback) = self.on_disappear {
            callback();
        }
    }
}

/// The controller's record of the popover window.
#[derive(Debug, Clone, PartialEq)]
pub struct PopoverWindow {
    pub frame: Option<Rect>,
    pub opacity: f64,
    pub is_key: bool,
    /// Part of the window list (possibly mid-fade).
    pub ordered_in: bool,
}

impl Default for PopoverWindow {
    fn default() -> Self {
        Self {
            frame: None,
            opacity: 1.0,
            is_key: false,
            ordered_in: false,
        }
    }
}

pub struct StatusItemController<B: StatusBarBackend> {
    backend: B,
    events: EventSource,
    state: PopoverState,
    icon: StatusIcon,
    popover: PopoverWindow,
    callbacks: Callbacks,
    settings: PopoverSettings,
    fade_counter: u64,
    pending_fade: Option<AnimationToken>,
    torn_down: bool,
}

impl<B: StatusBarBackend> StatusItemController<B> {
    pub fn new(
        backend: B,
        events: EventSource,
        options: StatusItemOptions,
        callbacks: Callbacks,
        settings: PopoverSettings,
    ) -> Self {
        let mut controller = Self {
            backend,
            events,
            state: PopoverState::Hidden,
            icon: StatusIcon::new(options.title, options.icon),
            popover: PopoverWindow::default(),
            callbacks,
            settings,
            fade_counter: 0,
            pending_fade: None,
            torn_down: false,
        };

        controller.backend.set_icon_title(&controller.icon.title);
        controller
            .backend
            .set_icon_image(controller.icon.image.as_ref());
        controller.backend.set_icon_visible(true);
        controller.icon.visible = true;
        controller.backend.start_local_monitor();

        info!(
            "Status item '{}' installed ({})",
            controller.icon.title,
            if controller.icon.is_text_only() {
                "text only"
            } else {
                "with image"
            }
        );
        controller
    }

    pub fn state(&self) -> PopoverState {
        self.state
    }

    pub fn icon(&self) -> &StatusIcon {
        &self.icon
    }

    pub fn popover(&self) -> &PopoverWindow {
        &self.popover
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn toggle_visibility(&mut self) {
        self.toggle();
        self.pump();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.apply_title(title.into());
        self.pump();
    }

    pub fn set_image(&mut self, image: Option<IconSpec>) {
        self.apply_image(image);
        self.pump();
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.apply_opacity(opacity);
        self.pump();
    }

    /// Whether the status icon itself is drawn, not whether the popover is open.
    pub fn is_visible(&self) -> bool {
        !self.torn_down && self.backend.icon_is_rendered()
    }

    /// Drain queued events. Called after every operation and by the dispatcher.
    pub fn pump(&mut self) {
        while let Some(event) = self.events.try_next() {
            self.handle_event(event);
        }
    }

    /// Remove the icon and stop every monitor. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }

        let was_open = self.state.is_open();
        let was_shown = self.state == PopoverState::Shown;

        self.torn_down = true;
        self.pending_fade = None;
        self.backend.stop_outside_click_monitor();
        self.backend.stop_local_monitor();
        if was_open {
            self.backend.post_menu_tracking(MenuTracking::End);
        }
        self.backend.order_out_popover();
        self.backend.remove_status_icon();
        self.events.clear_dispatcher();

        self.popover.ordered_in = false;
        self.popover.is_key = false;
        self.icon.visible = false;
        self.icon.highlighted = false;
        self.state = PopoverState::Hidden;

        if was_shown {
            self.callbacks.disappeared();
        }
        info!("Status item '{}' removed", self.icon.title);
    }

    fn handle_event(&mut self, event: PopoverEvent) {
        if self.torn_down {
            debug!("Ignoring {event:?} after teardown");
            return;
        }

        match event {
            PopoverEvent::StatusIconPressed | PopoverEvent::ToggleRequested => self.toggle(),
            PopoverEvent::PopoverBecameKey => self.popover_became_key(),
            PopoverEvent::PopoverResignedKey => self.popover_resigned_key(),
            PopoverEvent::OutsideMouseDown => self.outside_mouse_down(),
            PopoverEvent::FadeOutFinished(token) => self.fade_out_finished(token),
            PopoverEvent::SetTitle(title) => self.apply_title(title),
            PopoverEvent::SetImage(image) => self.apply_image(image),
            PopoverEvent::SetOpacity(opacity) => self.apply_opacity(opacity),
            PopoverEvent::TeardownRequested => self.teardown(),
        }
    }

    fn toggle(&mut self) {
        if self.torn_down {
            warn!("Toggle requested after teardown");
            return;
        }

        debug!("Toggle requested while {}", self.state);
        match self.state {
            PopoverState::Hidden => self.show(),
            PopoverState::Positioning => self.abort_show(),
            PopoverState::Shown => self.dismiss(),
            PopoverState::Dismissing => {
                // Cancel-and-restart: the pending completion is dropped by token.
                self.pending_fade = None;
                self.backend.cancel_fade_out();
                self.popover.opacity = 1.0;
                self.show();
            }
        }
    }

    fn show(&mut self) {
        self.state = PopoverState::Positioning;

        let request = PlacementRequest {
            icon_frame: self.backend.icon_frame(),
            icon_screen: self.backend.icon_screen(),
            main_screen: self.backend.main_screen(),
            popover_size: self.backend.popover_size(),
            border_offset: self.settings.border_offset,
        };
        let placement = place_popover(&request);
        debug!(
            "Popover placed {:?} at ({:.1}, {:.1}) {:.1}x{:.1}",
            placement.anchor,
            placement.frame.origin.x,
            placement.frame.origin.y,
            placement.frame.size.width,
            placement.frame.size.height
        );

        self.backend.set_popover_frame(placement.frame);
        self.backend.set_popover_opacity(1.0);
        self.backend.post_menu_tracking(MenuTracking::Begin);
        self.backend.present_popover();

        self.popover.frame = Some(placement.frame);
        self.popover.opacity = 1.0;
        self.popover.ordered_in = true;

        // A panel that kept key focus through a fade gets no new became-key notification.
        if self.popover.is_key {
            self.enter_shown();
        }
    }

    fn abort_show(&mut self) {
        info!("Popover show aborted before it gained focus");
        self.backend.order_out_popover();
        self.backend.post_menu_tracking(MenuTracking::End);
        self.popover.ordered_in = false;
        self.popover.is_key = false;
        self.state = PopoverState::Hidden;
    }

    fn popover_became_key(&mut self) {
        self.popover.is_key = true;
        if self.state != PopoverState::Positioning {
            debug!("Popover became key while {}", self.state);
            return;
        }

        self.enter_shown();
    }

    fn enter_shown(&mut self) {
        self.state = PopoverState::Shown;
        self.backend.set_icon_highlighted(true);
        self.icon.highlighted = true;
        self.backend.start_outside_click_monitor();
        info!("Popover shown");
        self.callbacks.appeared();
    }

    fn popover_resigned_key(&mut self) {
        self.popover.is_key = false;
        match self.state {
            PopoverState::Shown => self.dismiss(),
            PopoverState::Positioning => self.abort_show(),
            PopoverState::Hidden | PopoverState::Dismissing => {
                debug!("Popover resigned key while {}", self.state);
            }
        }
    }

    fn outside_mouse_down(&mut self) {
        if self.state == PopoverState::Shown {
            debug!("Click outside the popover, resigning key");
            self.backend.resign_popover_key();
        }
    }

    fn dismiss(&mut self) {
        self.state = PopoverState::Dismissing;
        self.backend.stop_outside_click_monitor();
        self.backend.set_icon_highlighted(false);
        self.icon.highlighted = false;
        self.backend.post_menu_tracking(MenuTracking::End);

        self.fade_counter += 1;
        let token = AnimationToken(self.fade_counter);
        self.pending_fade = Some(token);
        self.backend
            .fade_out_popover(FadeOut::with_duration(self.settings.fade_out), token);

        info!("Popover dismissing");
        self.callbacks.disappeared();
    }

    fn fade_out_finished(&mut self, token: AnimationToken) {
        if self.state != PopoverState::Dismissing || self.pending_fade != Some(token) {
            debug!("Ignoring stale fade completion {token:?}");
            return;
        }

        self.pending_fade = None;
        self.backend.order_out_popover();
        self.backend.set_popover_opacity(1.0);
        self.popover.ordered_in = false;
        self.popover.opacity = 1.0;
        self.state = PopoverState::Hidden;
        debug!("Popover hidden");
    }

    fn apply_title(&mut self, title: String) {
        self.backend.set_icon_title(&title);
        self.icon.title = title;
    }

    fn apply_image(&mut self, image: Option<IconSpec>) {
        self.backend.set_icon_image(image.as_ref());
        self.icon.image = image;
    }

    fn apply_opacity(&mut self, opacity: f64) {
        if opacity.is_nan() {
            warn!("Ignoring NaN status icon opacity");
            return;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.backend.set_icon_opacity(opacity);
        self.icon.opacity = opacity;
    }
}

impl<B: StatusBarBackend> Drop for StatusItemController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Last values seen by the handle, answered while the controller is busy.
#[derive(Default)]
struct Snapshot {
    state: Cell<PopoverState>,
    icon_rendered: Cell<bool>,
}

impl Snapshot {
    fn capture<B: StatusBarBackend>(&self, controller: &StatusItemController<B>) {
        self.state.set(controller.state());
        self.icon_rendered.set(controller.is_visible());
    }
}

/// Shared handle to a controller living on the UI thread.
///
/// Calls made while the controller is already running (for example from inside
/// `on_appear`) are queued and applied once the running operation finishes.
pub struct StatusItem<B: StatusBarBackend + 'static> {
    controller: Rc<RefCell<StatusItemController<B>>>,
    sink: EventSink,
    snapshot: Rc<Snapshot>,
}

impl<B: StatusBarBackend + 'static> StatusItem<B> {
    pub fn new(
        backend: B,
        (sink, source): (EventSink, EventSource),
        options: StatusItemOptions,
        callbacks: Callbacks,
        settings: PopoverSettings,
    ) -> Self {
        let controller = StatusItemController::new(backend, source, options, callbacks, settings);
        let snapshot = Rc::new(Snapshot::default());
        snapshot.capture(&controller);

        let controller = Rc::new(RefCell::new(controller));
        let weak: Weak<RefCell<StatusItemController<B>>> = Rc::downgrade(&controller);
        let dispatch_snapshot = snapshot.clone();
        controller.borrow().events.set_dispatcher(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            // Busy means an operation is on the stack; it drains the queue before returning.
            if let Ok(mut controller) = shared.try_borrow_mut() {
                controller.pump();
                dispatch_snapshot.capture(&*controller);
            }
        });

        Self {
            controller,
            sink,
            snapshot,
        }
    }

    pub fn toggle_visibility(&self) {
        self.with_controller(PopoverEvent::ToggleRequested, |c| c.toggle_visibility());
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => {
                controller.set_title(title);
                self.snapshot.capture(&*controller);
            }
            Err(_) => self.defer(PopoverEvent::SetTitle(title)),
        }
    }

    pub fn set_image(&self, image: Option<IconSpec>) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => {
                controller.set_image(image);
                self.snapshot.capture(&*controller);
            }
            Err(_) => self.defer(PopoverEvent::SetImage(image)),
        }
    }

    pub fn set_opacity(&self, opacity: f64) {
        self.with_controller(PopoverEvent::SetOpacity(opacity), |c| c.set_opacity(opacity));
    }

    pub fn is_visible(&self) -> bool {
        match self.controller.try_borrow() {
            Ok(controller) => {
                let rendered = controller.is_visible();
                self.snapshot.icon_rendered.set(rendered);
                rendered
            }
            Err(_) => self.snapshot.icon_rendered.get(),
        }
    }

    pub fn state(&self) -> PopoverState {
        match self.controller.try_borrow() {
            Ok(controller) => controller.state(),
            Err(_) => self.snapshot.state.get(),
        }
    }

    /// Run `inspect` against the controller, unless it is busy.
    pub fn inspect<R>(&self, inspect: impl FnOnce(&StatusItemController<B>) -> R) -> Option<R> {
        self.controller.try_borrow().ok().map(|c| inspect(&c))
    }

    pub fn close(&self) {
        self.with_controller(PopoverEvent::TeardownRequested, |c| c.teardown());
    }

    fn with_controller(
        &self,
        deferred: PopoverEvent,
        op: impl FnOnce(&mut StatusItemController<B>),
    ) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => {
                op(&mut controller);
                self.snapshot.capture(&*controller);
            }
            Err(_) => self.defer(deferred),
        }
    }

    fn defer(&self, event: PopoverEvent) {
        debug!("Controller busy, deferring {event:?}");
        self.sink.emit(event);
    }
}
