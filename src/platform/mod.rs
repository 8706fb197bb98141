// ABOUTME: Platform abstraction layer between the status item controller and the host toolkit
// ABOUTME: The controller decides; a backend only renders icons, moves windows and runs monitors

use crate::geometry::{Rect, ScreenGeometry, Size};
use crate::icon::IconSpec;
use crate::state::{AnimationToken, FadeOut};

#[cfg(target_os = "macos")]
pub mod macos;

/// Distributed notifications that keep the menu bar on screen in full-screen spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTracking {
    Begin,
    End,
}

/// Host toolkit operations used by the controller.
///
/// Implementations report asynchronous happenings (key focus changes, monitor hits,
/// fade completions) through the [`EventSink`](crate::events::EventSink) they were
/// built with, never by calling back into the controller.
pub trait StatusBarBackend {
    // Status icon
    fn set_icon_title(&mut self, title: &str);

    /// `None` falls back to a text-only button.
    fn set_icon_image(&mut self, image: Option<&IconSpec>);

    fn set_icon_opacity(&mut self, opacity: f64);

    fn set_icon_highlighted(&mut self, highlighted: bool);

    fn set_icon_visible(&mut self, visible: bool);

    /// Whether any part of the status icon is currently drawn on screen.
    fn icon_is_rendered(&self) -> bool;

    /// Screen frame of the status icon, if the toolkit knows it.
    fn icon_frame(&self) -> Option<Rect>;

    /// The screen the status icon is on.
    fn icon_screen(&self) -> Option<ScreenGeometry>;

    fn main_screen(&self) -> Option<ScreenGeometry>;

    fn remove_status_icon(&mut self);

    // Popover window
    fn popover_size(&self) -> Size;

    fn set_popover_frame(&mut self, frame: Rect);

    fn set_popover_opacity(&mut self, opacity: f64);

    /// Order the popover front and make it key without activating the app.
    fn present_popover(&mut self);

    fn resign_popover_key(&mut self);

    /// Start fading out; report [`PopoverEvent::FadeOutFinished`](crate::events::PopoverEvent)
    /// with `token` when done.
    fn fade_out_popover(&mut self, fade: FadeOut, token: AnimationToken);

    /// Stop an in-flight fade and snap back to fully opaque.
    fn cancel_fade_out(&mut self);

    /// Remove the popover from the window list without destroying it.
    fn order_out_popover(&mut self);

    // Event monitors
    /// The always-on same-process mouse-down monitor.
    fn start_local_monitor(&mut self);

    fn stop_local_monitor(&mut self);

    /// The cross-process mouse-down monitor, active only while the popover is shown.
    fn start_outside_click_monitor(&mut self);

    fn stop_outside_click_monitor(&mut self);

    fn post_menu_tracking(&mut self, tracking: MenuTracking);
}
