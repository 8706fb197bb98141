// ABOUTME: Menu bar status items with a custom popover window in place of a menu
// ABOUTME: Platform-independent controller and placement logic plus an AppKit backend on macOS

pub mod config;
pub mod controller;
pub mod events;
pub mod geometry;
pub mod icon;
pub mod logging;
pub mod platform;
pub mod positioning;
pub mod state;

pub use controller::{
    Callbacks, PopoverSettings, PopoverWindow, StatusItem, StatusItemController, StatusItemOptions,
};
pub use events::{EventSink, EventSource, PopoverEvent};
pub use geometry::{Point, Rect, ScreenGeometry, Size};
pub use icon::{IconSpec, RasterIcon, StatusIcon};
pub use platform::{MenuTracking, StatusBarBackend};
pub use state::PopoverState;
