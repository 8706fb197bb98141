// ABOUTME: macOS backend: status item, popover panel, event monitors and menu tracking via objc2
// ABOUTME: Must be used from the main thread of an NSApplication

mod content;
mod monitors;
mod panel;
mod status_bar;

pub use content::{DEFAULT_CONTENT_SIZE, PopoverContent, TextContent};
pub use status_bar::MacOSStatusBar;

use crate::controller::{Callbacks, PopoverSettings, StatusItem, StatusItemOptions};
use crate::events;
use crate::geometry::Rect;
use anyhow::Result;
use objc2::MainThreadMarker;
use objc2_foundation::{NSPoint, NSRect, NSSize};

pub(crate) fn to_ns_rect(rect: Rect) -> NSRect {
    NSRect::new(
        NSPoint::new(rect.origin.x, rect.origin.y),
        NSSize::new(rect.size.width, rect.size.height),
    )
}

pub(crate) fn from_ns_rect(rect: NSRect) -> Rect {
    Rect::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height)
}

/// Installs a status item whose clicks toggle a popover showing `content`.
///
/// The returned handle owns the icon; dropping it removes the icon from the menu bar.
pub fn status_item(
    mtm: MainThreadMarker,
    options: StatusItemOptions,
    content: &dyn PopoverContent,
    callbacks: Callbacks,
    settings: PopoverSettings,
) -> Result<StatusItem<MacOSStatusBar>> {
    let (sink, source) = events::channel();
    let backend = MacOSStatusBar::new(mtm, content, sink.clone())?;
    Ok(StatusItem::new(
        backend,
        (sink, source),
        options,
        callbacks,
        settings,
    ))
}
