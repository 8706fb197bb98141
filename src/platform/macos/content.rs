// ABOUTME: Caller-supplied popover content as an opaque NSView provider
// ABOUTME: Includes a plain text label provider used by the demo binary

use crate::geometry::Size;
use objc2::rc::Retained;
use objc2::{MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{NSTextAlignment, NSTextField, NSView};
use objc2_foundation::{NSPoint, NSRect, NSSize, NSString};

/// Used when the content view reports no size of its own.
pub const DEFAULT_CONTENT_SIZE: Size = Size::new(300.0, 200.0);

/// Builds the view shown inside the popover. Called once at construction.
pub trait PopoverContent {
    fn make_view(&self, mtm: MainThreadMarker) -> Retained<NSView>;

    /// Overrides the view's fitting size.
    fn preferred_size(&self) -> Option<Size> {
        None
    }
}

impl<F> PopoverContent for F
where
    F: Fn(MainThreadMarker) -> Retained<NSView>,
{
    fn make_view(&self, mtm: MainThreadMarker) -> Retained<NSView> {
        self(mtm)
    }
}

/// Size the popover should take for `view`.
pub fn content_size(content: &dyn PopoverContent, view: &NSView) -> Size {
    if let Some(size) = content.preferred_size() {
        return size;
    }

    let fitting = view.fittingSize();
    if fitting.width > 0.0 && fitting.height > 0.0 {
        return Size::new(fitting.width, fitting.height);
    }

    let frame = view.frame();
    if frame.size.width > 0.0 && frame.size.height > 0.0 {
        return Size::new(frame.size.width, frame.size.height);
    }

    tracing::warn!(
        "Popover content has no size, using {}x{}",
        DEFAULT_CONTENT_SIZE.width,
        DEFAULT_CONTENT_SIZE.height
    );
    DEFAULT_CONTENT_SIZE
}

/// A centered, non-editable label.
pub struct TextContent {
    pub message: String,
    pub size: Size,
}

impl PopoverContent for TextContent {
    fn make_view(&self, mtm: MainThreadMarker) -> Retained<NSView> {
        let frame = NSRect::new(
            NSPoint::new(0.0, 0.0),
            NSSize::new(self.size.width, self.size.height),
        );
        let container = NSView::initWithFrame(NSView::alloc(mtm), frame);

        let label = NSTextField::labelWithString(&NSString::from_str(&self.message), mtm);
        label.setAlignment(NSTextAlignment::Center);
        let label_height = label.fittingSize().height;
        label.setFrame(NSRect::new(
            NSPoint::new(0.0, (self.size.height - label_height) / 2.0),
            NSSize::new(self.size.width, label_height),
        ));
        container.addSubview(&label);

        container
    }

    fn preferred_size(&self) -> Option<Size> {
        Some(self.size)
    }
}
