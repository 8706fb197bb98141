// ABOUTME: NSEvent monitors for status icon clicks (local) and clicks in other apps (global)
// ABOUTME: Handlers only classify and enqueue; the controller decides what a click means

use crate::events::{EventSink, LocalClick, PopoverEvent, classify_local_mouse_down};
use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_app_kit::{NSEvent, NSEventMask, NSEventModifierFlags};
use std::cell::Cell;
use std::ptr::{self, NonNull};
use std::rc::Rc;

/// Window number of the status icon's button window, refreshed whenever the icon moves.
pub type IconWindowNumber = Rc<Cell<Option<isize>>>;

/// Same-process mouse-down monitor that turns plain clicks on the icon into toggles.
#[derive(Default)]
pub struct LocalClickMonitor {
    monitor: Option<Retained<AnyObject>>,
}

impl LocalClickMonitor {
    pub fn start(&mut self, sink: &EventSink, icon_window: IconWindowNumber) {
        if self.monitor.is_some() {
            return;
        }

        let sink = sink.clone();
        let handler = RcBlock::new(move |event: NonNull<NSEvent>| -> *mut NSEvent {
            let ns_event = unsafe { event.as_ref() };
            let targets_icon = icon_window
                .get()
                .is_some_and(|number| number == ns_event.windowNumber());
            let command_held = ns_event
                .modifierFlags()
                .contains(NSEventModifierFlags::Command);

            match classify_local_mouse_down(targets_icon, command_held) {
                LocalClick::Toggle => {
                    sink.emit(PopoverEvent::StatusIconPressed);
                    // Swallowed so the button does not run its own tracking loop.
                    ptr::null_mut()
                }
                LocalClick::PassThrough => event.as_ptr(),
            }
        });

        self.monitor = unsafe {
            NSEvent::addLocalMonitorForEventsMatchingMask_handler(NSEventMask::LeftMouseDown, &handler)
        };

        if self.monitor.is_some() {
            tracing::debug!("Local status icon monitor installed");
        } else {
            tracing::warn!("Failed to install local status icon monitor");
        }
    }

    pub fn stop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            unsafe { NSEvent::removeMonitor(&monitor) };
            tracing::debug!("Local status icon monitor removed");
        }
    }
}

/// Cross-process mouse-down monitor, installed only while the popover is shown.
#[derive(Default)]
pub struct OutsideClickMonitor {
    monitor: Option<Retained<AnyObject>>,
}

impl OutsideClickMonitor {
    pub fn start(&mut self, sink: &EventSink) {
        if self.monitor.is_some() {
            return;
        }

        let sink = sink.clone();
        let handler = RcBlock::new(move |_event: NonNull<NSEvent>| {
            sink.emit(PopoverEvent::OutsideMouseDown);
        });

        self.monitor = NSEvent::addGlobalMonitorForEventsMatchingMask_handler(
            NSEventMask::LeftMouseDown | NSEventMask::RightMouseDown,
            &handler,
        );

        if self.monitor.is_none() {
            tracing::warn!("Failed to install outside click monitor");
        }
    }

    pub fn stop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            unsafe { NSEvent::removeMonitor(&monitor) };
        }
    }
}

impl Drop for LocalClickMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Drop for OutsideClickMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
