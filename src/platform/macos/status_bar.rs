// ABOUTME: AppKit implementation of StatusBarBackend using NSStatusItem and a custom NSPanel
// ABOUTME: Owns the native icon, popover panel, key observers, event monitors and fade animation

use super::content::{PopoverContent, content_size};
use super::monitors::{IconWindowNumber, LocalClickMonitor, OutsideClickMonitor};
use super::panel::{KeyObservers, PopoverPanel};
use super::{from_ns_rect, to_ns_rect};
use crate::events::{EventSink, PopoverEvent};
use crate::geometry::{Rect, ScreenGeometry, Size};
use crate::icon::IconSpec;
use crate::platform::{MenuTracking, StatusBarBackend};
use crate::state::{AnimationToken, FadeOut, TimingCurve};
use anyhow::Result;
use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::{AnyClass, AnyObject};
use objc2::{MainThreadMarker, msg_send};
use objc2_app_kit::{
    NSAnimatablePropertyContainer, NSAnimationContext, NSCellImagePosition, NSImage, NSScreen,
    NSStatusBar, NSStatusBarButton, NSStatusItem, NSVariableStatusItemLength, NSView,
    NSWindowOcclusionState,
};
use objc2_foundation::{NSData, NSDistributedNotificationCenter, NSSize, NSString};
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

const BEGIN_MENU_TRACKING: &str = "com.apple.HIToolbox.beginMenuTrackingNotification";
const END_MENU_TRACKING: &str = "com.apple.HIToolbox.endMenuTrackingNotification";

pub struct MacOSStatusBar {
    mtm: MainThreadMarker,
    sink: EventSink,
    status_item: Option<Retained<NSStatusItem>>,
    icon_window: IconWindowNumber,
    panel: Retained<PopoverPanel>,
    // Keeps the caller's view alive independently of the panel hierarchy.
    _content: Retained<NSView>,
    popover_size: Size,
    key_observers: Option<KeyObservers>,
    local_monitor: LocalClickMonitor,
    outside_monitor: OutsideClickMonitor,
}

impl MacOSStatusBar {
    pub fn new(mtm: MainThreadMarker, content: &dyn PopoverContent, sink: EventSink) -> Result<Self> {
        let status_bar = NSStatusBar::systemStatusBar();
        let status_item = status_bar.statusItemWithLength(NSVariableStatusItemLength);
        if status_item.button(mtm).is_none() {
            status_bar.removeStatusItem(&status_item);
            anyhow::bail!("Status item was created without a button");
        }

        let view = content.make_view(mtm);
        let popover_size = content_size(content, &view);
        let panel = PopoverPanel::new(mtm, &view, popover_size);
        let key_observers = KeyObservers::register(&panel, &sink);

        tracing::debug!(
            "Popover panel created at {}x{}",
            popover_size.width,
            popover_size.height
        );

        let backend = Self {
            mtm,
            sink,
            status_item: Some(status_item),
            icon_window: Rc::new(Cell::new(None)),
            panel,
            _content: view,
            popover_size,
            key_observers: Some(key_observers),
            local_monitor: LocalClickMonitor::default(),
            outside_monitor: OutsideClickMonitor::default(),
        };
        backend.refresh_icon_window();
        Ok(backend)
    }

    fn button(&self) -> Option<Retained<NSStatusBarButton>> {
        self.status_item.as_ref()?.button(self.mtm)
    }

    /// The local monitor matches clicks by window number; the icon window can change.
    fn refresh_icon_window(&self) {
        let number = self
            .button()
            .and_then(|button| button.window())
            .map(|window| window.windowNumber());
        self.icon_window.set(number);
    }

    fn make_image(&self, spec: &IconSpec) -> Option<Retained<NSImage>> {
        match spec {
            IconSpec::Named(name) => {
                let image = NSImage::imageNamed(&NSString::from_str(name));
                if image.is_none() {
                    tracing::warn!("No image named '{name}'");
                }
                image
            }
            IconSpec::Symbol(name) => {
                let image = NSImage::imageWithSystemSymbolName_accessibilityDescription(
                    &NSString::from_str(name),
                    None,
                );
                match image {
                    Some(image) => {
                        image.setTemplate(true);
                        Some(image)
                    }
                    None => {
                        tracing::warn!("No SF Symbol named '{name}'");
                        None
                    }
                }
            }
            IconSpec::Raster(raster) => {
                let data = NSData::with_bytes(&raster.png);
                let image = NSImage::initWithData(NSImage::alloc(), &data);
                match image {
                    Some(image) => {
                        image.setSize(NSSize::new(
                            raster.point_size.width,
                            raster.point_size.height,
                        ));
                        Some(image)
                    }
                    None => {
                        tracing::warn!("AppKit rejected the raster status icon");
                        None
                    }
                }
            }
        }
    }
}

fn screen_geometry(screen: &NSScreen) -> ScreenGeometry {
    ScreenGeometry::new(from_ns_rect(screen.frame()), from_ns_rect(screen.visibleFrame()))
}

fn timing_function(curve: TimingCurve) -> Option<Retained<AnyObject>> {
    let name = match curve {
        TimingCurve::Linear => "linear",
        TimingCurve::EaseInEaseOut => "easeInEaseOut",
    };
    // QuartzCore class, resolved through the runtime.
    let class = AnyClass::get(c"CAMediaTimingFunction")?;
    unsafe { msg_send![class, functionWithName: &*NSString::from_str(name)] }
}

impl StatusBarBackend for MacOSStatusBar {
    fn set_icon_title(&mut self, title: &str) {
        if let Some(button) = self.button() {
            button.setTitle(&NSString::from_str(title));
        }
    }

    fn set_icon_image(&mut self, image: Option<&IconSpec>) {
        let Some(button) = self.button() else {
            return;
        };

        let ns_image = image.and_then(|spec| self.make_image(spec));
        button.setImage(ns_image.as_deref());
        button.setImagePosition(if ns_image.is_some() {
            NSCellImagePosition::ImageLeft
        } else {
            NSCellImagePosition::NoImage
        });
        self.refresh_icon_window();
    }

    fn set_icon_opacity(&mut self, opacity: f64) {
        if let Some(button) = self.button() {
            button.setAlphaValue(opacity);
        }
    }

    fn set_icon_highlighted(&mut self, highlighted: bool) {
        if let Some(button) = self.button() {
            button.highlight(highlighted);
        }
    }

    fn set_icon_visible(&mut self, visible: bool) {
        if let Some(item) = &self.status_item {
            item.setVisible(visible);
        }
        self.refresh_icon_window();
    }

    fn icon_is_rendered(&self) -> bool {
        let Some(item) = &self.status_item else {
            return false;
        };
        if !item.isVisible() {
            return false;
        }

        self.button()
            .and_then(|button| button.window())
            .is_some_and(|window| {
                window
                    .occlusionState()
                    .contains(NSWindowOcclusionState::Visible)
            })
    }

    fn icon_frame(&self) -> Option<Rect> {
        let window = self.button()?.window()?;
        Some(from_ns_rect(window.frame()))
    }

    fn icon_screen(&self) -> Option<ScreenGeometry> {
        let screen = self.button()?.window()?.screen()?;
        Some(screen_geometry(&screen))
    }

    fn main_screen(&self) -> Option<ScreenGeometry> {
        NSScreen::mainScreen(self.mtm).map(|screen| screen_geometry(&screen))
    }

    fn remove_status_icon(&mut self) {
        if let Some(item) = self.status_item.take() {
            NSStatusBar::systemStatusBar().removeStatusItem(&item);
        }
        self.icon_window.set(None);
        // Key changes after teardown have no one to report to.
        self.key_observers.take();
    }

    fn popover_size(&self) -> Size {
        self.popover_size
    }

    fn set_popover_frame(&mut self, frame: Rect) {
        self.refresh_icon_window();
        self.panel.setFrame_display(to_ns_rect(frame), true);
    }

    fn set_popover_opacity(&mut self, opacity: f64) {
        self.panel.setAlphaValue(opacity);
    }

    fn present_popover(&mut self) {
        self.panel.orderFrontRegardless();
        self.panel.makeKeyWindow();
    }

    fn resign_popover_key(&mut self) {
        self.panel.resignKeyWindow();
        // Not every AppKit version posts the notification for a direct resign.
        if !self.panel.isKeyWindow() {
            self.sink.emit(PopoverEvent::PopoverResignedKey);
        }
    }

    fn fade_out_popover(&mut self, fade: FadeOut, token: AnimationToken) {
        let panel = self.panel.clone();
        let seconds = fade.duration.as_secs_f64();
        let target = fade.to;
        let timing = timing_function(fade.curve);

        let changes = RcBlock::new(move |context: NonNull<NSAnimationContext>| {
            let context = unsafe { context.as_ref() };
            context.setDuration(seconds);
            if let Some(timing) = &timing {
                let _: () = unsafe { msg_send![context, setTimingFunction: &**timing] };
            }
            panel.animator().setAlphaValue(target);
        });

        let sink = self.sink.clone();
        let completion = RcBlock::new(move || {
            sink.emit(PopoverEvent::FadeOutFinished(token));
        });

        tracing::debug!("Fading out popover over {seconds:.2}s ({token:?})");
        unsafe {
            NSAnimationContext::runAnimationGroup_completionHandler(&changes, Some(&completion));
        }
    }

    fn cancel_fade_out(&mut self) {
        // A zero-length group on the same property replaces the running animation.
        let panel = self.panel.clone();
        let changes = RcBlock::new(move |context: NonNull<NSAnimationContext>| {
            unsafe { context.as_ref() }.setDuration(0.0);
            panel.animator().setAlphaValue(1.0);
        });
        unsafe { NSAnimationContext::runAnimationGroup_completionHandler(&changes, None) };
        self.panel.setAlphaValue(1.0);
    }

    fn order_out_popover(&mut self) {
        self.panel.orderOut(None);
    }

    fn start_local_monitor(&mut self) {
        self.refresh_icon_window();
        self.local_monitor.start(&self.sink, self.icon_window.clone());
    }

    fn stop_local_monitor(&mut self) {
        self.local_monitor.stop();
    }

    fn start_outside_click_monitor(&mut self) {
        self.outside_monitor.start(&self.sink);
    }

    fn stop_outside_click_monitor(&mut self) {
        self.outside_monitor.stop();
    }

    fn post_menu_tracking(&mut self, tracking: MenuTracking) {
        let name = match tracking {
            MenuTracking::Begin => BEGIN_MENU_TRACKING,
            MenuTracking::End => END_MENU_TRACKING,
        };

        let center = NSDistributedNotificationCenter::defaultCenter();
        unsafe {
            center.postNotificationName_object_userInfo_deliverImmediately(
                &NSString::from_str(name),
                None,
                None,
                true,
            );
        }
    }
}
