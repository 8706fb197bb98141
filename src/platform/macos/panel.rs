// ABOUTME: Borderless non-activating NSPanel that hosts the popover content
// ABOUTME: Key focus changes are forwarded to the controller as PopoverEvents

use crate::events::{EventSink, PopoverEvent};
use crate::geometry::Size;
use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, NSObject};
use objc2::{MainThreadMarker, MainThreadOnly, define_class, msg_send};
use objc2_app_kit::{
    NSAutoresizingMaskOptions, NSBackingStoreType, NSColor, NSPanel, NSResponder, NSView,
    NSVisualEffectBlendingMode, NSVisualEffectMaterial, NSVisualEffectState, NSVisualEffectView,
    NSWindow, NSWindowAnimationBehavior, NSWindowCollectionBehavior, NSWindowLevel,
    NSWindowStyleMask,
};
use objc2_foundation::{
    NSNotification, NSNotificationCenter, NSNotificationName, NSPoint, NSRect, NSSize,
};
use std::ptr::NonNull;

/// kCGStatusWindowLevel, so the popover sits with the menu bar above normal windows.
const STATUS_WINDOW_LEVEL: NSWindowLevel = 25;

const CORNER_RADIUS: f64 = 8.0;

define_class!(
    #[unsafe(super(NSPanel, NSWindow, NSResponder, NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "BarpopPopoverPanel"]
    pub struct PopoverPanel;

    impl PopoverPanel {
        // Borderless windows refuse key status unless told otherwise.
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key_window(&self) -> bool {
            true
        }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main_window(&self) -> bool {
            false
        }
    }
);

impl PopoverPanel {
    pub fn new(mtm: MainThreadMarker, content: &NSView, size: Size) -> Retained<Self> {
        let frame = NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(size.width, size.height));
        let style = NSWindowStyleMask::Borderless | NSWindowStyleMask::NonactivatingPanel;

        let panel: Retained<Self> = unsafe {
            msg_send![
                Self::alloc(mtm),
                initWithContentRect: frame,
                styleMask: style,
                backing: NSBackingStoreType::Buffered,
                defer: false
            ]
        };

        unsafe { panel.setReleasedWhenClosed(false) };
        panel.setLevel(STATUS_WINDOW_LEVEL);
        panel.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::FullScreenAuxiliary
                | NSWindowCollectionBehavior::Transient,
        );
        panel.setFloatingPanel(true);
        panel.setBecomesKeyOnlyIfNeeded(false);
        panel.setHidesOnDeactivate(false);
        panel.setMovable(false);
        panel.setOpaque(false);
        panel.setHasShadow(true);
        panel.setBackgroundColor(Some(&NSColor::clearColor()));
        panel.setAnimationBehavior(NSWindowAnimationBehavior::None);

        let background = NSVisualEffectView::initWithFrame(NSVisualEffectView::alloc(mtm), frame);
        background.setMaterial(NSVisualEffectMaterial::Menu);
        background.setBlendingMode(NSVisualEffectBlendingMode::BehindWindow);
        background.setState(NSVisualEffectState::Active);
        background.setWantsLayer(true);
        let layer: Option<Retained<AnyObject>> = unsafe { msg_send![&background, layer] };
        if let Some(layer) = layer {
            let _: () = unsafe { msg_send![&layer, setCornerRadius: CORNER_RADIUS] };
            let _: () = unsafe { msg_send![&layer, setMasksToBounds: true] };
        }

        content.setFrame(frame);
        content.setAutoresizingMask(
            NSAutoresizingMaskOptions::ViewWidthSizable
                | NSAutoresizingMaskOptions::ViewHeightSizable,
        );
        background.addSubview(content);
        panel.setContentView(Some(&background));

        panel
    }
}

/// Notification observers for the panel's key focus, removed on drop.
pub struct KeyObservers {
    observers: Vec<Retained<AnyObject>>,
}

impl KeyObservers {
    pub fn register(panel: &PopoverPanel, sink: &EventSink) -> Self {
        let center = NSNotificationCenter::defaultCenter();
        let subscriptions = [
            (
                "NSWindowDidBecomeKeyNotification",
                PopoverEvent::PopoverBecameKey,
            ),
            (
                "NSWindowDidResignKeyNotification",
                PopoverEvent::PopoverResignedKey,
            ),
        ];

        let mut observers = Vec::with_capacity(subscriptions.len());
        for (name, event) in subscriptions {
            let notification_name = NSNotificationName::from_str(name);
            let sink = sink.clone();
            let handler = RcBlock::new(move |_notification: NonNull<NSNotification>| {
                sink.emit(event.clone());
            });

            let observer = unsafe {
                center.addObserverForName_object_queue_usingBlock(
                    Some(&notification_name),
                    Some(panel),
                    None,
                    &handler,
                )
            };
            observers.push(observer.into());
        }

        tracing::debug!("Registered {} popover key observers", observers.len());
        Self { observers }
    }
}

impl Drop for KeyObservers {
    fn drop(&mut self) {
        let center = NSNotificationCenter::defaultCenter();
        for observer in self.observers.drain(..) {
            unsafe { center.removeObserver(&observer) };
        }
    }
}
