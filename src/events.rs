// ABOUTME: Event channel from host toolkit callbacks into the status item controller
// ABOUTME: Native observers and monitors only enqueue events; a weakly-held dispatcher drains them

use crate::icon::IconSpec;
use crate::state::AnimationToken;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, PartialEq)]
pub enum PopoverEvent {
    /// The local monitor saw a toggle click on the status icon.
    StatusIconPressed,
    PopoverBecameKey,
    PopoverResignedKey,
    /// The global monitor saw a click in another application.
    OutsideMouseDown,
    FadeOutFinished(AnimationToken),
    // Operations requested while the controller was busy.
    ToggleRequested,
    SetTitle(String),
    SetImage(Option<IconSpec>),
    SetOpacity(f64),
    TeardownRequested,
}

/// What the local mouse-down monitor should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalClick {
    /// Toggle the popover and swallow the event so the button stays highlighted.
    Toggle,
    PassThrough,
}

/// Command-clicks go through untouched so the icon can still be dragged in the menu bar.
pub fn classify_local_mouse_down(targets_status_icon: bool, command_held: bool) -> LocalClick {
    if targets_status_icon && !command_held {
        LocalClick::Toggle
    } else {
        LocalClick::PassThrough
    }
}

type Dispatcher = Rc<dyn Fn()>;

/// Sending half, cloned into every native callback.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<PopoverEvent>,
    dispatcher: Rc<RefCell<Option<Dispatcher>>>,
}

impl EventSink {
    pub fn emit(&self, event: PopoverEvent) {
        tracing::debug!("Popover event queued: {event:?}");
        if let Err(e) = self.sender.send(event) {
            tracing::debug!("Dropping popover event, controller is gone: {e}");
            return;
        }

        // Clone out so the dispatcher can install or clear itself while running.
        let dispatcher = self.dispatcher.borrow().clone();
        if let Some(dispatch) = dispatcher {
            dispatch();
        }
    }
}

/// Receiving half, owned by the controller.
pub struct EventSource {
    receiver: Receiver<PopoverEvent>,
    dispatcher: Rc<RefCell<Option<Dispatcher>>>,
}

impl EventSource {
    pub fn try_next(&self) -> Option<PopoverEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn set_dispatcher<F>(&self, dispatch: F)
    where
        F: Fn() + 'static,
    {
        *self.dispatcher.borrow_mut() = Some(Rc::new(dispatch));
    }

    pub fn clear_dispatcher(&self) {
        self.dispatcher.borrow_mut().take();
    }
}

pub fn channel() -> (EventSink, EventSource) {
    let (sender, receiver) = mpsc::channel();
    let dispatcher = Rc::new(RefCell::new(None));

    (
        EventSink {
            sender,
            dispatcher: dispatcher.clone(),
        },
        EventSource {
            receiver,
            dispatcher,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_classify_plain_icon_click_toggles() {
        assert_eq!(classify_local_mouse_down(true, false), LocalClick::Toggle);
    }

    #[test]
    fn test_classify_command_click_passes_through() {
        assert_eq!(
            classify_local_mouse_down(true, true),
            LocalClick::PassThrough
        );
    }

    #[test]
    fn test_classify_other_window_passes_through() {
        assert_eq!(
            classify_local_mouse_down(false, false),
            LocalClick::PassThrough
        );
        assert_eq!(
            classify_local_mouse_down(false, true),
            LocalClick::PassThrough
        );
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, source) = channel();

        sink.emit(PopoverEvent::StatusIconPressed);
        sink.emit(PopoverEvent::PopoverBecameKey);

        assert_eq!(source.try_next(), Some(PopoverEvent::StatusIconPressed));
        assert_eq!(source.try_next(), Some(PopoverEvent::PopoverBecameKey));
        assert_eq!(source.try_next(), None);
    }

    #[test]
    fn test_dispatcher_runs_after_each_emit() {
        let (sink, source) = channel();
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();

        source.set_dispatcher(move || calls_clone.set(calls_clone.get() + 1));
        sink.emit(PopoverEvent::OutsideMouseDown);
        sink.emit(PopoverEvent::OutsideMouseDown);
        assert_eq!(calls.get(), 2);

        source.clear_dispatcher();
        sink.emit(PopoverEvent::OutsideMouseDown);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_emit_after_source_dropped_is_harmless() {
        let (sink, source) = channel();
        drop(source);

        sink.emit(PopoverEvent::StatusIconPressed);
    }
}
