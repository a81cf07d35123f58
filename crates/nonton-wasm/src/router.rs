//! Event router - delivers browser callbacks to the session
//!
//! hls.js and the video element call back into Rust at arbitrary points,
//! including while the session is already borrowed (e.g. `hls.destroy()`
//! firing from inside a session method). Events are queued and delivered
//! whenever the session can be borrowed; callers flush after every session
//! call so nothing stays queued.

use crate::platform::WebPlatform;
use nonton_core::{EngineEvent, MediaEvent, PlaybackSession};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::trace;

pub type SharedSession = Rc<RefCell<PlaybackSession<WebPlatform>>>;

/// Event queued for the session
#[derive(Debug, Clone)]
pub enum RoutedEvent {
    Engine(EngineEvent),
    Media(MediaEvent),
}

type Observer = Rc<dyn Fn(&RoutedEvent)>;

#[derive(Default)]
struct RouterState {
    session: Option<Weak<RefCell<PlaybackSession<WebPlatform>>>>,
    pending: VecDeque<RoutedEvent>,
    observers: Vec<Observer>,
}

#[derive(Clone, Default)]
pub struct EventRouter {
    inner: Rc<RefCell<RouterState>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, session: &SharedSession) {
        self.inner.borrow_mut().session = Some(Rc::downgrade(session));
    }

    /// Run `observer` after each event the session has handled
    pub fn observe(&self, observer: impl Fn(&RoutedEvent) + 'static) {
        self.inner.borrow_mut().observers.push(Rc::new(observer));
    }

    pub fn dispatch(&self, event: RoutedEvent) {
        trace!(?event, "Event queued");
        self.inner.borrow_mut().pending.push_back(event);
        self.flush();
    }

    /// Deliver queued events until the queue is empty or the session is busy
    pub fn flush(&self) {
        loop {
            let (session, event) = {
                let mut state = self.inner.borrow_mut();
                let Some(session) = state.session.as_ref().and_then(Weak::upgrade) else {
                    state.pending.clear();
                    return;
                };
                let Some(event) = state.pending.pop_front() else {
                    return;
                };
                (session, event)
            };

            let Ok(mut guard) = session.try_borrow_mut() else {
                // Re-entrant callback; the outer caller flushes again
                self.inner.borrow_mut().pending.push_front(event);
                return;
            };
            match &event {
                RoutedEvent::Engine(e) => guard.handle_engine_event(e.clone()),
                RoutedEvent::Media(e) => guard.handle_media_event(*e),
            }
            drop(guard);

            let observers = self.inner.borrow().observers.clone();
            for observer in &observers {
                observer(&event);
            }
        }
    }
}
