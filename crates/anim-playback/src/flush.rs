//! Display flush hand-off.

use crate::events::{EventGroup, FLUSH_DONE};
use anim_core::FlushArea;
use std::any::Any;
use std::sync::Arc;

/// Renders an RGB565 rectangle. Must eventually call [`FlushNotifier::notify`].
pub type FlushCallback = Box<dyn FnMut(&FlushNotifier, FlushArea, &[u16]) + Send>;

/// Receives playback progress events.
pub type UpdateCallback = Box<dyn FnMut(crate::PlayerEvent) + Send>;

/// Opaque caller context.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Signals that the display finished with the last flushed split.
///
/// Cheap to clone and safe to call from any thread, including a display
/// driver's completion callback.
#[derive(Debug, Clone)]
pub struct FlushNotifier {
    events: Arc<EventGroup>,
}

impl FlushNotifier {
    pub(crate) fn new(events: Arc<EventGroup>) -> Self {
        Self { events }
    }

    pub fn notify(&self) {
        self.events.set(FLUSH_DONE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_sets_flush_done() {
        let events = Arc::new(EventGroup::new());
        let notifier = FlushNotifier::new(Arc::clone(&events));
        notifier.clone().notify();
        assert_eq!(events.get() & FLUSH_DONE, FLUSH_DONE);
    }
}
