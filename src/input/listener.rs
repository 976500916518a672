use std::fmt;

/// DOM touch events registered non-passive so their handlers can cancel
/// pinch-zoom synchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    TouchStart,
    TouchMove,
}

impl ListenerKind {
    /// Events the document-level zoom guard listens to
    pub const ZOOM_GUARD: [ListenerKind; 2] = [ListenerKind::TouchStart, ListenerKind::TouchMove];

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
        }
    }
}

/// Registration handle. Dropping it deregisters the listener.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Deregister now instead of at drop
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_zoom_guard_events() {
        let names: Vec<_> = ListenerKind::ZOOM_GUARD.iter().map(|k| k.event_name()).collect();
        assert_eq!(names, vec!["touchstart", "touchmove"]);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let released = Rc::new(Cell::new(0));
        {
            let counter = released.clone();
            let _subscription = Subscription::new(move || counter.set(counter.get() + 1));
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_explicit_release_runs_once() {
        let released = Rc::new(Cell::new(0));
        let counter = released.clone();
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        subscription.release();
        assert_eq!(released.get(), 1);
    }
}
