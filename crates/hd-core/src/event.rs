//! Drawing change notifications.
//!
//! The drawing owns the listener registry. Listeners subscribe either to
//! every event or to the events of one figure, and are addressed by the
//! [`ListenerId`] returned from [`Listeners::subscribe`].

use crate::attribute::{AttributeKey, AttributeValue};
use crate::id::{FigureId, ListenerId};
use kurbo::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    FigureAdded {
        id: FigureId,
        index: usize,
    },
    FigureRemoved {
        id: FigureId,
        index: usize,
    },
    FigureChanged {
        id: FigureId,
        old_bounds: Rect,
        new_bounds: Rect,
    },
    AttributeChanged {
        id: FigureId,
        key: AttributeKey,
        old: AttributeValue,
        new: AttributeValue,
    },
    /// `area` needs repainting. `figure` names the figure that caused it, if any.
    AreaInvalidated {
        figure: Option<FigureId>,
        area: Rect,
    },
    ZOrderChanged {
        id: FigureId,
    },
}

impl DrawingEvent {
    /// The figure an event is about, if any.
    pub fn figure(&self) -> Option<FigureId> {
        match self {
            DrawingEvent::FigureAdded { id, .. }
            | DrawingEvent::FigureRemoved { id, .. }
            | DrawingEvent::FigureChanged { id, .. }
            | DrawingEvent::AttributeChanged { id, .. }
            | DrawingEvent::ZOrderChanged { id } => Some(*id),
            DrawingEvent::AreaInvalidated { figure, .. } => *figure,
        }
    }
}

/// What a listener wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    All,
    Figure(FigureId),
}

pub type Listener = Box<dyn FnMut(&DrawingEvent) + Send>;

/// Registry of drawing listeners.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerId, Subscription, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("entries", &format!("<{} listeners>", self.entries.len()))
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscription: Subscription, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, subscription, listener));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _, _)| *lid != id);
        self.entries.len() != before
    }

    /// Drop every per-figure subscription for `figure`.
    pub fn forget_figure(&mut self, figure: FigureId) {
        self.entries
            .retain(|(_, sub, _)| *sub != Subscription::Figure(figure));
    }

    pub fn emit(&mut self, event: &DrawingEvent) {
        let target = event.figure();
        for (_, sub, listener) in &mut self.entries {
            let wants = match sub {
                Subscription::All => true,
                Subscription::Figure(id) => target == Some(*id),
            };
            if wants {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn figure_subscriptions_filter_events() {
        let a = FigureId::next();
        let b = FigureId::next();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut listeners = Listeners::new();
        let sink = seen.clone();
        listeners.subscribe(
            Subscription::Figure(a),
            Box::new(move |e| sink.lock().push(e.figure())),
        );

        listeners.emit(&DrawingEvent::ZOrderChanged { id: a });
        listeners.emit(&DrawingEvent::ZOrderChanged { id: b });
        listeners.emit(&DrawingEvent::AreaInvalidated {
            figure: None,
            area: Rect::ZERO,
        });

        assert_eq!(*seen.lock(), vec![Some(a)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        let c = count.clone();
        let id = listeners.subscribe(Subscription::All, Box::new(move |_| *c.lock() += 1));

        listeners.emit(&DrawingEvent::ZOrderChanged { id: FigureId::next() });
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&DrawingEvent::ZOrderChanged { id: FigureId::next() });

        assert_eq!(*count.lock(), 1);
        assert!(listeners.is_empty());
    }
}
