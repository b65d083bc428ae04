//! Single-value state container with synchronous subscribers.
//!
//! A `Model<S>` holds the latest published value (or nothing) and notifies every
//! subscriber on each replacement. Values are published as `Arc<S>` snapshots and
//! are never mutated after publication: updates clone, modify and replace.
//!
//! Subscribers are keyed by a monotonically increasing id in a `BTreeMap`, so
//! notification order is registration order.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle returned by [`Model::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<S> = Box<dyn FnMut(Option<&Arc<S>>)>;

pub struct Model<S> {
    state: Option<Arc<S>>,
    subscribers: BTreeMap<u64, Subscriber<S>>,
    next_id: u64,
    /// Number of publications so far. Exposed for diagnostics.
    emissions: u64,
}

impl<S> Model<S> {
    pub fn new(initial: Option<S>) -> Self {
        Self {
            state: initial.map(Arc::new),
            subscribers: BTreeMap::new(),
            next_id: 0,
            emissions: 0,
        }
    }

    /// Returns the latest published value.
    pub fn get_state(&self) -> Option<Arc<S>> {
        self.state.clone()
    }

    /// Replaces the value and notifies all subscribers in registration order.
    pub fn set_state(&mut self, state: Option<S>) {
        self.state = state.map(Arc::new);
        self.emissions += 1;
        let current = self.state.as_ref();
        for subscriber in self.subscribers.values_mut() {
            subscriber(current);
        }
    }

    /// Registers `subscriber` and immediately replays the current value to it.
    pub fn subscribe<F>(&mut self, mut subscriber: F) -> SubscriptionId
    where
        F: FnMut(Option<&Arc<S>>) + 'static,
    {
        subscriber(self.state.as_ref());
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.insert(id, Box::new(subscriber));
        SubscriptionId(id)
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id.0).is_some()
    }

    /// Subscribes to a projection of the state.
    ///
    /// `on_change` runs with the current projection on registration and afterwards
    /// only when the projected value differs from the previous one.
    pub fn select<T, P, C>(&mut self, project: P, mut on_change: C) -> SubscriptionId
    where
        T: PartialEq + 'static,
        P: Fn(Option<&S>) -> T + 'static,
        C: FnMut(&T) + 'static,
    {
        let mut last: Option<T> = None;
        self.subscribe(move |state| {
            let next = project(state.map(Arc::as_ref));
            if last.as_ref() != Some(&next) {
                on_change(&next);
                last = Some(next);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emissions(&self) -> u64 {
        self.emissions
    }
}

impl<S> Default for Model<S> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Model<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .field("emissions", &self.emissions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn subscribers_are_notified_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut model: Model<u32> = Model::default();
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            model.subscribe(move |s| log.borrow_mut().push((name, s.map(|v| **v))));
        }
        log.borrow_mut().clear();

        model.set_state(Some(7));
        assert_eq!(
            *log.borrow(),
            vec![("first", Some(7)), ("second", Some(7)), ("third", Some(7))]
        );
    }

    #[test]
    fn subscribe_replays_current_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model = Model::new(Some("a".to_owned()));
        let sink = Rc::clone(&seen);
        model.subscribe(move |s| sink.borrow_mut().push(s.map(|v| v.to_string())));
        assert_eq!(*seen.borrow(), vec![Some("a".to_owned())]);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut model: Model<u32> = Model::default();
        let sink = Rc::clone(&count);
        let id = model.subscribe(move |_| *sink.borrow_mut() += 1);
        model.set_state(Some(1));
        assert!(model.unsubscribe(id));
        model.set_state(Some(2));
        assert_eq!(*count.borrow(), 2, "replay plus one publication");
        assert!(!model.unsubscribe(id));
        assert_eq!(model.subscriber_count(), 0);
    }

    #[test]
    fn select_skips_unchanged_projections() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model: Model<(u32, &'static str)> = Model::default();
        let sink = Rc::clone(&seen);
        model.select(|s| s.map(|(n, _)| *n), move |n| sink.borrow_mut().push(*n));

        model.set_state(Some((1, "a")));
        model.set_state(Some((1, "b")));
        model.set_state(Some((2, "b")));
        model.set_state(None);

        assert_eq!(*seen.borrow(), vec![None, Some(1), Some(2), None]);
    }

    #[test]
    fn published_snapshots_are_shared() {
        let mut model = Model::new(Some(vec![1, 2, 3]));
        let before = model.get_state().unwrap();
        model.set_state(Some(vec![4]));
        assert_eq!(*before, vec![1, 2, 3]);
        assert_eq!(*model.get_state().unwrap(), vec![4]);
        assert_eq!(model.emissions(), 1);
    }
}
