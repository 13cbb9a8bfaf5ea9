use std::fmt;

pub type SubscriptionId = usize;

type Listener<T> = Box<dyn FnMut(&T)>;

/// Value holder that notifies listeners synchronously on every change.
///
/// New subscribers are called immediately with the current value, so a late
/// subscriber never misses the latest state.
pub struct Observable<T> {
    value: T,
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.notify();
    }

    /// Mutate in place, then notify
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.value);
        self.notify();
        out
    }

    pub fn subscribe(&mut self, mut listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        listener(&self.value);
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.value);
        }
    }
}

impl<T: PartialEq> Observable<T> {
    /// Set and notify only when the value actually changes
    pub fn set_if_changed(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(&T) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn late_subscriber_gets_latest_value() {
        let mut obs = Observable::new(1);
        obs.set(2);
        obs.set(3);

        let (seen, listener) = recorder();
        obs.subscribe(listener);
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn every_set_is_delivered_in_order() {
        let mut obs = Observable::new(String::from("a"));
        let (seen, listener) = recorder();
        obs.subscribe(listener);

        obs.set("b".into());
        obs.update(|s| s.push('c'));

        assert_eq!(*seen.borrow(), vec!["a", "b", "bc"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut obs = Observable::new(0);
        let (seen, listener) = recorder();
        let id = obs.subscribe(listener);

        assert!(obs.unsubscribe(id));
        assert!(!obs.unsubscribe(id));
        obs.set(5);

        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn set_if_changed_skips_duplicates() {
        let mut obs = Observable::new(false);
        let (seen, listener) = recorder();
        obs.subscribe(listener);

        assert!(!obs.set_if_changed(false));
        assert!(obs.set_if_changed(true));

        assert_eq!(*seen.borrow(), vec![false, true]);
    }
}
