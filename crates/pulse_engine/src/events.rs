//! Typed event channels
//!
//! Every notification in the engine flows through a [`Channel`]: a closed,
//! single-threaded publish/subscribe channel carrying one payload type.
//! Scopes that emit several kinds of events (engine, scene, entity) group one
//! channel per event name into a plain struct with public fields, so each
//! event keeps its own payload type at compile time.
//!
//! Dispatch is synchronous and runs listeners in registration order. Emitting
//! on a channel with no listeners is a no-op, as is removing a listener that
//! was already removed.

use std::cell::RefCell;
use std::rc::Rc;

/// Identity of a single listener registration.
///
/// Returned by [`Channel::on`] and consumed by [`Channel::off`]. Handles are
/// unique per channel and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

type Listener<P> = Rc<RefCell<dyn FnMut(&P)>>;

struct ChannelInner<P> {
    listeners: Vec<(ListenerHandle, Listener<P>)>,
    next_id: u64,
}

/// A typed publish/subscribe channel.
///
/// Clones share the same listener set; scopes hand out clones so listeners
/// can be registered without borrowing the owning object. Listeners may add
/// or remove *other* registrations on the same channel from inside an
/// emission: removals take effect immediately (the removed listener is
/// skipped for the rest of that emission) and additions are first invoked on
/// the next emission. A listener must not re-enter itself.
pub struct Channel<P> {
    inner: Rc<RefCell<ChannelInner<P>>>,
}

impl<P> Clone for Channel<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> Default for Channel<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Channel<P> {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChannelInner {
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a listener, returning its handle.
    ///
    /// Listeners run in registration order on every subsequent emission.
    pub fn on(&self, listener: impl FnMut(&P) + 'static) -> ListenerHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = ListenerHandle(inner.next_id);
        inner.next_id += 1;
        inner
            .listeners
            .push((handle, Rc::new(RefCell::new(listener))));
        handle
    }

    /// Remove a listener by handle.
    ///
    /// Returns `false` when the handle is unknown or already removed; that is
    /// not an error.
    pub fn off(&self, handle: ListenerHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(h, _)| *h != handle);
        inner.listeners.len() != before
    }

    /// Invoke every registered listener with `payload`, in registration order.
    pub fn emit(&self, payload: &P) {
        // Snapshot so listeners can mutate the registration list mid-dispatch.
        let snapshot: Vec<(ListenerHandle, Listener<P>)> =
            self.inner.borrow().listeners.to_vec();

        for (handle, listener) in snapshot {
            let still_registered = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(h, _)| *h == handle);
            if still_registered {
                (listener.borrow_mut())(payload);
            }
        }
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Whether the channel has no listeners.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_runs_listeners_in_registration_order() {
        let channel: Channel<i32> = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen);
        channel.on(move |v| a.borrow_mut().push(("a", *v)));
        let b = Rc::clone(&seen);
        channel.on(move |v| b.borrow_mut().push(("b", *v)));

        channel.emit(&7);

        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn off_removes_only_the_named_registration() {
        let channel: Channel<()> = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen);
        let first = channel.on(move |()| a.borrow_mut().push("first"));
        let b = Rc::clone(&seen);
        channel.on(move |()| b.borrow_mut().push("second"));

        assert!(channel.off(first));
        assert!(!channel.off(first));
        channel.emit(&());

        assert_eq!(*seen.borrow(), vec!["second"]);
    }

    #[test]
    fn emit_without_listeners_is_a_noop() {
        let channel: Channel<String> = Channel::new();
        channel.emit(&"nobody home".to_string());
    }

    #[test]
    fn listener_removed_during_emission_is_skipped() {
        let channel: Channel<()> = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        // The first listener removes the second before it runs.
        let chan = channel.clone();
        let handle_slot: Rc<RefCell<Option<ListenerHandle>>> =
            Rc::new(RefCell::new(None));
        let slot = Rc::clone(&handle_slot);
        let a = Rc::clone(&seen);
        channel.on(move |()| {
            a.borrow_mut().push("first");
            if let Some(handle) = *slot.borrow() {
                chan.off(handle);
            }
        });
        let b = Rc::clone(&seen);
        let second = channel.on(move |()| b.borrow_mut().push("second"));
        *handle_slot.borrow_mut() = Some(second);

        channel.emit(&());

        assert_eq!(*seen.borrow(), vec!["first"]);
    }

    #[test]
    fn clear_removes_everything() {
        let channel: Channel<()> = Channel::new();
        channel.on(|()| {});
        channel.on(|()| {});
        assert_eq!(channel.len(), 2);

        channel.clear();

        assert!(channel.is_empty());
        channel.emit(&());
    }
}
