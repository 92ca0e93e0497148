//! Ordered listener registry shared by the stores.

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listeners fire in registration order.
pub struct Subscribers<L: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<L>)>,
}

impl<L: ?Sized> Subscribers<L> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: Box<L>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns false if the id was not registered.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<L>> {
        self.entries.iter_mut().map(|(_, listener)| listener)
    }
}

impl<L: ?Sized> Default for Subscribers<L> {
    fn default() -> Self {
        Self::new()
    }
}
