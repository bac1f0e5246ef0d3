use parking_lot::RwLock;
use wsrep_store::View;

/// The latest view delivered by the provider, under its own lock.
///
/// Never nested inside the Store's lock: the view callback copies the view
/// here after (not while) calling `Store::update_membership`.
#[derive(Default)]
pub struct ViewCache {
    current: RwLock<Option<View>>,
}

impl ViewCache {
    /// An empty cache, as if no view has ever been delivered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the cached view.
    pub fn replace(&self, view: View) {
        *self.current.write() = Some(view);
    }

    /// A clone of the current view, if any has been delivered yet.
    #[must_use]
    pub fn current(&self) -> Option<View> {
        self.current.read().clone()
    }
}
