//! Request/result correlation.
//!
//! Callers that file results into an ordered collection attach a move
//! index at submission time. The index is parked here keyed by the opaque
//! request id and stamped onto the result when it resolves — a
//! later-submitted, earlier-resolved request can never clobber an
//! earlier-submitted, later-resolved one, because arrival order is never
//! consulted.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct CorrelationMap {
    inner: Mutex<HashMap<String, i64>>,
}

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a move index for a request id. Requests without an index
    /// park nothing.
    pub fn insert(&self, id: &str, move_index: Option<i64>) {
        if let Some(index) = move_index {
            self.inner
                .lock()
                .expect("correlation lock")
                .insert(id.to_string(), index);
        }
    }

    /// Claim and remove the parked index for a resolving request.
    pub fn take(&self, id: &str) -> Option<i64> {
        self.inner.lock().expect("correlation lock").remove(id)
    }

    /// Discard all parked correlations (queue teardown).
    pub fn clear(&self) {
        self.inner.lock().expect("correlation lock").clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("correlation lock").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_on_id_not_arrival_order() {
        let map = CorrelationMap::new();
        map.insert("first", Some(3));
        map.insert("second", Some(7));

        // The later submission resolves first and takes only its own index.
        assert_eq!(map.take("second"), Some(7));
        assert_eq!(map.take("first"), Some(3));
        assert_eq!(map.take("first"), None);
    }

    #[test]
    fn absent_index_parks_nothing() {
        let map = CorrelationMap::new();
        map.insert("r1", None);
        assert_eq!(map.len(), 0);
        assert_eq!(map.take("r1"), None);
    }

    #[test]
    fn clear_discards_everything() {
        let map = CorrelationMap::new();
        map.insert("r1", Some(1));
        map.insert("r2", Some(2));
        map.clear();
        assert_eq!(map.len(), 0);
    }
}
