use std::rc::Rc;

use tracing::warn;

use crate::db::SlotStore;

use super::collection::WritePolicy;
use super::error::StoreError;
use super::facts::FactStore;
use super::genres::GenreStore;
use super::users::UserStore;

/// The three stores the application works with, sharing one slot backend.
pub struct Collections {
    pub genres: GenreStore,
    pub facts: FactStore,
    pub users: UserStore,
}

impl Collections {
    pub fn new(slots: Rc<dyn SlotStore>, policy: WritePolicy) -> Self {
        Self {
            genres: GenreStore::new(Rc::clone(&slots), policy),
            facts: FactStore::new(Rc::clone(&slots), policy),
            users: UserStore::new(slots, policy),
        }
    }

    /// Load every store. A failing store keeps its previous list and its error
    /// is returned, while the others still load.
    pub fn load_all(&mut self) -> Vec<StoreError> {
        let results = [
            self.genres.load().map(|_| ()),
            self.facts.load().map(|_| ()),
            self.users.load().map(|_| ()),
        ];

        results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|err| warn!(%err, "collection failed to load"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySlots;

    #[test]
    fn one_corrupt_slot_does_not_block_the_others() {
        let slots = Rc::new(MemorySlots::new().with_value("@app_fatos", "oops"));
        let mut collections = Collections::new(slots, WritePolicy::default());

        let failures = collections.load_all();

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], StoreError::Decode { key: "@app_fatos", .. }));
        assert_eq!(collections.genres.len(), 3);
        assert!(collections.users.is_loaded());
        assert!(!collections.facts.is_loaded());
    }
}
