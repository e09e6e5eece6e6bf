use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::db::{SlotError, SlotStore};

use super::entity::Entity;
use super::error::{StoreError, ValidationError};

/// How a mutation orders the in-memory swap against the durable write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Publish the new list first, then write it. A failed write leaves memory
    /// ahead of disk until the next successful write or a restart.
    Optimistic,
    /// Write first and only publish the new list once the write succeeded. A
    /// failed write leaves both memory and disk on the previous list.
    #[default]
    DurableFirst,
}

/// What `load` found in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The slot held a list with this many entries.
    Restored(usize),
    /// The slot was empty and the built-in list was written.
    Seeded(usize),
}

/// Result of an update or delete. Unknown ids and invalid edits are not errors,
/// but callers can still tell them apart from a real change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NoMatch,
    Rejected(ValidationError),
}

impl Outcome {
    pub fn matched(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// An ordered, newest-first list of one entity kind paired with its durable
/// slot. Every successful mutation rewrites the whole slot.
pub struct CollectionStore<E: Entity> {
    slots: Rc<dyn SlotStore>,
    policy: WritePolicy,
    items: Vec<E>,
    loaded: bool,
}

impl<E: Entity> CollectionStore<E> {
    /// Create an uninitialized store. Nothing is read until `load` runs.
    pub fn new(slots: Rc<dyn SlotStore>, policy: WritePolicy) -> Self {
        Self {
            slots,
            policy,
            items: Vec::new(),
            loaded: false,
        }
    }

    /// Read the slot into memory, seeding it with the built-in list when it has
    /// never been written. On a read or decode failure the current list is left
    /// exactly as it was.
    pub fn load(&mut self) -> Result<LoadOutcome, StoreError> {
        let stored = self.slots.get(E::SLOT_KEY).map_err(|source| {
            error!(key = E::SLOT_KEY, %source, "failed to read slot");
            StoreError::Read {
                key: E::SLOT_KEY,
                source,
            }
        })?;

        match stored {
            Some(text) => {
                let items: Vec<E> = serde_json::from_str(&text).map_err(|source| {
                    error!(key = E::SLOT_KEY, %source, "failed to decode slot");
                    StoreError::Decode {
                        key: E::SLOT_KEY,
                        source,
                    }
                })?;
                let count = items.len();
                self.items = items;
                self.loaded = true;
                info!(key = E::SLOT_KEY, count, "restored {}", E::KIND);
                Ok(LoadOutcome::Restored(count))
            }
            None => {
                let seed = E::seed();
                let count = seed.len();
                self.commit(seed)?;
                info!(key = E::SLOT_KEY, count, "seeded {}", E::KIND);
                Ok(LoadOutcome::Seeded(count))
            }
        }
    }

    /// Validate, assign an id, prepend, persist. Returns the stored record.
    pub fn add(&mut self, draft: E::Draft) -> Result<E, StoreError> {
        if let Err(err) = E::validate(&draft) {
            warn!(kind = E::KIND, %err, "rejected new entry");
            return Err(err.into());
        }

        let item = E::build(E::next_id(&self.items), draft);
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(item.clone());
        next.extend(self.items.iter().cloned());

        self.commit(next)?;
        Ok(item)
    }

    /// Replace the mutable fields of the record with `id`. Invalid drafts and
    /// unknown ids leave the collection untouched and skip the write.
    pub fn update(&mut self, id: &str, draft: E::Draft) -> Result<Outcome, StoreError> {
        if let Err(err) = E::validate(&draft) {
            warn!(kind = E::KIND, id, %err, "ignored invalid update");
            return Ok(Outcome::Rejected(err));
        }

        let Some(position) = self.position(id) else {
            warn!(kind = E::KIND, id, "update for unknown id");
            return Ok(Outcome::NoMatch);
        };

        let mut next = self.items.clone();
        next[position].apply(draft);

        self.commit(next)?;
        Ok(Outcome::Applied)
    }

    /// Remove the record with `id`. Deleting an unknown id is a no-op.
    pub fn delete(&mut self, id: &str) -> Result<Outcome, StoreError> {
        if self.position(id).is_none() {
            warn!(kind = E::KIND, id, "delete for unknown id");
            return Ok(Outcome::NoMatch);
        }

        let next: Vec<E> = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();

        self.commit(next)?;
        Ok(Outcome::Applied)
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a `load` (or a mutation) has populated the list yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Make `next` the current list and write it in full, in the order the
    /// write policy dictates.
    fn commit(&mut self, next: Vec<E>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&next).map_err(|source| StoreError::Encode {
            key: E::SLOT_KEY,
            source,
        })?;
        let count = next.len();

        match self.policy {
            WritePolicy::Optimistic => {
                self.items = next;
                self.loaded = true;
                self.write(&encoded)?;
            }
            WritePolicy::DurableFirst => {
                self.write(&encoded)?;
                self.items = next;
                self.loaded = true;
            }
        }

        debug!(key = E::SLOT_KEY, count, "persisted {}", E::KIND);
        Ok(())
    }

    fn write(&self, encoded: &str) -> Result<(), StoreError> {
        self.slots.set(E::SLOT_KEY, encoded).map_err(|source: SlotError| {
            error!(key = E::SLOT_KEY, %source, "failed to write slot");
            StoreError::Write {
                key: E::SLOT_KEY,
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySlots;
    use crate::models::{Genre, GenreDraft, User, UserDraft};

    fn genre_draft(name: &str) -> GenreDraft {
        GenreDraft {
            name: name.to_string(),
            location: None,
        }
    }

    fn store_with(slots: &Rc<MemorySlots>, policy: WritePolicy) -> CollectionStore<Genre> {
        CollectionStore::new(slots.clone(), policy)
    }

    #[test]
    fn new_store_is_uninitialized_and_empty() {
        let slots = Rc::new(MemorySlots::new());
        let store = store_with(&slots, WritePolicy::default());
        assert!(!store.is_loaded());
        assert!(store.is_empty());
    }

    #[test]
    fn load_seeds_and_writes_when_slot_is_empty() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::default());

        assert_eq!(store.load().unwrap(), LoadOutcome::Seeded(3));
        assert!(store.is_loaded());
        let raw = slots.raw("@app_generos").unwrap();
        let written: Vec<Genre> = serde_json::from_str(&raw).unwrap();
        assert_eq!(written, store.items());
    }

    #[test]
    fn load_restores_verbatim_and_ignores_unknown_fields() {
        let slots = Rc::new(
            MemorySlots::new()
                .with_value("@app_generos", r#"[{"id":"7","nome":"Samba","extra":true}]"#),
        );
        let mut store = store_with(&slots, WritePolicy::default());

        assert_eq!(store.load().unwrap(), LoadOutcome::Restored(1));
        assert_eq!(store.items()[0].name, "Samba");
    }

    #[test]
    fn failed_read_keeps_previous_list() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::default());
        store.load().unwrap();

        slots.fail_reads(true);
        assert!(matches!(store.load(), Err(StoreError::Read { .. })));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn malformed_slot_reports_decode_error() {
        let slots = Rc::new(MemorySlots::new().with_value("@app_generos", "{not json"));
        let mut store = store_with(&slots, WritePolicy::default());

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert!(err.is_storage());
        assert!(!store.is_loaded());
        assert!(store.is_empty());
    }

    #[test]
    fn add_rejects_blank_required_field() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::default());

        let err = store.add(genre_draft("   ")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::Required(_))
        ));
        assert!(store.is_empty());
        assert!(slots.raw("@app_generos").is_none());
    }

    #[test]
    fn update_with_invalid_draft_is_rejected_without_write() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::default());
        store.load().unwrap();
        let before = slots.raw("@app_generos");

        let outcome = store.update("1", genre_draft("")).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(!outcome.matched());
        assert_eq!(slots.raw("@app_generos"), before);
    }

    #[test]
    fn optimistic_write_failure_diverges_until_reload() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::Optimistic);
        store.load().unwrap();

        slots.fail_writes(true);
        let err = store.add(genre_draft("Forró")).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.len(), 4);
        assert_eq!(store.items()[0].name, "Forró");

        slots.fail_writes(false);
        let mut restarted = store_with(&slots, WritePolicy::Optimistic);
        restarted.load().unwrap();
        assert_eq!(restarted.len(), 3);
    }

    #[test]
    fn durable_first_write_failure_leaves_memory_untouched() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::DurableFirst);
        store.load().unwrap();

        slots.fail_writes(true);
        assert!(store.add(genre_draft("Forró")).is_err());
        assert_eq!(store.len(), 3);
        assert!(store.delete("1").is_err());
        assert!(store.get("1").is_some());
    }

    #[test]
    fn next_mutation_after_optimistic_failure_heals_the_slot() {
        let slots = Rc::new(MemorySlots::new());
        let mut store = store_with(&slots, WritePolicy::Optimistic);
        store.load().unwrap();

        slots.fail_writes(true);
        let _ = store.add(genre_draft("Forró"));
        slots.fail_writes(false);
        store.add(genre_draft("Axé")).unwrap();

        let mut restarted = store_with(&slots, WritePolicy::Optimistic);
        restarted.load().unwrap();
        assert_eq!(restarted.items(), store.items());
    }

    #[test]
    fn users_start_empty_on_first_load() {
        let slots = Rc::new(MemorySlots::new());
        let mut store: CollectionStore<User> =
            CollectionStore::new(slots.clone(), WritePolicy::default());

        assert_eq!(store.load().unwrap(), LoadOutcome::Seeded(0));
        assert_eq!(slots.raw("@app_usuarios").as_deref(), Some("[]"));

        store
            .add(UserDraft {
                name: " Ana ".to_string(),
                email: " ana@example.com ".to_string(),
            })
            .unwrap();
        assert_eq!(store.items()[0].email, "ana@example.com");
    }
}
