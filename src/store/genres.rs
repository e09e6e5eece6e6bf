use crate::models::{Genre, GenreDraft, Location};

use super::collection::{CollectionStore, Outcome};
use super::entity::{next_sequential_id, require, Entity};
use super::error::{StoreError, ValidationError};

pub type GenreStore = CollectionStore<Genre>;

impl Entity for Genre {
    type Draft = GenreDraft;

    const KIND: &'static str = "genres";
    const SLOT_KEY: &'static str = "@app_generos";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        [(1, "Heavy Metal"), (2, "Música Clássica"), (3, "Jazz")]
            .into_iter()
            .map(|(id, name)| Genre {
                id: id.to_string(),
                name: name.to_string(),
                location: None,
            })
            .collect()
    }

    fn next_id(existing: &[Self]) -> String {
        next_sequential_id(existing)
    }

    fn validate(draft: &GenreDraft) -> Result<(), ValidationError> {
        require(&draft.name, "Genre name")
    }

    fn build(id: String, draft: GenreDraft) -> Self {
        Genre {
            id,
            name: draft.name.trim().to_string(),
            location: draft.location,
        }
    }

    fn apply(&mut self, draft: GenreDraft) {
        self.name = draft.name.trim().to_string();
        if draft.location.is_some() {
            self.location = draft.location;
        }
    }
}

impl GenreStore {
    pub fn add_genre(
        &mut self,
        name: &str,
        location: Option<Location>,
    ) -> Result<Genre, StoreError> {
        self.add(GenreDraft {
            name: name.to_string(),
            location,
        })
    }

    pub fn update_genre(
        &mut self,
        id: &str,
        name: &str,
        location: Option<Location>,
    ) -> Result<Outcome, StoreError> {
        self.update(
            id,
            GenreDraft {
                name: name.to_string(),
                location,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::db::MemorySlots;
    use crate::store::WritePolicy;

    fn loaded_with(json: &str) -> (Rc<MemorySlots>, GenreStore) {
        let slots = Rc::new(MemorySlots::new().with_value(Genre::SLOT_KEY, json));
        let mut store = GenreStore::new(slots.clone(), WritePolicy::default());
        store.load().unwrap();
        (slots, store)
    }

    #[test]
    fn first_genre_in_empty_collection_gets_id_one() {
        let (_, mut store) = loaded_with("[]");
        store.add_genre("  Heavy Metal ", None).unwrap();

        assert_eq!(
            store.items(),
            &[Genre {
                id: "1".to_string(),
                name: "Heavy Metal".to_string(),
                location: None,
            }]
        );
    }

    #[test]
    fn new_genre_goes_first_with_max_plus_one() {
        let (_, mut store) = loaded_with(r#"[{"id":"1","nome":"Jazz"}]"#);
        store.add_genre("Rock", None).unwrap();

        let ids: Vec<_> = store.items().iter().map(|g| g.id.as_str()).collect();
        let names: Vec<_> = store.items().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(names, ["Rock", "Jazz"]);
    }

    #[test]
    fn ids_skip_past_gaps_and_ignore_non_numeric_ids() {
        let (_, mut store) =
            loaded_with(r#"[{"id":"abc","nome":"A"},{"id":"9","nome":"B"},{"id":"4","nome":"C"}]"#);
        let genre = store.add_genre("D", None).unwrap();
        assert_eq!(genre.id, "10");
    }

    #[test]
    fn update_keeps_location_when_none_is_supplied() {
        let (_, mut store) = loaded_with("[]");
        let here = Location::new(-8.05, -34.9);
        let genre = store.add_genre("Frevo", Some(here)).unwrap();

        let outcome = store.update_genre(&genre.id, " Frevo de Rua ", None).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        let stored = store.get(&genre.id).unwrap();
        assert_eq!(stored.name, "Frevo de Rua");
        assert_eq!(stored.location, Some(here));
        assert_eq!(stored.id, genre.id);
    }

    #[test]
    fn update_replaces_location_when_supplied() {
        let (_, mut store) = loaded_with("[]");
        let genre = store.add_genre("Frevo", None).unwrap();
        let there = Location::new(1.0, 2.0);

        store.update_genre(&genre.id, "Frevo", Some(there)).unwrap();
        assert_eq!(store.get(&genre.id).unwrap().location, Some(there));
    }
}
