use crate::models::{Fact, FactDraft, Location};

use super::collection::{CollectionStore, Outcome};
use super::entity::{next_sequential_id, require, Entity};
use super::error::{StoreError, ValidationError};

pub type FactStore = CollectionStore<Fact>;

/// Genre assigned to a new fact when the caller does not pick one.
const DEFAULT_GENRE_ID: i64 = 1;

impl Entity for Fact {
    type Draft = FactDraft;

    const KIND: &'static str = "facts";
    const SLOT_KEY: &'static str = "@app_fatos";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        vec![
            Fact {
                id: "1".to_string(),
                title: "O Riff É A Base".to_string(),
                content: "O Heavy Metal é construído sobre o riff.".to_string(),
                genre_id: 1,
                location: None,
            },
            Fact {
                id: "2".to_string(),
                title: "A Nona Sinfonia".to_string(),
                content: "Um marco na obra de Beethoven.".to_string(),
                genre_id: 2,
                location: None,
            },
        ]
    }

    fn next_id(existing: &[Self]) -> String {
        next_sequential_id(existing)
    }

    fn validate(draft: &FactDraft) -> Result<(), ValidationError> {
        require(&draft.title, "Fact title")?;
        require(&draft.content, "Fact content")
    }

    fn build(id: String, draft: FactDraft) -> Self {
        Fact {
            id,
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            genre_id: draft.genre_id.unwrap_or(DEFAULT_GENRE_ID),
            location: draft.location,
        }
    }

    fn apply(&mut self, draft: FactDraft) {
        self.title = draft.title.trim().to_string();
        self.content = draft.content.trim().to_string();
        if let Some(genre_id) = draft.genre_id {
            self.genre_id = genre_id;
        }
        if draft.location.is_some() {
            self.location = draft.location;
        }
    }
}

impl FactStore {
    pub fn add_fact(
        &mut self,
        title: &str,
        content: &str,
        genre_id: Option<i64>,
        location: Option<Location>,
    ) -> Result<Fact, StoreError> {
        self.add(FactDraft {
            title: title.to_string(),
            content: content.to_string(),
            genre_id,
            location,
        })
    }

    pub fn update_fact(
        &mut self,
        id: &str,
        title: &str,
        content: &str,
        genre_id: Option<i64>,
        location: Option<Location>,
    ) -> Result<Outcome, StoreError> {
        self.update(
            id,
            FactDraft {
                title: title.to_string(),
                content: content.to_string(),
                genre_id,
                location,
            },
        )
    }

    /// Facts that point at `genre_id`, newest first.
    pub fn for_genre(&self, genre_id: i64) -> impl Iterator<Item = &Fact> {
        self.items()
            .iter()
            .filter(move |fact| fact.genre_id == genre_id)
    }
}
