use chrono::Utc;

use crate::models::{User, UserDraft};

use super::collection::{CollectionStore, Outcome};
use super::entity::{require, Entity};
use super::error::{StoreError, ValidationError};

pub type UserStore = CollectionStore<User>;

impl Entity for User {
    type Draft = UserDraft;

    const KIND: &'static str = "users";
    const SLOT_KEY: &'static str = "@app_usuarios";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        Vec::new()
    }

    fn next_id(existing: &[Self]) -> String {
        timestamp_id(Utc::now().timestamp_millis(), existing)
    }

    fn validate(draft: &UserDraft) -> Result<(), ValidationError> {
        require(&draft.name, "Name")?;
        require(&draft.email, "Email")
    }

    fn build(id: String, draft: UserDraft) -> Self {
        User {
            id,
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
        }
    }

    fn apply(&mut self, draft: UserDraft) {
        self.name = draft.name.trim().to_string();
        self.email = draft.email.trim().to_string();
    }
}

/// Millisecond timestamp as text, bumped forward while it collides with an
/// existing id (two adds inside the same millisecond).
fn timestamp_id(now_millis: i64, existing: &[User]) -> String {
    let mut candidate = now_millis;
    while existing.iter().any(|user| user.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

impl UserStore {
    pub fn add_user(&mut self, name: &str, email: &str) -> Result<User, StoreError> {
        self.add(UserDraft {
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn update_user(
        &mut self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Outcome, StoreError> {
        self.update(
            id,
            UserDraft {
                name: name.to_string(),
                email: email.to_string(),
            },
        )
    }
}
