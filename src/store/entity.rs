use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ValidationError;

/// Describes one kind of record a `CollectionStore` can hold.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// User-supplied fields for add and update.
    type Draft;

    /// Human label used in logs and status messages.
    const KIND: &'static str;
    /// Durable slot key holding the serialized list.
    const SLOT_KEY: &'static str;

    fn id(&self) -> &str;

    /// Built-in list written on first start.
    fn seed() -> Vec<Self>;

    /// Identifier for a record about to be prepended to `existing`.
    fn next_id(existing: &[Self]) -> String;

    fn validate(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// Construct a new record from a validated draft, trimming text fields.
    fn build(id: String, draft: Self::Draft) -> Self;

    /// Overwrite mutable fields from a validated draft. Optional fields left
    /// empty in the draft keep their previous value.
    fn apply(&mut self, draft: Self::Draft);
}

/// `1 + max` over the ids that parse as integers, starting from zero.
pub(crate) fn next_sequential_id<E: Entity>(existing: &[E]) -> String {
    let max = existing
        .iter()
        .filter_map(|item| item.id().trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    max.saturating_add(1).to_string()
}

pub(crate) fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}
