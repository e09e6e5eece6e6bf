//! Domain models that mirror the JSON documents kept in each durable slot and
//! get passed throughout the TUI. These types stay light-weight data holders so
//! the store can focus on persistence and the UI on presentation. The serde
//! field names match what is already on disk, which is why they read `nome`,
//! `titulo` and friends instead of their English Rust names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A latitude/longitude fix attached to genres and facts. The store never
/// validates range or precision; whatever the location provider hands over is
/// kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Link to an OpenStreetMap view centred on this fix. The UI hands it to
    /// the system browser.
    pub fn map_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=15/{lat}/{lon}",
            lat = self.latitude,
            lon = self.longitude
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A music genre. `id` is a decimal integer rendered as text so it sorts and
/// compares the same way the stored documents do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    /// Display name, always stored trimmed.
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A short fact about a genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "conteudo")]
    pub content: String,
    /// Numeric id of the genre this fact talks about. Nothing checks that the
    /// genre actually exists; deleting a genre leaves its facts untouched.
    #[serde(rename = "generoId")]
    pub genre_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A registered user. Emails are free text; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Raw input for creating or editing a genre, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreDraft {
    pub name: String,
    pub location: Option<Location>,
}

/// Raw input for creating or editing a fact. `genre_id` and `location` are
/// optional: on create a missing genre falls back to the first genre, on edit
/// a missing value keeps whatever the fact already had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactDraft {
    pub title: String,
    pub content: String,
    pub genre_id: Option<i64>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_uses_stored_field_names() {
        let genre = Genre {
            id: "1".to_string(),
            name: "Jazz".to_string(),
            location: None,
        };
        let json = serde_json::to_string(&genre).unwrap();
        assert_eq!(json, r#"{"id":"1","nome":"Jazz"}"#);
    }

    #[test]
    fn fact_reads_documents_without_location() {
        let json = r#"{"id":"2","titulo":"A Nona","conteudo":"Beethoven","generoId":2}"#;
        let fact: Fact = serde_json::from_str(json).unwrap();
        assert_eq!(fact.genre_id, 2);
        assert_eq!(fact.title, "A Nona");
        assert!(fact.location.is_none());
    }

    #[test]
    fn location_display_rounds_to_four_places() {
        let location = Location::new(-23.550519, -46.633309);
        assert_eq!(location.to_string(), "-23.5505, -46.6333");
        assert!(location.map_url().contains("mlat=-23.550519"));
    }
}
