use anyhow::{Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Fact, FactDraft, Genre, GenreDraft, Location, User, UserDraft};

use super::app::Tab;

/// One editable text field inside a modal form.
#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    required: bool,
    digits_only: bool,
}

impl FormField {
    fn required(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            required: true,
            digits_only: false,
        }
    }

    fn numeric(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            required: false,
            digits_only: true,
        }
    }
}

/// Form state shared by the create and edit dialogs of every tab. Which
/// fields exist depends on the tab the form was opened from.
#[derive(Clone)]
pub(crate) struct EntryForm {
    pub(crate) tab: Tab,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl EntryForm {
    /// Blank form for creating an entry on `tab`.
    pub(crate) fn blank(tab: Tab) -> Self {
        let fields = match tab {
            Tab::Genres => vec![FormField::required("Name", "")],
            Tab::Facts => vec![
                FormField::required("Title", ""),
                FormField::required("Content", ""),
                FormField::numeric("Genre id", ""),
            ],
            Tab::Users => vec![
                FormField::required("Name", ""),
                FormField::required("Email", ""),
            ],
        };
        Self::with_fields(tab, fields)
    }

    pub(crate) fn from_genre(genre: &Genre) -> Self {
        Self::with_fields(Tab::Genres, vec![FormField::required("Name", &genre.name)])
    }

    pub(crate) fn from_fact(fact: &Fact) -> Self {
        Self::with_fields(
            Tab::Facts,
            vec![
                FormField::required("Title", &fact.title),
                FormField::required("Content", &fact.content),
                FormField::numeric("Genre id", &fact.genre_id.to_string()),
            ],
        )
    }

    pub(crate) fn from_user(user: &User) -> Self {
        Self::with_fields(
            Tab::Users,
            vec![
                FormField::required("Name", &user.name),
                FormField::required("Email", &user.email),
            ],
        )
    }

    fn with_fields(tab: Tab, fields: Vec<FormField>) -> Self {
        Self {
            tab,
            fields,
            active: 0,
            error: None,
        }
    }

    /// Move focus to the next field, wrapping around.
    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field, rejecting input the field does
    /// not accept.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = &mut self.fields[self.active];
        if ch.is_control() || (field.digits_only && !ch.is_ascii_digit()) {
            return false;
        }
        field.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.fields[self.active].value.pop();
    }

    fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }

    /// Raw genre input. Blank names are left for the store to reject.
    pub(crate) fn genre_draft(&self, location: Option<Location>) -> GenreDraft {
        GenreDraft {
            name: self.value(0).to_string(),
            location,
        }
    }

    /// Raw fact input. An empty genre id means "not chosen".
    pub(crate) fn fact_draft(&self, location: Option<Location>) -> Result<FactDraft> {
        let genre_raw = self.value(2).trim();
        let genre_id = if genre_raw.is_empty() {
            None
        } else {
            Some(
                genre_raw
                    .parse::<i64>()
                    .context("Genre id must be an integer.")?,
            )
        };
        Ok(FactDraft {
            title: self.value(0).to_string(),
            content: self.value(1).to_string(),
            genre_id,
            location,
        })
    }

    pub(crate) fn user_draft(&self) -> UserDraft {
        UserDraft {
            name: self.value(0).to_string(),
            email: self.value(1).to_string(),
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset for the active field, counted from the left edge.
    pub(crate) fn cursor_offset(&self) -> usize {
        let field = &self.fields[self.active];
        field.label.chars().count() + 2 + field.value.chars().count()
    }
}

/// State for confirming the removal of an entry.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) tab: Tab,
    pub(crate) id: String,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut EntryForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn genre_id_field_only_accepts_digits() {
        let mut form = EntryForm::blank(Tab::Facts);
        form.next_field();
        form.next_field();
        assert!(!form.push_char('x'));
        assert!(form.push_char('4'));
        assert_eq!(form.fields[2].value, "4");
    }

    #[test]
    fn fact_draft_leaves_blank_genre_unset() {
        let mut form = EntryForm::blank(Tab::Facts);
        type_into(&mut form, "Riff");
        form.next_field();
        type_into(&mut form, "Heavy");

        let draft = form.fact_draft(None).unwrap();
        assert_eq!(draft.title, "Riff");
        assert_eq!(draft.content, "Heavy");
        assert_eq!(draft.genre_id, None);
    }

    #[test]
    fn edit_form_round_trips_existing_values() {
        let fact = Fact {
            id: "3".to_string(),
            title: "Bebop".to_string(),
            content: "Fast".to_string(),
            genre_id: 3,
            location: None,
        };
        let draft = EntryForm::from_fact(&fact).fact_draft(None).unwrap();
        assert_eq!(draft.genre_id, Some(3));
        assert_eq!(draft.title, "Bebop");
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = EntryForm::blank(Tab::Users);
        form.previous_field();
        assert_eq!(form.active, 1);
        form.next_field();
        assert_eq!(form.active, 0);
        form.backspace();
        assert!(form.user_draft().name.is_empty());
    }
}
