use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::location::LocationProvider;
use crate::models::Location;
use crate::store::{Collections, Outcome, StoreError};

use super::forms::{ConfirmDelete, EntryForm};
use super::helpers::{centered_rect, describe_chain, location_label, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the tab strip at the top of the screen.
const TABS_HEIGHT: u16 = 3;

/// The three collections, one per tab.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Tab {
    Genres,
    Facts,
    Users,
}

impl Tab {
    pub(crate) const ALL: [Tab; 3] = [Tab::Genres, Tab::Facts, Tab::Users];

    fn index(self) -> usize {
        match self {
            Tab::Genres => 0,
            Tab::Facts => 1,
            Tab::Users => 2,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Tab::Genres => "Genres",
            Tab::Facts => "Facts",
            Tab::Users => "Users",
        }
    }

    /// Singular noun used in status messages and dialog titles.
    fn noun(self) -> &'static str {
        match self {
            Tab::Genres => "Genre",
            Tab::Facts => "Fact",
            Tab::Users => "User",
        }
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn previous(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    /// Only genres and facts carry a location.
    fn takes_location(self) -> bool {
        !matches!(self, Tab::Users)
    }
}

/// Modal states layered over the tab view.
enum Mode {
    Normal,
    Creating(EntryForm),
    Editing { id: String, form: EntryForm },
    ConfirmDelete(ConfirmDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI: the three stores, the
/// location source used by "save with GPS", and what is on screen.
pub struct App {
    collections: Collections,
    locator: Box<dyn LocationProvider>,
    tab: Tab,
    /// Selected row per tab, indexed by `Tab::index`.
    selected: [usize; 3],
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Wrap already-loaded collections. Load failures are reported separately
    /// through `report_load_failures`.
    pub fn new(collections: Collections, locator: Box<dyn LocationProvider>) -> Self {
        Self {
            collections,
            locator,
            tab: Tab::Genres,
            selected: [0; 3],
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Surface startup load errors in the footer.
    pub fn report_load_failures(&mut self, failures: &[StoreError]) {
        if failures.is_empty() {
            return;
        }
        let text = failures
            .iter()
            .map(|err| describe_chain(err))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_status(text, StatusKind::Error);
    }

    /// Top-level key dispatcher. Every key goes through the active `Mode`,
    /// which returns the next mode to run. The boolean result tells the outer
    /// loop whether the user requested an exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Creating(form) => self.handle_form(code, None, form),
            Mode::Editing { id, form } => self.handle_form(code, Some(id), form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    /// Ctrl+G inside a genre or fact form saves it tagged with the current
    /// location fix.
    pub(crate) fn handle_ctrl_g(&mut self) -> Result<()> {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Creating(form) if form.tab.takes_location() => {
                self.submit_with_location(None, form)
            }
            Mode::Editing { id, form } if form.tab.takes_location() => {
                self.submit_with_location(Some(id), form)
            }
            other => other,
        };
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.previous()),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected[self.tab.index()] = 0,
            KeyCode::End => {
                self.selected[self.tab.index()] = self.current_len().saturating_sub(1);
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Creating(EntryForm::blank(self.tab)));
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some((id, form)) = self.selected_form() {
                    self.clear_status();
                    return Ok(Mode::Editing { id, form });
                }
                let message = format!("No {} selected to edit.", self.tab.noun().to_lowercase());
                self.set_status(message, StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Char('d') => {
                if let Some(confirm) = self.selected_confirm() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                let message = format!(
                    "No {} selected to remove.",
                    self.tab.noun().to_lowercase()
                );
                self.set_status(message, StatusKind::Error);
            }
            KeyCode::Char('m') | KeyCode::Char('M') => self.open_selected_map(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form(&mut self, code: KeyCode, target: Option<String>, mut form: EntryForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Changes discarded.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => return self.finish_form(target, form, None),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        reopen(target, form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(message) => self.set_status(message, StatusKind::Info),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                self.clamp_selection();
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn submit_with_location(&mut self, target: Option<String>, form: EntryForm) -> Mode {
        let location = self.locator.locate();
        if location.is_none() {
            warn!("no location fix available, saving without one");
        }
        let mode = self.finish_form(target, form, location);
        if location.is_none() {
            if let Some(status) = self.status.as_mut().filter(|s| s.kind == StatusKind::Info) {
                status.text.push_str(" No location fix; saved without GPS.");
            }
        }
        mode
    }

    /// Run the store call behind a form. Input problems keep the form open
    /// with the message inline; storage failures close it since retrying the
    /// same keystrokes will not help.
    fn finish_form(
        &mut self,
        target: Option<String>,
        mut form: EntryForm,
        location: Option<Location>,
    ) -> Mode {
        match self.submit(target.as_deref(), &form, location) {
            Ok(message) => {
                self.set_status(message, StatusKind::Info);
                self.clamp_selection();
                Mode::Normal
            }
            Err(err) => {
                let message = surface_error(&err);
                self.set_status(message.clone(), StatusKind::Error);
                let storage = err
                    .downcast_ref::<StoreError>()
                    .is_some_and(StoreError::is_storage);
                if storage {
                    self.clamp_selection();
                    Mode::Normal
                } else {
                    form.error = Some(message);
                    reopen(target, form)
                }
            }
        }
    }

    fn submit(
        &mut self,
        target: Option<&str>,
        form: &EntryForm,
        location: Option<Location>,
    ) -> Result<String> {
        let noun = form.tab.noun();
        let message = match (form.tab, target) {
            (Tab::Genres, None) => {
                let genre = self.collections.genres.add(form.genre_draft(location))?;
                format!("{noun} \"{}\" added.", genre.name)
            }
            (Tab::Genres, Some(id)) => {
                let outcome = self
                    .collections
                    .genres
                    .update(id, form.genre_draft(location))?;
                describe_update(outcome, noun)?
            }
            (Tab::Facts, None) => {
                let fact = self.collections.facts.add(form.fact_draft(location)?)?;
                format!("{noun} \"{}\" added.", fact.title)
            }
            (Tab::Facts, Some(id)) => {
                let outcome = self
                    .collections
                    .facts
                    .update(id, form.fact_draft(location)?)?;
                describe_update(outcome, noun)?
            }
            (Tab::Users, None) => {
                let user = self.collections.users.add(form.user_draft())?;
                format!("{noun} \"{}\" created.", user.name)
            }
            (Tab::Users, Some(id)) => {
                let outcome = self.collections.users.update(id, form.user_draft())?;
                describe_update(outcome, noun)?
            }
        };

        if target.is_none() {
            self.selected[form.tab.index()] = 0;
        }
        info!(tab = form.tab.title(), "{message}");
        Ok(message)
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<String> {
        let outcome = match confirm.tab {
            Tab::Genres => self.collections.genres.delete(&confirm.id)?,
            Tab::Facts => self.collections.facts.delete(&confirm.id)?,
            Tab::Users => self.collections.users.delete(&confirm.id)?,
        };
        let noun = confirm.tab.noun();
        Ok(match outcome {
            Outcome::Applied => format!("{noun} \"{}\" deleted.", confirm.label),
            _ => format!("{noun} \"{}\" was already gone.", confirm.label),
        })
    }

    /// Re-read every slot from disk, discarding anything only held in memory.
    fn reload(&mut self) {
        let failures = self.collections.load_all();
        self.clamp_selection();
        if failures.is_empty() {
            self.set_status("Collections reloaded.", StatusKind::Info);
        } else {
            self.report_load_failures(&failures);
        }
    }

    fn open_selected_map(&mut self) {
        let Some(location) = self.selected_location() else {
            self.set_status("Selected entry has no location.", StatusKind::Error);
            return;
        };
        match open_link(location.map_url()) {
            Ok(()) => self.set_status(format!("Opened map at {location}."), StatusKind::Info),
            Err(err) => self.set_status(
                format!("Could not open map: {err}"),
                StatusKind::Error,
            ),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.clear_status();
        self.clamp_selection();
    }

    fn len_of(&self, tab: Tab) -> usize {
        match tab {
            Tab::Genres => self.collections.genres.len(),
            Tab::Facts => self.collections.facts.len(),
            Tab::Users => self.collections.users.len(),
        }
    }

    fn current_len(&self) -> usize {
        self.len_of(self.tab)
    }

    fn selected_index(&self) -> Option<usize> {
        let index = self.selected[self.tab.index()];
        (index < self.current_len()).then_some(index)
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let current = self.selected[self.tab.index()] as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected[self.tab.index()] = next as usize;
    }

    /// Keep every tab's selection inside its list after the list changed.
    fn clamp_selection(&mut self) {
        for tab in Tab::ALL {
            let len = self.len_of(tab);
            let slot = &mut self.selected[tab.index()];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    fn selected_form(&self) -> Option<(String, EntryForm)> {
        let index = self.selected_index()?;
        Some(match self.tab {
            Tab::Genres => {
                let genre = &self.collections.genres.items()[index];
                (genre.id.clone(), EntryForm::from_genre(genre))
            }
            Tab::Facts => {
                let fact = &self.collections.facts.items()[index];
                (fact.id.clone(), EntryForm::from_fact(fact))
            }
            Tab::Users => {
                let user = &self.collections.users.items()[index];
                (user.id.clone(), EntryForm::from_user(user))
            }
        })
    }

    fn selected_confirm(&self) -> Option<ConfirmDelete> {
        let index = self.selected_index()?;
        let (id, label) = match self.tab {
            Tab::Genres => {
                let genre = &self.collections.genres.items()[index];
                (genre.id.clone(), genre.name.clone())
            }
            Tab::Facts => {
                let fact = &self.collections.facts.items()[index];
                (fact.id.clone(), fact.title.clone())
            }
            Tab::Users => {
                let user = &self.collections.users.items()[index];
                (user.id.clone(), user.name.clone())
            }
        };
        Some(ConfirmDelete {
            tab: self.tab,
            id,
            label,
        })
    }

    fn selected_location(&self) -> Option<Location> {
        let index = self.selected_index()?;
        match self.tab {
            Tab::Genres => self.collections.genres.items()[index].location,
            Tab::Facts => self.collections.facts.items()[index].location,
            Tab::Users => None,
        }
    }

    fn genre_name(&self, genre_id: i64) -> String {
        self.collections
            .genres
            .get(&genre_id.to_string())
            .map(|genre| genre.name.clone())
            .unwrap_or_else(|| format!("genre #{genre_id}"))
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        self.draw_list(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Creating(form) => {
                let title = format!("New {}", form.tab.noun());
                self.draw_form(frame, area, &title, form);
            }
            Mode::Editing { form, .. } => {
                let title = format!("Edit {}", form.tab.noun());
                self.draw_form(frame, area, &title, form);
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = Tab::ALL
            .iter()
            .map(|tab| format!("{} ({})", tab.title(), self.len_of(*tab)));
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Music Facts"))
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.tab.title());
        let items = self.list_items();

        if items.is_empty() {
            let empty = format!("No {} yet. Press + to add one.", self.tab.title().to_lowercase());
            let paragraph = Paragraph::new(Span::styled(empty, Style::default().fg(Color::DarkGray)))
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(self.selected_index());
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn list_items(&self) -> Vec<ListItem<'static>> {
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let detail = Style::default().fg(Color::Gray);
        let place = Style::default().fg(Color::Green);

        match self.tab {
            Tab::Genres => self
                .collections
                .genres
                .items()
                .iter()
                .map(|genre| {
                    let mut lines = vec![Line::from(Span::styled(genre.name.clone(), heading))];
                    if let Some(label) = location_label(genre.location.as_ref()) {
                        lines.push(Line::from(Span::styled(label, place)));
                    }
                    ListItem::new(lines)
                })
                .collect(),
            Tab::Facts => self
                .collections
                .facts
                .items()
                .iter()
                .map(|fact| {
                    let mut lines = vec![
                        Line::from(vec![
                            Span::styled(fact.title.clone(), heading),
                            Span::styled(format!("  [{}]", self.genre_name(fact.genre_id)), detail),
                        ]),
                        Line::from(Span::styled(fact.content.clone(), detail)),
                    ];
                    if let Some(label) = location_label(fact.location.as_ref()) {
                        lines.push(Line::from(Span::styled(label, place)));
                    }
                    ListItem::new(lines)
                })
                .collect(),
            Tab::Users => self
                .collections
                .users
                .items()
                .iter()
                .map(|user| {
                    ListItem::new(vec![
                        Line::from(Span::styled(user.name.clone(), heading)),
                        Line::from(Span::styled(user.email.clone(), detail)),
                    ])
                })
                .collect(),
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = vec![
            Span::styled("[Tab]", key_style),
            Span::raw(" Switch   "),
            Span::styled("[+]", key_style),
            Span::raw(" New   "),
            Span::styled("[e]", key_style),
            Span::raw(" Edit   "),
            Span::styled("[-]", key_style),
            Span::raw(" Delete   "),
        ];
        if self.tab.takes_location() {
            spans.push(Span::styled("[m]", key_style));
            spans.push(Span::raw(" Map   "));
        }
        spans.push(Span::styled("[r]", key_style));
        spans.push(Span::raw(" Reload   "));
        spans.push(Span::styled("[q]", key_style));
        spans.push(Span::raw(" Quit"));
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &EntryForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            let hint = if form.tab.takes_location() {
                "Enter to save • Ctrl+G to save with GPS • Tab to switch • Esc to cancel"
            } else {
                "Enter to save • Tab to switch • Esc to cancel"
            };
            lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Delete {}", confirm.tab.noun()))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}'?", confirm.label)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn reopen(target: Option<String>, form: EntryForm) -> Mode {
    match target {
        Some(id) => Mode::Editing { id, form },
        None => Mode::Creating(form),
    }
}

fn describe_update(outcome: Outcome, noun: &str) -> Result<String> {
    match outcome {
        Outcome::Applied => Ok(format!("{noun} updated.")),
        Outcome::NoMatch => Ok(format!("{noun} no longer exists; nothing changed.")),
        Outcome::Rejected(err) => Err(StoreError::from(err).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::db::MemorySlots;
    use crate::location::FixedLocation;
    use crate::store::WritePolicy;

    fn app_with(slots: &Rc<MemorySlots>, fix: Option<Location>) -> App {
        let mut collections = Collections::new(slots.clone(), WritePolicy::default());
        assert!(collections.load_all().is_empty());
        App::new(collections, Box::new(FixedLocation(fix)))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn creating_a_genre_puts_it_first_and_selects_it() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Samba");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.collections.genres.items()[0].name, "Samba");
        assert_eq!(app.collections.genres.items()[0].id, "4");
        assert_eq!(app.selected_index(), Some(0));
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Info));
    }

    #[test]
    fn blank_form_stays_open_with_validation_message() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);

        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Creating(form) => assert_eq!(form.error.as_deref(), Some("Genre name is required.")),
            _ => panic!("form should still be open"),
        }
        assert_eq!(app.collections.genres.len(), 3);
    }

    #[test]
    fn ctrl_g_tags_the_new_genre_with_the_fix() {
        let slots = Rc::new(MemorySlots::new());
        let here = Location::new(-12.97, -38.5);
        let mut app = app_with(&slots, Some(here));

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Axé");
        app.handle_ctrl_g().unwrap();

        assert_eq!(app.collections.genres.items()[0].location, Some(here));
    }

    #[test]
    fn ctrl_g_without_fix_saves_untagged_and_says_so() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Axé");
        app.handle_ctrl_g().unwrap();

        assert_eq!(app.collections.genres.items()[0].location, None);
        let status = app.status.as_ref().unwrap();
        assert!(status.text.ends_with("saved without GPS."));
    }

    #[test]
    fn delete_flow_removes_selected_genre() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);

        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        app.handle_key(KeyCode::Char('y')).unwrap();

        assert_eq!(app.collections.genres.len(), 2);
        assert!(app.collections.genres.get("1").is_none());
    }

    #[test]
    fn users_tab_creates_and_edits_users() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);

        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.tab, Tab::Users);

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Ana");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "ana@example.com");
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.collections.users.len(), 1);

        app.handle_key(KeyCode::Char('e')).unwrap();
        type_text(&mut app, " Maria");
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.collections.users.items()[0].name, "Ana Maria");
    }

    #[test]
    fn storage_failure_closes_form_and_reports_error() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);
        slots.fail_writes(true);

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Samba");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.starts_with("could not save @app_generos"));
        assert_eq!(app.collections.genres.len(), 3);
    }

    #[test]
    fn fact_form_rejects_non_numeric_genre_before_saving() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);
        app.handle_key(KeyCode::Tab).unwrap();

        app.handle_key(KeyCode::Char('e')).unwrap();
        if let Mode::Editing { form, .. } = &mut app.mode {
            form.fields[2].value = "x".to_string();
        }
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Editing { .. }));
    }

    #[test]
    fn q_exits() {
        let slots = Rc::new(MemorySlots::new());
        let mut app = app_with(&slots, None);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
