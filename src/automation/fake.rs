//! Scripted in-memory [`PageAutomation`] for tests.
//!
//! Models the results page as a list of pages of cards. Locators are
//! recognised by comparing against a [`Locators`] table, so tests exercise
//! the same selector plumbing as a real run.

use super::{AutomationError, AutomationResult, PageAutomation};
use crate::config::Locators;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// One result card.
#[derive(Debug, Clone, Default)]
pub struct FakeCard {
    pub timestamp: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl FakeCard {
    /// A complete card published at noon on the given day.
    pub fn dated(year: i32, month: u32, day: u32, title: &str) -> Self {
        let at = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        Self::at(at, title)
    }

    pub fn at(at: DateTime<Utc>, title: &str) -> Self {
        Self {
            timestamp: Some(at.timestamp_millis().to_string()),
            title: Some(title.to_string()),
            description: Some(format!("About {title}")),
            image: Some(format!("https://img.example.com/{}.jpg", title.replace(' ', "-"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Date,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeElement {
    Card { page: usize, index: usize },
    Field { page: usize, index: usize, field: Field },
    Control(String),
}

#[derive(Debug, Default)]
struct State {
    page: usize,
    next_clicks: u32,
    next_faults: VecDeque<AutomationError>,
    next_gone: bool,
    calls: Vec<String>,
    closed: bool,
    screenshots: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct FakePage {
    locators: Locators,
    pages: Vec<Vec<FakeCard>>,
    /// Topic label and the count shown next to it.
    pub topic_count: Option<(String, String)>,
    pub result_count_text: String,
    pub overlay_present: bool,
    pub loading_indicator_seen: bool,
    /// Render a disabled next-page link on the last page instead of none.
    pub last_page_disabled: bool,
    /// Locators whose `find_element` should fail with `NotFound`.
    pub missing: Vec<String>,
    /// Drop the next-page link from the document after a faulted click.
    pub next_vanishes_on_fault: bool,
    /// Card fields whose lookup fails with `StaleElement`.
    pub stale_fields: Vec<Field>,
    /// Card fields whose text and attributes fail with a browser error.
    pub unreadable_fields: Vec<Field>,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(locators: Locators, pages: Vec<Vec<FakeCard>>) -> Self {
        Self {
            locators,
            pages,
            topic_count: None,
            result_count_text: String::new(),
            overlay_present: false,
            loading_indicator_seen: true,
            last_page_disabled: false,
            missing: Vec::new(),
            next_vanishes_on_fault: false,
            stale_fields: Vec::new(),
            unreadable_fields: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Faults returned by successive next-page clicks before they succeed.
    pub fn with_next_faults(self, faults: Vec<AutomationError>) -> Self {
        self.state.lock().unwrap().next_faults = faults.into();
        self
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().unwrap().page
    }

    pub fn next_clicks(&self) -> u32 {
        self.state.lock().unwrap().next_clicks
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().screenshots.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn card(&self, page: usize, index: usize) -> AutomationResult<&FakeCard> {
        self.pages
            .get(page)
            .and_then(|cards| cards.get(index))
            .ok_or_else(|| AutomationError::StaleElement(format!("card {page}/{index}")))
    }

    fn field_of(&self, locator: &str) -> Option<Field> {
        let l = &self.locators;
        if locator == l.item_title {
            Some(Field::Title)
        } else if locator == l.item_description {
            Some(Field::Description)
        } else if locator == l.item_date {
            Some(Field::Date)
        } else if locator == l.item_image {
            Some(Field::Image)
        } else {
            None
        }
    }

    fn readable(&self, field: Field) -> AutomationResult<()> {
        if self.unreadable_fields.contains(&field) {
            return Err(AutomationError::Browser(format!("cannot read {field:?}")));
        }
        Ok(())
    }

    fn has_next_page(&self) -> bool {
        self.current_page() + 1 < self.pages.len()
    }
}

impl PageAutomation for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> AutomationResult<()> {
        self.record(format!("goto {url}"));
        Ok(())
    }

    async fn find_element(
        &self,
        locator: &str,
        scope: Option<&FakeElement>,
    ) -> AutomationResult<FakeElement> {
        if self.missing.iter().any(|m| m == locator) {
            return Err(AutomationError::not_found(locator));
        }

        if let Some(FakeElement::Card { page, index }) = scope {
            let (page, index) = (*page, *index);
            if page != self.current_page() {
                return Err(AutomationError::StaleElement(format!("card {page}/{index}")));
            }
            let field = self
                .field_of(locator)
                .ok_or_else(|| AutomationError::not_found(locator))?;
            if self.stale_fields.contains(&field) {
                return Err(AutomationError::StaleElement(format!("{field:?} of card {page}/{index}")));
            }
            let card = self.card(page, index)?;
            let present = match field {
                Field::Title => card.title.is_some(),
                Field::Description => card.description.is_some(),
                Field::Date => card.timestamp.is_some(),
                Field::Image => card.image.is_some(),
            };
            return if present {
                Ok(FakeElement::Field { page, index, field })
            } else {
                Err(AutomationError::not_found(locator))
            };
        }

        let next_gone = self.state.lock().unwrap().next_gone;
        if locator == self.locators.next_page
            && (next_gone || (!self.has_next_page() && !self.last_page_disabled))
        {
            return Err(AutomationError::not_found(locator));
        }
        if locator == self.locators.overlay_host && !self.overlay_present {
            return Err(AutomationError::not_found(locator));
        }
        Ok(FakeElement::Control(locator.to_string()))
    }

    async fn find_elements(&self, locator: &str) -> AutomationResult<Vec<FakeElement>> {
        if locator != self.locators.result_item {
            return Ok(Vec::new());
        }
        let page = self.current_page();
        let count = self.pages.get(page).map_or(0, Vec::len);
        Ok((0..count).map(|index| FakeElement::Card { page, index }).collect())
    }

    async fn get_text(&self, element: &FakeElement) -> AutomationResult<String> {
        match element {
            FakeElement::Field { page, index, field } => {
                self.readable(*field)?;
                let card = self.card(*page, *index)?;
                let text = match field {
                    Field::Title => card.title.clone(),
                    Field::Description => card.description.clone(),
                    _ => None,
                };
                Ok(text.unwrap_or_default())
            }
            FakeElement::Control(locator) => {
                if let Some((topic, count)) = &self.topic_count {
                    if *locator == self.locators.topic_count_for(topic) {
                        return Ok(count.clone());
                    }
                }
                if *locator == self.locators.result_count {
                    return Ok(self.result_count_text.clone());
                }
                Ok(String::new())
            }
            FakeElement::Card { .. } => Ok(String::new()),
        }
    }

    async fn get_attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> AutomationResult<Option<String>> {
        match element {
            FakeElement::Field { page, index, field } => {
                self.readable(*field)?;
                let card = self.card(*page, *index)?;
                Ok(match (field, name) {
                    (Field::Date, n) if n == self.locators.item_date_attribute => {
                        card.timestamp.clone()
                    }
                    (Field::Image, "src") => card.image.clone(),
                    _ => None,
                })
            }
            FakeElement::Control(locator)
                if *locator == self.locators.next_page
                    && name == "aria-disabled"
                    && !self.has_next_page() =>
            {
                Ok(Some("true".to_string()))
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, element: &FakeElement) -> AutomationResult<()> {
        let FakeElement::Control(locator) = element else {
            return Ok(());
        };
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("click {locator}"));
        if *locator == self.locators.next_page {
            state.next_clicks += 1;
            if let Some(fault) = state.next_faults.pop_front() {
                state.next_gone = self.next_vanishes_on_fault;
                return Err(fault);
            }
            state.page += 1;
        }
        Ok(())
    }

    async fn wait_visible(&self, locator: &str, timeout: Duration) -> AutomationResult<()> {
        self.record(format!("wait_visible {locator}"));
        if locator == self.locators.loading_indicator && !self.loading_indicator_seen {
            return Err(AutomationError::Timeout {
                locator: locator.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn wait_not_visible(&self, locator: &str, _timeout: Duration) -> AutomationResult<()> {
        self.record(format!("wait_not_visible {locator}"));
        Ok(())
    }

    async fn select_checkbox(&self, locator: &str) -> AutomationResult<()> {
        self.record(format!("select_checkbox {locator}"));
        Ok(())
    }

    async fn select_from_list(&self, locator: &str, value: &str) -> AutomationResult<()> {
        self.record(format!("select_from_list {locator} {value}"));
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> AutomationResult<()> {
        self.record(format!("execute_script {script}"));
        Ok(())
    }

    async fn input_text(&self, locator: &str, text: &str) -> AutomationResult<()> {
        self.record(format!("input_text {locator} {text}"));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> AutomationResult<()> {
        self.state.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> AutomationResult<()> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.calls.push("close".to_string());
        Ok(())
    }
}
