//! Search-as-you-type as an explicit state machine.
//!
//! [`SearchBar`] owns no timers and performs no I/O. Every transition takes the
//! current instant and returns the effects the caller must carry out; pending
//! timers are exposed through [`SearchBar::next_deadline`] and fired with
//! [`SearchBar::tick`]. [`SearchController`] drives it on tokio.

mod controller;

pub use controller::{SearchController, SearchHandle, SearchNotice, SearchSnapshot};

use log::debug;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::model::SearchResult;
use std::time::Duration;

/// Where the search bar is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// Waiting for the debounce timer
    Typing,
    /// A request is in flight
    Searching,
    ResultsShown,
    NoResults,
}

/// Visibility of the results dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Hidden,
    Visible,
    /// Still rendered at zero opacity until `until`
    FadingOut { until: Instant },
}

/// Result of a search request as reported back to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Finished; an empty list means nothing matched
    Found(Vec<SearchResult>),
    Cancelled,
}

/// Inputs to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The field received focus
    Focus,
    /// The user edited the text
    Input(String),
    /// The text was changed by the application, not the user
    SetText(String),
    /// A dropdown entry was picked
    Select(SearchResult),
    /// The clear button was pressed
    Clear,
    /// A search request finished
    Completed {
        generation: u64,
        outcome: SearchOutcome,
    },
}

/// Work the caller has to perform after a transition
#[derive(Debug, Clone)]
pub enum SearchEffect {
    /// Issue a search; drop the response if `token` is cancelled
    Search {
        generation: u64,
        query: String,
        token: CancellationToken,
    },
    /// Load this recipe
    RecipeSelected(String),
    /// The search text changed and the owner should know
    TermChanged(String),
}

/// While active, text changes do not start a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionToken {
    pub issued_at: Instant,
    pub until: Instant,
}

impl SuppressionToken {
    pub fn is_active(&self, now: Instant) -> bool {
        now < self.until
    }
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug)]
pub struct SearchBar {
    debounce: Duration,
    suppress: Duration,
    fade: Duration,
    text: String,
    state: SearchState,
    panel: Panel,
    results: Vec<SearchResult>,
    has_interacted: bool,
    debounce_deadline: Option<Instant>,
    clear_deadline: Option<Instant>,
    suppression: Option<SuppressionToken>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl SearchBar {
    pub fn new(config: &SearchConfig, initial_text: impl Into<String>) -> Self {
        SearchBar {
            debounce: config.debounce(),
            suppress: config.suppress(),
            fade: config.fade(),
            text: initial_text.into(),
            state: SearchState::Idle,
            panel: Panel::Hidden,
            results: Vec::new(),
            has_interacted: false,
            debounce_deadline: None,
            clear_deadline: None,
            suppression: None,
            in_flight: None,
            generation: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.state == SearchState::Searching
    }

    /// Rendered with full opacity
    pub fn is_panel_visible(&self) -> bool {
        self.panel == Panel::Visible
    }

    /// Part of the layout, possibly mid fade-out
    pub fn is_panel_rendered(&self) -> bool {
        self.panel != Panel::Hidden
    }

    pub fn no_results_found(&self) -> bool {
        self.state == SearchState::NoResults
    }

    pub fn suppression(&self) -> Option<SuppressionToken> {
        self.suppression
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        let fade = match self.panel {
            Panel::FadingOut { until } => Some(until),
            _ => None,
        };
        [
            self.debounce_deadline,
            self.clear_deadline,
            fade,
            self.suppression.map(|s| s.until),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn handle(&mut self, event: SearchEvent, now: Instant) -> Vec<SearchEffect> {
        match event {
            SearchEvent::Focus => {
                self.has_interacted = true;
                Vec::new()
            }
            SearchEvent::Input(text) => {
                self.has_interacted = true;
                // typing during a clear fade keeps the new text
                self.clear_deadline = None;
                self.text = text.clone();
                self.on_text_changed(now);
                vec![SearchEffect::TermChanged(text)]
            }
            SearchEvent::SetText(text) => {
                if text == self.text {
                    return Vec::new();
                }
                self.text = text;
                if self.has_interacted {
                    self.on_text_changed(now);
                }
                Vec::new()
            }
            SearchEvent::Select(result) => self.on_select(result, now),
            SearchEvent::Clear => {
                self.on_clear(now);
                Vec::new()
            }
            SearchEvent::Completed {
                generation,
                outcome,
            } => {
                self.on_completed(generation, outcome);
                Vec::new()
            }
        }
    }

    /// Fire every timer that is due at `now`
    pub fn tick(&mut self, now: Instant) -> Vec<SearchEffect> {
        let mut effects = Vec::new();

        if matches!(self.suppression, Some(s) if !s.is_active(now)) {
            self.suppression = None;
        }

        if let Panel::FadingOut { until } = self.panel {
            if until <= now {
                self.panel = Panel::Hidden;
                self.results.clear();
                if self.state == SearchState::NoResults {
                    self.state = SearchState::Idle;
                }
            }
        }

        if matches!(self.clear_deadline, Some(at) if at <= now) {
            self.clear_deadline = None;
            self.text.clear();
            self.panel = Panel::Hidden;
            self.results.clear();
            self.state = SearchState::Idle;
            effects.push(SearchEffect::TermChanged(String::new()));
        }

        if matches!(self.debounce_deadline, Some(at) if at <= now) {
            self.debounce_deadline = None;
            if let Some(effect) = self.start_search() {
                effects.push(effect);
            }
        }

        effects
    }

    fn is_suppressed(&self, now: Instant) -> bool {
        self.suppression.is_some_and(|s| s.is_active(now))
    }

    fn on_text_changed(&mut self, now: Instant) {
        if self.is_suppressed(now) {
            debug!("Auto-search suppressed for '{}'", self.text);
            return;
        }

        self.cancel_in_flight();

        if self.text.trim().is_empty() {
            self.debounce_deadline = None;
            self.state = SearchState::Idle;
            if self.panel == Panel::Visible {
                // keep the last results on screen while the panel fades
                self.panel = Panel::FadingOut {
                    until: now + self.fade,
                };
            }
            return;
        }

        self.debounce_deadline = Some(now + self.debounce);
        self.state = SearchState::Typing;
    }

    fn start_search(&mut self) -> Option<SearchEffect> {
        let query = self.text.trim().to_string();
        if query.is_empty() {
            self.state = SearchState::Idle;
            return None;
        }

        self.cancel_in_flight();
        self.generation += 1;
        let token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation: self.generation,
            token: token.clone(),
        });
        self.state = SearchState::Searching;
        self.panel = Panel::Visible;

        debug!("Issuing search #{} for '{}'", self.generation, query);
        Some(SearchEffect::Search {
            generation: self.generation,
            query,
            token,
        })
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("Cancelling search #{}", in_flight.generation);
            in_flight.token.cancel();
        }
        if self.state == SearchState::Searching {
            self.state = SearchState::Idle;
        }
    }

    fn on_select(&mut self, result: SearchResult, now: Instant) -> Vec<SearchEffect> {
        self.cancel_in_flight();
        self.debounce_deadline = None;
        self.clear_deadline = None;
        self.panel = Panel::Hidden;
        self.results.clear();
        self.state = SearchState::Idle;
        self.suppression = Some(SuppressionToken {
            issued_at: now,
            until: now + self.suppress,
        });
        // the field shows the picked name right away, while suppression holds
        self.text = result.name.clone();
        vec![
            SearchEffect::TermChanged(result.name),
            SearchEffect::RecipeSelected(result.id),
        ]
    }

    fn on_clear(&mut self, now: Instant) {
        self.cancel_in_flight();
        self.debounce_deadline = None;
        self.has_interacted = false;
        let until = now + self.fade;
        if self.panel != Panel::Hidden {
            self.panel = Panel::FadingOut { until };
        }
        self.clear_deadline = Some(until);
    }

    fn on_completed(&mut self, generation: u64, outcome: SearchOutcome) {
        let current = match &self.in_flight {
            Some(in_flight) if in_flight.generation == generation => in_flight,
            _ => {
                debug!("Dropping stale search #{}", generation);
                return;
            }
        };
        if current.token.is_cancelled() {
            return;
        }

        match outcome {
            SearchOutcome::Found(results) => {
                self.in_flight = None;
                if results.is_empty() {
                    self.results.clear();
                    self.state = SearchState::NoResults;
                } else {
                    self.results = results;
                    self.state = SearchState::ResultsShown;
                }
            }
            SearchOutcome::Cancelled => {}
        }
    }
}
