use log::{debug, error};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::{SearchBar, SearchEffect, SearchEvent, SearchOutcome, SearchState};
use crate::api::RecipeApi;
use crate::config::SearchConfig;
use crate::model::SearchResult;

/// Messages for the owner of the search bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchNotice {
    RecipeSelected(String),
    TermChanged(String),
}

/// What the search bar should display right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub text: String,
    pub state: SearchState,
    pub loading: bool,
    pub panel_visible: bool,
    pub panel_rendered: bool,
    pub results: Vec<SearchResult>,
}

impl SearchSnapshot {
    fn of(bar: &SearchBar) -> Self {
        Self {
            text: bar.text().to_string(),
            state: bar.state(),
            loading: bar.is_loading(),
            panel_visible: bar.is_panel_visible(),
            panel_rendered: bar.is_panel_rendered(),
            results: bar.results().to_vec(),
        }
    }
}

/// Owner side of a running [`SearchController`]
pub struct SearchHandle {
    pub events: mpsc::UnboundedSender<SearchEvent>,
    pub notices: mpsc::UnboundedReceiver<SearchNotice>,
    pub snapshot: watch::Receiver<SearchSnapshot>,
    pub task: JoinHandle<()>,
}

impl SearchHandle {
    /// Returns false once the controller has stopped
    pub fn send(&self, event: SearchEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Runs a [`SearchBar`] against a [`RecipeApi`]: fires its timers, performs
/// its searches on separate tasks and feeds the outcomes back in.
pub struct SearchController {
    api: Arc<dyn RecipeApi>,
    bar: SearchBar,
    page_size: u32,
}

impl SearchController {
    pub fn new(
        api: Arc<dyn RecipeApi>,
        config: &SearchConfig,
        page_size: u32,
        initial_text: impl Into<String>,
    ) -> Self {
        Self {
            api,
            bar: SearchBar::new(config, initial_text),
            page_size,
        }
    }

    /// Start the controller on the current runtime
    pub fn spawn(self) -> SearchHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SearchSnapshot::of(&self.bar));

        let task = tokio::spawn(self.run(events_rx, notices_tx, snapshot_tx));

        SearchHandle {
            events: events_tx,
            notices: notices_rx,
            snapshot: snapshot_rx,
            task,
        }
    }

    /// Process events until the event channel closes
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SearchEvent>,
        notices: mpsc::UnboundedSender<SearchNotice>,
        snapshot: watch::Sender<SearchSnapshot>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, SearchOutcome)>();

        loop {
            let deadline = self.bar.next_deadline();
            let effects = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.bar.handle(event, Instant::now()),
                    None => break,
                },
                Some((generation, outcome)) = done_rx.recv() => self.bar.handle(
                    SearchEvent::Completed { generation, outcome },
                    Instant::now(),
                ),
                _ = sleep_until_deadline(deadline) => self.bar.tick(Instant::now()),
            };

            for effect in effects {
                match effect {
                    SearchEffect::Search {
                        generation,
                        query,
                        token,
                    } => {
                        let api = Arc::clone(&self.api);
                        let done = done_tx.clone();
                        let limit = self.page_size;
                        tokio::spawn(async move {
                            let outcome =
                                match api.search_recipes(&query, "", 1, limit, &token).await {
                                    Ok(page) => SearchOutcome::Found(
                                        page.data.iter().map(SearchResult::from).collect(),
                                    ),
                                    Err(e) if e.is_cancelled() => SearchOutcome::Cancelled,
                                    Err(e) => {
                                        error!("Error searching recipes: {}", e);
                                        SearchOutcome::Found(Vec::new())
                                    }
                                };
                            let _ = done.send((generation, outcome));
                        });
                    }
                    SearchEffect::RecipeSelected(id) => {
                        let _ = notices.send(SearchNotice::RecipeSelected(id));
                    }
                    SearchEffect::TermChanged(text) => {
                        let _ = notices.send(SearchNotice::TermChanged(text));
                    }
                }
            }

            snapshot.send_replace(SearchSnapshot::of(&self.bar));
        }

        debug!("Search controller stopped");
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
