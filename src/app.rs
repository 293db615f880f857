use std::sync::mpsc::Receiver;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::best_score::{BestOutcome, KeyValueStore, PersonalBest};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::passage::{Difficulty, Passage, PassageLibrary};
use crate::session::{Mode, Session, SessionObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

/// What the event loop should do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub mode: Mode,
    /// Replaces the built-in passages when set.
    pub prompt: Option<String>,
}

impl From<Config> for Settings {
    fn from(cfg: Config) -> Self {
        Self {
            difficulty: cfg.difficulty,
            mode: cfg.mode,
            prompt: None,
        }
    }
}

impl From<&Settings> for Config {
    fn from(s: &Settings) -> Self {
        Self {
            difficulty: s.difficulty,
            mode: s.mode,
        }
    }
}

/// Everything the presentation layer reads, plus the collaborators the
/// session talks to.
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub state: AppState,
    pub settings: Settings,
    /// Last metrics pushed by the session.
    pub stats: Metrics,
    /// Best WPM shown in the header.
    pub best_wpm: Option<u32>,
    /// Result of comparing the last finished run against the best.
    pub outcome: Option<BestOutcome>,
    library: PassageLibrary,
    personal_best: PersonalBest,
    best_updates: Receiver<u32>,
}

impl App {
    pub fn new(
        settings: Settings,
        library: PassageLibrary,
        store: Box<dyn KeyValueStore>,
    ) -> crate::Result<Self> {
        let mut personal_best = PersonalBest::new(store);
        let best_updates = personal_best.subscribe();
        let best_wpm = personal_best.current().unwrap_or_else(|e| {
            warn!(error = %e, "could not read personal best");
            None
        });

        let passage = pick_passage(&library, &settings, None)?;
        let session = Session::new(passage, settings.mode);
        let state = initial_state(&session);

        Ok(Self {
            stats: session.metrics(),
            session,
            state,
            settings,
            best_wpm,
            outcome: None,
            library,
            personal_best,
            best_updates,
        })
    }

    /// The periodic tick should run only while a session is in progress.
    pub fn wants_ticks(&self) -> bool {
        self.session.has_started() && !self.session.has_finished()
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.session.on_tick(now);
        self.sync();
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Backspace => self.session.on_backspace(),
                KeyCode::Left => self.restart(),
                KeyCode::Right => self.new_passage(),
                KeyCode::Char(c) => self.session.on_char(c, now),
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.restart(),
                KeyCode::Char('n') => self.new_passage(),
                KeyCode::Char('d') => {
                    self.set_difficulty(self.settings.difficulty.next());
                }
                KeyCode::Char('m') => {
                    self.set_mode(self.settings.mode.toggle());
                }
                _ => {}
            },
        }

        self.sync();
        Action::Continue
    }

    /// Same passage, fresh run.
    pub fn restart(&mut self) {
        if self.session.mode() == self.settings.mode {
            self.session.restart();
        } else {
            self.session = Session::new(self.session.passage().clone(), self.settings.mode);
        }
        self.reset_screen();
    }

    /// Another passage of the current difficulty.
    pub fn new_passage(&mut self) {
        let current = self.session.passage().id.clone();
        match pick_passage(&self.library, &self.settings, Some(current.as_str())) {
            Ok(passage) => {
                self.session = Session::new(passage, self.settings.mode);
                self.reset_screen();
            }
            Err(e) => warn!(error = %e, "could not pick a new passage"),
        }
    }

    /// Refused while a run is in progress. Returns whether it was applied.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.wants_ticks() {
            return false;
        }
        self.settings.difficulty = difficulty;
        self.new_passage();
        true
    }

    /// Refused while a run is in progress. Returns whether it was applied.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.wants_ticks() {
            return false;
        }
        self.settings.mode = mode;
        self.restart();
        true
    }

    fn reset_screen(&mut self) {
        self.outcome = None;
        self.stats = self.session.metrics();
        self.state = initial_state(&self.session);
        // discard the restart notification; stats were just refreshed
        let _ = self.session.drain_events().count();
    }

    /// Deliver queued session signals and best-score notifications.
    pub fn sync(&mut self) {
        let mut presenter = Presenter {
            stats: &mut self.stats,
            state: &mut self.state,
            outcome: &mut self.outcome,
            personal_best: &mut self.personal_best,
        };
        self.session.dispatch(&mut presenter);

        while let Ok(best) = self.best_updates.try_recv() {
            self.best_wpm = Some(best);
        }
    }
}

/// Applies session signals to the parts of [`App`] the screens read.
struct Presenter<'a> {
    stats: &'a mut Metrics,
    state: &'a mut AppState,
    outcome: &'a mut Option<BestOutcome>,
    personal_best: &'a mut PersonalBest,
}

impl SessionObserver for Presenter<'_> {
    fn on_start(&mut self) {
        debug!("typing started");
    }

    fn on_stats(&mut self, metrics: &Metrics) {
        *self.stats = *metrics;
    }

    fn on_finish(&mut self, metrics: &Metrics) {
        *self.stats = *metrics;
        *self.state = AppState::Results;
        match self.personal_best.record(metrics.wpm) {
            Ok(outcome) => *self.outcome = Some(outcome),
            Err(e) => warn!(error = %e, "could not record personal best"),
        }
    }
}

fn initial_state(session: &Session) -> AppState {
    // an empty passage is complete before anything is typed
    if session.has_finished() {
        AppState::Results
    } else {
        AppState::Typing
    }
}

fn pick_passage(
    library: &PassageLibrary,
    settings: &Settings,
    current_id: Option<&str>,
) -> crate::Result<Passage> {
    if let Some(prompt) = &settings.prompt {
        return Ok(Passage::custom(prompt));
    }

    let mut rng = rand::thread_rng();
    match current_id {
        Some(id) => library.random_except(settings.difficulty, id, &mut rng),
        None => library.random(settings.difficulty, &mut rng),
    }
}
