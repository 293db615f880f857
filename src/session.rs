use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::Metrics;
use crate::passage::Passage;

/// Fixed limit for a timed run.
pub const TIME_LIMIT_MS: u64 = 60_000;

/// Interval at which the host is expected to call [`Session::on_tick`].
pub const TICK_INTERVAL_MS: u64 = 250;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ends after 60 seconds or at the end of the passage, whichever comes first.
    #[default]
    #[strum(serialize = "Timed (60s)")]
    Timed,
    /// Ends only when the whole passage has been typed.
    Passage,
}

impl Mode {
    pub fn toggle(self) -> Self {
        match self {
            Mode::Timed => Mode::Passage,
            Mode::Passage => Mode::Timed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Finished,
}

/// How a passage character should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Pending,
}

/// Discrete signals queued by the session for its host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    StatsChanged(Metrics),
    Finished(Metrics),
}

/// Receiver side of [`Session::dispatch`].
pub trait SessionObserver {
    fn on_start(&mut self) {}
    fn on_stats(&mut self, _metrics: &Metrics) {}
    fn on_finish(&mut self, _metrics: &Metrics) {}
}

/// One typing run against a single passage.
#[derive(Debug, Clone)]
pub struct Session {
    passage: Passage,
    expected: Vec<char>,
    mode: Mode,
    typed: Vec<char>,
    errors: BTreeSet<usize>,
    started_at: Option<Instant>,
    elapsed_ms: u64,
    finished: bool,
    events: VecDeque<SessionEvent>,
    last_metrics: Metrics,
}

impl Session {
    pub fn new(passage: Passage, mode: Mode) -> Self {
        let expected: Vec<char> = passage.text.chars().collect();
        let finished = expected.is_empty();
        Self {
            passage,
            expected,
            mode,
            typed: Vec::new(),
            errors: BTreeSet::new(),
            started_at: None,
            elapsed_ms: 0,
            finished,
            events: VecDeque::new(),
            last_metrics: Metrics::default(),
        }
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    pub fn expected(&self) -> &[char] {
        &self.expected
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.typed.len()
    }

    pub fn errors(&self) -> &BTreeSet<usize> {
        &self.errors
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.finished
    }

    pub fn status(&self) -> Status {
        match (self.finished, self.started_at) {
            (true, _) => Status::Finished,
            (false, Some(_)) => Status::Running,
            (false, None) => Status::Idle,
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::compute(
            self.typed.len(),
            self.errors.len(),
            self.elapsed_ms,
            self.mode,
        )
    }

    /// Display status of the passage character at `idx`.
    ///
    /// Anything already typed is shown as incorrect if its slot was ever
    /// mistyped, even when the current character matches.
    pub fn char_status(&self, idx: usize) -> CharStatus {
        if idx < self.typed.len() {
            if self.errors.contains(&idx) {
                CharStatus::Incorrect
            } else {
                CharStatus::Correct
            }
        } else {
            CharStatus::Pending
        }
    }

    pub fn on_char(&mut self, c: char, now: Instant) {
        if self.finished || self.cursor() >= self.expected.len() {
            return;
        }

        if self.started_at.is_none() {
            self.started_at = Some(now);
            info!(passage = %self.passage.id, mode = %self.mode, "session started");
            self.events.push_back(SessionEvent::Started);
        }

        let idx = self.cursor();
        if c != self.expected[idx] {
            debug!(idx, expected = %self.expected[idx], got = %c, "mismatch");
            self.errors.insert(idx);
        }
        self.typed.push(c);

        if self.cursor() == self.expected.len() {
            self.elapsed_ms = self.clamp_elapsed(self.elapsed_since_start(now));
            self.finish();
        } else {
            self.push_stats();
        }
    }

    pub fn on_backspace(&mut self) {
        if self.finished || self.typed.is_empty() {
            return;
        }

        self.typed.pop();
        self.push_stats();
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.finished || self.started_at.is_none() {
            return;
        }

        let elapsed = self.elapsed_since_start(now);
        if self.mode == Mode::Timed && elapsed >= TIME_LIMIT_MS {
            self.elapsed_ms = TIME_LIMIT_MS;
            self.finish();
            return;
        }

        self.elapsed_ms = elapsed;
        self.push_stats();
    }

    /// Back to a fresh idle run over the same passage.
    pub fn restart(&mut self) {
        self.typed.clear();
        self.errors.clear();
        self.started_at = None;
        self.elapsed_ms = 0;
        self.finished = self.expected.is_empty();
        self.events.clear();
        self.last_metrics = self.metrics();
        self.events
            .push_back(SessionEvent::StatsChanged(self.last_metrics));
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.events.drain(..)
    }

    pub fn dispatch<O: SessionObserver + ?Sized>(&mut self, observer: &mut O) {
        for event in self.events.drain(..) {
            match event {
                SessionEvent::Started => observer.on_start(),
                SessionEvent::StatsChanged(m) => observer.on_stats(&m),
                SessionEvent::Finished(m) => observer.on_finish(&m),
            }
        }
    }

    fn elapsed_since_start(&self, now: Instant) -> u64 {
        self.started_at
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0)
    }

    fn clamp_elapsed(&self, elapsed: u64) -> u64 {
        match self.mode {
            Mode::Timed => elapsed.min(TIME_LIMIT_MS),
            Mode::Passage => elapsed,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        let metrics = self.metrics();
        info!(
            wpm = metrics.wpm,
            accuracy = metrics.accuracy,
            elapsed_ms = self.elapsed_ms,
            "session finished"
        );
        self.last_metrics = metrics;
        self.events.push_back(SessionEvent::StatsChanged(metrics));
        self.events.push_back(SessionEvent::Finished(metrics));
    }

    fn push_stats(&mut self) {
        let metrics = self.metrics();
        if metrics != self.last_metrics {
            self.last_metrics = metrics;
            self.events.push_back(SessionEvent::StatsChanged(metrics));
        }
    }
}
