use chrono::Local;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::format;
use crate::history::{AttemptRecord, HistoryStore};
use crate::level::Level;
use crate::session::{Effect, Event, Notice, SessionState};

/// Source of the authoritative timestamps for start and submit
pub trait Clock: fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for tests; clones share the same offset
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

/// Cosmetic elapsed-time display; only alive while a test is running
#[derive(Debug, Clone, Copy)]
struct DisplayTimer {
    started_at: Instant,
}

/// Owns the session, the record store and the display timer, and carries
/// out the effects produced by session transitions.
#[derive(Debug)]
pub struct Tester {
    session: SessionState,
    store: Box<dyn HistoryStore>,
    clock: Box<dyn Clock>,
    timer: Option<DisplayTimer>,
    timer_text: String,
    records: Vec<AttemptRecord>,
}

impl Tester {
    pub fn new(store: Box<dyn HistoryStore>, clock: Box<dyn Clock>, level: Option<Level>) -> Self {
        let records = store.load_all();
        tracing::debug!(records = records.len(), "history loaded");
        Self {
            session: SessionState::new(level),
            store,
            clock,
            timer: None,
            timer_text: format::timer_text(0.0),
            records,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Read-only copy of the persisted history, in insertion order
    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn timer_text(&self) -> &str {
        &self.timer_text
    }

    pub fn is_ticking(&self) -> bool {
        self.timer.is_some()
    }

    pub fn dispatch(&mut self, event: Event) {
        let now = self.clock.now();
        tracing::debug!(?event, "dispatch");
        let restarting = event == Event::Restart && self.session.is_finished();
        let effects = self.session.apply(event, now);
        if restarting {
            self.timer_text = format::timer_text(0.0);
        }
        for effect in effects {
            self.run_effect(effect, now);
        }
    }

    fn run_effect(&mut self, effect: Effect, now: Instant) {
        match effect {
            Effect::StartTimer => {
                self.timer = Some(DisplayTimer { started_at: now });
                self.timer_text = format::timer_text(0.0);
            }
            Effect::StopTimer => {
                self.timer = None;
            }
            Effect::AppendRecord(record) => {
                let record = record.recorded_at(Local::now());
                match self.store.append(record.clone()) {
                    Ok(()) => {
                        self.records = self.store.load_all();
                        let stored = self.records.last().cloned().unwrap_or(record);
                        self.session.settle_record(stored);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to save attempt");
                        self.session.notice = Some(Notice::StorageFailed);
                        self.session.settle_record(record);
                    }
                }
            }
            Effect::ClearHistory => match self.store.clear() {
                Ok(()) => self.records.clear(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to clear history");
                    self.session.notice = Some(Notice::StorageFailed);
                }
            },
        }
    }

    /// Refresh the cosmetic timer; does nothing once the timer is stopped
    pub fn on_tick(&mut self) {
        if let Some(timer) = self.timer {
            let elapsed = self
                .clock
                .now()
                .saturating_duration_since(timer.started_at)
                .as_secs_f64();
            self.timer_text = format::timer_text(elapsed);
        }
    }

    pub fn select_level(&mut self, level: Level) {
        self.dispatch(Event::SelectLevel(level));
    }

    pub fn cycle_level(&mut self, forward: bool) {
        let level = match (self.session.selected_level, forward) {
            (Some(level), true) => level.next(),
            (Some(level), false) => level.prev(),
            (None, _) => Level::Beginner,
        };
        self.select_level(level);
    }

    pub fn start(&mut self) {
        self.dispatch(Event::Start);
    }

    pub fn type_char(&mut self, c: char) {
        if !self.session.is_running() {
            return;
        }
        let mut input = self.session.input.clone();
        input.push(c);
        self.dispatch(Event::InputChanged(input));
    }

    pub fn backspace(&mut self) {
        if !self.session.is_running() {
            return;
        }
        let mut input = self.session.input.clone();
        input.pop();
        self.dispatch(Event::InputChanged(input));
    }

    pub fn submit(&mut self) {
        self.dispatch(Event::Submit);
    }

    pub fn restart(&mut self) {
        self.dispatch(Event::Restart);
    }

    pub fn clear_history(&mut self) {
        let stored = self.store.load_all().len();
        self.dispatch(Event::ClearHistory { stored });
    }

    /// Stop the display timer when leaving mid-test
    pub fn abort(&mut self) {
        if self.timer.take().is_some() {
            tracing::debug!("running test abandoned");
        }
    }
}
