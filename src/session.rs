use std::fmt;
use std::time::Instant;

use crate::accuracy::Metrics;
use crate::format;
use crate::history::AttemptRecord;
use crate::level::Level;

/// How a finished attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum Finish {
    /// Submitted text matched the passage exactly; the record was appended
    Recorded(AttemptRecord),
    /// Submitted text did not match the passage; nothing was recorded
    Rejected(Metrics),
    /// Typed text stopped being a prefix of the passage before submit
    Diverged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Running,
    Finished(Finish),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectLevel(Level),
    Start,
    /// Full contents of the input field after an edit
    InputChanged(String),
    Submit,
    Restart,
    /// `stored` is the number of records currently persisted
    ClearHistory { stored: usize },
}

/// Side effects requested by a transition; executed by the owner of the state
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTimer,
    StopTimer,
    AppendRecord(AttemptRecord),
    ClearHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoLevelSelected,
    LevelLocked,
    NothingToClear,
    HistoryCleared,
    StorageFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Notice::NoLevelSelected => "Please select a level before starting.",
            Notice::LevelLocked => "Please complete the typing test before changing the level.",
            Notice::NothingToClear => "No records to clear!",
            Notice::HistoryCleared => "History cleared.",
            Notice::StorageFailed => "Could not update the attempt history.",
        };
        f.write_str(msg)
    }
}

/// Enabled/disabled flags for the controls around the test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub level_locked: bool,
    pub input_enabled: bool,
    pub submit_enabled: bool,
    pub start_enabled: bool,
    pub restart_visible: bool,
}

/// The single active typing test
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub selected_level: Option<Level>,
    pub status: Status,
    pub started_at: Option<Instant>,
    pub input: String,
    pub notice: Option<Notice>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            selected_level: None,
            status: Status::Idle,
            started_at: None,
            input: String::new(),
            notice: None,
        }
    }
}

impl SessionState {
    pub fn new(selected_level: Option<Level>) -> Self {
        Self {
            selected_level,
            ..Self::default()
        }
    }

    /// Passage currently on display, if a level is selected
    pub fn passage(&self) -> Option<&'static str> {
        self.selected_level.map(|level| level.passage())
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, Status::Finished(_))
    }

    /// Finished without a record, either while typing or at submit
    pub fn is_mismatched(&self) -> bool {
        matches!(
            self.status,
            Status::Finished(Finish::Rejected(_)) | Status::Finished(Finish::Diverged)
        )
    }

    /// Seconds since start while running
    pub fn elapsed(&self, now: Instant) -> Option<f64> {
        match (self.is_running(), self.started_at) {
            (true, Some(started_at)) => {
                Some(now.saturating_duration_since(started_at).as_secs_f64())
            }
            _ => None,
        }
    }

    pub fn controls(&self) -> Controls {
        let running = self.is_running();
        Controls {
            level_locked: running,
            input_enabled: running,
            submit_enabled: running,
            start_enabled: !running,
            restart_visible: self.is_finished(),
        }
    }

    /// Replace the finished attempt with its stored form; ignored unless the
    /// last attempt was recorded.
    pub fn settle_record(&mut self, stored: AttemptRecord) {
        if let Status::Finished(Finish::Recorded(record)) = &mut self.status {
            *record = stored;
        }
    }

    /// Text for the result line
    pub fn result_message(&self) -> Option<String> {
        match &self.status {
            Status::Finished(Finish::Recorded(r)) => {
                Some(format::result_text(r.time, r.wpm, r.accuracy))
            }
            Status::Finished(_) => Some(format::MISMATCH_TEXT.to_string()),
            _ => None,
        }
    }

    /// Advance the state machine. Never performs I/O; the returned effects
    /// are for the caller to carry out.
    pub fn apply(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        self.notice = None;

        match event {
            Event::SelectLevel(level) => {
                if self.is_running() {
                    self.notice = Some(Notice::LevelLocked);
                } else {
                    self.selected_level = Some(level);
                }
                vec![]
            }
            Event::Start => {
                if self.is_running() {
                    return vec![];
                }
                if self.selected_level.is_none() {
                    self.notice = Some(Notice::NoLevelSelected);
                    return vec![];
                }
                self.input.clear();
                self.started_at = Some(now);
                self.status = Status::Running;
                vec![Effect::StartTimer]
            }
            Event::InputChanged(text) => {
                let Some(passage) = self.running_passage() else {
                    return vec![];
                };
                self.input = text;
                if passage.starts_with(self.input.as_str()) {
                    vec![]
                } else {
                    self.status = Status::Finished(Finish::Diverged);
                    vec![Effect::StopTimer]
                }
            }
            Event::Submit => self.submit(now),
            Event::Restart => {
                if self.is_finished() {
                    self.input.clear();
                    self.started_at = None;
                    self.status = Status::Idle;
                }
                vec![]
            }
            Event::ClearHistory { stored } => {
                if stored == 0 {
                    self.notice = Some(Notice::NothingToClear);
                    vec![]
                } else {
                    self.notice = Some(Notice::HistoryCleared);
                    vec![Effect::ClearHistory]
                }
            }
        }
    }

    fn running_passage(&self) -> Option<&'static str> {
        if self.is_running() {
            self.passage()
        } else {
            None
        }
    }

    fn submit(&mut self, now: Instant) -> Vec<Effect> {
        let (Some(level), Some(passage)) = (self.selected_level, self.running_passage()) else {
            return vec![];
        };

        let elapsed = self
            .started_at
            .map(|started_at| now.saturating_duration_since(started_at).as_secs_f64())
            .unwrap_or(0.0);
        let metrics = Metrics::score(passage, &self.input, elapsed);

        if self.input.trim() == passage {
            let record = AttemptRecord::new(level, metrics.time_secs, metrics.wpm, metrics.accuracy);
            tracing::debug!(%level, time = metrics.time_secs, wpm = metrics.wpm, "attempt matched");
            self.status = Status::Finished(Finish::Recorded(record.clone()));
            vec![Effect::StopTimer, Effect::AppendRecord(record)]
        } else {
            tracing::debug!(%level, accuracy = metrics.accuracy, "attempt rejected");
            self.status = Status::Finished(Finish::Rejected(metrics));
            vec![Effect::StopTimer]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Duration;

    const FOX: &str = "The quick brown fox jumps over the lazy dog";

    fn running(level: Level, at: Instant) -> SessionState {
        let mut state = SessionState::new(Some(level));
        assert_eq!(state.apply(Event::Start, at), vec![Effect::StartTimer]);
        state
    }

    #[test]
    fn test_default_is_idle_without_level() {
        let state = SessionState::default();
        assert_eq!(state.status, Status::Idle);
        assert_eq!(state.selected_level, None);
        assert_eq!(state.passage(), None);
        assert!(state.controls().start_enabled);
        assert!(!state.controls().input_enabled);
    }

    #[test]
    fn test_select_level_sets_passage() {
        let mut state = SessionState::default();
        let effects = state.apply(Event::SelectLevel(Level::Intermediate), Instant::now());
        assert!(effects.is_empty());
        assert_eq!(state.selected_level, Some(Level::Intermediate));
        assert_eq!(
            state.passage(),
            Some("Typing is a fundamental skill for computer literacy")
        );
    }

    #[test]
    fn test_start_requires_level() {
        let mut state = SessionState::default();
        let effects = state.apply(Event::Start, Instant::now());
        assert!(effects.is_empty());
        assert_eq!(state.status, Status::Idle);
        assert_eq!(state.notice, Some(Notice::NoLevelSelected));
    }

    #[test]
    fn test_start_enters_running_and_locks_level() {
        let now = Instant::now();
        let state = running(Level::Beginner, now);
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.started_at, Some(now));
        assert_eq!(
            state.controls(),
            Controls {
                level_locked: true,
                input_enabled: true,
                submit_enabled: true,
                start_enabled: false,
                restart_visible: false,
            }
        );
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        let effects = state.apply(Event::Start, t0 + Duration::from_secs(3));
        assert!(effects.is_empty());
        assert_eq!(state.started_at, Some(t0));
    }

    #[test]
    fn test_select_level_while_running_is_rejected() {
        let now = Instant::now();
        let mut state = running(Level::Beginner, now);
        state.apply(Event::InputChanged("The".into()), now);

        let effects = state.apply(Event::SelectLevel(Level::Advanced), now);

        assert!(effects.is_empty());
        assert_eq!(state.selected_level, Some(Level::Beginner));
        assert_eq!(state.passage(), Some(FOX));
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.input, "The");
        assert_eq!(state.notice, Some(Notice::LevelLocked));
    }

    #[test]
    fn test_prefix_input_keeps_running() {
        let now = Instant::now();
        let mut state = running(Level::Beginner, now);
        for partial in ["T", "The", "The ", "The quick b"] {
            assert!(state.apply(Event::InputChanged(partial.into()), now).is_empty());
            assert_eq!(state.status, Status::Running);
        }
    }

    #[test]
    fn test_divergence_fails_fast() {
        let now = Instant::now();
        let mut state = running(Level::Beginner, now);

        let effects = state.apply(Event::InputChanged("The quikc".into()), now);

        assert_eq!(effects, vec![Effect::StopTimer]);
        assert_eq!(state.status, Status::Finished(Finish::Diverged));
        assert!(state.is_mismatched());
        let controls = state.controls();
        assert!(!controls.input_enabled);
        assert!(!controls.submit_enabled);
        assert!(controls.restart_visible);
        assert_eq!(
            state.result_message().as_deref(),
            Some("Text does not match. Please try again.")
        );
    }

    #[test]
    fn test_input_ignored_when_not_running() {
        let mut state = SessionState::new(Some(Level::Beginner));
        let effects = state.apply(Event::InputChanged("xyz".into()), Instant::now());
        assert!(effects.is_empty());
        assert_eq!(state.status, Status::Idle);
        assert!(state.input.is_empty());
    }

    #[test]
    fn test_exact_submit_records_attempt() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::InputChanged(FOX.into()), t0);

        let effects = state.apply(Event::Submit, t0 + Duration::from_secs(27));

        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], Effect::StopTimer);
        let record = assert_matches!(&effects[1], Effect::AppendRecord(r) => r.clone());
        assert_eq!(record.level, Level::Beginner);
        assert_eq!(record.time, 27.0);
        assert!((record.wpm - 20.0).abs() < 1e-9);
        assert_eq!(record.accuracy, 100.0);
        assert_eq!(state.status, Status::Finished(Finish::Recorded(record)));
        assert!(!state.is_mismatched());
        assert!(!state.controls().level_locked);
    }

    #[test]
    fn test_settle_record_only_touches_recorded_finish() {
        let t0 = Instant::now();
        let stored = AttemptRecord::new(Level::Beginner, 27.0, 20.0, 100.0);

        let mut rejected = running(Level::Beginner, t0);
        rejected.apply(Event::InputChanged("The".into()), t0);
        rejected.apply(Event::Submit, t0 + Duration::from_secs(3));
        let before = rejected.status.clone();
        rejected.settle_record(stored.clone());
        assert_eq!(rejected.status, before);

        let mut recorded = running(Level::Beginner, t0);
        recorded.apply(Event::InputChanged(FOX.into()), t0);
        recorded.apply(Event::Submit, t0 + Duration::from_millis(27_004));
        recorded.settle_record(stored.clone());
        assert_eq!(recorded.status, Status::Finished(Finish::Recorded(stored)));
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed_on_submit() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        // a trailing space is not a prefix of the passage, so submit straight away
        state.input = format!("{FOX} ");
        let effects = state.apply(Event::Submit, t0 + Duration::from_secs(10));
        assert_matches!(effects.as_slice(), [Effect::StopTimer, Effect::AppendRecord(_)]);
    }

    #[test]
    fn test_prefix_submit_is_rejected() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::InputChanged("The quick brown fox".into()), t0);
        assert_eq!(state.status, Status::Running);

        let effects = state.apply(Event::Submit, t0 + Duration::from_secs(4));

        assert_eq!(effects, vec![Effect::StopTimer]);
        let metrics = assert_matches!(
            &state.status,
            Status::Finished(Finish::Rejected(m)) => *m
        );
        assert!((metrics.accuracy - 400.0 / 9.0).abs() < 1e-9);
        assert!((metrics.wpm - 60.0).abs() < 1e-9);
        assert!(state.is_mismatched());
    }

    #[test]
    fn test_submit_with_zero_elapsed_clamps_wpm() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::InputChanged(FOX.into()), t0);
        let effects = state.apply(Event::Submit, t0);
        let record = assert_matches!(&effects[1], Effect::AppendRecord(r) => r.clone());
        assert_eq!(record.time, 0.0);
        assert_eq!(record.wpm, 0.0);
    }

    #[test]
    fn test_submit_when_not_running_is_ignored() {
        let mut state = SessionState::new(Some(Level::Beginner));
        assert!(state.apply(Event::Submit, Instant::now()).is_empty());
        assert_eq!(state.status, Status::Idle);
    }

    #[test]
    fn test_restart_returns_to_idle_with_level() {
        let t0 = Instant::now();
        let mut state = running(Level::Advanced, t0);
        state.apply(Event::InputChanged("Advanced typo".into()), t0);
        assert!(state.is_finished());

        let effects = state.apply(Event::Restart, t0);

        assert!(effects.is_empty());
        assert_eq!(state.status, Status::Idle);
        assert_eq!(state.selected_level, Some(Level::Advanced));
        assert!(state.input.is_empty());
        assert_eq!(state.started_at, None);
        assert_eq!(state.result_message(), None);
        assert!(!state.controls().restart_visible);
    }

    #[test]
    fn test_restart_only_from_finished() {
        let t0 = Instant::now();
        let mut state = running(Level::Advanced, t0);
        state.apply(Event::Restart, t0);
        assert_eq!(state.status, Status::Running);
    }

    #[test]
    fn test_level_change_after_finish_is_allowed() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::InputChanged("x".into()), t0);
        state.apply(Event::SelectLevel(Level::Advanced), t0);
        assert_eq!(state.selected_level, Some(Level::Advanced));
        assert_eq!(state.notice, None);
    }

    #[test]
    fn test_start_from_finished_begins_new_attempt() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::InputChanged("x".into()), t0);
        let t1 = t0 + Duration::from_secs(5);
        assert_eq!(state.apply(Event::Start, t1), vec![Effect::StartTimer]);
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.started_at, Some(t1));
        assert!(state.input.is_empty());
    }

    #[test]
    fn test_clear_history() {
        let mut state = SessionState::default();
        assert!(state
            .apply(Event::ClearHistory { stored: 0 }, Instant::now())
            .is_empty());
        assert_eq!(state.notice, Some(Notice::NothingToClear));

        let effects = state.apply(Event::ClearHistory { stored: 3 }, Instant::now());
        assert_eq!(effects, vec![Effect::ClearHistory]);
        assert_eq!(state.notice, Some(Notice::HistoryCleared));
    }

    #[test]
    fn test_clear_history_does_not_touch_running_session() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        state.apply(Event::ClearHistory { stored: 1 }, t0);
        assert_eq!(state.status, Status::Running);
    }

    #[test]
    fn test_notice_cleared_by_next_event() {
        let mut state = SessionState::default();
        state.apply(Event::Start, Instant::now());
        assert!(state.notice.is_some());
        state.apply(Event::SelectLevel(Level::Beginner), Instant::now());
        assert_eq!(state.notice, None);
    }

    #[test]
    fn test_elapsed_only_while_running() {
        let t0 = Instant::now();
        let mut state = running(Level::Beginner, t0);
        let elapsed = state.elapsed(t0 + Duration::from_millis(1500)).unwrap();
        assert!((elapsed - 1.5).abs() < 1e-9);
        state.apply(Event::InputChanged("z".into()), t0);
        assert_eq!(state.elapsed(t0 + Duration::from_secs(2)), None);
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(Notice::NothingToClear.to_string(), "No records to clear!");
        assert_eq!(
            Notice::LevelLocked.to_string(),
            "Please complete the typing test before changing the level."
        );
    }
}
