use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything the main loop can wait on for input
pub trait EventSource {
    /// `None` when nothing arrived within `timeout`.
    fn next_event(&self, timeout: Duration) -> Option<AppEvent>;
}

/// Map a raw terminal event to an app event; key releases and repeats,
/// mouse and focus events are dropped.
pub fn translate(raw: CtEvent) -> Option<AppEvent> {
    match raw {
        CtEvent::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

/// Events fed through an mpsc channel. Tests push into the sender directly;
/// `terminal()` feeds it from a crossterm reader thread.
pub struct ChannelSource {
    rx: Receiver<AppEvent>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let raw = match event::read() {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event read failed");
                    break;
                }
            };
            let Some(evt) = translate(raw) else {
                continue;
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self::new(rx)
    }
}

impl EventSource for ChannelSource {
    fn next_event(&self, timeout: Duration) -> Option<AppEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(evt) => Some(evt),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // nothing more will arrive; keep the tick cadence
                std::thread::sleep(timeout);
                None
            }
        }
    }
}

pub struct Runner<E: EventSource> {
    source: E,
    tick_rate: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick_rate: Duration) -> Self {
        Self { source, tick_rate }
    }

    /// Zero is bumped to 1ms so the loop never spins
    pub fn with_tick_millis(source: E, ms: u64) -> Self {
        Self::new(source, Duration::from_millis(ms.max(1)))
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Next event, or `Tick` once a full tick passes with no input
    pub fn step(&self) -> AppEvent {
        self.source
            .next_event(self.tick_rate)
            .unwrap_or(AppEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::with_tick_millis(ChannelSource::new(rx), 1);

        assert!(matches!(runner.step(), AppEvent::Tick));
    }

    #[test]
    fn step_ticks_after_sender_is_gone() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::with_tick_millis(ChannelSource::new(rx), 1);

        assert!(matches!(runner.step(), AppEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::with_tick_millis(ChannelSource::new(rx), 10);

        match runner.step() {
            AppEvent::Key(key) => assert_eq!(key.code, KeyCode::Enter),
            other => panic!("expected key event, got {other:?}"),
        }
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::with_tick_millis(ChannelSource::new(rx), 0);
        assert_eq!(runner.tick_rate(), Duration::from_millis(1));
    }

    #[test]
    fn translate_keeps_presses_only() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );

        assert!(matches!(
            translate(CtEvent::Key(press)),
            Some(AppEvent::Key(k)) if k.code == KeyCode::Char('a')
        ));
        assert!(translate(CtEvent::Key(release)).is_none());
        assert!(matches!(translate(CtEvent::Resize(80, 24)), Some(AppEvent::Resize)));
        assert!(translate(CtEvent::FocusGained).is_none());
    }
}
