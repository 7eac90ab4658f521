pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
};

use keytrial::{
    config::{Config, ConfigStore, FileConfigStore},
    format::two_decimals,
    history::{export_csv, summarize, FileHistoryStore, HistoryStore, MemoryHistoryStore},
    logging,
    runtime::{AppEvent, ChannelSource, EventSource, Runner},
    session::Notice,
    tester::{SystemClock, Tester},
    Level,
};

/// typing speed test with fixed passages and attempt history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test: pick a level, retype its passage, and get time, words per minute and word accuracy. Exact matches are saved to a local history."
)]
pub struct Cli {
    /// level to preselect
    #[clap(short = 'l', long, value_enum)]
    level: Option<Level>,

    /// refresh interval of the elapsed-time display, in milliseconds
    #[clap(long)]
    tick_rate_ms: Option<u64>,

    /// read and write attempt history at this path
    #[clap(long)]
    history_file: Option<PathBuf>,

    /// keep new attempts in memory only
    #[clap(long)]
    no_save: bool,

    /// persist the effective level, tick rate and history file as defaults
    #[clap(long)]
    save_config: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print recorded attempts
    History {
        /// per-level best and average instead of every attempt
        #[clap(long)]
        summary: bool,
    },
    /// write recorded attempts as CSV ("-" for stdout)
    Export { path: PathBuf },
    /// delete all recorded attempts
    Clear,
}

impl Cli {
    /// Command line flags layered over the persisted config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(level) = self.level {
            config.default_level = Some(level);
        }
        if let Some(ms) = self.tick_rate_ms {
            config.tick_rate_ms = ms;
        }
        if let Some(path) = &self.history_file {
            config.history_file = Some(path.clone());
        }
        config
    }

    fn history_store(&self, config: &Config) -> Box<dyn HistoryStore> {
        let file_store = match &config.history_file {
            Some(path) => FileHistoryStore::with_path(path),
            None => FileHistoryStore::new(),
        };
        if self.no_save {
            Box::new(MemoryHistoryStore::with_records(file_store.load_all()))
        } else {
            Box::new(file_store)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryView {
    Records,
    Summary,
}

#[derive(Debug)]
pub struct App {
    pub tester: Tester,
    pub history_view: HistoryView,
}

impl App {
    pub fn new(tester: Tester) -> Self {
        Self {
            tester,
            history_view: HistoryView::Records,
        }
    }

    pub fn toggle_history_view(&mut self) {
        self.history_view = match self.history_view {
            HistoryView::Records => HistoryView::Summary,
            HistoryView::Summary => HistoryView::Records,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(path) = logging::init() {
        tracing::info!(log = %path.display(), "logging enabled");
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    let mut store = cli.history_store(&config);

    if let Some(command) = &cli.command {
        return run_command(command, store.as_mut(), &mut io::stdout());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(Tester::new(
        store,
        Box::new(SystemClock),
        config.default_level,
    ));
    let runner = Runner::with_tick_millis(ChannelSource::terminal(), config.tick_rate_ms);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Non-interactive subcommands; output goes to `out`
fn run_command<W: Write>(
    command: &Command,
    store: &mut dyn HistoryStore,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let records = store.load_all();
    match command {
        Command::History { summary: false } => {
            if records.is_empty() {
                writeln!(out, "No records.")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<4} {:<14} {:>10} {:>10} {:>10}",
                "#", "level", "time", "wpm", "accuracy"
            )?;
            for (idx, r) in records.iter().enumerate() {
                writeln!(
                    out,
                    "{:<4} {:<14} {:>10} {:>10} {:>10}",
                    idx + 1,
                    r.level.to_string(),
                    two_decimals(r.time),
                    two_decimals(r.wpm),
                    format!("{}%", two_decimals(r.accuracy)),
                )?;
            }
        }
        Command::History { summary: true } => {
            let summary = summarize(&records);
            if summary.is_empty() {
                writeln!(out, "No records.")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<14} {:>8} {:>10} {:>10} {:>8} {:>10}",
                "level", "attempts", "best wpm", "avg wpm", "sd", "best time"
            )?;
            for s in summary {
                writeln!(
                    out,
                    "{:<14} {:>8} {:>10} {:>10} {:>8} {:>10}",
                    s.level.to_string(),
                    s.attempts,
                    two_decimals(s.best_wpm),
                    two_decimals(s.average_wpm),
                    two_decimals(s.wpm_std_dev),
                    two_decimals(s.best_time),
                )?;
            }
        }
        Command::Export { path } => {
            if path.as_os_str() == "-" {
                export_csv(&records, &mut *out)?;
            } else {
                export_csv(&records, File::create(path)?)?;
                writeln!(
                    out,
                    "Exported {} records to {}",
                    records.len(),
                    path.display()
                )?;
            }
        }
        Command::Clear => {
            if records.is_empty() {
                writeln!(out, "{}", Notice::NothingToClear)?;
            } else {
                store.clear()?;
                writeln!(out, "{}", Notice::HistoryCleared)?;
            }
        }
    }
    Ok(())
}

fn run_app<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                // only redraw while the elapsed time is moving
                if app.tester.is_ticking() {
                    app.tester.on_tick();
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if handle_key(app, key) == KeyOutcome::Quit {
                    app.tester.abort();
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        // ctrl+c to quit; other chords are not input
        if key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }
        return KeyOutcome::Continue;
    }

    match key.code {
        KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Tab => app.tester.cycle_level(true),
        KeyCode::BackTab => app.tester.cycle_level(false),
        _ if app.tester.session().is_running() => match key.code {
            KeyCode::Enter => app.tester.submit(),
            KeyCode::Backspace => app.tester.backspace(),
            KeyCode::Char(c) => app.tester.type_char(c),
            _ => {}
        },
        KeyCode::Enter | KeyCode::Char('s') => app.tester.start(),
        KeyCode::Char('1') => app.tester.select_level(Level::Beginner),
        KeyCode::Char('2') => app.tester.select_level(Level::Intermediate),
        KeyCode::Char('3') => app.tester.select_level(Level::Advanced),
        KeyCode::Char('r') => app.tester.restart(),
        KeyCode::Char('c') => app.tester.clear_history(),
        KeyCode::Char('h') => app.toggle_history_view(),
        KeyCode::Char('q') => return KeyOutcome::Quit,
        _ => {}
    }

    KeyOutcome::Continue
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
