// Library surface for the binary and headless/integration tests.
pub mod accuracy;
pub mod app_dirs;
pub mod config;
pub mod format;
pub mod history;
pub mod level;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod tester;
pub mod util;

pub use level::Level;
pub use tester::Tester;
