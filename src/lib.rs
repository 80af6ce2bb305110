// Library surface for the binary, headless runs and integration tests.
pub mod analysis;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod logging;
pub mod recorder;
pub mod rhythm;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod waveform;

pub use app::App;

pub const TICK_RATE_MS: u64 = 100;
