// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI).
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// Only the monitor and its tests are live off Windows.
#![cfg_attr(not(windows), allow(dead_code))]

mod config;
mod error;
mod monitor;
mod platform;
mod progress;

use config::LauncherConfig;

fn main() {
    // Release builds have no console to log to.
    #[cfg(debug_assertions)]
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());

    if let Err(e) = platform::run(LauncherConfig::default()) {
        // Startup failed before or during the message loop.
        // A modal dialog is the only output a release GUI build has.
        log::error!("loader failed: {e}");
        platform::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }
}
