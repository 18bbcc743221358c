// ── Launcher configuration ────────────────────────────────────────────────────
//
// Everything the loader needs to know is compiled in: there is no config
// file, no command line and no environment lookup.  `LauncherConfig` only
// gives those constants a single typed home so the window controller and
// the process monitor read them from the same place.
//
// No `unsafe`, no Win32 imports; the geometry helpers are pure.

use std::{path::PathBuf, time::Duration};

// ── Compiled-in values ────────────────────────────────────────────────────────

/// Executable started by the loader, relative to the working directory.
const TARGET_PATH: &str = "appdata/TucanMax.exe";

/// Exact title of the target's main window.  Its appearance closes the loader.
const TARGET_TITLE: &str = "TUCAN MAX";

const WINDOW_TITLE: &str = "TucanMax se esta iniciando...";
const STATUS_TEXT: &str = "Tucan Max se esta iniciando\nPor favor espere...";
const ERROR_TITLE: &str = "Error";
const ERROR_TEXT: &str = "No se pudo ejecutar la app principal.";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Loader window size in logical (96 DPI) units.
const WINDOW_WIDTH: i32 = 400;
const WINDOW_HEIGHT: i32 = 150;

// ── LauncherConfig ────────────────────────────────────────────────────────────

/// What to launch, what to wait for, and what the splash says meanwhile.
#[derive(Debug, Clone)]
pub(crate) struct LauncherConfig {
    /// Path handed to the process spawner as-is (no existence check).
    pub(crate) target_path: PathBuf,
    /// Title matched exactly against every top-level window.
    pub(crate) target_title: String,
    pub(crate) window_title: String,
    /// Copy shown above the progress bar.
    pub(crate) status_text: String,
    pub(crate) error_title: String,
    /// Body of the modal dialog shown when the target cannot be started.
    pub(crate) error_text: String,
    /// Delay between two monitor iterations.
    pub(crate) poll_interval: Duration,
    /// Loader window size in logical units.
    pub(crate) window_size: Size,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            target_path: PathBuf::from(TARGET_PATH),
            target_title: TARGET_TITLE.to_owned(),
            window_title: WINDOW_TITLE.to_owned(),
            status_text: STATUS_TEXT.to_owned(),
            error_title: ERROR_TITLE.to_owned(),
            error_text: ERROR_TEXT.to_owned(),
            poll_interval: POLL_INTERVAL,
            window_size: Size {
                width: WINDOW_WIDTH,
                height: WINDOW_HEIGHT,
            },
        }
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Size {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/// A rectangle as `CreateWindowExW` wants it: origin plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/// Placement of the loader window and its two children, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoaderLayout {
    /// Window rectangle in screen coordinates.
    pub(crate) window: Rect,
    /// Status label, client coordinates.
    pub(crate) label: Rect,
    /// Progress bar, client coordinates.
    pub(crate) progress: Rect,
}

impl LoaderLayout {
    /// Compute the layout for a `screen`-sized primary display.
    ///
    /// `scale` maps a logical length to device pixels (identity at 96 DPI).
    /// The window is centred once; a screen smaller than the window yields a
    /// negative origin, which is passed through unchanged.
    pub(crate) fn compute(size: Size, screen: Size, scale: impl Fn(i32) -> i32) -> Self {
        let width = scale(size.width);
        let height = scale(size.height);

        Self {
            window: Rect {
                x: (screen.width - width) / 2,
                y: (screen.height - height) / 2,
                width,
                height,
            },
            label: Rect {
                x: scale(20),
                y: scale(20),
                width: scale(size.width - 40),
                height: scale(40),
            },
            progress: Rect {
                x: scale(40),
                y: scale(75),
                width: scale(size.width - 80),
                height: scale(25),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
