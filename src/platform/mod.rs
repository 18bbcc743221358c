// ── Platform abstraction layer ────────────────────────────────────────────────
//
// The loader window only exists on Windows.  All Win32 FFI is confined to
// the `win32` sub-module and never leaks outward; on other hosts `run`
// reports the platform as unsupported so the rest of the crate (and its
// tests) still builds.

#[cfg(windows)]
pub mod win32;

#[cfg(windows)]
pub(crate) use win32::window::{run, show_error_dialog};

#[cfg(not(windows))]
pub(crate) fn run(_config: crate::config::LauncherConfig) -> crate::error::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "the loader window requires Windows",
    )
    .into())
}

#[cfg(not(windows))]
pub(crate) fn show_error_dialog(message: &str) {
    eprintln!("tucan-loader: {message}");
}
