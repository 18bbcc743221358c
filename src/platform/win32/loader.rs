// ── Monitor-facing side of the loader window ──────────────────────────────────
//
// The monitor thread never calls into a window directly.  `LoaderWindow`
// turns each request into a posted message that WndProc applies on the UI
// thread; `TitleProbe` answers the "has the target shown its window" query.

#![allow(unsafe_code)]

use std::ffi::c_void;

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HWND, LPARAM, WPARAM},
        UI::WindowsAndMessaging::{FindWindowW, PostMessageW, WM_CLOSE},
    },
};

use super::{
    to_wide,
    window::{WM_APP_LAUNCH_FAILED, WM_APP_PROGRESS},
};
use crate::monitor::{LoaderSink, WindowProbe};

// ── LoaderWindow ──────────────────────────────────────────────────────────────

/// Cross-thread handle to the loader window.
///
/// Stores the raw handle value because `HWND` wraps a pointer and is not
/// `Send`.  Posting to a window that has already been destroyed fails and is
/// ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoaderWindow {
    hwnd: isize,
}

impl LoaderWindow {
    pub(crate) fn new(hwnd: HWND) -> Self {
        Self {
            hwnd: hwnd.0 as isize,
        }
    }

    fn post(self, msg: u32, wparam: usize) {
        // SAFETY: PostMessageW only queues the message; no pointers are
        // transferred and a stale handle makes the call fail harmlessly.
        unsafe {
            let _ = PostMessageW(
                HWND(self.hwnd as *mut c_void),
                msg,
                WPARAM(wparam),
                LPARAM(0),
            );
        }
    }
}

impl LoaderSink for LoaderWindow {
    fn set_progress(&self, position: u32) {
        self.post(WM_APP_PROGRESS, position as usize);
    }

    fn close(&self) {
        self.post(WM_CLOSE, 0);
    }

    fn fail_launch(&self) {
        self.post(WM_APP_LAUNCH_FAILED, 0);
    }
}

// ── TitleProbe ────────────────────────────────────────────────────────────────

/// Exact-title lookup over every top-level window on the desktop.
///
/// Not scoped to the spawned process: any window with the same title counts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TitleProbe;

impl WindowProbe for TitleProbe {
    fn window_exists(&self, title: &str) -> bool {
        let title = to_wide(title);
        // SAFETY: title is a null-terminated UTF-16 buffer that outlives the
        // call; a null class name matches any class.
        let found = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(title.as_ptr())) };
        found.is_ok_and(|hwnd| !hwnd.is_invalid())
    }
}
