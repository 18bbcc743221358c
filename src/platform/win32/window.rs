// ── Loader window ─────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the loader window class.
//   • Create the centred, always-on-top popup with its status label and
//     progress bar.
//   • Start the process monitor and run the Win32 message loop.
//   • Apply the monitor's posted requests (progress, launch failure, close)
//     on the UI thread in WndProc.
//   • Expose a safe fatal-error dialog helper for use by main().

#![allow(unsafe_code)]

use std::cell::RefCell;

use log::{debug, info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetSysColorBrush, UpdateWindow, COLOR_WINDOW},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Controls::{
                InitCommonControlsEx, ICC_PROGRESS_CLASS, INITCOMMONCONTROLSEX, PBM_SETPOS,
                PBM_SETRANGE, PBM_SETSTEP, PBS_SMOOTH, PROGRESS_CLASSW,
            },
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
                GetSystemMetrics, LoadCursorW, LoadIconW, MessageBoxW, PostQuitMessage,
                RegisterClassExW, SendMessageW, ShowWindow, TranslateMessage, HMENU, IDC_ARROW,
                IDI_APPLICATION, MB_ICONERROR, MB_OK, MSG, SM_CXSCREEN, SM_CYSCREEN, SS_CENTER, SW_SHOW,
                WINDOW_EX_STYLE, WINDOW_STYLE, WM_APP, WM_CLOSE, WM_DESTROY, WNDCLASSEXW,
                WS_BORDER, WS_CAPTION, WS_CHILD, WS_EX_TOPMOST, WS_POPUP, WS_VISIBLE,
            },
        },
    },
};

use super::{
    dpi,
    loader::{LoaderWindow, TitleProbe},
    to_wide,
};
use crate::{
    config::{LauncherConfig, LoaderLayout, Rect, Size},
    error::{LoaderError, Result},
    monitor::{process, MonitorHandle, Watch},
    progress::RANGE_MAX,
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register the loader window class.
const CLASS_NAME: PCWSTR = w!("LoaderWindow");

const STATIC_CLASS: PCWSTR = w!("STATIC");

// ── Requests posted by the monitor thread ─────────────────────────────────────

/// Set the progress bar position; WPARAM carries the new position.
pub(super) const WM_APP_PROGRESS: u32 = WM_APP + 1;

/// The target could not be started; show the error dialog and close.
pub(super) const WM_APP_LAUNCH_FAILED: u32 = WM_APP + 2;

// ── UI-thread state ───────────────────────────────────────────────────────────

/// What WndProc needs beyond its arguments.  Lives only on the UI thread.
struct LoaderState {
    progress: Option<HWND>,
    error_title: Vec<u16>,
    error_text: Vec<u16>,
}

std::thread_local! {
    static LOADER_STATE: RefCell<Option<LoaderState>> = const { RefCell::new(None) };
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Show the loader, launch the target and pump messages until the loader
/// window is destroyed.  The monitor thread is stopped and joined before
/// returning.
pub(crate) fn run(config: LauncherConfig) -> Result<()> {
    #[cfg(debug_assertions)]
    let t0 = std::time::Instant::now();

    dpi::init();
    init_common_controls();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(win32("GetModuleHandleW"))?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;

    let system_dpi = dpi::get_system_dpi();
    let layout = LoaderLayout::compute(config.window_size, screen_size(), |v| dpi::scale(v, system_dpi));
    debug!("loader layout at {system_dpi} dpi: {layout:?}");

    let hwnd = create_window(hinstance, &config, &layout)?;
    let progress = create_children(hwnd, hinstance, &config, &layout)?;

    LOADER_STATE.with(|slot| {
        *slot.borrow_mut() = Some(LoaderState {
            progress: Some(progress),
            error_title: to_wide(&config.error_title),
            error_text: to_wide(&config.error_text),
        });
    });

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // Return values (previous visibility, success BOOL) are intentionally
    // ignored.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    #[cfg(debug_assertions)]
    debug!("loader visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

    let target_path = config.target_path.clone();
    let monitor = MonitorHandle::spawn(
        Watch {
            sink: LoaderWindow::new(hwnd),
            probe: TitleProbe,
            target_title: config.target_title.clone(),
            poll_interval: config.poll_interval,
        },
        move || process::spawn_target(&target_path),
    )?;

    let result = message_loop();

    match monitor.stop() {
        Some(outcome) => info!("monitor finished: {outcome:?}"),
        None => warn!("monitor thread panicked"),
    }
    LOADER_STATE.with(|slot| slot.borrow_mut().take());

    result
}

/// Show a modal error dialog with the given message.
///
/// Used by `main()` when `run()` fails before or during the message loop.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide = to_wide(message);

    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            w!("Tucan Max Loader: Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

/// Register the progress-bar class from comctl32.  Failure leaves the class
/// unregistered and surfaces later as a CreateWindowExW error.
fn init_common_controls() {
    let icc = INITCOMMONCONTROLSEX {
        dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
        dwICC: ICC_PROGRESS_CLASS,
    };
    // SAFETY: icc is fully initialised and outlives the call.
    let _ = unsafe { InitCommonControlsEx(&icc) };
}

fn screen_size() -> Size {
    // SAFETY: GetSystemMetrics has no preconditions.
    unsafe {
        Size {
            width: GetSystemMetrics(SM_CXSCREEN),
            height: GetSystemMetrics(SM_CYSCREEN),
        }
    }
}

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: IDI_APPLICATION and IDC_ARROW are built-in resources present on
    // every Windows version.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(win32("LoadIconW"))?;
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(win32("LoadCursorW"))?;

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        // SAFETY: system colour brushes are owned by the system and never
        // need to be freed.
        hbrBackground: unsafe { GetSysColorBrush(COLOR_WINDOW) },
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

fn create_window(hinstance: HINSTANCE, config: &LauncherConfig, layout: &LoaderLayout) -> Result<HWND> {
    let title = to_wide(&config.window_title);
    let Rect { x, y, width, height } = layout.window;

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module;
    // title outlives the call.  Null parent → top-level window.
    unsafe {
        CreateWindowExW(
            WS_EX_TOPMOST,
            CLASS_NAME,
            PCWSTR(title.as_ptr()),
            WS_POPUP | WS_BORDER | WS_CAPTION,
            x,
            y,
            width,
            height,
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(win32("CreateWindowExW"))
}

/// Create the status label and the progress bar; returns the progress bar.
fn create_children(
    hwnd: HWND,
    hinstance: HINSTANCE,
    config: &LauncherConfig,
    layout: &LoaderLayout,
) -> Result<HWND> {
    let text = to_wide(&config.status_text);
    let label = layout.label;

    // SAFETY: hwnd is the freshly created loader window; text outlives the
    // call.  STATIC is a system class and always registered.
    unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            STATIC_CLASS,
            PCWSTR(text.as_ptr()),
            WS_VISIBLE | WS_CHILD | WINDOW_STYLE(SS_CENTER.0),
            label.x,
            label.y,
            label.width,
            label.height,
            hwnd,
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(win32("CreateWindowExW (label)"))?;

    let bar = layout.progress;
    // SAFETY: as above; the progress class was registered by
    // init_common_controls().
    let progress = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            PROGRESS_CLASSW,
            PCWSTR::null(),
            WS_VISIBLE | WS_CHILD | WINDOW_STYLE(PBS_SMOOTH),
            bar.x,
            bar.y,
            bar.width,
            bar.height,
            hwnd,
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(win32("CreateWindowExW (progress)"))?;

    // SAFETY: progress is a valid progress-bar window.
    unsafe {
        let _ = SendMessageW(progress, PBM_SETRANGE, WPARAM(0), progress_range(RANGE_MAX));
        let _ = SendMessageW(progress, PBM_SETSTEP, WPARAM(1), LPARAM(0));
    }

    Ok(progress)
}

/// `PBM_SETRANGE` argument: MAKELPARAM(0, max).
fn progress_range(max: u32) -> LPARAM {
    LPARAM(((max & 0xFFFF) as isize) << 16)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop() -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            // WM_QUIT, posted from WM_DESTROY.
            0 => break,
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessageW call.
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            // DestroyWindow triggers WM_DESTROY, which posts WM_QUIT.
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_APP_PROGRESS => {
            let progress = LOADER_STATE.with(|slot| slot.borrow().as_ref().and_then(|s| s.progress));
            if let Some(bar) = progress {
                // SAFETY: bar is a child of hwnd and lives as long as it does.
                let _ = SendMessageW(bar, PBM_SETPOS, wparam, LPARAM(0));
            }
            LRESULT(0)
        }

        WM_APP_LAUNCH_FAILED => {
            // Copy the text out first: MessageBoxW runs a nested message loop
            // that re-enters this procedure.
            let copy = LOADER_STATE.with(|slot| {
                slot.borrow()
                    .as_ref()
                    .map(|s| (s.error_title.clone(), s.error_text.clone()))
            });
            if let Some((title, text)) = copy {
                // SAFETY: title and text are null-terminated UTF-16 buffers
                // that outlive the call; hwnd owns the dialog.
                let _ = MessageBoxW(
                    hwnd,
                    PCWSTR(text.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    MB_OK | MB_ICONERROR,
                );
            }
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        // SAFETY: hwnd and message parameters are valid, provided by Windows.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Map a windows-crate error to a `LoaderError` naming the failing call.
fn win32(function: &'static str) -> impl Fn(windows::core::Error) -> LoaderError {
    move |e| LoaderError::Win32 {
        function,
        code: e.code().0 as u32,
    }
}

/// Capture the current Win32 last-error code and wrap it in a `LoaderError`.
///
/// Call immediately after a Win32 function that signals failure: `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> LoaderError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    LoaderError::Win32 {
        function,
        code: code.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
