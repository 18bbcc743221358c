// ── Central error type ────────────────────────────────────────────────────────
//
// Startup failures (window class, window, child controls, worker thread)
// return `error::Result<T>` and surface as a fatal dialog from `main()`.
// Launch failure and premature target exit are NOT errors here: the monitor
// reports them through its outcome and the loader closes normally.

/// Every error the loader can produce.
#[derive(Debug)]
pub enum LoaderError {
    /// A Win32 API call returned a failure code.
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (process or thread spawn).
    Io(std::io::Error),
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Win32 { .. } => None,
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LoaderError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
