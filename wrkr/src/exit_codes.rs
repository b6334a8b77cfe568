#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The script could not be loaded, or a VU failed to initialize it.
    ScriptError = 20,

    /// Invalid CLI flags or script options.
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, failed tasks).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
