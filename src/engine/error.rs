use super::{ErrorRef, SharedEngine};
use crate::errors::{MarshalError, Result};
use crate::managed::{Lifecycle, Managed};
use tracing::warn;

/// An engine error handle
///
/// Passed to every fallible engine call, then inspected with
/// [`check`](Self::check). Code 0 means the call succeeded.
pub struct WeldError {
    engine: SharedEngine,
    handle: ErrorRef,
    lifecycle: Lifecycle,
}

impl WeldError {
    pub fn new(engine: &SharedEngine) -> Self {
        WeldError {
            engine: engine.clone(),
            handle: engine.error_new(),
            lifecycle: Lifecycle::new(),
        }
    }

    #[track_caller]
    pub fn handle(&self) -> ErrorRef {
        self.check_access();
        self.handle
    }

    #[track_caller]
    pub fn code(&self) -> i32 {
        self.engine.error_code(self.handle())
    }

    #[track_caller]
    pub fn message(&self) -> String {
        self.engine.error_message(self.handle())
    }

    pub fn is_success(&self) -> bool {
        self.code() == 0
    }

    /// `Ok` for code 0, otherwise the engine's code and message
    pub fn check(&self) -> Result<()> {
        match self.code() {
            0 => Ok(()),
            code => {
                let message = self.message();
                warn!(code, %message, "engine call failed");
                Err(MarshalError::Engine { code, message })
            }
        }
    }
}

impl Managed for WeldError {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        self.engine.error_free(self.handle);
    }

    fn kind(&self) -> &'static str {
        "error"
    }
}

impl Drop for WeldError {
    fn drop(&mut self) {
        self.finalize();
    }
}
