//! Engine boundary adapter
//!
//! The engine is reached only through the [`Engine`] trait, a pass-through of
//! the engine's C API with opaque handle newtypes. The wrappers in this module
//! turn its handles into managed objects:
//!
//! - [`WeldModule`]: compile a program and run it
//! - [`WeldValue`]: an engine value wrapping a struct's address
//! - [`WeldError`]: an engine error handle (code 0 means success)
//! - [`WeldConf`]: an engine key/value configuration
//!
//! Every call that takes an error handle is checked before its output is
//! touched. On failure the error and any output handle are released, and the
//! failure surfaces as [`MarshalError::Engine`].
//!
//! With the `native` feature, [`native::NativeEngine`] binds the linked
//! engine library.

mod conf;
mod error;
mod module;
#[cfg(feature = "native")]
pub mod native;
mod value;

pub use conf::WeldConf;
pub use error::WeldError;
pub use module::WeldModule;
pub use value::WeldValue;

use crate::errors::{MarshalError, Result};
use crate::managed::Managed;
use crate::memory::Address;
use std::ffi::{CStr, CString};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

macro_rules! engine_handle {
    ($($(#[$doc:meta])* $name:ident),*) => {
        $(
            $(#[$doc])*
            #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
            pub struct $name(pub u64);

            impl $name {
                pub const NULL: $name = $name(0);

                pub fn is_null(self) -> bool {
                    self.0 == 0
                }
            }
        )*
    };
}

engine_handle!(
    /// Engine value handle
    ValueRef,
    /// Compiled module handle
    ModuleRef,
    /// Error handle
    ErrorRef,
    /// Configuration handle
    ConfRef
);

/// The engine's C API
///
/// Implementations forward each call to the engine unchanged. Handles passed
/// in were returned by the same engine and have not been freed.
pub trait Engine: Send + Sync {
    fn compile(&self, code: &CStr, conf: ConfRef, err: ErrorRef) -> ModuleRef;
    fn run(&self, module: ModuleRef, conf: ConfRef, input: ValueRef, err: ErrorRef) -> ValueRef;
    fn module_free(&self, module: ModuleRef);

    fn value_new(&self, data: Address) -> ValueRef;
    fn value_data(&self, value: ValueRef) -> Address;
    /// Run id of a value produced by `run`; -1 for values created by the caller
    fn value_run_id(&self, value: ValueRef) -> i64;
    fn value_free(&self, value: ValueRef);

    fn error_new(&self) -> ErrorRef;
    fn error_code(&self, err: ErrorRef) -> i32;
    fn error_message(&self, err: ErrorRef) -> String;
    fn error_free(&self, err: ErrorRef);

    fn conf_new(&self) -> ConfRef;
    fn conf_get(&self, conf: ConfRef, key: &CStr) -> Option<String>;
    fn conf_set(&self, conf: ConfRef, key: &CStr, value: &CStr);
    fn conf_free(&self, conf: ConfRef);

    fn load_library(&self, filename: &CStr, err: ErrorRef);
    fn set_log_level(&self, level: LogLevel);
}

/// Engine shared by all handles created from it
pub type SharedEngine = Arc<dyn Engine>;

/// Engine log verbosity
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn name(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = MarshalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(MarshalError::InvalidLogLevel {
                level: s.to_string(),
            }),
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::DEBUG => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convert text for the C boundary
pub(crate) fn c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|e| MarshalError::InvalidString {
        message: e.to_string(),
    })
}

/// Load a dynamic library into the engine so compiled programs can call into it
pub fn load_library(engine: &SharedEngine, filename: &str) -> Result<()> {
    let filename_c = c_string(filename)?;
    let mut err = WeldError::new(engine);
    engine.load_library(&filename_c, err.handle());
    let result = err.check();
    err.close();
    result?;
    debug!(filename, "loaded library into engine");
    Ok(())
}

/// Set the engine's log level from its name, e.g. `"debug"`
pub fn set_log_level(engine: &SharedEngine, level: &str) -> Result<()> {
    let level: LogLevel = level.parse()?;
    engine.set_log_level(level);
    debug!(%level, "set engine log level");
    Ok(())
}
