//! Binding to the linked engine library (`libweld`)
//!
//! The C API hands out opaque pointers for every handle kind. They are carried
//! through the [`Engine`] trait as 64-bit handle values and turned back into
//! pointers only here.

use super::{ConfRef, Engine, ErrorRef, LogLevel, ModuleRef, ValueRef};
use crate::memory::Address;
use libc::{c_char, c_int, c_void};
use std::ffi::CStr;

type Handle = *mut c_void;

#[link(name = "weld")]
extern "C" {
    fn weld_value_new(data: *const c_void) -> Handle;
    fn weld_value_run(value: Handle) -> i64;
    fn weld_value_data(value: Handle) -> *mut c_void;
    fn weld_value_free(value: Handle);

    fn weld_module_compile(code: *const c_char, conf: Handle, err: Handle) -> Handle;
    fn weld_module_run(module: Handle, conf: Handle, input: Handle, err: Handle) -> Handle;
    fn weld_module_free(module: Handle);

    fn weld_error_new() -> Handle;
    fn weld_error_code(err: Handle) -> c_int;
    fn weld_error_message(err: Handle) -> *const c_char;
    fn weld_error_free(err: Handle);

    fn weld_conf_new() -> Handle;
    fn weld_conf_get(conf: Handle, key: *const c_char) -> *const c_char;
    fn weld_conf_set(conf: Handle, key: *const c_char, value: *const c_char);
    fn weld_conf_free(conf: Handle);

    fn weld_load_library(filename: *const c_char, err: Handle);
    fn weld_set_log_level(level: u64);
}

fn ptr(handle: u64) -> Handle {
    handle as usize as Handle
}

fn handle(ptr: *const c_void) -> u64 {
    ptr as usize as u64
}

/// Copy a C string owned by the engine
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Numeric level understood by `weld_set_log_level`
fn level_code(level: LogLevel) -> u64 {
    match level {
        LogLevel::Off => 0,
        LogLevel::Error => 1,
        LogLevel::Warn => 2,
        LogLevel::Info => 3,
        LogLevel::Debug => 4,
        LogLevel::Trace => 5,
    }
}

/// The process-wide engine library
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        NativeEngine
    }
}

impl Engine for NativeEngine {
    fn compile(&self, code: &CStr, conf: ConfRef, err: ErrorRef) -> ModuleRef {
        let module = unsafe { weld_module_compile(code.as_ptr(), ptr(conf.0), ptr(err.0)) };
        ModuleRef(handle(module))
    }

    fn run(&self, module: ModuleRef, conf: ConfRef, input: ValueRef, err: ErrorRef) -> ValueRef {
        let output =
            unsafe { weld_module_run(ptr(module.0), ptr(conf.0), ptr(input.0), ptr(err.0)) };
        ValueRef(handle(output))
    }

    fn module_free(&self, module: ModuleRef) {
        unsafe { weld_module_free(ptr(module.0)) }
    }

    fn value_new(&self, data: Address) -> ValueRef {
        let value = unsafe { weld_value_new(data.get() as usize as *const c_void) };
        ValueRef(handle(value))
    }

    fn value_data(&self, value: ValueRef) -> Address {
        Address::new(handle(unsafe { weld_value_data(ptr(value.0)) }))
    }

    fn value_run_id(&self, value: ValueRef) -> i64 {
        unsafe { weld_value_run(ptr(value.0)) }
    }

    fn value_free(&self, value: ValueRef) {
        unsafe { weld_value_free(ptr(value.0)) }
    }

    fn error_new(&self) -> ErrorRef {
        ErrorRef(handle(unsafe { weld_error_new() }))
    }

    fn error_code(&self, err: ErrorRef) -> i32 {
        unsafe { weld_error_code(ptr(err.0)) }
    }

    fn error_message(&self, err: ErrorRef) -> String {
        unsafe { owned_string(weld_error_message(ptr(err.0))) }.unwrap_or_default()
    }

    fn error_free(&self, err: ErrorRef) {
        unsafe { weld_error_free(ptr(err.0)) }
    }

    fn conf_new(&self) -> ConfRef {
        ConfRef(handle(unsafe { weld_conf_new() }))
    }

    fn conf_get(&self, conf: ConfRef, key: &CStr) -> Option<String> {
        unsafe { owned_string(weld_conf_get(ptr(conf.0), key.as_ptr())) }
    }

    fn conf_set(&self, conf: ConfRef, key: &CStr, value: &CStr) {
        unsafe { weld_conf_set(ptr(conf.0), key.as_ptr(), value.as_ptr()) }
    }

    fn conf_free(&self, conf: ConfRef) {
        unsafe { weld_conf_free(ptr(conf.0)) }
    }

    fn load_library(&self, filename: &CStr, err: ErrorRef) {
        unsafe { weld_load_library(filename.as_ptr(), ptr(err.0)) }
    }

    fn set_log_level(&self, level: LogLevel) {
        unsafe { weld_set_log_level(level_code(level)) }
    }
}
