// In-process engine used by the integration tests
//
// Handles are plain counters. Every live handle is tracked, so tests can
// assert that the adapter released everything it created; freeing an unknown
// handle panics.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::{Arc, Mutex};
use weld_marshal::engine::{ConfRef, Engine, ErrorRef, LogLevel, ModuleRef, SharedEngine, ValueRef};
use weld_marshal::types::parse::parse_struct;
use weld_marshal::view::StructView;
use weld_marshal::{Address, Value, WeldStruct};

/// A program maps the input data address to an output struct, or to an engine error
pub type Program = Box<dyn Fn(Address) -> Result<WeldStruct<'static>, (i32, String)> + Send + Sync>;

struct FakeValue {
    data: Address,
    run_id: i64,
    // Output block, kept alive until the value is freed
    _output: Option<WeldStruct<'static>>,
}

#[derive(Default)]
struct State {
    next_handle: u64,
    runs: i64,
    values: FxHashMap<u64, FakeValue>,
    modules: FxHashMap<u64, String>,
    errors: FxHashMap<u64, (i32, String)>,
    confs: FxHashMap<u64, FxHashMap<String, String>>,
    libraries: Vec<String>,
    log_level: Option<LogLevel>,
}

impl State {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn fail(&mut self, err: ErrorRef, code: i32, message: String) {
        let slot = self
            .errors
            .get_mut(&err.0)
            .unwrap_or_else(|| panic!("unknown error handle {}", err.0));
        *slot = (code, message);
    }
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<State>,
    programs: FxHashMap<String, Program>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program<F>(mut self, code: &str, program: F) -> Self
    where
        F: Fn(Address) -> Result<WeldStruct<'static>, (i32, String)> + Send + Sync + 'static,
    {
        self.programs.insert(code.to_string(), Box::new(program));
        self
    }

    /// Engine with the programs used across the tests:
    /// - `sum`: `{vec[i64]}` to `{i64}`
    /// - `stats`: `{vec[f64]}` to `{i64, f64, vec[f64]}` (count, total, running totals)
    /// - `fail`: always fails with code 5
    pub fn standard() -> Self {
        FakeEngine::new()
            .with_program("sum", |data| {
                let input = decode(data, "{vec[i64]}");
                let total: i64 = input.get_vec(0).to_i64_vec().iter().sum();
                Ok(WeldStruct::build(&[Value::I64(total)]).expect("build output"))
            })
            .with_program("stats", |data| {
                let input = decode(data, "{vec[f64]}");
                let values = input.get_vec(0).to_f64_vec();
                let running: Vec<f64> = values
                    .iter()
                    .scan(0.0, |acc, v| {
                        *acc += v;
                        Some(*acc)
                    })
                    .collect();
                let total = running.last().copied().unwrap_or(0.0);
                Ok(WeldStruct::build(&[
                    Value::I64(values.len() as i64),
                    Value::F64(total),
                    weld_marshal::VecBuilder::f64s(running).into(),
                ])
                .expect("build output"))
            })
            .with_program("fail", |_| Err((5, "Weld program failed at runtime".to_string())))
    }

    pub fn shared(self) -> Arc<FakeEngine> {
        Arc::new(self)
    }

    pub fn live_values(&self) -> usize {
        self.state.lock().unwrap().values.len()
    }

    pub fn live_modules(&self) -> usize {
        self.state.lock().unwrap().modules.len()
    }

    pub fn live_errors(&self) -> usize {
        self.state.lock().unwrap().errors.len()
    }

    pub fn live_confs(&self) -> usize {
        self.state.lock().unwrap().confs.len()
    }

    pub fn live_handles(&self) -> usize {
        self.live_values() + self.live_modules() + self.live_errors() + self.live_confs()
    }

    pub fn libraries(&self) -> Vec<String> {
        self.state.lock().unwrap().libraries.clone()
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.state.lock().unwrap().log_level
    }
}

/// Shared engine handle plus the fake behind it, for inspecting live handles
pub fn engine() -> (SharedEngine, Arc<FakeEngine>) {
    let fake = FakeEngine::standard().shared();
    let engine: SharedEngine = fake.clone();
    (engine, fake)
}

fn decode(data: Address, ty: &str) -> StructView<'static> {
    let ty = parse_struct(ty).expect("valid type");
    unsafe { StructView::new(data, ty) }
}

fn text(s: &CStr) -> String {
    s.to_str().expect("utf-8").to_string()
}

impl Engine for FakeEngine {
    fn compile(&self, code: &CStr, conf: ConfRef, err: ErrorRef) -> ModuleRef {
        let code = text(code);
        let mut state = self.state.lock().unwrap();
        assert!(state.confs.contains_key(&conf.0), "unknown conf handle {}", conf.0);
        if !self.programs.contains_key(&code) {
            state.fail(err, 3, format!("Undefined symbol {} in uniquify", code));
        }
        // A module handle is returned even on failure; the caller must free it
        let handle = state.handle();
        state.modules.insert(handle, code);
        ModuleRef(handle)
    }

    fn run(&self, module: ModuleRef, conf: ConfRef, input: ValueRef, err: ErrorRef) -> ValueRef {
        let (code, data) = {
            let state = self.state.lock().unwrap();
            assert!(state.confs.contains_key(&conf.0), "unknown conf handle {}", conf.0);
            let code = state
                .modules
                .get(&module.0)
                .unwrap_or_else(|| panic!("unknown module handle {}", module.0))
                .clone();
            let data = state
                .values
                .get(&input.0)
                .unwrap_or_else(|| panic!("unknown value handle {}", input.0))
                .data;
            (code, data)
        };
        let program = self.programs.get(&code).expect("compiled module has a program");
        let result = program(data);

        let mut state = self.state.lock().unwrap();
        let handle = state.handle();
        let value = match result {
            Ok(output) => {
                state.runs += 1;
                FakeValue {
                    data: output.address(),
                    run_id: state.runs,
                    _output: Some(output),
                }
            }
            Err((code, message)) => {
                state.fail(err, code, message);
                FakeValue {
                    data: Address::NULL,
                    run_id: -1,
                    _output: None,
                }
            }
        };
        state.values.insert(handle, value);
        ValueRef(handle)
    }

    fn module_free(&self, module: ModuleRef) {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.modules.remove(&module.0).is_some(),
            "double free of module handle {}",
            module.0
        );
    }

    fn value_new(&self, data: Address) -> ValueRef {
        let mut state = self.state.lock().unwrap();
        let handle = state.handle();
        state.values.insert(
            handle,
            FakeValue {
                data,
                run_id: -1,
                _output: None,
            },
        );
        ValueRef(handle)
    }

    fn value_data(&self, value: ValueRef) -> Address {
        let state = self.state.lock().unwrap();
        state
            .values
            .get(&value.0)
            .unwrap_or_else(|| panic!("unknown value handle {}", value.0))
            .data
    }

    fn value_run_id(&self, value: ValueRef) -> i64 {
        let state = self.state.lock().unwrap();
        state
            .values
            .get(&value.0)
            .unwrap_or_else(|| panic!("unknown value handle {}", value.0))
            .run_id
    }

    fn value_free(&self, value: ValueRef) {
        let removed = self.state.lock().unwrap().values.remove(&value.0);
        assert!(removed.is_some(), "double free of value handle {}", value.0);
    }

    fn error_new(&self) -> ErrorRef {
        let mut state = self.state.lock().unwrap();
        let handle = state.handle();
        state.errors.insert(handle, (0, "Success".to_string()));
        ErrorRef(handle)
    }

    fn error_code(&self, err: ErrorRef) -> i32 {
        let state = self.state.lock().unwrap();
        state
            .errors
            .get(&err.0)
            .unwrap_or_else(|| panic!("unknown error handle {}", err.0))
            .0
    }

    fn error_message(&self, err: ErrorRef) -> String {
        let state = self.state.lock().unwrap();
        state
            .errors
            .get(&err.0)
            .unwrap_or_else(|| panic!("unknown error handle {}", err.0))
            .1
            .clone()
    }

    fn error_free(&self, err: ErrorRef) {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.errors.remove(&err.0).is_some(),
            "double free of error handle {}",
            err.0
        );
    }

    fn conf_new(&self) -> ConfRef {
        let mut state = self.state.lock().unwrap();
        let handle = state.handle();
        state.confs.insert(handle, FxHashMap::default());
        ConfRef(handle)
    }

    fn conf_get(&self, conf: ConfRef, key: &CStr) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .confs
            .get(&conf.0)
            .unwrap_or_else(|| panic!("unknown conf handle {}", conf.0))
            .get(&text(key))
            .cloned()
    }

    fn conf_set(&self, conf: ConfRef, key: &CStr, value: &CStr) {
        let mut state = self.state.lock().unwrap();
        state
            .confs
            .get_mut(&conf.0)
            .unwrap_or_else(|| panic!("unknown conf handle {}", conf.0))
            .insert(text(key), text(value));
    }

    fn conf_free(&self, conf: ConfRef) {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.confs.remove(&conf.0).is_some(),
            "double free of conf handle {}",
            conf.0
        );
    }

    fn load_library(&self, filename: &CStr, err: ErrorRef) {
        let filename = text(filename);
        let mut state = self.state.lock().unwrap();
        if filename.ends_with(".so") {
            state.libraries.push(filename);
        } else {
            state.fail(err, 1, format!("could not load library {}", filename));
        }
    }

    fn set_log_level(&self, level: LogLevel) {
        self.state.lock().unwrap().log_level = Some(level);
    }
}
