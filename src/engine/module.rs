use super::{c_string, ModuleRef, SharedEngine, WeldConf, WeldError, WeldValue};
use crate::errors::Result;
use crate::managed::{Lifecycle, Managed};
use tracing::{debug, warn};

/// A compiled engine program
///
/// ```no_run
/// # use weld_marshal::engine::{SharedEngine, WeldModule, WeldValue};
/// # use weld_marshal::{Managed, VecBuilder, WeldStruct};
/// # fn demo(engine: SharedEngine) -> weld_marshal::Result<()> {
/// let mut module = WeldModule::compile(&engine, "|x: vec[i64]| result(for(x, merger[i64, +], |b, i, e| merge(b, e)))")?;
/// let input = WeldStruct::build(&[VecBuilder::i64s(vec![1, 2, 3]).into()])?;
/// let arg = WeldValue::from_struct(&engine, &input);
/// let out = module.run(&arg)?;
/// let sum = unsafe { out.view_as("{i64}")? }.get_i64(0);
/// assert_eq!(sum, 6);
/// module.close();
/// # Ok(())
/// # }
/// ```
pub struct WeldModule {
    engine: SharedEngine,
    handle: ModuleRef,
    lifecycle: Lifecycle,
}

impl WeldModule {
    /// Compile `code` with a default configuration
    pub fn compile(engine: &SharedEngine, code: &str) -> Result<Self> {
        let mut conf = WeldConf::new(engine);
        let module = Self::compile_with(engine, &conf, code);
        conf.close();
        module
    }

    pub fn compile_with(engine: &SharedEngine, conf: &WeldConf, code: &str) -> Result<Self> {
        let code_c = c_string(code)?;
        let mut err = WeldError::new(engine);
        let handle = engine.compile(&code_c, conf.handle(), err.handle());
        let result = err.check();
        err.close();
        if let Err(e) = result {
            if !handle.is_null() {
                engine.module_free(handle);
            }
            warn!(code_len = code.len(), error = %e, "compilation failed");
            return Err(e);
        }
        debug!(handle = handle.0, "compiled module");
        Ok(WeldModule {
            engine: engine.clone(),
            handle,
            lifecycle: Lifecycle::new(),
        })
    }

    #[track_caller]
    pub fn handle(&self) -> ModuleRef {
        self.check_access();
        self.handle
    }

    /// Run the module on `input` with a default configuration
    pub fn run(&self, input: &WeldValue<'_>) -> Result<WeldValue<'static>> {
        let mut conf = WeldConf::new(&self.engine);
        let output = self.run_with(&conf, input);
        conf.close();
        output
    }

    pub fn run_with(&self, conf: &WeldConf, input: &WeldValue<'_>) -> Result<WeldValue<'static>> {
        let module = self.handle();
        let mut err = WeldError::new(&self.engine);
        let output = self
            .engine
            .run(module, conf.handle(), input.handle(), err.handle());
        let result = err.check();
        err.close();
        if let Err(e) = result {
            if !output.is_null() {
                self.engine.value_free(output);
            }
            warn!(module = module.0, error = %e, "run failed");
            return Err(e);
        }
        debug!(module = module.0, output = output.0, "ran module");
        Ok(WeldValue::from_engine(self.engine.clone(), output))
    }
}

impl Managed for WeldModule {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        self.engine.module_free(self.handle);
    }

    fn kind(&self) -> &'static str {
        "module"
    }
}

impl Drop for WeldModule {
    fn drop(&mut self) {
        self.finalize();
    }
}
