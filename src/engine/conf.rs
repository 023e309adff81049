use super::{c_string, ConfRef, SharedEngine};
use crate::errors::Result;
use crate::managed::{Lifecycle, Managed};

/// Engine configuration: string keys mapped to string values
///
/// Key meanings belong to the engine; this handle only stores them.
pub struct WeldConf {
    engine: SharedEngine,
    handle: ConfRef,
    lifecycle: Lifecycle,
}

impl WeldConf {
    pub fn new(engine: &SharedEngine) -> Self {
        WeldConf {
            engine: engine.clone(),
            handle: engine.conf_new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Configuration with every `(key, value)` pair set, in order
    pub fn from_pairs<'a, I>(engine: &SharedEngine, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let conf = WeldConf::new(engine);
        for (key, value) in pairs {
            conf.set(key, value)?;
        }
        Ok(conf)
    }

    #[track_caller]
    pub fn handle(&self) -> ConfRef {
        self.check_access();
        self.handle
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let key = c_string(key)?;
        Ok(self.engine.conf_get(self.handle(), &key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = c_string(key)?;
        let value = c_string(value)?;
        self.engine.conf_set(self.handle(), &key, &value);
        Ok(())
    }
}

impl Managed for WeldConf {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        self.engine.conf_free(self.handle);
    }

    fn kind(&self) -> &'static str {
        "conf"
    }
}

impl Drop for WeldConf {
    fn drop(&mut self) {
        self.finalize();
    }
}
