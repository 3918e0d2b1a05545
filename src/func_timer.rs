use log::debug;
use std::time::Instant;

/// Logs how long a scope took once it is dropped.
pub struct FunctionTimer {
    name: String,
    start: Instant,
}

impl FunctionTimer {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionTimer {
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for FunctionTimer {
    fn drop(&mut self) {
        debug!("'{}' took: {:?}", self.name, self.start.elapsed());
    }
}
