use crate::error::{Error, Result};
use std::time::Duration;

/// Pool construction parameters.
///
/// `WorkPool::new(n)` is the short path; `WorkPool::with_config` takes a
/// validated `Config` when the defaults need adjusting.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed worker count. `None` resolves to the number of logical CPUs.
    pub max_workers: Option<usize>,
    /// Per-task deadline applied by the workers. `None` disables it; can also
    /// be changed later through `WorkPool::set_timeout`.
    pub task_timeout: Option<Duration>,
    /// Capacity of the bounded ready channel between the dispatcher and the
    /// workers. `None` resolves to `2 * max_workers`.
    pub ready_capacity: Option<usize>,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: None,
            task_timeout: None,
            ready_capacity: None,
            thread_name_prefix: "weir-worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.max_workers {
            if n == 0 {
                return Err(Error::config("max_workers must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("max_workers too large (max 1024)"));
            }
        }

        if self.ready_capacity == Some(0) {
            return Err(Error::config("ready_capacity must be > 0"));
        }

        Ok(())
    }

    /// Resolved worker count, clamped to at least one thread.
    pub fn worker_threads(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Resolved ready-channel capacity.
    pub fn ready_slots(&self) -> usize {
        self.ready_capacity
            .unwrap_or_else(|| 2 * self.worker_threads())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = Some(n);
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.config.task_timeout = Some(timeout);
        self
    }

    pub fn ready_capacity(mut self, slots: usize) -> Self {
        self.config.ready_capacity = Some(slots);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let config = Config::default();
        assert!(config.worker_threads() >= 1);
        assert_eq!(config.ready_slots(), 2 * config.worker_threads());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Config::builder().max_workers(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_roundtrip() {
        let config = Config::builder()
            .max_workers(4)
            .ready_capacity(16)
            .task_timeout(Duration::from_millis(50))
            .thread_name_prefix("test-pool")
            .build()
            .unwrap();

        assert_eq!(config.worker_threads(), 4);
        assert_eq!(config.ready_slots(), 16);
        assert_eq!(config.task_timeout, Some(Duration::from_millis(50)));
        assert_eq!(config.thread_name_prefix, "test-pool");
    }
}
