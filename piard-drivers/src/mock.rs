//! In-memory driver for tests and dry runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use piard_core::{Driver, DriverError, DriverResult, ServoArray};

#[derive(Debug, Default)]
struct Shared {
    snapshots: Mutex<Vec<Vec<f64>>>,
    connects: Mutex<usize>,
    failing: AtomicBool,
}

/// Observer side of a [`MockDriver`]; stays valid after the driver is
/// boxed into a controller.
#[derive(Debug, Clone, Default)]
pub struct MockHistory {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHistory {
    /// Values of every servo at each write, oldest first
    pub fn snapshots(&self) -> Vec<Vec<f64>> {
        lock(&self.shared.snapshots).clone()
    }

    pub fn last(&self) -> Option<Vec<f64>> {
        lock(&self.shared.snapshots).last().cloned()
    }

    pub fn writes(&self) -> usize {
        lock(&self.shared.snapshots).len()
    }

    pub fn connects(&self) -> usize {
        *lock(&self.shared.connects)
    }

    /// Makes subsequent writes fail with [`DriverError::WriteFailed`].
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }
}

/// Records a value snapshot per write instead of moving hardware.
#[derive(Debug, Default)]
pub struct MockDriver {
    open: bool,
    history: MockHistory,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> MockHistory {
        self.history.clone()
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn connect(&mut self, servos: &ServoArray) -> DriverResult<()> {
        *lock(&self.history.shared.connects) += 1;
        self.open = true;
        debug!(servos = servos.len(), "mock driver connected");
        Ok(())
    }

    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()> {
        if !self.open {
            return Err(DriverError::NotOpen);
        }
        if self.history.shared.failing.load(Ordering::SeqCst) {
            return Err(DriverError::WriteFailed("mock driver set to fail".into()));
        }
        lock(&self.history.shared.snapshots).push(servos.values());
        servos.mark_all_written();
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piard_core::ServoArrayConfig;

    fn servos() -> ServoArray {
        ServoArray::new(2, &ServoArrayConfig::default()).unwrap()
    }

    #[test]
    fn test_write_requires_connect() {
        let mut driver = MockDriver::new();
        assert_eq!(driver.write(&mut servos()), Err(DriverError::NotOpen));
    }

    #[test]
    fn test_write_records_values() {
        let mut driver = MockDriver::new();
        let history = driver.history();
        let mut servos = servos();
        driver.connect(&servos).unwrap();
        servos.move_by(&[45.0, -90.0]).unwrap();
        driver.write(&mut servos).unwrap();
        assert_eq!(history.last(), Some(vec![0.5, -1.0]));
        assert_eq!(history.connects(), 1);
        assert!(servos.dirty_indices().is_empty());
    }

    #[test]
    fn test_failing_write_keeps_servos_dirty() {
        let mut driver = MockDriver::new();
        let history = driver.history();
        let mut servos = servos();
        driver.connect(&servos).unwrap();
        servos.move_by(&[1.0, 1.0]).unwrap();
        history.set_failing(true);
        assert!(matches!(
            driver.write(&mut servos),
            Err(DriverError::WriteFailed(_))
        ));
        assert_eq!(servos.dirty_indices(), vec![0, 1]);
        assert_eq!(history.writes(), 0);
    }

    #[test]
    fn test_close() {
        let mut driver = MockDriver::new();
        driver.connect(&servos()).unwrap();
        assert!(driver.is_open());
        driver.close().unwrap();
        driver.close().unwrap();
        assert!(!driver.is_open());
    }
}
