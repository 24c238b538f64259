// SPDX-License-Identifier: Apache-2.0

//! Driver Registry
//!
//! Central registry for all available database drivers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::traits::DataEngine;
use crate::engine::types::DriverInfo;

/// Registry that holds all available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DataEngine>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Registers a driver under its `driver_id()`, replacing any previous one.
    pub fn register(&mut self, driver: Arc<dyn DataEngine>) {
        let id = driver.driver_id().to_string();
        self.drivers.insert(id, driver);
    }

    pub fn get(&self, driver_id: &str) -> Option<Arc<dyn DataEngine>> {
        self.drivers.get(driver_id).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    /// All registered drivers, sorted by id
    pub fn list_infos(&self) -> Vec<DriverInfo> {
        let mut infos: Vec<DriverInfo> = self
            .drivers
            .values()
            .map(|driver| DriverInfo {
                id: driver.driver_id().to_string(),
                name: driver.driver_name().to_string(),
                supported: driver.is_supported(),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::drivers::unsupported::UnsupportedDriver;
    use crate::engine::testing::MockDriver;

    #[test]
    fn test_registry_basics() {
        let mut registry = DriverRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(MockDriver::new("mock1")));
        registry.register(Arc::new(MockDriver::new("mock2")));
        assert_eq!(registry.len(), 2);

        assert!(registry.get("mock1").is_some());
        assert!(registry.get("nonexistent").is_none());

        let list = registry.list();
        assert!(list.contains(&"mock1"));
        assert!(list.contains(&"mock2"));
    }

    #[test]
    fn test_list_infos_marks_stubs() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(MockDriver::new("postgres")));
        registry.register(Arc::new(UnsupportedDriver::mysql()));

        let infos = registry.list_infos();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].id, "mysql");
        assert!(!infos[0].supported);
        assert_eq!(infos[1].id, "postgres");
        assert!(infos[1].supported);
    }
}
