// SPDX-License-Identifier: Apache-2.0

// Data Engine Module
// Driver abstraction, registry and session management

pub mod drivers;
pub mod registry;
pub mod session_manager;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use registry::DriverRegistry;
pub use session_manager::SessionManager;
pub use traits::DataEngine;
pub use types::*;
pub use vitalake_core::{EngineError, EngineResult};
