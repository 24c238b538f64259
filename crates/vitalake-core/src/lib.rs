// SPDX-License-Identifier: Apache-2.0

//! VitaLake core: result-set types, the error taxonomy, column role
//! classification and chart axis auto-selection.

pub mod axes;
pub mod classify;
pub mod error;
pub mod types;

pub use axes::{select_axes, AxisDetection, ChartAxisSelection};
pub use classify::{classify, classify_all};
pub use error::{EngineError, EngineResult};
pub use types::*;
