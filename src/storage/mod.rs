// SPDX-License-Identifier: Apache-2.0

//! Local persistence: connection profiles and UI preferences.

pub mod connections;
pub mod preferences;

pub use connections::{ConnectionInput, ConnectionStore, ConnectionSummary, PASSWORD_MASK};
pub use preferences::{
    table_widths_key, FileBackend, KeyValueBackend, MemoryBackend, PreferencesStore,
    DASHBOARDS_KEY, HISTORY_KEY, HISTORY_LIMIT, SAVED_CHARTS_KEY,
};
