// SPDX-License-Identifier: Apache-2.0

// Database drivers module

pub mod postgres;
pub mod unsupported;
