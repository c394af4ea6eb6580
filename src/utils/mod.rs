// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Utility modules
//!
//! Terminal helpers for the elt CLI.

pub mod spinner;

pub use spinner::*;
