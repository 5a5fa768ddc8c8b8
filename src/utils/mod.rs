// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Terminal output helpers shared by the CLI and the engines

pub mod colors;
pub mod spinner;

pub use colors::*;
pub use spinner::*;
