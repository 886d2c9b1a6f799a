//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Internal constants and magic numbers
//! - [`log`]: Feature-gated logging macros
//! - [`tc6_regs`]: OPEN Alliance standard registers and wire-word bit fields
//! - [`lan865x_regs`]: LAN865x vendor-specific register definitions
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod lan865x_regs;
pub(crate) mod log;
pub(crate) mod tc6_regs;
