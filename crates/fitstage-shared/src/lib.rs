//! # fitstage-shared
//!
//! Domain primitives shared between the FitStage store and server crates:
//! role and engagement enums, feed sort modes, and platform constants.

pub mod constants;
pub mod types;

pub use types::{EngagementKind, ParseEnumError, Role, SortBy};
