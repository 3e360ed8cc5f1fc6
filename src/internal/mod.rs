//! Low-level storage used by the parse graph
//!
//! Nothing in this module is part of the stable interface; it is only
//! re-exported when the `expose_internal` feature is enabled.

pub mod arena;
pub mod stack;
