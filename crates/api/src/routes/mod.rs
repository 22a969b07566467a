//! HTTP Routes

pub mod classify;
pub mod labels;
