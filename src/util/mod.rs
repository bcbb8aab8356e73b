//! Shared helpers: aligned IO buffers and timing/formatting

pub mod buffer;
pub mod time;
