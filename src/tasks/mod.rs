//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is live.
//!
//! # Tasks
//! - GC: forced startup sweep, then threshold-driven sweeps at an interval

mod gc;

pub use gc::GcScheduler;
