//! Rotating resource pools
//!
//! Lock-guarded collections of rotating elements (credentials, egress
//! points) drawn concurrently by many workers. A pool hands out elements
//! through cursors: looped cursors wrap to the start in insertion order and
//! only exhaust once the pool is empty; linear cursors exhaust after a
//! single pass. Removal is permanent — a removed element is never produced
//! by any subsequent draw.

pub mod error;
pub mod rotating;

pub use error::{Error, Result};
pub use rotating::{Cursor, RotatingPool};
