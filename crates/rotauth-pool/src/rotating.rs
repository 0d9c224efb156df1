//! Pool storage and draw cursors
//!
//! The pool owns the element list; cursors own draw positions over it. A
//! draw locks the cursor position and the pool contents together, as one
//! critical section, so a cursor shared across tasks hands each drawn
//! element to exactly one task and a removed element can never race back
//! into a draw.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Shared collection of rotating elements, in insertion order.
pub struct RotatingPool<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Clone + PartialEq> RotatingPool<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    /// Number of elements currently in the pool.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Remove an element. Returns whether it was present. Once removed, no
    /// subsequent draw from any cursor produces the element again.
    pub async fn remove(&self, item: &T) -> bool {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|i| i != item);
        let removed = items.len() != before;
        if removed {
            debug!(remaining = items.len(), "element removed from pool");
        }
        removed
    }

    /// Copy of the current elements, in insertion order.
    pub async fn snapshot(&self) -> Vec<T> {
        self.items.lock().await.clone()
    }
}

/// Draw position over a pool.
///
/// Looped cursors restart at the head after the last element and only
/// exhaust when the pool is empty. Linear cursors exhaust after one full
/// pass. Share a cursor across tasks via `Arc`; draws are serialized.
pub struct Cursor<T> {
    pool: Arc<RotatingPool<T>>,
    position: Mutex<usize>,
    looped: bool,
}

impl<T: Clone + PartialEq> Cursor<T> {
    /// Infinite, restartable cursor: wraps to the start after the last
    /// element.
    pub fn looped(pool: Arc<RotatingPool<T>>) -> Self {
        Self {
            pool,
            position: Mutex::new(0),
            looped: true,
        }
    }

    /// Single-pass cursor: exhausts after the last element.
    pub fn linear(pool: Arc<RotatingPool<T>>) -> Self {
        Self {
            pool,
            position: Mutex::new(0),
            looped: false,
        }
    }

    /// Draw the next element.
    ///
    /// Lock order is position then contents, the same as `progress`, so
    /// concurrent draws and removals interleave without deadlock.
    pub async fn draw(&self) -> Result<T> {
        let mut position = self.position.lock().await;
        let items = self.pool.items.lock().await;
        if items.is_empty() {
            return Err(Error::Exhausted);
        }
        if *position >= items.len() {
            if self.looped {
                *position = 0;
            } else {
                return Err(Error::Exhausted);
            }
        }
        let item = items[*position].clone();
        *position += 1;
        Ok(item)
    }

    /// Fraction of the pool this cursor has walked, in [0, 1].
    pub async fn progress(&self) -> f64 {
        let position = self.position.lock().await;
        let items = self.pool.items.lock().await;
        if items.is_empty() {
            return 1.0;
        }
        (*position as f64 / items.len() as f64).min(1.0)
    }
}
