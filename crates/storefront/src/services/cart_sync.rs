//! Ordering for line item quantity updates.
//!
//! Shoppers can change a quantity several times before the first update
//! returns. Each change takes a [`Ticket`] when its request arrives; updates
//! for the same line run one at a time, and an update whose ticket has been
//! overtaken by a newer one is skipped. The backend therefore always ends up
//! with the most recently requested quantity, and a response rendered from a
//! stale cart is never sent back to the page.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use cornerstore_core::{CartId, LineItemId};

/// Idle lines are forgotten after this long.
const SLOT_IDLE: Duration = Duration::from_secs(600);

type SlotKey = (CartId, LineItemId);

#[derive(Default)]
struct LineSlot {
    latest: AtomicU64,
    gate: Mutex<()>,
}

/// Result of a sequenced update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sequenced<T> {
    /// The update ran and is still the latest for its line.
    Applied(T),
    /// A newer update for the same line arrived first.
    Superseded,
}

/// Position of one update in its line's queue.
pub struct Ticket {
    slot: Arc<LineSlot>,
    number: u64,
}

impl Ticket {
    fn is_stale(&self) -> bool {
        self.slot.latest.load(Ordering::SeqCst) != self.number
    }

    /// Run `op` unless a newer ticket for the same line exists.
    ///
    /// `op` is not called when the ticket is already stale. If a newer ticket
    /// arrives while `op` runs, its result is reported as superseded.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `op`.
    pub async fn run<F, Fut, T, E>(self, op: F) -> Result<Sequenced<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _guard = self.slot.gate.lock().await;

        if self.is_stale() {
            tracing::debug!(ticket = self.number, "Skipping superseded quantity update");
            return Ok(Sequenced::Superseded);
        }

        let value = op().await?;

        if self.is_stale() {
            return Ok(Sequenced::Superseded);
        }
        Ok(Sequenced::Applied(value))
    }
}

/// Hands out tickets per (cart, line item).
#[derive(Clone)]
pub struct QuantitySequencer {
    slots: Cache<SlotKey, Arc<LineSlot>>,
}

impl Default for QuantitySequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantitySequencer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(SLOT_IDLE)
                .build(),
        }
    }

    /// Take the next ticket for a line. Call this as soon as the request arrives.
    pub async fn ticket(&self, cart_id: &CartId, line_item_id: &LineItemId) -> Ticket {
        let slot = self
            .slots
            .get_with((cart_id.clone(), line_item_id.clone()), async {
                Arc::new(LineSlot::default())
            })
            .await;
        let number = slot.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { slot, number }
    }
}
