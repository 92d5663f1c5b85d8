//! Contracts between the cart store and whatever presents it to the user.

use tracing::{info, warn};

/// Blocking user-facing messages.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
    /// Ask a yes/no question; `true` means go ahead.
    fn confirm(&self, prompt: &str) -> bool;
}

/// A cart badge. Shown with the item count, hidden when the carts are empty.
pub trait DisplaySurface: Send + Sync {
    fn show(&self, count: usize);
    fn hide(&self);
}

/// Gets called after every change to the current user's carts.
pub trait CartObserver: Send + Sync {
    fn cart_changed(&self, counts: CartCounts);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartCounts {
    pub products: usize,
    pub categories: usize,
}

impl CartCounts {
    pub fn total(&self) -> usize { self.products + self.categories }
}

/// Handle returned by `ScopedCartStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Headless notifier: alerts go to the log, confirmations get a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    pub auto_confirm: bool,
}

impl Default for LogNotifier {
    fn default() -> Self { Self { auto_confirm: true } }
}

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!(%message, "cart alert");
    }

    fn confirm(&self, prompt: &str) -> bool {
        info!(%prompt, answer = self.auto_confirm, "confirmation requested");
        self.auto_confirm
    }
}
