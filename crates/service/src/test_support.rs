#![cfg(test)]
use std::sync::{Arc, Mutex};

use models::Identity;

use crate::cart::{CartCounts, CartObserver, DisplaySurface, Notifier, ScopedCartStore};
use crate::identity::mock::StaticIdentityProvider;
use crate::kv::{KeyValueStore, MemoryKvStore};

/// Notifier that remembers every alert and answers confirmations with `answer`.
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub answer: bool,
}

impl RecordingNotifier {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self { alerts: Mutex::new(Vec::new()), prompts: Mutex::new(Vec::new()), answer })
    }

    pub fn alerts(&self) -> Vec<String> { self.alerts.lock().unwrap().clone() }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) { self.alerts.lock().unwrap().push(message.to_string()); }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

/// Badge that records `Some(count)` for show and `None` for hide.
#[derive(Default)]
pub struct RecordingDisplay {
    pub states: Mutex<Vec<Option<usize>>>,
}

impl RecordingDisplay {
    pub fn last(&self) -> Option<Option<usize>> { self.states.lock().unwrap().last().copied() }
}

impl DisplaySurface for RecordingDisplay {
    fn show(&self, count: usize) { self.states.lock().unwrap().push(Some(count)); }
    fn hide(&self) { self.states.lock().unwrap().push(None); }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub seen: Mutex<Vec<CartCounts>>,
}

impl CartObserver for RecordingObserver {
    fn cart_changed(&self, counts: CartCounts) { self.seen.lock().unwrap().push(counts); }
}

pub struct Harness {
    pub kv: Arc<MemoryKvStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub display: Arc<RecordingDisplay>,
    pub store: ScopedCartStore,
}

/// Store over a fresh memory substrate with `user` already installed.
pub fn harness(user: Option<Identity>) -> Harness {
    harness_with(Arc::new(MemoryKvStore::new()), user)
}

pub fn harness_with(kv: Arc<MemoryKvStore>, user: Option<Identity>) -> Harness {
    let notifier = RecordingNotifier::answering(true);
    let display = Arc::new(RecordingDisplay::default());
    let kv_dyn: Arc<dyn KeyValueStore> = kv.clone();
    let mut store = ScopedCartStore::new(
        kv_dyn,
        Arc::new(StaticIdentityProvider::default()),
        notifier.clone(),
    );
    store.attach_display(display.clone());
    store.set_current_user(user);
    Harness { kv, notifier, display, store }
}
