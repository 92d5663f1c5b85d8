use std::sync::Arc;

use models::{CartKind, CategoryLine, Identity, NewProduct, ProductLine};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument, warn};

use super::errors::CartError;
use super::keys::partition_key;
use super::notify::{CartCounts, CartObserver, DisplaySurface, Notifier, SubscriptionId};
use crate::identity::IdentityProvider;
use crate::kv::{KeyValueStore, TOKEN_KEY};

/// Snapshot of what the store currently points at.
#[derive(Debug, Clone, PartialEq)]
pub struct CartDebugInfo {
    pub current_user: Option<Identity>,
    pub product_cart_key: Option<String>,
    pub category_cart_key: Option<String>,
    pub product_cart_items: usize,
    pub category_cart_items: usize,
}

/// Product and category carts of the signed-in user.
///
/// One instance per session. Mutations take `&mut self`, so a single
/// instance never interleaves two read-modify-write cycles. Separate
/// instances over the same substrate are not coordinated (last write wins).
pub struct ScopedCartStore {
    pub(super) kv: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    pub(super) current_user: Option<Identity>,
    displays: Vec<Arc<dyn DisplaySurface>>,
    observers: Vec<(SubscriptionId, Arc<dyn CartObserver>)>,
    next_subscription: u64,
}

impl ScopedCartStore {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            kv,
            identity,
            notifier,
            current_user: None,
            displays: Vec::new(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn current_user(&self) -> Option<&Identity> { self.current_user.as_ref() }

    /// Install an identity resolved elsewhere (e.g. right after login).
    pub fn set_current_user(&mut self, user: Option<Identity>) {
        self.current_user = user;
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> { &self.notifier }

    /// Resolve the signed-in user from the stored bearer token.
    ///
    /// Never fails: a missing token or any transport/HTTP error yields `None`
    /// and leaves the cached identity as it was.
    #[instrument(skip(self))]
    pub async fn resolve_current_user(&mut self) -> Option<Identity> {
        let token = match self.kv.get(TOKEN_KEY).await {
            Ok(Some(t)) if !t.is_empty() => t,
            Ok(_) => {
                debug!("no stored credential");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "cannot read stored credential");
                return None;
            }
        };
        match self.identity.current_user(&token).await {
            Ok(user) => {
                info!(user = %user.partition_id(), "current user resolved");
                self.current_user = Some(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "identity resolution failed; continuing without a user");
                None
            }
        }
    }

    /// `cart_<kind>_<user>` for the cached identity; `None` when nobody is signed in.
    pub fn partition_key(&self, kind: CartKind) -> Option<String> {
        self.current_user.as_ref().map(|u| partition_key(kind, u))
    }

    // ---------- loading / saving ----------

    pub async fn load_products(&self) -> Result<Vec<ProductLine>, CartError> {
        self.load(CartKind::Products).await
    }

    pub async fn load_categories(&self) -> Result<Vec<CategoryLine>, CartError> {
        self.load(CartKind::Categories).await
    }

    async fn load<T: DeserializeOwned>(&self, kind: CartKind) -> Result<Vec<T>, CartError> {
        let Some(key) = self.partition_key(kind) else { return Ok(Vec::new()) };
        match self.kv.get(&key).await? {
            None => Ok(Vec::new()),
            Some(raw) if raw.is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| CartError::Decode { kind, key, source }),
        }
    }

    /// Validate and write a whole product cart. `Ok(false)` when nobody is signed in.
    pub async fn save_products(&self, cart: &[ProductLine]) -> Result<bool, CartError> {
        for line in cart {
            line.validate()?;
        }
        self.save(CartKind::Products, cart).await
    }

    /// Validate and write a whole category cart. `Ok(false)` when nobody is signed in.
    pub async fn save_categories(&self, cart: &[CategoryLine]) -> Result<bool, CartError> {
        for line in cart {
            line.validate()?;
        }
        self.save(CartKind::Categories, cart).await
    }

    async fn save<T: Serialize>(&self, kind: CartKind, cart: &[T]) -> Result<bool, CartError> {
        let Some(key) = self.partition_key(kind) else { return Ok(false) };
        let raw = serde_json::to_string(cart).map_err(|source| CartError::Encode { kind, source })?;
        self.kv.set(&key, raw).await?;
        debug!(%key, items = cart.len(), "cart saved");
        Ok(true)
    }

    // ---------- products ----------

    /// Add a product or bump the quantity of the line with the same code.
    ///
    /// On a merge the line takes the stock figure of the incoming item.
    #[instrument(skip(self, item), fields(code = %item.code))]
    pub async fn add_product(&mut self, item: NewProduct) -> Result<(), CartError> {
        if self.current_user.is_none() {
            return self.reject(CartError::AuthRequired(CartKind::Products));
        }
        let mut cart = self.load_products().await?;
        let requested = item.requested_quantity();

        match cart.iter_mut().find(|line| line.code == item.code) {
            Some(line) => {
                let total = line
                    .quantity
                    .checked_add(requested)
                    .filter(|q| *q <= item.available_stock);
                let Some(total) = total else {
                    return self.reject(CartError::StockExceeded {
                        code: item.code,
                        available: item.available_stock,
                    });
                };
                line.quantity = total;
                line.available_stock = item.available_stock;
            }
            None => {
                if requested > item.available_stock {
                    return self.reject(CartError::StockExceeded {
                        code: item.code,
                        available: item.available_stock,
                    });
                }
                let line = item.into_line();
                line.validate()?;
                cart.push(line);
            }
        }

        self.save(CartKind::Products, &cart).await?;
        self.changed().await;
        Ok(())
    }

    /// Drop the line with `code`; absent codes are ignored.
    #[instrument(skip(self))]
    pub async fn remove_product(&mut self, code: &str) -> Result<(), CartError> {
        let mut cart = self.load_products().await?;
        let before = cart.len();
        cart.retain(|line| line.code != code);
        if cart.len() == before {
            debug!("product not in cart");
            return Ok(());
        }
        self.save(CartKind::Products, &cart).await?;
        self.changed().await;
        Ok(())
    }

    /// Set the quantity of a line. `<= 0` removes it; above stock is rejected.
    #[instrument(skip(self))]
    pub async fn update_product_quantity(&mut self, code: &str, new_quantity: i64) -> Result<(), CartError> {
        let mut cart = self.load_products().await?;
        let Some(line) = cart.iter_mut().find(|line| line.code == code) else {
            return Ok(());
        };
        if new_quantity <= 0 {
            return self.remove_product(code).await;
        }
        let available = line.available_stock;
        match u32::try_from(new_quantity) {
            Ok(q) if q <= available => line.quantity = q,
            _ => return self.reject(CartError::StockExceeded { code: code.to_string(), available }),
        }
        self.save(CartKind::Products, &cart).await?;
        self.changed().await;
        Ok(())
    }

    /// Shift a line's quantity by `delta` (the +/- buttons).
    pub async fn change_product_quantity(&mut self, code: &str, delta: i64) -> Result<(), CartError> {
        let current = self
            .load_products()
            .await?
            .iter()
            .find(|line| line.code == code)
            .map(|line| i64::from(line.quantity));
        match current {
            Some(q) => self.update_product_quantity(code, q + delta).await,
            None => Ok(()),
        }
    }

    pub async fn clear_product_cart(&mut self) -> Result<(), CartError> {
        self.clear(CartKind::Products).await
    }

    /// Ask first, then empty the product cart. Returns whether it was emptied.
    pub async fn confirm_and_clear_products(&mut self) -> Result<bool, CartError> {
        if !self.notifier.confirm("Are you sure you want to empty your cart?") {
            return Ok(false);
        }
        self.clear_product_cart().await?;
        Ok(true)
    }

    // ---------- categories ----------

    /// Append a category; a code already in the cart is rejected, never merged.
    #[instrument(skip(self, item), fields(code = %item.code))]
    pub async fn add_category(&mut self, item: CategoryLine) -> Result<(), CartError> {
        if self.current_user.is_none() {
            return self.reject(CartError::AuthRequired(CartKind::Categories));
        }
        let mut cart = self.load_categories().await?;
        if cart.iter().any(|line| line.code == item.code) {
            return self.reject(CartError::DuplicateCategory { code: item.code });
        }
        item.validate()?;
        cart.push(item);
        self.save(CartKind::Categories, &cart).await?;
        self.changed().await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_category(&mut self, code: &str) -> Result<(), CartError> {
        let mut cart = self.load_categories().await?;
        let before = cart.len();
        cart.retain(|line| line.code != code);
        if cart.len() == before {
            return Ok(());
        }
        self.save(CartKind::Categories, &cart).await?;
        self.changed().await;
        Ok(())
    }

    pub async fn clear_category_cart(&mut self) -> Result<(), CartError> {
        self.clear(CartKind::Categories).await
    }

    async fn clear(&mut self, kind: CartKind) -> Result<(), CartError> {
        let Some(key) = self.partition_key(kind) else { return Ok(()) };
        self.kv.remove(&key).await?;
        info!(%key, "cart cleared");
        self.changed().await;
        Ok(())
    }

    // ---------- session end ----------

    /// Logout: delete both carts of the current user and forget the user.
    #[instrument(skip(self))]
    pub async fn clear_all_for_current_user(&mut self) -> Result<(), CartError> {
        self.clear_product_cart().await?;
        self.clear_category_cart().await?;
        self.current_user = None;
        self.changed().await;
        Ok(())
    }

    // ---------- display / observers ----------

    pub fn attach_display(&mut self, surface: Arc<dyn DisplaySurface>) {
        self.displays.push(surface);
    }

    pub fn subscribe(&mut self, observer: Arc<dyn CartObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    /// Recount both carts and push the total to every display and observer.
    pub async fn refresh_display_count(&self) -> Result<CartCounts, CartError> {
        let counts = CartCounts {
            products: self.load_products().await?.len(),
            categories: self.load_categories().await?.len(),
        };
        let total = counts.total();
        for surface in &self.displays {
            if total > 0 {
                surface.show(total);
            } else {
                surface.hide();
            }
        }
        for (_, observer) in &self.observers {
            observer.cart_changed(counts);
        }
        Ok(counts)
    }

    /// Refresh after a mutation that already landed; a failing recount is only logged.
    pub(super) async fn changed(&self) {
        if let Err(e) = self.refresh_display_count().await {
            warn!(error = %e, "cart display refresh failed");
        }
    }

    pub async fn debug_info(&self) -> Result<CartDebugInfo, CartError> {
        Ok(CartDebugInfo {
            current_user: self.current_user.clone(),
            product_cart_key: self.partition_key(CartKind::Products),
            category_cart_key: self.partition_key(CartKind::Categories),
            product_cart_items: self.load_products().await?.len(),
            category_cart_items: self.load_categories().await?.len(),
        })
    }

    fn reject<T>(&self, err: CartError) -> Result<T, CartError> {
        warn!(error = %err, "cart change rejected");
        self.notifier.alert(&err.to_string());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::mock::StaticIdentityProvider;
    use crate::kv::MemoryKvStore;
    use crate::test_support::{harness, harness_with, RecordingNotifier, RecordingObserver};

    fn alice() -> Identity { Identity::with_email("alice@uni.pe") }

    const ALICE_PRODUCTS: &str = "cart_productos_alice@uni.pe";
    const ALICE_CATEGORIES: &str = "cart_categorias_alice@uni.pe";

    #[tokio::test]
    async fn add_merges_quantities_up_to_stock() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));

        h.store.add_product(NewProduct::new("X", 2, 5)).await?;
        let cart = h.store.load_products().await?;
        assert_eq!(cart.len(), 1);
        assert_eq!((cart[0].code.as_str(), cart[0].quantity), ("X", 2));

        h.store.add_product(NewProduct::new("X", 2, 5)).await?;
        assert_eq!(h.store.load_products().await?[0].quantity, 4);

        let err = h.store.add_product(NewProduct::new("X", 2, 5)).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { available: 5, .. }));
        let cart = h.store.load_products().await?;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 4);
        assert_eq!(h.notifier.alerts(), vec!["only 5 units of X are available in stock".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn merge_takes_latest_stock() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("X", 2, 2)).await?;
        h.store.add_product(NewProduct::new("X", 2, 5)).await?;

        let cart = h.store.load_products().await?;
        assert_eq!((cart[0].quantity, cart[0].available_stock), (4, 5));
        // stored cart stays valid
        assert!(h.store.save_products(&cart).await?);
        h.store.update_product_quantity("X", 4).await?;

        // stock shrank below what is already held
        let err = h.store.add_product(NewProduct::new("X", 1, 3)).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { available: 3, .. }));
        let cart = h.store.load_products().await?;
        assert_eq!((cart[0].quantity, cart[0].available_stock), (4, 5));
        Ok(())
    }

    #[tokio::test]
    async fn missing_quantity_defaults_to_one() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        let mut item = NewProduct::new("Y", 0, 3);
        item.quantity = None;
        h.store.add_product(item).await?;
        assert_eq!(h.store.load_products().await?[0].quantity, 1);
        Ok(())
    }

    #[tokio::test]
    async fn new_line_above_stock_is_rejected() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        let err = h.store.add_product(NewProduct::new("Z", 4, 3)).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { available: 3, .. }));
        assert_eq!(h.kv.get(ALICE_PRODUCTS).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn adding_without_user_requires_auth() -> anyhow::Result<()> {
        let mut h = harness(None);
        let err = h.store.add_product(NewProduct::new("X", 1, 5)).await.unwrap_err();
        assert!(matches!(err, CartError::AuthRequired(CartKind::Products)));
        let err = h.store.add_category(CategoryLine::new("C", "Limpieza")).await.unwrap_err();
        assert!(matches!(err, CartError::AuthRequired(CartKind::Categories)));
        assert_eq!(h.notifier.alerts().len(), 2);
        assert!(h.kv.keys().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn removing_unknown_code_is_noop() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        let stored = h.kv.get(ALICE_PRODUCTS).await?;

        h.store.remove_product("nope").await?;
        assert_eq!(h.store.load_products().await?.len(), 1);
        assert_eq!(h.kv.get(ALICE_PRODUCTS).await?, stored);

        h.store.remove_product("A").await?;
        assert!(h.store.load_products().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_to_zero_removes_line() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        h.store.add_product(NewProduct::new("B", 1, 5)).await?;

        h.store.update_product_quantity("A", 0).await?;
        let codes: Vec<String> = h.store.load_products().await?.into_iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["B".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn update_respects_stock_and_ignores_unknown() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;

        h.store.update_product_quantity("A", 5).await?;
        assert_eq!(h.store.load_products().await?[0].quantity, 5);

        let err = h.store.update_product_quantity("A", 6).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { available: 5, .. }));
        assert_eq!(h.store.load_products().await?[0].quantity, 5);

        h.store.update_product_quantity("ghost", 2).await?;
        assert_eq!(h.store.load_products().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn change_quantity_by_delta() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 2, 5)).await?;

        h.store.change_product_quantity("A", 1).await?;
        assert_eq!(h.store.load_products().await?[0].quantity, 3);

        h.store.change_product_quantity("A", -3).await?;
        assert!(h.store.load_products().await?.is_empty());

        h.store.change_product_quantity("A", 1).await?;
        assert!(h.store.load_products().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_category_rejected() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_category(CategoryLine::new("C1", "Limpieza")).await?;
        let err = h.store.add_category(CategoryLine::new("C1", "Otra")).await.unwrap_err();
        assert!(matches!(err, CartError::DuplicateCategory { .. }));
        let cart = h.store.load_categories().await?;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].name, "Limpieza");

        h.store.remove_category("C1").await?;
        assert!(h.store.load_categories().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_cart_is_a_decode_error() -> anyhow::Result<()> {
        let kv = std::sync::Arc::new(MemoryKvStore::with_entries([(ALICE_PRODUCTS, "{not json")]));
        let mut h = harness_with(kv, Some(alice()));
        let err = h.store.load_products().await.unwrap_err();
        assert!(matches!(err, CartError::Decode { kind: CartKind::Products, .. }));
        assert!(!err.is_user_facing());
        assert!(h.store.add_product(NewProduct::new("A", 1, 1)).await.is_err());
        // untouched
        assert_eq!(h.kv.get(ALICE_PRODUCTS).await?.as_deref(), Some("{not json"));
        Ok(())
    }

    #[tokio::test]
    async fn display_shows_total_and_hides_at_zero() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        assert_eq!(h.display.last(), Some(Some(1)));
        h.store.add_category(CategoryLine::new("C", "c")).await?;
        assert_eq!(h.display.last(), Some(Some(2)));

        h.store.clear_product_cart().await?;
        assert_eq!(h.display.last(), Some(Some(1)));
        h.store.clear_category_cart().await?;
        assert_eq!(h.display.last(), Some(None));
        Ok(())
    }

    #[tokio::test]
    async fn observers_get_counts_until_unsubscribed() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        let observer = std::sync::Arc::new(RecordingObserver::default());
        let id = h.store.subscribe(observer.clone());

        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        assert_eq!(
            observer.seen.lock().unwrap().last().copied(),
            Some(CartCounts { products: 1, categories: 0 })
        );

        assert!(h.store.unsubscribe(id));
        assert!(!h.store.unsubscribe(id));
        h.store.add_product(NewProduct::new("B", 1, 5)).await?;
        assert_eq!(observer.seen.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn clear_all_only_touches_current_user() -> anyhow::Result<()> {
        let kv = std::sync::Arc::new(MemoryKvStore::with_entries([
            ("cart_productos_bob@uni.pe", "[]"),
            ("cart_categorias_bob@uni.pe", "[]"),
        ]));
        let mut h = harness_with(kv, Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        h.store.add_category(CategoryLine::new("C", "c")).await?;

        h.store.clear_all_for_current_user().await?;
        assert!(h.store.current_user().is_none());
        assert!(!h.kv.contains(ALICE_PRODUCTS).await?);
        assert!(!h.kv.contains(ALICE_CATEGORIES).await?);
        assert_eq!(
            h.kv.keys().await?,
            vec!["cart_categorias_bob@uni.pe".to_string(), "cart_productos_bob@uni.pe".to_string()]
        );
        assert_eq!(h.display.last(), Some(None));
        Ok(())
    }

    #[tokio::test]
    async fn users_do_not_see_each_others_carts() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;

        h.store.set_current_user(Some(Identity::with_sub("bob-sub")));
        assert!(h.store.load_products().await?.is_empty());
        h.store.add_product(NewProduct::new("B", 1, 5)).await?;

        h.store.set_current_user(Some(alice()));
        let codes: Vec<String> = h.store.load_products().await?.into_iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["A".to_string()]);
        assert!(h.kv.contains("cart_productos_bob-sub").await?);
        Ok(())
    }

    #[tokio::test]
    async fn no_user_means_no_key_and_empty_carts() -> anyhow::Result<()> {
        let mut h = harness(None);
        assert_eq!(h.store.partition_key(CartKind::Products), None);
        assert!(h.store.load_products().await?.is_empty());
        assert!(!h.store.save_products(&[]).await?);
        h.store.clear_product_cart().await?;
        assert!(h.kv.keys().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_products_validates_lines() -> anyhow::Result<()> {
        let h = harness(Some(alice()));
        let mut line = NewProduct::new("A", 1, 2).into_line();
        line.quantity = 3;
        let err = h.store.save_products(&[line]).await.unwrap_err();
        assert!(matches!(err, CartError::Invalid(_)));
        assert!(!h.kv.contains(ALICE_PRODUCTS).await?);
        Ok(())
    }

    #[tokio::test]
    async fn confirm_guards_clearing() -> anyhow::Result<()> {
        let kv: std::sync::Arc<dyn KeyValueStore> = std::sync::Arc::new(MemoryKvStore::new());
        let notifier = RecordingNotifier::answering(false);
        let mut store = ScopedCartStore::new(
            kv.clone(),
            std::sync::Arc::new(StaticIdentityProvider::default()),
            notifier.clone(),
        );
        store.set_current_user(Some(alice()));
        store.add_product(NewProduct::new("A", 1, 5)).await?;

        assert!(!store.confirm_and_clear_products().await?);
        assert_eq!(store.load_products().await?.len(), 1);
        assert_eq!(notifier.prompts.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn resolve_user_from_stored_token() -> anyhow::Result<()> {
        let kv: std::sync::Arc<dyn KeyValueStore> =
            std::sync::Arc::new(MemoryKvStore::with_entries([(TOKEN_KEY, "t-alice")]));
        let provider = StaticIdentityProvider::new([("t-alice", alice())]);
        let mut store = ScopedCartStore::new(
            kv.clone(),
            std::sync::Arc::new(provider),
            RecordingNotifier::answering(true),
        );

        assert_eq!(store.resolve_current_user().await, Some(alice()));
        assert_eq!(store.partition_key(CartKind::Products).as_deref(), Some(ALICE_PRODUCTS));
        Ok(())
    }

    #[tokio::test]
    async fn resolve_degrades_to_no_user() -> anyhow::Result<()> {
        let kv = std::sync::Arc::new(MemoryKvStore::new());
        let kv_dyn: std::sync::Arc<dyn KeyValueStore> = kv.clone();
        let mut store = ScopedCartStore::new(
            kv_dyn,
            std::sync::Arc::new(StaticIdentityProvider::default()),
            RecordingNotifier::answering(true),
        );

        // no token
        assert_eq!(store.resolve_current_user().await, None);
        // rejected token
        kv.set(TOKEN_KEY, "expired".into()).await?;
        assert_eq!(store.resolve_current_user().await, None);
        assert!(store.current_user().is_none());
        Ok(())
    }

    async fn start_me_backend() -> anyhow::Result<String> {
        use axum::{http::{HeaderMap, StatusCode}, routing::get, Json, Router};
        use serde_json::json;

        let app = Router::new().route(
            crate::identity::ME_PATH,
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer t-alice") => (StatusCode::OK, Json(json!({ "email": "alice@uni.pe" }))),
                    Some("Bearer t-broken") => {
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "db down" })))
                    }
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" }))),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
        });
        Ok(format!("http://{}:{}", addr.ip(), addr.port()))
    }

    fn http_store(base_url: &str, token: &str) -> anyhow::Result<ScopedCartStore> {
        let client = common::http::ApiClient::new(base_url, None)?;
        let kv: std::sync::Arc<dyn KeyValueStore> =
            std::sync::Arc::new(MemoryKvStore::with_entries([(TOKEN_KEY, token)]));
        Ok(ScopedCartStore::new(
            kv,
            std::sync::Arc::new(crate::identity::HttpIdentityProvider::new(client)),
            RecordingNotifier::answering(true),
        ))
    }

    #[tokio::test]
    async fn resolve_through_me_endpoint() -> anyhow::Result<()> {
        let base = start_me_backend().await?;

        let mut store = http_store(&base, "t-alice")?;
        assert_eq!(store.resolve_current_user().await, Some(alice()));

        for token in ["t-broken", "t-unknown"] {
            let mut store = http_store(&base, token)?;
            assert_eq!(store.resolve_current_user().await, None);
            assert!(store.current_user().is_none());
            assert_eq!(store.partition_key(CartKind::Products), None);
        }
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_me_endpoint_means_no_user() -> anyhow::Result<()> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut store = http_store(&format!("http://{}", addr), "t-alice")?;
        store.set_current_user(Some(Identity::with_sub("cached")));
        assert_eq!(store.resolve_current_user().await, None);
        // cached identity is kept
        assert_eq!(store.current_user(), Some(&Identity::with_sub("cached")));
        Ok(())
    }

    #[tokio::test]
    async fn debug_info_reports_keys_and_counts() -> anyhow::Result<()> {
        let mut h = harness(Some(alice()));
        h.store.add_product(NewProduct::new("A", 1, 5)).await?;
        let info = h.store.debug_info().await?;
        assert_eq!(info.current_user, Some(alice()));
        assert_eq!(info.product_cart_key.as_deref(), Some(ALICE_PRODUCTS));
        assert_eq!(info.category_cart_key.as_deref(), Some(ALICE_CATEGORIES));
        assert_eq!((info.product_cart_items, info.category_cart_items), (1, 0));
        Ok(())
    }
}
