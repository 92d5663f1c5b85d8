use models::{CartKind, Identity};

/// Storage key for one user's cart of one kind: `cart_<kind>_<id>`.
pub fn partition_key(kind: CartKind, identity: &Identity) -> String {
    format!("cart_{}_{}", kind.segment(), identity.partition_id())
}
