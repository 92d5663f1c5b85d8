use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// The two independent carts each user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartKind {
    Products,
    Categories,
}

impl CartKind {
    pub const ALL: [CartKind; 2] = [CartKind::Products, CartKind::Categories];

    /// Segment used inside partition keys (`cart_<segment>_<id>`).
    pub fn segment(self) -> &'static str {
        match self {
            CartKind::Products => "productos",
            CartKind::Categories => "categorias",
        }
    }

    /// Shared, un-partitioned key written before per-user carts existed.
    pub fn legacy_key(self) -> &'static str {
        match self {
            CartKind::Products => "cart",
            CartKind::Categories => "categorias_cart",
        }
    }
}

impl fmt::Display for CartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// One product row in a user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "idProducto", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "precio", default)]
    pub unit_price: f64,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "stockDisponible")]
    pub available_stock: u32,
}

impl ProductLine {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.code.trim().is_empty() {
            return Err(ModelError::Validation("product code required".into()));
        }
        if self.quantity == 0 {
            return Err(ModelError::Validation(format!("quantity for {} must be >= 1", self.code)));
        }
        if self.quantity > self.available_stock {
            return Err(ModelError::Validation(format!(
                "quantity {} for {} exceeds stock {}",
                self.quantity, self.code, self.available_stock
            )));
        }
        Ok(())
    }
}

/// Product as offered to the cart; `quantity` of `None` or 0 means one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "idProducto", default)]
    pub product_id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "precio", default)]
    pub unit_price: f64,
    #[serde(rename = "cantidad", default)]
    pub quantity: Option<u32>,
    #[serde(rename = "stockDisponible")]
    pub available_stock: u32,
}

impl NewProduct {
    pub fn new(code: impl Into<String>, quantity: u32, available_stock: u32) -> Self {
        Self {
            code: code.into(),
            product_id: None,
            name: String::new(),
            category: None,
            unit_price: 0.0,
            quantity: Some(quantity),
            available_stock,
        }
    }

    pub fn requested_quantity(&self) -> u32 {
        match self.quantity {
            Some(q) if q > 0 => q,
            _ => 1,
        }
    }

    pub fn into_line(self) -> ProductLine {
        let quantity = self.requested_quantity();
        ProductLine {
            code: self.code,
            product_id: self.product_id,
            name: self.name,
            category: self.category,
            unit_price: self.unit_price,
            quantity,
            available_stock: self.available_stock,
        }
    }
}

/// One category row in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLine {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "idCategoria", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryLine {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self { code: code.into(), category_id: None, name: name.into(), description: None }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.code.trim().is_empty() {
            return Err(ModelError::Validation("category code required".into()));
        }
        Ok(())
    }
}
