//! Cart lines and the persisted cart store.
//!
//! The cart is a sequence of [`CartLine`]s with at most one line per
//! (product, size, color) key. Every mutation loads the whole slot from the
//! [`CartRepository`], applies the change and writes the whole slot back.
//!
//! Persisted layout is a JSON array under [`CART_SLOT_KEY`]:
//!
//! ```json
//! [{"product_id": "p1", "size_id": "na", "size_label": "Única", "color": "Único", "qty": 2}]
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DEFAULT_COLOR, DEFAULT_SIZE_LABEL, ProductId, SizeId};

/// Fixed key of the persisted cart slot.
pub const CART_SLOT_KEY: &str = "lumina_cart_v1";
/// Smallest quantity a line can hold.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity a line can hold.
pub const MAX_QUANTITY: u32 = 99;

/// Clamp a requested quantity into `[MIN_QUANTITY, MAX_QUANTITY]`.
#[must_use]
pub fn clamp_quantity(qty: i64) -> u32 {
    let clamped = qty.clamp(i64::from(MIN_QUANTITY), i64::from(MAX_QUANTITY));
    u32::try_from(clamped).unwrap_or(MIN_QUANTITY)
}

/// Composite key identifying a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartKey {
    pub product_id: ProductId,
    pub size_id: SizeId,
    pub color: String,
}

impl CartKey {
    /// Build a key, substituting the default size and color for empty values.
    #[must_use]
    pub fn new(product_id: ProductId, size_id: SizeId, color: impl Into<String>) -> Self {
        let size_id = if size_id.is_empty() {
            SizeId::default_size()
        } else {
            size_id
        };
        Self {
            product_id,
            size_id,
            color: normalize_color(color.into()),
        }
    }
}

/// What the shopper picked on the product detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSelection {
    pub product_id: ProductId,
    #[serde(default = "SizeId::default_size")]
    pub size_id: SizeId,
    #[serde(default)]
    pub size_label: String,
    #[serde(default)]
    pub color: String,
}

impl CartSelection {
    /// The key this selection is stored under.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey::new(
            self.product_id.clone(),
            self.size_id.clone(),
            self.color.clone(),
        )
    }
}

/// One distinct (product, size, color) selection with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size_id: SizeId,
    pub size_label: String,
    pub color: String,
    pub qty: u32,
}

impl CartLine {
    /// The composite key of this line.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product_id.clone(),
            size_id: self.size_id.clone(),
            color: self.color.clone(),
        }
    }

    fn matches(&self, key: &CartKey) -> bool {
        self.product_id == key.product_id && self.size_id == key.size_id && self.color == key.color
    }
}

fn normalize_color(color: String) -> String {
    match color.trim() {
        "" => DEFAULT_COLOR.to_owned(),
        trimmed => trimmed.to_owned(),
    }
}

/// The persisted slot could not be read as a cart.
#[derive(Debug, Error)]
#[error("cart slot is corrupt: {0}")]
pub struct StorageCorruption(String);

/// Errors raised while writing the cart slot.
#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write cart slot: {0}")]
    Io(#[from] std::io::Error),
}

/// Entry shape accepted when reading the slot. Missing optional fields take
/// defaults; anything else that doesn't fit drops the entry.
#[derive(Deserialize)]
struct StoredLine {
    product_id: String,
    #[serde(default)]
    size_id: String,
    #[serde(default)]
    size_label: String,
    #[serde(default)]
    color: String,
    #[serde(default = "default_stored_qty")]
    qty: f64,
}

const fn default_stored_qty() -> f64 {
    1.0
}

impl StoredLine {
    #[allow(clippy::cast_possible_truncation)] // `as` saturates and the value is clamped next
    fn into_line(self) -> Option<CartLine> {
        if self.product_id.is_empty() || !self.qty.is_finite() {
            return None;
        }
        let key = CartKey::new(
            ProductId::new(self.product_id),
            SizeId::new(self.size_id),
            self.color,
        );
        let size_label = if self.size_label.trim().is_empty() && key.size_id.is_default() {
            DEFAULT_SIZE_LABEL.to_owned()
        } else {
            self.size_label
        };
        Some(CartLine {
            product_id: key.product_id,
            size_id: key.size_id,
            size_label,
            color: key.color,
            qty: clamp_quantity(self.qty.round() as i64),
        })
    }
}

/// Decode a raw slot.
///
/// Content that isn't a JSON array is [`StorageCorruption`]. Entries that
/// don't look like cart lines are dropped, quantities are clamped, and
/// entries sharing a key are merged into the first one.
///
/// # Errors
///
/// Returns [`StorageCorruption`] if `raw` is not a JSON array.
pub fn decode_slot(raw: &str) -> Result<Vec<CartLine>, StorageCorruption> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| StorageCorruption(e.to_string()))?;

    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(line) = serde_json::from_value::<StoredLine>(entry)
            .ok()
            .and_then(StoredLine::into_line)
        else {
            continue;
        };
        let key = line.key();
        if let Some(existing) = lines.iter_mut().find(|l| l.matches(&key)) {
            existing.qty = clamp_quantity(i64::from(existing.qty) + i64::from(line.qty));
        } else {
            lines.push(line);
        }
    }

    Ok(lines)
}

/// Read an optional raw slot, treating absence and corruption as an empty
/// cart.
#[must_use]
pub fn read_slot(raw: Option<&str>) -> Vec<CartLine> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match decode_slot(raw) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(error = %e, slot = CART_SLOT_KEY, "Discarding unreadable cart");
            Vec::new()
        }
    }
}

/// Encode lines into the persisted slot layout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_slot(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string(lines)
}

/// Storage port for the cart slot.
///
/// `load` never fails: an absent or unreadable slot is an empty cart.
pub trait CartRepository {
    /// Read the whole cart.
    fn load(&self) -> Vec<CartLine>;

    /// Replace the whole cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be encoded or written.
    fn save(&mut self, lines: &[CartLine]) -> Result<(), CartStoreError>;
}

/// Cart slot kept in memory as its encoded JSON text.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartRepository {
    slot: Option<String>,
}

impl MemoryCartRepository {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot holding `raw` as-is, whether or not it decodes.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Some(raw.into()),
        }
    }

    /// The raw slot content, if anything was ever written.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl CartRepository for MemoryCartRepository {
    fn load(&self) -> Vec<CartLine> {
        read_slot(self.slot.as_deref())
    }

    fn save(&mut self, lines: &[CartLine]) -> Result<(), CartStoreError> {
        self.slot = Some(encode_slot(lines)?);
        Ok(())
    }
}

/// Cart operations over a [`CartRepository`].
#[derive(Debug, Clone, Default)]
pub struct CartStore<R> {
    repository: R,
}

impl<R: CartRepository> CartStore<R> {
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// The underlying repository.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// All lines in insertion order.
    pub fn lines(&self) -> Vec<CartLine> {
        self.repository.load()
    }

    /// The line stored under `key`, if any.
    pub fn line(&self, key: &CartKey) -> Option<CartLine> {
        self.lines().into_iter().find(|l| l.matches(key))
    }

    /// Add `qty` (default 1) of a selection, merging into an existing line
    /// with the same key. Returns the resulting line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn add(
        &mut self,
        selection: CartSelection,
        qty: Option<i64>,
    ) -> Result<CartLine, CartStoreError> {
        let qty = clamp_quantity(qty.unwrap_or(1));
        let key = selection.key();
        let mut lines = self.lines();

        let line = if let Some(existing) = lines.iter_mut().find(|l| l.matches(&key)) {
            existing.qty = clamp_quantity(i64::from(existing.qty) + i64::from(qty));
            existing.clone()
        } else {
            let size_label = if selection.size_label.trim().is_empty() && key.size_id.is_default()
            {
                DEFAULT_SIZE_LABEL.to_owned()
            } else {
                selection.size_label
            };
            let line = CartLine {
                product_id: key.product_id,
                size_id: key.size_id,
                size_label,
                color: key.color,
                qty,
            };
            lines.push(line.clone());
            line
        };

        self.repository.save(&lines)?;
        Ok(line)
    }

    /// Set the quantity of an existing line, clamped into range. Returns the
    /// updated line, or `None` without writing when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn set_quantity(
        &mut self,
        key: &CartKey,
        qty: i64,
    ) -> Result<Option<CartLine>, CartStoreError> {
        let mut lines = self.lines();
        let Some(line) = lines.iter_mut().find(|l| l.matches(key)) else {
            return Ok(None);
        };
        line.qty = clamp_quantity(qty);
        let updated = line.clone();

        self.repository.save(&lines)?;
        Ok(Some(updated))
    }

    /// Remove the line under `key`. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn remove(&mut self, key: &CartKey) -> Result<bool, CartStoreError> {
        let mut lines = self.lines();
        let before = lines.len();
        lines.retain(|l| !l.matches(key));
        if lines.len() == before {
            return Ok(false);
        }

        self.repository.save(&lines)?;
        Ok(true)
    }

    /// Empty the cart. The slot is kept, holding an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be saved.
    pub fn clear(&mut self) -> Result<(), CartStoreError> {
        self.repository.save(&[])
    }

    /// Sum of all line quantities.
    pub fn total_item_count(&self) -> u32 {
        self.lines().iter().map(|l| l.qty).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn selection(product: &str, size: &str, color: &str) -> CartSelection {
        CartSelection {
            product_id: ProductId::new(product),
            size_id: SizeId::new(size),
            size_label: size.to_uppercase(),
            color: color.to_owned(),
        }
    }

    fn store() -> CartStore<MemoryCartRepository> {
        CartStore::new(MemoryCartRepository::new())
    }

    #[test]
    fn test_add_twice_merges_into_one_line() {
        let mut cart = store();
        cart.add(selection("p1", "m", "Rojo"), Some(1)).unwrap();
        cart.add(selection("p1", "m", "Rojo"), Some(1)).unwrap();

        let lines = cart.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 2);
    }

    #[test]
    fn test_add_defaults_to_one() {
        let mut cart = store();
        let line = cart.add(selection("p1", "m", "Rojo"), None).unwrap();
        assert_eq!(line.qty, 1);
    }

    #[test]
    fn test_add_never_exceeds_max() {
        let mut cart = store();
        for _ in 0..5 {
            cart.add(selection("p1", "m", "Rojo"), Some(40)).unwrap();
        }
        assert_eq!(cart.lines()[0].qty, MAX_QUANTITY);

        let line = cart.add(selection("p2", "m", "Rojo"), Some(500)).unwrap();
        assert_eq!(line.qty, MAX_QUANTITY);
    }

    #[test]
    fn test_add_clamps_non_positive_to_one() {
        let mut cart = store();
        let line = cart.add(selection("p1", "m", "Rojo"), Some(0)).unwrap();
        assert_eq!(line.qty, 1);
        let line = cart.add(selection("p1", "m", "Rojo"), Some(-7)).unwrap();
        assert_eq!(line.qty, 2);
    }

    #[test]
    fn test_distinct_keys_make_distinct_lines() {
        let mut cart = store();
        cart.add(selection("p1", "m", "Rojo"), None).unwrap();
        cart.add(selection("p1", "m", "Azul"), None).unwrap();
        cart.add(selection("p1", "l", "Rojo"), None).unwrap();
        cart.add(selection("p2", "m", "Rojo"), None).unwrap();
        assert_eq!(cart.lines().len(), 4);
        assert_eq!(cart.total_item_count(), 4);
    }

    #[test]
    fn test_empty_color_and_size_use_defaults() {
        let mut cart = store();
        let line = cart
            .add(
                CartSelection {
                    product_id: ProductId::new("p1"),
                    size_id: SizeId::new(""),
                    size_label: String::new(),
                    color: "  ".into(),
                },
                None,
            )
            .unwrap();
        assert!(line.size_id.is_default());
        assert_eq!(line.size_label, DEFAULT_SIZE_LABEL);
        assert_eq!(line.color, DEFAULT_COLOR);

        let key = CartKey::new(ProductId::new("p1"), SizeId::new(""), "");
        assert_eq!(cart.line(&key).map(|l| l.qty), Some(1));
    }

    #[test]
    fn test_set_quantity_round_trip() {
        let mut cart = store();
        let key = cart.add(selection("p1", "m", "Rojo"), None).unwrap().key();
        for (requested, expected) in [(5, 5), (0, 1), (-3, 1), (150, 99), (99, 99), (1, 1)] {
            cart.set_quantity(&key, requested).unwrap();
            assert_eq!(cart.line(&key).unwrap().qty, expected, "qty {requested}");
        }
    }

    #[test]
    fn test_set_quantity_on_absent_key_is_noop() {
        let mut cart = store();
        let key = CartKey::new(ProductId::new("ghost"), SizeId::default_size(), "Rojo");
        assert!(cart.set_quantity(&key, 3).unwrap().is_none());
        assert!(cart.repository().raw().is_none());
    }

    #[test]
    fn test_remove() {
        let mut cart = store();
        let key = cart.add(selection("p1", "m", "Rojo"), None).unwrap().key();
        cart.add(selection("p2", "m", "Rojo"), None).unwrap();

        assert!(cart.remove(&key).unwrap());
        assert!(!cart.remove(&key).unwrap());
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_clear_keeps_empty_slot() {
        let mut cart = store();
        cart.add(selection("p1", "m", "Rojo"), Some(3)).unwrap();
        cart.clear().unwrap();
        assert!(cart.lines().is_empty());
        assert_eq!(cart.repository().raw(), Some("[]"));
        assert_eq!(cart.total_item_count(), 0);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = store();
        cart.add(selection("b", "m", "Rojo"), None).unwrap();
        cart.add(selection("a", "m", "Rojo"), None).unwrap();
        cart.add(selection("b", "m", "Rojo"), None).unwrap();
        let ids: Vec<String> = cart.lines().iter().map(|l| l.product_id.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_corrupt_slot_reads_as_empty() {
        for raw in ["not json", "{\"product_id\": \"p1\"}", "42", ""] {
            let mut cart = CartStore::new(MemoryCartRepository::with_raw(raw));
            assert!(cart.lines().is_empty(), "raw {raw:?}");
            cart.add(selection("p1", "m", "Rojo"), None).unwrap();
            assert_eq!(cart.lines().len(), 1);
        }
    }

    #[test]
    fn test_decode_drops_malformed_entries() {
        let raw = r#"[
            {"product_id": "p1", "size_id": "m", "size_label": "M", "color": "Rojo", "qty": 2},
            {"size_id": "m", "qty": 1},
            {"product_id": 7, "qty": 1},
            "oops",
            {"product_id": "", "qty": 1},
            {"product_id": "p2", "qty": "many"}
        ]"#;
        let lines = decode_slot(raw).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id.as_str(), "p1");
    }

    #[test]
    fn test_decode_clamps_and_merges() {
        let raw = r#"[
            {"product_id": "p1", "size_id": "m", "size_label": "M", "color": "Rojo", "qty": 250},
            {"product_id": "p2", "qty": 0},
            {"product_id": "p3", "qty": 2.6},
            {"product_id": "p2", "qty": 4}
        ]"#;
        let lines = decode_slot(raw).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].qty, 99);
        assert_eq!(lines[1].product_id.as_str(), "p2");
        assert_eq!(lines[1].qty, 5);
        assert!(lines[1].size_id.is_default());
        assert_eq!(lines[1].size_label, DEFAULT_SIZE_LABEL);
        assert_eq!(lines[1].color, DEFAULT_COLOR);
        assert_eq!(lines[2].qty, 3);
    }

    #[test]
    fn test_encoded_slot_layout() {
        let mut repo = MemoryCartRepository::new();
        let line = CartLine {
            product_id: ProductId::new("p1"),
            size_id: SizeId::default_size(),
            size_label: DEFAULT_SIZE_LABEL.into(),
            color: DEFAULT_COLOR.into(),
            qty: 2,
        };
        repo.save(std::slice::from_ref(&line)).unwrap();

        let json: serde_json::Value = serde_json::from_str(repo.raw().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "product_id": "p1",
                "size_id": "na",
                "size_label": "Única",
                "color": "Único",
                "qty": 2
            }])
        );
        assert_eq!(repo.load(), vec![line]);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(i64::MIN), 1);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(42), 42);
        assert_eq!(clamp_quantity(i64::MAX), 99);
    }
}
