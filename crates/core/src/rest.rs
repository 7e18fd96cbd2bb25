//! Shapes shared by every client of the hosted backend's REST API.

/// Columns selected when reading `products`.
pub const PRODUCT_COLUMNS: &str = "id,name,category,desc,base_price,discount_percent,featured,colors,image_url,image_path,created_at,updated_at";

/// Columns selected when reading `product_sizes`.
pub const SIZE_COLUMNS: &str = "id,product_id,label,extra_price";

/// Pull a human-readable message out of a backend error body.
///
/// Auth answers `{"error_description": ...}` or `{"msg": ...}`, REST and
/// storage answer `{"message": ...}`. Anything else is returned truncated
/// as-is.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
