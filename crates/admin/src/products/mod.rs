//! Product editing: form input and the payloads written to the backend.

mod form;

pub use form::{
    ProductDraft, ProductForm, SizeDraft, ValidationError, parse_colors, parse_size_lines,
};
