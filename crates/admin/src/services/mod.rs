//! Admin services.

pub mod console;

pub use console::{AdminConsole, ProductRow, RefreshOutcome};
