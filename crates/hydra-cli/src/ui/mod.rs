//! Terminal output: theme, progress lines and tables.

pub mod output;
pub mod table;
pub mod theme;

pub use output::Output;
pub use theme::{Theme, format_size};
