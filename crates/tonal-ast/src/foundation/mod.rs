//! Foundation types shared by every stage of the back-end.

pub mod path;
pub mod span;

pub use path::Path;
pub use span::Span;
