// src/content/mod.rs
pub mod glossary;
pub mod guide;
pub mod source;

// Re-export commonly used types
pub use glossary::{lookup, terms};
pub use guide::guide;
pub use source::{SourceError, SourceFetcher};
