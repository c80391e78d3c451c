//! Git references (HEAD, branches, tags).

pub mod resolver;

pub use resolver::{RefStore, RefValue, ResolvedRef};
