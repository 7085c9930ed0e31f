//! Domain layer: the configuration tree model
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod error;
pub mod nested;
pub mod node;
pub mod scalar;

pub use error::{DomainError, DomainResult};
pub use nested::{Nested, MAX_SERIALIZE_DEPTH};
pub use node::{NodeKind, TreeNode};
pub use scalar::Scalar;
