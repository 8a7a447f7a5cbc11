pub mod context;
pub mod embedding;
pub mod vector_store;

pub use context::*;
pub use embedding::*;
pub use vector_store::*;
