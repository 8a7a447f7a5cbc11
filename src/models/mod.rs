pub mod analysis;
pub mod knowledge;
pub mod metadata;
pub mod record;
pub mod transcript;

pub use analysis::*;
pub use knowledge::*;
pub use metadata::*;
pub use record::*;
pub use transcript::*;
