pub mod anthropic;
pub mod completion;
pub mod extraction;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod schema;

pub use anthropic::*;
pub use completion::*;
pub use extraction::*;
pub use gemini::*;
pub use openai::*;
pub use prompts::*;
pub use schema::*;
