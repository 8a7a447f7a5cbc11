pub mod stage0_retrieval;
pub mod stage1_narrative;
pub mod stage2_structured;
pub mod stage3_render;

pub use stage0_retrieval::*;
pub use stage1_narrative::*;
pub use stage2_structured::*;
pub use stage3_render::*;
