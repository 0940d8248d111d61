pub mod stage0_parse;
pub mod stage1_filter;
pub mod stage2_normalize;
pub mod stage3_merge;

pub use stage0_parse::*;
pub use stage1_filter::*;
pub use stage2_normalize::*;
pub use stage3_merge::*;
