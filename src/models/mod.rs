pub mod record;
pub mod tags;

pub use record::*;
pub use tags::*;
