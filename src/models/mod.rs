pub mod association;
pub mod criteria;
pub mod enums;
pub mod evidence;
pub mod failure;
pub mod sentence;
pub mod span;
pub mod status;

pub use association::*;
pub use criteria::*;
pub use enums::*;
pub use evidence::*;
pub use failure::*;
pub use sentence::*;
pub use span::*;
pub use status::*;
