pub use common::*;
pub use traits::*;

mod common;
mod traits;

pub mod mock;
