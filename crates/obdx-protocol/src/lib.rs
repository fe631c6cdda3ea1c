pub mod codec;
pub mod frame;
pub mod reading;

pub use codec::*;
pub use frame::*;
pub use reading::*;
