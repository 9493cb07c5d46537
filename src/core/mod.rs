mod fold;
mod frame;

pub use fold::{Fold, Phase};
pub use frame::Frame;
pub(crate) use frame::take;
