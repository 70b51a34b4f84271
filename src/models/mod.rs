mod account;
mod invoice;

pub use account::*;
pub use invoice::*;
