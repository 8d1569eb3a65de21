pub mod channel;
pub mod gateway;

pub use channel::*;
pub use gateway::*;
