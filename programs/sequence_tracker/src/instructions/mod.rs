pub mod admin;
pub mod close_segment;
pub mod consume_sequence;
pub mod initialize;
pub mod initialize_channel;
mod segment_accounts;

pub use admin::*;
pub use close_segment::*;
pub use consume_sequence::*;
pub use initialize::*;
pub use initialize_channel::*;
