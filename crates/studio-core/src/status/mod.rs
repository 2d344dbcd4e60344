//! Outbound status: the sink trait, the serializing publisher and the
//! shared working flag.

mod publisher;
mod sink;
mod working;

pub use publisher::*;
pub use sink::*;
pub use working::*;
