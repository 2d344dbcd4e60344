//! Firebase Realtime Database transport: status writes over REST and the
//! Studio change feed over server-sent events.

mod feed;
mod session;
mod sink;
mod sse;

pub use feed::ChangeFeed;
pub use session::FirebaseSession;
pub use sink::FirebaseStatusSink;
pub use sse::{FeedMessage, SseDecoder};
