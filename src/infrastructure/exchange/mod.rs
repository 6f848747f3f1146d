//! Connection management for venue streams.

mod reconnecting;

pub use reconnecting::ReconnectingStream;
