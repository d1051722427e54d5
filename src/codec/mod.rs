//! Non-standard encodings used by the remote API.

pub mod expires_in;
pub mod timestamp;

pub use timestamp::Timestamp;
