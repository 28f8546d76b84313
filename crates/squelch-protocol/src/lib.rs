//! # squelch-protocol
//!
//! Wire format for the chat records the Squelch radio router pushes to
//! connected sessions.
//!
//! A routing call builds one [`ChatRecord`], wraps it in a [`Frame`] and
//! encodes it once; every recipient session receives the same bytes.
//!
//! ## Example
//!
//! ```rust
//! use squelch_protocol::{codec, ChatChannel, ChatRecord, Frame};
//!
//! let record = ChatRecord::new(ChatChannel::Radio, "status green", "[Command] Alice says, \"status green\"");
//! let encoded = codec::encode(&Frame::chat(record)).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert!(matches!(decoded, Frame::Chat { .. }));
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{ChatChannel, ChatRecord, Frame};
