//! Typed value trees with two equivalent external representations: a
//! human-readable S-expression text form and a self-delimiting binary
//! wire form.
//!
//! weft is the value core of a channel-wiring messaging system. Producers
//! build a [`Value`] tree - scalars, byte strings, blobs, IPv4 addresses,
//! packed dates and times, plus ordered arrays, maps, and sets - then
//! either print it into a [`StringBuffer`] or frame it into a [`Message`]
//! for the wire. Consumers run the inverse codec and get the same tree
//! back.
//!
//! Decoding distinguishes three failure tiers: a truncated buffer comes
//! back as `None`, a structurally broken encoding comes back as an
//! in-band [`Flaw`] value carrying a description and byte offset, and
//! misusing an API (say, reading a message that was never opened) is an
//! [`Error`].
//!
//! ```
//! use weft::{Array, Message, StringBuffer, Value};
//!
//! let mut arr = Array::new();
//! arr.add_value(Value::from(true));
//! arr.add_value(Value::from(42));
//! arr.add_value(Value::from("ab"));
//! let value = Value::Array(arr);
//!
//! // Textual form.
//! let mut text = StringBuffer::new();
//! value.print_to(&mut text, false);
//! assert_eq!(text.to_string(), "( true 42 \"ab\" )");
//! assert_eq!(text.convert_to_value(), Some(value.clone()));
//!
//! // Binary form.
//! let mut msg = Message::new();
//! msg.open_for_writing()?;
//! msg.write_value(&value)?;
//! msg.close()?;
//!
//! let mut reader = Message::new();
//! reader.open_for_reading(&msg.bytes())?;
//! assert_eq!(reader.get_value()?, Some(value));
//! # Ok::<(), weft::Error>(())
//! ```

mod array;
mod chunk;
mod compare;
mod date_time;
mod de;
mod encode;
mod error;
mod extract;
mod map;
mod message;
mod print;
mod scan;
mod ser;
mod set;
mod string_buffer;
mod tag;
mod utils;
mod value;

pub use self::array::Array;
pub use self::chunk::{BufferChunk, ChunkArray, CHUNK_SIZE};
pub use self::date_time::{pack_date, pack_time, unpack_date, unpack_time, DateTime};
pub use self::error::{Error, Result};
pub use self::map::Map;
pub use self::message::{Message, MessageState};
pub use self::set::Set;
pub use self::string_buffer::StringBuffer;
pub use self::utils::{random_channel_name, random_hex_string};
pub use self::value::{Flaw, Kind, Value};
