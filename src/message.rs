//! Binary accumulator with framing.

use crate::chunk::ChunkArray;
use crate::error::{Error, Result};
use crate::tag;
use crate::value::{Flaw, Value};

/// Where a message is in its lifecycle. Transitions are
/// `Unknown -> OpenForReading | OpenForWriting -> Closed`; a closed
/// message may be reopened, which discards its contents when opening for
/// writing and replaces them when opening for reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    Unknown,
    OpenForReading,
    OpenForWriting,
    Closed,
}

/// A framed byte stream holding one encoded value.
///
/// Writing brackets the payload with start and end tags that each carry a
/// two-bit expected-type code derived from the enclosed value, letting a
/// reader validate the envelope without decoding the payload. A message
/// holds exactly one value; to send several, wrap them in an array.
///
/// ```
/// use weft::{Message, Value};
///
/// let mut msg = Message::new();
/// msg.open_for_writing().unwrap();
/// msg.write_value(&Value::from(42)).unwrap();
/// msg.close().unwrap();
/// let wire = msg.bytes();
///
/// let mut reader = Message::new();
/// reader.open_for_reading(&wire).unwrap();
/// assert_eq!(reader.get_value().unwrap(), Some(Value::from(42)));
/// reader.close().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Message {
    buffer: ChunkArray,
    state: MessageState,
    read_position: usize,
    written_tag: Option<u8>,
}

impl Default for MessageState {
    fn default() -> Self {
        MessageState::Unknown
    }
}

impl Message {
    pub fn new() -> Self {
        Message {
            buffer: ChunkArray::new(),
            state: MessageState::Unknown,
            read_position: 0,
            written_tag: None,
        }
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    /// Begin assembling a new message, discarding any previous contents.
    pub fn open_for_writing(&mut self) -> Result<()> {
        match self.state {
            MessageState::Unknown | MessageState::Closed => {
                self.buffer.reset();
                self.read_position = 0;
                self.written_tag = None;
                self.state = MessageState::OpenForWriting;
                Ok(())
            }
            _ => Err(Error::AlreadyOpen),
        }
    }

    /// Begin reading received bytes, replacing any previous contents.
    pub fn open_for_reading(&mut self, data: &[u8]) -> Result<()> {
        match self.state {
            MessageState::Unknown | MessageState::Closed => {
                self.buffer.reset();
                self.buffer.append_bytes(data);
                self.read_position = 0;
                self.written_tag = None;
                self.state = MessageState::OpenForReading;
                Ok(())
            }
            _ => Err(Error::AlreadyOpen),
        }
    }

    /// Encode the message's single value, laying down the start tag; the
    /// end tag is written at close time. A second write is rejected, as
    /// is any value with a flaw somewhere in its tree - flaws have no
    /// wire form, and skipping one would break the container counts
    /// around it.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        if self.state != MessageState::OpenForWriting {
            return Err(Error::NotOpenForWriting);
        }
        if self.written_tag.is_some() {
            return Err(Error::ValueAlreadyWritten);
        }
        if let Some(flaw) = value.find_flaw() {
            return Err(Error::FlawNotWritable(flaw.to_string()));
        }
        let type_tag = value.type_tag();
        self.buffer.append_bytes(&[tag::message_start(Some(type_tag))]);
        crate::encode::write_value(value, &mut self.buffer);
        self.written_tag = Some(type_tag);
        Ok(())
    }

    /// Finish the message. For a written message this seals the envelope;
    /// a message closed without any writes carries the two-byte empty
    /// envelope.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            MessageState::OpenForWriting => {
                match self.written_tag {
                    Some(type_tag) => {
                        self.buffer.append_bytes(&[tag::message_end(Some(type_tag))]);
                    }
                    None => {
                        self.buffer.append_bytes(&[tag::message_start(None), tag::message_end(None)]);
                    }
                }
                self.state = MessageState::Closed;
                Ok(())
            }
            MessageState::OpenForReading => {
                self.state = MessageState::Closed;
                Ok(())
            }
            _ => Err(Error::NotOpen),
        }
    }

    /// Decode the next value. Returns `Ok(None)` when the buffer holds no
    /// complete message (or an empty envelope); structural defects come
    /// back as in-band [`Flaw`] values.
    pub fn get_value(&mut self) -> Result<Option<Value>> {
        if self.state != MessageState::OpenForReading {
            return Err(Error::NotOpenForReading);
        }
        let start = match self.buffer.get_byte(self.read_position) {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if start & !(tag::MESSAGE_EMPTY_MASK | tag::MESSAGE_EXPECTED_TYPE_MASK)
            != tag::message_start(None)
        {
            return Ok(Some(Value::Flaw(Flaw::new(
                "Message with incorrect start tag",
                self.read_position,
            ))));
        }
        if start & tag::MESSAGE_EMPTY_MASK == tag::MESSAGE_EMPTY {
            // Empty envelope: expect the matching end tag and yield no
            // value.
            let end = match self.buffer.get_byte(self.read_position + 1) {
                Some(byte) => byte,
                None => return Ok(None),
            };
            if end != tag::message_end(None) {
                return Ok(Some(Value::Flaw(Flaw::new(
                    "Empty Message with incorrect end tag",
                    self.read_position + 1,
                ))));
            }
            self.read_position += 2;
            return Ok(None);
        }
        let expected = start & tag::MESSAGE_EXPECTED_TYPE_MASK;
        let mut position = self.read_position + 1;
        let lead = match self.buffer.get_byte(position) {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if lead >> tag::MESSAGE_EXPECTED_TYPE_SHIFT != expected {
            return Ok(Some(Value::Flaw(Flaw::new(
                "Message expected type does not match its value",
                position,
            ))));
        }
        let value = match crate::extract::value_from_message(&self.buffer, &mut position, None) {
            Some(value) => value,
            None => return Ok(None),
        };
        if value.is_flaw() {
            return Ok(Some(value));
        }
        let end = match self.buffer.get_byte(position) {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if end != tag::message_end(Some(value.type_tag())) {
            return Ok(Some(Value::Flaw(Flaw::new(
                "Message with incorrect end tag",
                position,
            ))));
        }
        self.read_position = position + 1;
        Ok(Some(value))
    }

    /// Total bytes held, envelope included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Materialize the message bytes for transport.
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.bytes()
    }

    /// Discard contents and return to the unopened state.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.read_position = 0;
        self.written_tag = None;
        self.state = MessageState::Unknown;
    }
}
