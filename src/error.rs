//! Library error types.

use std::fmt;

/// A weft Result, normally returning a weft [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised when the library is used outside its contracts.
///
/// Recoverable decode conditions never show up here: buffer underflow is
/// reported as `None` and structural wire defects travel in-band as
/// [`Flaw`](crate::Flaw) values. `Error` is reserved for caller mistakes,
/// chiefly driving a [`Message`](crate::Message) against its state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A message operation needed the message to be open for reading.
    NotOpenForReading,
    /// A message operation needed the message to be open for writing.
    NotOpenForWriting,
    /// A message was opened while already open.
    AlreadyOpen,
    /// A close was requested on a message that was never opened.
    NotOpen,
    /// A second value was written to a message; a message holds exactly
    /// one value, so several must be wrapped in an array.
    ValueAlreadyWritten,
    /// A value containing a flaw was handed to `write_value`; flaws
    /// report extraction defects and have no wire form.
    FlawNotWritable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotOpenForReading => write!(f, "Message is not open for reading"),
            Error::NotOpenForWriting => write!(f, "Message is not open for writing"),
            Error::AlreadyOpen => write!(f, "Message is already open"),
            Error::NotOpen => write!(f, "Message was not open"),
            Error::ValueAlreadyWritten => write!(f, "Message already holds a value"),
            Error::FlawNotWritable(ref desc) => {
                write!(f, "Flaw values cannot be written to a message: {}", desc)
            }
        }
    }
}

impl std::error::Error for Error {}
