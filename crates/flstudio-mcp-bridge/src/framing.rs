//! Framing for JSON messages on a byte stream.
//!
//! Messages carry no length prefix or delimiter: a message ends where the
//! JSON value ends. Reads may split a message or carry several.

use serde_json::Value;

use flstudio_mcp_core::{Error, Result};

/// Accumulates bytes and yields complete JSON values.
#[derive(Debug)]
pub struct JsonStreamDecoder {
    buf: Vec<u8>,
    max_bytes: usize,
}

impl JsonStreamDecoder {
    /// Decoder that refuses to buffer more than `max_bytes` of one message.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_bytes,
        }
    }

    /// Append received bytes.
    ///
    /// Fails with [`Error::MessageTooLarge`] and drops the buffer when the
    /// pending data exceeds the limit.
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > self.max_bytes {
            self.buf.clear();
            return Err(Error::MessageTooLarge(self.max_bytes));
        }
        Ok(())
    }

    /// Take the next complete value, if one is buffered.
    ///
    /// An incomplete tail stays buffered. Malformed input fails with
    /// [`Error::InvalidJson`] and clears the buffer.
    pub fn next_message(&mut self) -> Result<Option<Value>> {
        let (next, used) = {
            let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(value)) => {
                self.buf.drain(..used);
                Ok(Some(value))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => {
                self.buf.clear();
                Err(Error::InvalidJson(e.to_string()))
            }
            None => {
                // only whitespace left
                self.buf.clear();
                Ok(None)
            }
        }
    }

    /// Bytes waiting for the rest of a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial message.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
