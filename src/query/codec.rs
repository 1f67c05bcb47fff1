// src/query/codec.rs
//! Cube 2 packet integer and string packing.
//!
//! Integers between -126 and 127 take one signed byte. Anything else is a
//! marker byte (`0x80` for an `i16`, `0x81` for an `i32`) followed by the
//! value in little endian. Strings are encoded characters up to a 0.

use byteorder::{LittleEndian, ReadBytesExt};

use super::QueryError;

const MARKER_I16: i8 = -128;
const MARKER_I32: i8 = -127;

pub fn put_int(buf: &mut Vec<u8>, n: i32) {
    if n < 128 && n > -127 {
        buf.push(n as i8 as u8);
    } else if n < 0x8000 && n >= -0x8000 {
        buf.push(MARKER_I16 as u8);
        buf.extend_from_slice(&(n as i16).to_le_bytes());
    } else {
        buf.push(MARKER_I32 as u8);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

pub fn put_string(buf: &mut Vec<u8>, s: &str) {
    for c in s.chars() {
        let c = if c.is_ascii() && c != '\0' { c as i32 } else { '?' as i32 };
        put_int(buf, c);
    }
    put_int(buf, 0);
}

fn truncated(_: std::io::Error) -> QueryError {
    QueryError::Malformed("packet ended early".to_string())
}

/// Cursor over a received datagram.
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn get_int(&mut self) -> Result<i32, QueryError> {
        match self.buf.read_i8().map_err(truncated)? {
            MARKER_I16 => Ok(self.buf.read_i16::<LittleEndian>().map_err(truncated)? as i32),
            MARKER_I32 => self.buf.read_i32::<LittleEndian>().map_err(truncated),
            n => Ok(n as i32),
        }
    }

    /// Characters outside printable ASCII come out as U+FFFD.
    pub fn get_string(&mut self) -> Result<String, QueryError> {
        let mut s = String::new();
        loop {
            match self.get_int()? {
                0 => return Ok(s),
                c @ 0x20..=0x7e => s.push(c as u8 as char),
                _ => s.push(char::REPLACEMENT_CHARACTER),
            }
        }
    }

    pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8], QueryError> {
        if self.buf.len() < n {
            return Err(truncated(std::io::ErrorKind::UnexpectedEof.into()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Replies start by echoing the request; anything else is not ours.
    pub fn expect_echo(&mut self, request: &[u8]) -> Result<(), QueryError> {
        let echoed = self
            .get_bytes(request.len())
            .map_err(|_| QueryError::Malformed("reply shorter than request".to_string()))?;
        if echoed != request {
            return Err(QueryError::Malformed("reply does not echo the request".to_string()));
        }
        Ok(())
    }
}
