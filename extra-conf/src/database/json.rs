// SPDX-License-Identifier: GPL-3.0-or-later

//! Reads a JSON array element by element.
//!
//! Compilation databases of large projects have many thousands of entries.
//! Reading them one at a time lets the loader validate each entry as it
//! arrives and report the position of the first broken one.

use serde::de::DeserializeOwned;
use std::io;

/// Deserialize the elements of a JSON array into an iterator.
///
/// from https://github.com/serde-rs/json/issues/404#issuecomment-892957228
///
/// The elements must be self-delimiting (objects, arrays, strings). After the
/// first error the iterator yields nothing more.
pub fn deserialize_seq<T, R>(reader: R) -> impl Iterator<Item = Result<T, serde_json::Error>>
where
    T: DeserializeOwned,
    R: io::Read,
{
    let mut reader = PeekableReader::new(reader);
    let mut state = State::AtStart;
    std::iter::from_fn(move || next_element(&mut reader, &mut state).transpose())
}

// A reader which can look at the next byte without consuming it.
struct PeekableReader<R> {
    reader: R,
    peeked: Option<u8>,
}

impl<R: io::Read> PeekableReader<R> {
    fn new(reader: R) -> Self {
        PeekableReader { reader, peeked: None }
    }

    fn read_byte(&mut self) -> Result<u8, serde_json::Error> {
        let mut byte = 0u8;
        self.reader
            .read_exact(std::slice::from_mut(&mut byte))
            .map_err(serde_json::Error::io)?;
        Ok(byte)
    }

    fn peek(&mut self) -> Result<u8, serde_json::Error> {
        match self.peeked {
            Some(byte) => Ok(byte),
            None => {
                let byte = self.read_byte()?;
                self.peeked = Some(byte);
                Ok(byte)
            }
        }
    }

    fn consume(&mut self) -> Result<u8, serde_json::Error> {
        match self.peeked.take() {
            Some(byte) => Ok(byte),
            None => self.read_byte(),
        }
    }

    fn peek_skipping_ws(&mut self) -> Result<u8, serde_json::Error> {
        loop {
            let byte = self.peek()?;
            if !byte.is_ascii_whitespace() {
                return Ok(byte);
            }
            self.consume()?;
        }
    }

    fn consume_skipping_ws(&mut self) -> Result<u8, serde_json::Error> {
        self.peek_skipping_ws()?;
        self.consume()
    }
}

impl<R: io::Read> io::Read for PeekableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            return Ok(1);
        }
        self.reader.read(buf)
    }
}

enum State {
    AtStart,
    AtMiddle,
    Finished,
    Failed,
}

fn next_element<T, R>(reader: &mut PeekableReader<R>, state: &mut State) -> Result<Option<T>, serde_json::Error>
where
    T: DeserializeOwned,
    R: io::Read,
{
    let result = match state {
        State::AtStart => {
            if reader.consume_skipping_ws()? != b'[' {
                Err(serde::de::Error::custom("expected `[`"))
            } else if reader.peek_skipping_ws()? == b']' {
                reader.consume()?;
                *state = State::Finished;
                Ok(None)
            } else {
                *state = State::AtMiddle;
                deserialize_single(reader).map(Some)
            }
        }
        State::AtMiddle => match reader.consume_skipping_ws()? {
            b',' => deserialize_single(reader).map(Some),
            b']' => {
                *state = State::Finished;
                Ok(None)
            }
            _ => Err(serde::de::Error::custom("expected `,` or `]`")),
        },
        State::Finished | State::Failed => Ok(None),
    };
    if result.is_err() {
        *state = State::Failed;
    }
    result
}

fn deserialize_single<T, R>(reader: &mut R) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
    R: io::Read,
{
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<T>()
        .next()
        .unwrap_or_else(|| Err(serde::de::Error::custom("premature EOF")))
}
