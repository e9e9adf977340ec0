// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Byte level codec: base-128 varints, zigzag, fixed-width little-endian
//! values and length-delimited payloads.

use crate::error::Error;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Longest legal varint: ten 7-bit groups cover 64 bits.
pub const MAX_VARINT_LEN: usize = 10;

#[inline(always)]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[inline(always)]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline(always)]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Number of bytes `value` takes as a varint.
#[inline(always)]
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Encodes `value` as a standalone varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut writer = Writer::with_capacity(varint_len(value));
    writer.write_varuint64(value);
    writer.into_bytes()
}

/// Decodes a varint from the front of `bf`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(bf: &[u8]) -> Result<(u64, usize), Error> {
    let mut reader = Reader::new(bf);
    let value = reader.read_varuint64()?;
    Ok((value, reader.get_cursor()))
}

#[derive(Default)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    /// Inserts `data` at `offset`, shifting everything after it.
    pub fn insert_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), Error> {
        if offset > self.bf.len() {
            return Err(Error::framing_error(format!(
                "insert offset {} is past the end of a {} byte buffer",
                offset,
                self.bf.len()
            )));
        }
        self.bf.splice(offset..offset, data.iter().copied());
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_u32_be(&mut self, value: u32) {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_varuint64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.bf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
    }

    pub fn write_varuint32(&mut self, value: u32) {
        self.write_varuint64(value as u64)
    }

    pub fn write_zigzag64(&mut self, value: i64) {
        self.write_varuint64(zigzag_encode64(value))
    }

    pub fn write_zigzag32(&mut self, value: i32) {
        self.write_varuint32(zigzag_encode32(value))
    }

    /// Varint length followed by the raw bytes.
    pub fn write_length_delimited(&mut self, v: &[u8]) {
        self.write_varuint64(v.len() as u64);
        self.write_bytes(v);
    }
}

/// Cursor over a borrowed byte slice. Every read is bounds checked and
/// reports [`Error::TruncatedInput`] instead of panicking.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    #[inline(always)]
    pub fn is_eof(&self) -> bool {
        self.cursor >= self.bf.len()
    }

    pub fn slice_after_cursor(&self) -> &'a [u8] {
        &self.bf[self.cursor..]
    }

    /// Bytes between two absolute offsets of the underlying buffer.
    pub fn slice(&self, start: usize, end: usize) -> Result<&'a [u8], Error> {
        self.bf
            .get(start..end)
            .ok_or_else(|| Error::truncated_input(start, end.saturating_sub(start), self.bf.len()))
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        if self.cursor + n > self.bf.len() {
            return Err(Error::truncated_input(self.cursor, n, self.bf.len()));
        }
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check_bound(len)?;
        self.cursor += len;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.check_bound(len)?;
        let bytes = &self.bf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check_bound(1)?;
        let v = self.bf[self.cursor];
        self.cursor += 1;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let b = match self.bf.get(self.cursor) {
                Some(b) => *b,
                None => return Err(Error::truncated_input(self.cursor, 1, self.bf.len())),
            };
            self.cursor += 1;
            result |= ((b & 0x7F) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::malformed_varint(format!(
            "varint ending at offset {} did not terminate within {} bytes",
            self.cursor, MAX_VARINT_LEN
        )))
    }

    /// Like [`Reader::read_varuint64`] but returns `None` at a clean end of input.
    pub fn try_read_varuint64(&mut self) -> Result<Option<u64>, Error> {
        if self.is_eof() {
            return Ok(None);
        }
        self.read_varuint64().map(Some)
    }

    pub fn read_zigzag64(&mut self) -> Result<i64, Error> {
        Ok(zigzag_decode64(self.read_varuint64()?))
    }

    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_varuint64()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::truncated_input(self.cursor, usize::MAX, self.bf.len()))?;
        self.read_bytes(len)
    }
}
