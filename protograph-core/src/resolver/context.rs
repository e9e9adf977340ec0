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

//! Per-call encode and decode state.
//!
//! A [`WriteContext`] owns the output buffer, the pending field header, the
//! stack of open sub-items and the reference cache for one top level
//! serialize call. A [`ReadContext`] is its mirror image over a borrowed
//! input slice. Neither is shared between calls.

use crate::buffer::{decode_varint, encode_varint, Reader, Writer};
use crate::config::Config;
use crate::error::Error;
use crate::resolver::ref_resolver::{RefReader, RefWriter};
use crate::resolver::type_resolver::TypeResolver;
use crate::types::{check_field_number, make_header, split_header, WireType};
use log::trace;
use std::any::{Any, TypeId};

/// Marker returned when a sub-item is opened. It must be handed back to the
/// same context, innermost first.
#[derive(Debug)]
#[must_use = "a sub-item must be closed with end_sub_item"]
pub struct SubItemToken {
    depth: usize,
}

enum WriteFrame {
    LengthPrefixed { start: usize },
    Group { field_number: u32 },
}

pub struct WriteContext<'a> {
    pub writer: Writer,
    resolver: &'a TypeResolver,
    config: &'a Config,
    pub ref_writer: RefWriter,
    frames: Vec<WriteFrame>,
    pending: Option<(u32, WireType)>,
}

impl<'a> WriteContext<'a> {
    pub fn new(resolver: &'a TypeResolver, config: &'a Config) -> WriteContext<'a> {
        WriteContext {
            writer: Writer::default(),
            resolver,
            config,
            ref_writer: RefWriter::new(),
            frames: Vec::new(),
            pending: None,
        }
    }

    #[inline(always)]
    pub fn get_resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    #[inline(always)]
    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    /// Current sub-item nesting depth.
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn write_field_header(&mut self, field_number: u32, wire_type: WireType) -> Result<(), Error> {
        if let Some((pending, _)) = self.pending {
            return Err(Error::framing_error(format!(
                "cannot write header for field {} before the value of field {}",
                field_number, pending
            )));
        }
        check_field_number(field_number)?;
        if wire_type == WireType::EndGroup {
            return Err(Error::framing_error(
                "end group markers are written by end_sub_item",
            ));
        }
        self.writer
            .write_varuint64(make_header(field_number, wire_type));
        self.pending = Some((field_number, wire_type));
        Ok(())
    }

    fn take_pending(&mut self) -> Result<(u32, WireType), Error> {
        self.pending
            .take()
            .ok_or_else(|| Error::framing_error("a value was written without a field header"))
    }

    /// Wire type of the header waiting for its value.
    pub fn pending_wire_type(&self) -> Option<WireType> {
        self.pending.map(|(_, wire_type)| wire_type)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        let (field_number, wire_type) = self.take_pending()?;
        match wire_type {
            WireType::Variant => self.writer.write_varuint64(value as u64),
            WireType::SignedVariant => self.writer.write_zigzag64(value),
            WireType::Fixed64 => self.writer.write_u64(value as u64),
            WireType::Fixed32 => {
                let narrow = i32::try_from(value).map_err(|_| {
                    Error::encode_error(format!(
                        "value {} of field {} does not fit in fixed32",
                        value, field_number
                    ))
                })?;
                self.writer.write_u32(narrow as u32)
            }
            other => return Err(unexpected(field_number, other, "an integer")),
        }
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.write_i64(value as i64)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        let (field_number, wire_type) = self.take_pending()?;
        match wire_type {
            WireType::Variant | WireType::SignedVariant => self.writer.write_varuint64(value),
            WireType::Fixed64 => self.writer.write_u64(value),
            WireType::Fixed32 => {
                let narrow = u32::try_from(value).map_err(|_| {
                    Error::encode_error(format!(
                        "value {} of field {} does not fit in fixed32",
                        value, field_number
                    ))
                })?;
                self.writer.write_u32(narrow)
            }
            other => return Err(unexpected(field_number, other, "an unsigned integer")),
        }
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.write_u64(value as u64)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.write_u64(value as u64)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        let (field_number, wire_type) = self.take_pending()?;
        match wire_type {
            WireType::Fixed64 => self.writer.write_f64(value),
            WireType::Fixed32 => {
                let narrow = value as f32;
                if value.is_finite() && narrow.is_infinite() {
                    return Err(Error::encode_error(format!(
                        "value {} of field {} overflows a 32-bit float",
                        value, field_number
                    )));
                }
                self.writer.write_f32(narrow)
            }
            other => return Err(unexpected(field_number, other, "a floating point value")),
        }
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        let (field_number, wire_type) = self.take_pending()?;
        match wire_type {
            WireType::Fixed32 => self.writer.write_f32(value),
            WireType::Fixed64 => self.writer.write_f64(value as f64),
            other => return Err(unexpected(field_number, other, "a floating point value")),
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        let (field_number, wire_type) = self.take_pending()?;
        match wire_type {
            WireType::String => self.writer.write_length_delimited(value),
            other => return Err(unexpected(field_number, other, "a length-delimited value")),
        }
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        self.write_bytes(value.as_bytes())
    }

    /// Appends bytes that already carry their own headers, such as preserved
    /// unknown fields.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if let Some((field_number, _)) = self.pending {
            return Err(Error::framing_error(format!(
                "raw bytes written while field {} waits for its value",
                field_number
            )));
        }
        self.writer.write_bytes(bytes);
        Ok(())
    }

    /// Opens a sub-message for the pending `String` or `StartGroup` header.
    pub fn start_sub_item(&mut self) -> Result<SubItemToken, Error> {
        let (field_number, wire_type) = self.take_pending()?;
        if self.frames.len() as u32 >= self.config.max_depth() {
            return Err(Error::depth_exceed(format!(
                "maximum nesting depth ({}) exceeded while writing field {}",
                self.config.max_depth(),
                field_number
            )));
        }
        let frame = match wire_type {
            WireType::String => WriteFrame::LengthPrefixed {
                start: self.writer.len(),
            },
            WireType::StartGroup => WriteFrame::Group { field_number },
            other => return Err(unexpected(field_number, other, "a sub-message")),
        };
        self.frames.push(frame);
        Ok(SubItemToken {
            depth: self.frames.len() - 1,
        })
    }

    pub fn end_sub_item(&mut self, token: SubItemToken) -> Result<(), Error> {
        if let Some((field_number, _)) = self.pending {
            return Err(Error::framing_error(format!(
                "sub-item closed while field {} waits for its value",
                field_number
            )));
        }
        if token.depth + 1 != self.frames.len() {
            return Err(Error::framing_error(format!(
                "sub-item token for depth {} closed at depth {}",
                token.depth,
                self.frames.len()
            )));
        }
        match self.frames.pop() {
            Some(WriteFrame::LengthPrefixed { start }) => {
                let len = self.writer.len() - start;
                let prefix = encode_varint(len as u64);
                self.writer.insert_bytes(start, &prefix)?;
                let (declared, used) = decode_varint(&self.writer.as_slice()[start..])?;
                if declared as usize + used + start != self.writer.len() {
                    return Err(Error::framing_error(format!(
                        "length prefix {} does not match {} framed bytes",
                        declared, len
                    )));
                }
                trace!("closed sub-item of {} bytes at offset {}", len, start);
            }
            Some(WriteFrame::Group { field_number }) => {
                self.writer
                    .write_varuint64(make_header(field_number, WireType::EndGroup));
                trace!("closed group {}", field_number);
            }
            None => return Err(Error::framing_error("no open sub-item")),
        }
        Ok(())
    }

    /// Writes the full message body of `value`, whose runtime type is `concrete`.
    pub fn write_object(&mut self, value: &dyn Any, concrete: TypeId) -> Result<(), Error> {
        let resolver = self.resolver;
        let serializer = resolver.get_serializer(concrete)?;
        serializer.write(value, self)
    }

    /// Finishes the call, checking that every sub-item was closed.
    pub fn close(self) -> Result<Vec<u8>, Error> {
        if !self.frames.is_empty() {
            return Err(Error::framing_error(format!(
                "{} sub-items are still open",
                self.frames.len()
            )));
        }
        if let Some((field_number, _)) = self.pending {
            return Err(Error::framing_error(format!(
                "field {} has a header but no value",
                field_number
            )));
        }
        Ok(self.writer.into_bytes())
    }
}

#[derive(Clone, Debug)]
enum ReadFrame {
    Length { outer_limit: usize },
    Group { field_number: u32, closed: bool },
}

pub struct ReadContext<'a> {
    reader: Reader<'a>,
    resolver: &'a TypeResolver,
    config: &'a Config,
    pub ref_reader: RefReader,
    frames: Vec<ReadFrame>,
    limit: usize,
    field_number: u32,
    wire_type: WireType,
    field_start: usize,
}

impl<'a> ReadContext<'a> {
    pub fn new(bf: &'a [u8], resolver: &'a TypeResolver, config: &'a Config) -> ReadContext<'a> {
        ReadContext {
            reader: Reader::new(bf),
            resolver,
            config,
            ref_reader: RefReader::new(),
            frames: Vec::new(),
            limit: bf.len(),
            field_number: 0,
            wire_type: WireType::Variant,
            field_start: 0,
        }
    }

    #[inline(always)]
    pub fn get_resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    #[inline(always)]
    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    pub fn field_number(&self) -> u32 {
        self.field_number
    }

    #[inline(always)]
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.reader.get_cursor()
    }

    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Reinterprets a plain varint as zigzag encoded.
    pub fn hint(&mut self, wire_type: WireType) {
        if wire_type == WireType::SignedVariant && self.wire_type == WireType::Variant {
            self.wire_type = WireType::SignedVariant;
        }
    }

    fn ensure_within_frame(&self) -> Result<(), Error> {
        let cursor = self.reader.get_cursor();
        if cursor > self.limit {
            return Err(Error::truncated_input(
                self.field_start,
                cursor - self.field_start,
                self.limit,
            ));
        }
        Ok(())
    }

    fn frame_exhausted(&self) -> bool {
        matches!(self.frames.last(), Some(ReadFrame::Group { closed: true, .. }))
            || self.reader.get_cursor() >= self.limit
    }

    /// Reads the next field header of the current frame. Returns 0 once the
    /// frame has no more fields.
    pub fn read_field_header(&mut self) -> Result<u32, Error> {
        if self.frame_exhausted() {
            self.ensure_within_frame()?;
            self.field_number = 0;
            return Ok(0);
        }
        self.field_start = self.reader.get_cursor();
        let header = self.reader.read_varuint64()?;
        self.ensure_within_frame()?;
        let (field_number, wire_type) = split_header(header)?;
        if wire_type == WireType::EndGroup {
            return match self.frames.last_mut() {
                Some(ReadFrame::Group {
                    field_number: open,
                    closed,
                }) if *open == field_number => {
                    *closed = true;
                    self.field_number = 0;
                    Ok(0)
                }
                Some(ReadFrame::Group {
                    field_number: open, ..
                }) => Err(Error::framing_error(format!(
                    "group {} closed by end group marker {}",
                    open, field_number
                ))),
                _ => Err(Error::framing_error(format!(
                    "unexpected end group marker {}",
                    field_number
                ))),
            };
        }
        self.field_number = field_number;
        self.wire_type = wire_type;
        Ok(field_number)
    }

    /// Consumes the next header only if it repeats the current field with the
    /// same wire type.
    pub fn try_read_field_header(&mut self, field_number: u32) -> Result<bool, Error> {
        if self.frame_exhausted() {
            return Ok(false);
        }
        let mut probe = self.reader;
        let start = probe.get_cursor();
        let header = probe.read_varuint64()?;
        if header != make_header(field_number, self.wire_type) {
            return Ok(false);
        }
        let (field_number, wire_type) = split_header(header)?;
        self.reader = probe;
        self.field_start = start;
        self.field_number = field_number;
        self.wire_type = wire_type;
        self.ensure_within_frame()?;
        Ok(true)
    }

    fn varint(&mut self) -> Result<u64, Error> {
        let value = self.reader.read_varuint64()?;
        self.ensure_within_frame()?;
        Ok(value)
    }

    fn fixed32(&mut self) -> Result<u32, Error> {
        let value = self.reader.read_u32()?;
        self.ensure_within_frame()?;
        Ok(value)
    }

    fn fixed64(&mut self) -> Result<u64, Error> {
        let value = self.reader.read_u64()?;
        self.ensure_within_frame()?;
        Ok(value)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        match self.wire_type {
            WireType::Variant => Ok(self.varint()? as i64),
            WireType::SignedVariant => Ok(crate::buffer::zigzag_decode64(self.varint()?)),
            WireType::Fixed64 => Ok(self.fixed64()? as i64),
            WireType::Fixed32 => Ok(self.fixed32()? as i32 as i64),
            other => Err(unexpected(self.field_number, other, "an integer")),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        let value = self.read_i64()?;
        i32::try_from(value).map_err(|_| {
            Error::invalid_data(format!(
                "value {} of field {} overflows a 32-bit integer",
                value, self.field_number
            ))
        })
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        match self.wire_type {
            WireType::Variant | WireType::SignedVariant => self.varint(),
            WireType::Fixed64 => self.fixed64(),
            WireType::Fixed32 => Ok(self.fixed32()? as u64),
            other => Err(unexpected(self.field_number, other, "an unsigned integer")),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let value = self.read_u64()?;
        u32::try_from(value).map_err(|_| {
            Error::invalid_data(format!(
                "value {} of field {} overflows a 32-bit unsigned integer",
                value, self.field_number
            ))
        })
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u64()? != 0)
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        match self.wire_type {
            WireType::Fixed64 => Ok(f64::from_bits(self.fixed64()?)),
            WireType::Fixed32 => Ok(f32::from_bits(self.fixed32()?) as f64),
            other => Err(unexpected(self.field_number, other, "a floating point value")),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        match self.wire_type {
            WireType::Fixed32 => Ok(f32::from_bits(self.fixed32()?)),
            WireType::Fixed64 => {
                let wide = f64::from_bits(self.fixed64()?);
                let narrow = wide as f32;
                if wide.is_finite() && narrow.is_infinite() {
                    return Err(Error::invalid_data(format!(
                        "value {} of field {} overflows a 32-bit float",
                        wide, self.field_number
                    )));
                }
                Ok(narrow)
            }
            other => Err(unexpected(self.field_number, other, "a floating point value")),
        }
    }

    fn length_delimited(&mut self) -> Result<&'a [u8], Error> {
        let len = self.varint()?;
        let start = self.reader.get_cursor();
        let available = self.limit - start;
        if len > available as u64 {
            return Err(Error::truncated_input(start, len as usize, self.limit));
        }
        self.reader.read_bytes(len as usize)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        match self.wire_type {
            WireType::String => Ok(self.length_delimited()?.to_vec()),
            other => Err(unexpected(self.field_number, other, "a length-delimited value")),
        }
    }

    pub fn read_string(&mut self) -> Result<String, Error> {
        match self.wire_type {
            WireType::String => {
                let bytes = self.length_delimited()?;
                std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| {
                    Error::invalid_data(format!(
                        "field {} is not valid UTF-8: {}",
                        self.field_number, e
                    ))
                })
            }
            other => Err(unexpected(self.field_number, other, "a string")),
        }
    }

    /// Enters the sub-message of the current `String` or `StartGroup` field.
    pub fn start_sub_item(&mut self) -> Result<SubItemToken, Error> {
        if self.frames.len() as u32 >= self.config.max_depth() {
            return Err(Error::depth_exceed(format!(
                "maximum nesting depth ({}) exceeded while reading field {}",
                self.config.max_depth(),
                self.field_number
            )));
        }
        match self.wire_type {
            WireType::String => {
                let len = self.varint()?;
                let start = self.reader.get_cursor();
                if len > (self.limit - start) as u64 {
                    return Err(Error::truncated_input(start, len as usize, self.limit));
                }
                self.frames.push(ReadFrame::Length {
                    outer_limit: self.limit,
                });
                self.limit = start + len as usize;
            }
            WireType::StartGroup => self.frames.push(ReadFrame::Group {
                field_number: self.field_number,
                closed: false,
            }),
            other => return Err(unexpected(self.field_number, other, "a sub-message")),
        }
        Ok(SubItemToken {
            depth: self.frames.len() - 1,
        })
    }

    pub fn end_sub_item(&mut self, token: SubItemToken) -> Result<(), Error> {
        if token.depth + 1 != self.frames.len() {
            return Err(Error::framing_error(format!(
                "sub-item token for depth {} closed at depth {}",
                token.depth,
                self.frames.len()
            )));
        }
        match self.frames.pop() {
            Some(ReadFrame::Length { outer_limit }) => {
                let cursor = self.reader.get_cursor();
                if cursor != self.limit {
                    return Err(Error::framing_error(format!(
                        "sub-message ended at offset {} but was declared to end at {}",
                        cursor, self.limit
                    )));
                }
                self.limit = outer_limit;
            }
            Some(ReadFrame::Group {
                field_number,
                closed,
            }) => {
                if !closed {
                    return Err(Error::framing_error(format!(
                        "group {} has no end group marker",
                        field_number
                    )));
                }
            }
            None => return Err(Error::framing_error("no open sub-item")),
        }
        Ok(())
    }

    /// Discards the payload of the current field.
    pub fn skip_field(&mut self) -> Result<(), Error> {
        match self.wire_type {
            WireType::Variant | WireType::SignedVariant => {
                self.varint()?;
            }
            WireType::Fixed32 => {
                self.fixed32()?;
            }
            WireType::Fixed64 => {
                self.fixed64()?;
            }
            WireType::String => {
                self.length_delimited()?;
            }
            WireType::StartGroup => {
                let token = self.start_sub_item()?;
                while self.read_field_header()? != 0 {
                    self.skip_field()?;
                }
                self.end_sub_item(token)?;
            }
            WireType::EndGroup => {
                return Err(Error::framing_error("cannot skip an end group marker"));
            }
        }
        Ok(())
    }

    /// Skips the current field and appends its raw header and payload to `target`.
    pub fn append_extension_data(&mut self, target: &mut Vec<u8>) -> Result<(), Error> {
        let start = self.field_start;
        let field_number = self.field_number;
        self.skip_field()?;
        let raw = self.reader.slice(start, self.reader.get_cursor())?;
        trace!(
            "preserved {} bytes of unknown field {}",
            raw.len(),
            field_number
        );
        target.extend_from_slice(raw);
        Ok(())
    }

    /// A throwaway copy positioned at the same place, used to look ahead.
    pub fn fork(&self) -> ReadContext<'a> {
        ReadContext {
            reader: self.reader,
            resolver: self.resolver,
            config: self.config,
            ref_reader: RefReader::new(),
            frames: self.frames.clone(),
            limit: self.limit,
            field_number: self.field_number,
            wire_type: self.wire_type,
            field_start: self.field_start,
        }
    }

    /// Merges the message body at the cursor into `target`, whose runtime
    /// type is `concrete`.
    pub fn read_object(&mut self, target: &mut dyn Any, concrete: TypeId) -> Result<(), Error> {
        let resolver = self.resolver;
        let serializer = resolver.get_serializer(concrete)?;
        serializer.read(target, self)
    }

    /// Finishes the call, checking that every sub-item was closed.
    pub fn close(self) -> Result<(), Error> {
        if !self.frames.is_empty() {
            return Err(Error::framing_error(format!(
                "{} sub-items are still open",
                self.frames.len()
            )));
        }
        Ok(())
    }
}

#[cold]
fn unexpected(field_number: u32, wire_type: WireType, expected: &str) -> Error {
    Error::unexpected_wire_type(format!(
        "field {} has wire type {} which cannot carry {}",
        field_number, wire_type, expected
    ))
}
