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

use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Largest field number a header can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// How a field payload is framed on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WireType {
    Variant = 0,
    Fixed64 = 1,
    String = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
    /// Variant carrying a zigzag encoded value. Never appears on the wire
    /// itself; headers use [`WireType::Variant`].
    SignedVariant = 8,
}

impl WireType {
    /// The three bit code written into a field header.
    #[inline(always)]
    pub fn code(self) -> u8 {
        match self {
            WireType::SignedVariant => WireType::Variant as u8,
            other => other as u8,
        }
    }

    /// True when both types share the same on-wire code.
    #[inline(always)]
    pub fn same_encoding(self, other: WireType) -> bool {
        self.code() == other.code()
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-field encoding choice for values that have more than one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Variant for integers, length-delimited for strings and messages.
    #[default]
    Default,
    /// Zigzag encoded signed varint.
    ZigZag,
    /// Plain varint, negative values use ten bytes.
    TwosComplement,
    /// Fixed32 / Fixed64.
    FixedSize,
    /// Messages delimited by start/end group markers.
    Group,
}

/// Outer framing used by the length-prefixed operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrefixStyle {
    /// No prefix; the message runs to the end of the input.
    None,
    /// Varint length, optionally preceded by a `String` field header.
    Base128,
    /// Four byte little-endian length.
    Fixed32,
    /// Four byte big-endian length.
    Fixed32BigEndian,
}

/// Lifecycle hook kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallbackKind {
    BeforeSerialize,
    AfterSerialize,
    BeforeDeserialize,
    AfterDeserialize,
}

/// Packs a field number and wire type into a header value.
#[inline(always)]
pub fn make_header(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << 3) | wire_type.code() as u64
}

/// Splits a header into field number and wire type.
pub fn split_header(header: u64) -> Result<(u32, WireType), Error> {
    let field_number = header >> 3;
    if field_number == 0 || field_number > MAX_FIELD_NUMBER as u64 {
        return Err(Error::invalid_tag(format!(
            "invalid field number {} in header {:#x}",
            field_number, header
        )));
    }
    let wire_type = WireType::try_from((header & 7) as u8)
        .map_err(|_| Error::invalid_tag(format!("invalid wire type {} in header", header & 7)))?;
    Ok((field_number as u32, wire_type))
}

/// Validates a configured field number.
pub fn check_field_number(field_number: u32) -> Result<(), Error> {
    if field_number == 0 || field_number > MAX_FIELD_NUMBER {
        return Err(Error::invalid_tag(format!(
            "field numbers must be in 1..={}, got {}",
            MAX_FIELD_NUMBER, field_number
        )));
    }
    Ok(())
}
