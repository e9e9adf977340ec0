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

//! Decimal and Guid value types, each encoded as a small sub-message whose
//! zero-valued fields are omitted.

use crate::bail;
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{unsupported_format, ScalarValue};
use crate::types::{DataFormat, WireType};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

const DECIMAL_LOW_FIELD: u32 = 1;
const DECIMAL_HIGH_FIELD: u32 = 2;
const DECIMAL_SIGN_SCALE_FIELD: u32 = 3;

const GUID_LOW_FIELD: u32 = 1;
const GUID_HIGH_FIELD: u32 = 2;

/// Largest decimal scale.
pub const MAX_DECIMAL_SCALE: u8 = 28;

fn sub_message_wire_type<T>(format: DataFormat) -> Result<WireType, Error> {
    match format {
        DataFormat::Default => Ok(WireType::String),
        DataFormat::Group => Ok(WireType::StartGroup),
        other => Err(unsupported_format::<T>(other)),
    }
}

fn is_sub_message(wire_type: WireType) -> bool {
    matches!(wire_type, WireType::String | WireType::StartGroup)
}

/// A 96-bit decimal: `(-1)^negative * mantissa / 10^scale`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Decimal {
    low: u64,
    high: u32,
    scale: u8,
    negative: bool,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        low: 0,
        high: 0,
        scale: 0,
        negative: false,
    };

    /// Builds a decimal from a signed mantissa of at most 96 bits. Every
    /// zero, whatever its scale or sign, is [`Decimal::ZERO`].
    pub fn new(mantissa: i128, scale: u8) -> Result<Decimal, Error> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::invalid_data(format!(
                "decimal scale {} exceeds {}",
                scale, MAX_DECIMAL_SCALE
            )));
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude >> 96 != 0 {
            return Err(Error::invalid_data(format!(
                "decimal mantissa {} exceeds 96 bits",
                mantissa
            )));
        }
        if magnitude == 0 {
            return Ok(Decimal::ZERO);
        }
        Ok(Decimal {
            low: magnitude as u64,
            high: (magnitude >> 64) as u32,
            scale,
            negative: mantissa < 0,
        })
    }

    pub fn from_i64(value: i64) -> Decimal {
        let magnitude = value.unsigned_abs();
        Decimal {
            low: magnitude,
            high: 0,
            scale: 0,
            negative: value < 0,
        }
    }

    pub fn mantissa(&self) -> i128 {
        let magnitude = ((self.high as i128) << 64) | self.low as i128;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    fn sign_scale(&self) -> u32 {
        ((self.scale as u32) << 1) | self.negative as u32
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa().unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.negative && !self.is_zero() { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, whole, fraction)
    }
}

impl ScalarValue for Decimal {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        sub_message_wire_type::<Decimal>(format)
    }

    fn implicit_default() -> Option<Self> {
        None
    }

    fn accepts(wire_type: WireType) -> bool {
        is_sub_message(wire_type)
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        let token = dest.start_sub_item()?;
        if self.is_zero() {
            return dest.end_sub_item(token);
        }
        if self.low != 0 {
            dest.write_field_header(DECIMAL_LOW_FIELD, WireType::Variant)?;
            dest.write_u64(self.low)?;
        }
        if self.high != 0 {
            dest.write_field_header(DECIMAL_HIGH_FIELD, WireType::Variant)?;
            dest.write_u32(self.high)?;
        }
        let sign_scale = self.sign_scale();
        if sign_scale != 0 {
            dest.write_field_header(DECIMAL_SIGN_SCALE_FIELD, WireType::Variant)?;
            dest.write_u32(sign_scale)?;
        }
        dest.end_sub_item(token)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        let token = source.start_sub_item()?;
        let mut low = 0u64;
        let mut high = 0u32;
        let mut sign_scale = 0u32;
        loop {
            match source.read_field_header()? {
                0 => break,
                DECIMAL_LOW_FIELD => low = source.read_u64()?,
                DECIMAL_HIGH_FIELD => high = source.read_u32()?,
                DECIMAL_SIGN_SCALE_FIELD => sign_scale = source.read_u32()?,
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        if low == 0 && high == 0 {
            return Ok(Decimal::ZERO);
        }
        let scale = ((sign_scale & 0x01FE) >> 1) as u8;
        if scale > MAX_DECIMAL_SCALE {
            bail!("decimal scale {} exceeds {}", scale, MAX_DECIMAL_SCALE);
        }
        Ok(Decimal {
            low,
            high,
            scale,
            negative: sign_scale & 1 == 1,
        })
    }
}

/// A 128-bit identifier, stored in the little-endian byte order of the
/// .NET `Guid` layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid([u8; 16]);

impl Guid {
    pub const EMPTY: Guid = Guid([0; 16]);

    pub fn from_bytes(bytes: [u8; 16]) -> Guid {
        Guid(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 16]
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            LittleEndian::read_u32(&b[0..4]),
            LittleEndian::read_u16(&b[4..6]),
            LittleEndian::read_u16(&b[6..8]),
            b[8],
            b[9]
        )?;
        for byte in &b[10..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl ScalarValue for Guid {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        sub_message_wire_type::<Guid>(format)
    }

    fn implicit_default() -> Option<Self> {
        None
    }

    fn accepts(wire_type: WireType) -> bool {
        is_sub_message(wire_type)
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        let token = dest.start_sub_item()?;
        if !self.is_empty() {
            dest.write_field_header(GUID_LOW_FIELD, WireType::Fixed64)?;
            dest.write_u64(LittleEndian::read_u64(&self.0[0..8]))?;
            dest.write_field_header(GUID_HIGH_FIELD, WireType::Fixed64)?;
            dest.write_u64(LittleEndian::read_u64(&self.0[8..16]))?;
        }
        dest.end_sub_item(token)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        let token = source.start_sub_item()?;
        let mut low = 0u64;
        let mut high = 0u64;
        loop {
            match source.read_field_header()? {
                0 => break,
                GUID_LOW_FIELD => low = source.read_u64()?,
                GUID_HIGH_FIELD => high = source.read_u64()?,
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        let mut bytes = [0u8; 16];
        LittleEndian::write_u64(&mut bytes[0..8], low);
        LittleEndian::write_u64(&mut bytes[8..16], high);
        Ok(Guid(bytes))
    }
}
