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

//! Time spans and date-times as `{1: value, 2: scale}` sub-messages.
//!
//! Values are counted in ticks of 100ns. The value is divided by the
//! coarsest unit that divides it evenly and the unit is written as the scale;
//! `TimeDelta::MAX`/`MIN` and `NaiveDateTime::MAX`/`MIN` are
//! written as `±1` with the `MinMax` scale. Date-times are relative to
//! 1970-01-01T00:00:00. Precision below one tick is truncated.
//!
//! With [`DataFormat::FixedSize`] the raw tick count is written as `Fixed64`.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{unsupported_format, ScalarValue};
use crate::types::{DataFormat, WireType};
use chrono::{NaiveDateTime, TimeDelta};
use num_enum::{IntoPrimitive, TryFromPrimitive};

const VALUE_FIELD: u32 = 1;
const SCALE_FIELD: u32 = 2;

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_SECOND: i64 = 1_000 * TICKS_PER_MILLISECOND;
pub const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
pub const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
pub const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;
const NANOS_PER_TICK: i64 = 100;

/// Unit of the value field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum TimeSpanScale {
    Days = 0,
    Hours = 1,
    Minutes = 2,
    Seconds = 3,
    Milliseconds = 4,
    Ticks = 5,
    MinMax = 15,
}

impl TimeSpanScale {
    fn ticks(self) -> i64 {
        match self {
            TimeSpanScale::Days => TICKS_PER_DAY,
            TimeSpanScale::Hours => TICKS_PER_HOUR,
            TimeSpanScale::Minutes => TICKS_PER_MINUTE,
            TimeSpanScale::Seconds => TICKS_PER_SECOND,
            TimeSpanScale::Milliseconds => TICKS_PER_MILLISECOND,
            TimeSpanScale::Ticks | TimeSpanScale::MinMax => 1,
        }
    }
}

/// A tick count or one of the two sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Span {
    Min,
    Max,
    Ticks(i64),
}

fn scaled(ticks: i64) -> (i64, TimeSpanScale) {
    for scale in [
        TimeSpanScale::Days,
        TimeSpanScale::Hours,
        TimeSpanScale::Minutes,
        TimeSpanScale::Seconds,
        TimeSpanScale::Milliseconds,
    ] {
        if ticks % scale.ticks() == 0 {
            return (ticks / scale.ticks(), scale);
        }
    }
    (ticks, TimeSpanScale::Ticks)
}

fn write_span(span: Span, dest: &mut WriteContext) -> Result<(), Error> {
    match dest.pending_wire_type() {
        Some(WireType::Fixed64) => {
            let ticks = match span {
                Span::Min => i64::MIN,
                Span::Max => i64::MAX,
                Span::Ticks(ticks) => ticks,
            };
            dest.write_i64(ticks)
        }
        _ => {
            let (value, scale) = match span {
                Span::Min => (-1, TimeSpanScale::MinMax),
                Span::Max => (1, TimeSpanScale::MinMax),
                Span::Ticks(ticks) => scaled(ticks),
            };
            let token = dest.start_sub_item()?;
            if value != 0 {
                dest.write_field_header(VALUE_FIELD, WireType::SignedVariant)?;
                dest.write_i64(value)?;
            }
            if scale != TimeSpanScale::Days {
                dest.write_field_header(SCALE_FIELD, WireType::Variant)?;
                dest.write_i32(scale.into())?;
            }
            dest.end_sub_item(token)
        }
    }
}

fn read_span(source: &mut ReadContext) -> Result<Span, Error> {
    match source.wire_type() {
        WireType::Fixed64 => Ok(match source.read_i64()? {
            i64::MIN => Span::Min,
            i64::MAX => Span::Max,
            ticks => Span::Ticks(ticks),
        }),
        WireType::String | WireType::StartGroup => {
            let token = source.start_sub_item()?;
            let mut value = 0i64;
            let mut scale = TimeSpanScale::Days;
            loop {
                match source.read_field_header()? {
                    0 => break,
                    VALUE_FIELD => {
                        source.hint(WireType::SignedVariant);
                        value = source.read_i64()?;
                    }
                    SCALE_FIELD => {
                        let raw = source.read_i32()?;
                        scale = TimeSpanScale::try_from(raw).map_err(|_| {
                            Error::invalid_data(format!("unknown time scale {}", raw))
                        })?;
                    }
                    _ => source.skip_field()?,
                }
            }
            source.end_sub_item(token)?;
            match scale {
                TimeSpanScale::MinMax => match value {
                    1 => Ok(Span::Max),
                    -1 => Ok(Span::Min),
                    other => Err(Error::invalid_data(format!(
                        "unknown min/max value {}",
                        other
                    ))),
                },
                scale => value.checked_mul(scale.ticks()).map(Span::Ticks).ok_or_else(|| {
                    Error::invalid_data(format!("{} {:?} overflows the tick range", value, scale))
                }),
            }
        }
        other => Err(Error::unexpected_wire_type(format!(
            "field {} has wire type {} which cannot carry a time span",
            source.field_number(),
            other
        ))),
    }
}

fn span_wire_type<T>(format: DataFormat) -> Result<WireType, Error> {
    match format {
        DataFormat::Default => Ok(WireType::String),
        DataFormat::Group => Ok(WireType::StartGroup),
        DataFormat::FixedSize => Ok(WireType::Fixed64),
        other => Err(unsupported_format::<T>(other)),
    }
}

fn accepts_span(wire_type: WireType) -> bool {
    matches!(
        wire_type,
        WireType::String | WireType::StartGroup | WireType::Fixed64
    )
}

/// Whole ticks in `delta`.
pub fn to_ticks(delta: TimeDelta) -> Result<i64, Error> {
    delta
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(delta.subsec_nanos() as i64 / NANOS_PER_TICK))
        .ok_or_else(|| Error::encode_error(format!("{} does not fit in 64-bit ticks", delta)))
}

pub fn from_ticks(ticks: i64) -> TimeDelta {
    TimeDelta::seconds(ticks / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

impl ScalarValue for TimeDelta {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        span_wire_type::<TimeDelta>(format)
    }

    fn implicit_default() -> Option<Self> {
        None
    }

    fn accepts(wire_type: WireType) -> bool {
        accepts_span(wire_type)
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        let span = if *self == TimeDelta::MAX {
            Span::Max
        } else if *self == TimeDelta::MIN {
            Span::Min
        } else {
            Span::Ticks(to_ticks(*self)?)
        };
        write_span(span, dest)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        Ok(match read_span(source)? {
            Span::Max => TimeDelta::MAX,
            Span::Min => TimeDelta::MIN,
            Span::Ticks(ticks) => from_ticks(ticks),
        })
    }
}

impl ScalarValue for NaiveDateTime {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        span_wire_type::<NaiveDateTime>(format)
    }

    fn implicit_default() -> Option<Self> {
        None
    }

    fn accepts(wire_type: WireType) -> bool {
        accepts_span(wire_type)
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        let fixed = dest.pending_wire_type() == Some(WireType::Fixed64);
        let span = if *self == NaiveDateTime::MAX && !fixed {
            Span::Max
        } else if *self == NaiveDateTime::MIN && !fixed {
            Span::Min
        } else {
            Span::Ticks(to_ticks(self.signed_duration_since(epoch()))?)
        };
        write_span(span, dest)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        match read_span(source)? {
            Span::Max => Ok(NaiveDateTime::MAX),
            Span::Min => Ok(NaiveDateTime::MIN),
            Span::Ticks(ticks) => epoch()
                .checked_add_signed(from_ticks(ticks))
                .ok_or_else(|| {
                    Error::invalid_data(format!("{} ticks is outside the date-time range", ticks))
                }),
        }
    }
}
