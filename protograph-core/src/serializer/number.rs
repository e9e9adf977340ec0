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
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{unsupported_format, ScalarValue};
use crate::types::{DataFormat, WireType};

fn is_numeric(wire_type: WireType) -> bool {
    matches!(
        wire_type,
        WireType::Variant | WireType::SignedVariant | WireType::Fixed32 | WireType::Fixed64
    )
}

macro_rules! impl_scalar_integer {
    ($ty:ty, $fixed:expr, $zigzag:expr, $write:ident, $read:ident) => {
        impl ScalarValue for $ty {
            fn wire_type(format: DataFormat) -> Result<WireType, Error> {
                match format {
                    DataFormat::Default | DataFormat::TwosComplement => Ok(WireType::Variant),
                    DataFormat::FixedSize => Ok($fixed),
                    DataFormat::ZigZag => $zigzag.ok_or_else(|| unsupported_format::<$ty>(format)),
                    DataFormat::Group => Err(unsupported_format::<$ty>(format)),
                }
            }

            fn implicit_default() -> Option<Self> {
                Some(0)
            }

            fn accepts(wire_type: WireType) -> bool {
                is_numeric(wire_type)
            }

            #[inline(always)]
            fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
                dest.$write(*self)
            }

            #[inline(always)]
            fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
                source.$read()
            }
        }
    };
}

impl_scalar_integer!(i32, WireType::Fixed32, Some(WireType::SignedVariant), write_i32, read_i32);
impl_scalar_integer!(i64, WireType::Fixed64, Some(WireType::SignedVariant), write_i64, read_i64);
impl_scalar_integer!(u32, WireType::Fixed32, None::<WireType>, write_u32, read_u32);
impl_scalar_integer!(u64, WireType::Fixed64, None::<WireType>, write_u64, read_u64);

impl ScalarValue for bool {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        match format {
            DataFormat::Default | DataFormat::TwosComplement => Ok(WireType::Variant),
            other => Err(unsupported_format::<bool>(other)),
        }
    }

    fn implicit_default() -> Option<Self> {
        Some(false)
    }

    fn accepts(wire_type: WireType) -> bool {
        is_numeric(wire_type)
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        dest.write_bool(*self)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        source.read_bool()
    }
}

macro_rules! impl_scalar_float {
    ($ty:ty, $wire:expr, $write:ident, $read:ident) => {
        impl ScalarValue for $ty {
            fn wire_type(format: DataFormat) -> Result<WireType, Error> {
                match format {
                    DataFormat::Default | DataFormat::FixedSize => Ok($wire),
                    other => Err(unsupported_format::<$ty>(other)),
                }
            }

            fn implicit_default() -> Option<Self> {
                Some(0.0)
            }

            fn accepts(wire_type: WireType) -> bool {
                matches!(wire_type, WireType::Fixed32 | WireType::Fixed64)
            }

            #[inline(always)]
            fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
                dest.$write(*self)
            }

            #[inline(always)]
            fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
                source.$read()
            }
        }
    };
}

impl_scalar_float!(f32, WireType::Fixed32, write_f32, read_f32);
impl_scalar_float!(f64, WireType::Fixed64, write_f64, read_f64);
