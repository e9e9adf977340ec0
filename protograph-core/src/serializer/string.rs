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

impl ScalarValue for String {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        match format {
            DataFormat::Default => Ok(WireType::String),
            other => Err(unsupported_format::<String>(other)),
        }
    }

    fn implicit_default() -> Option<Self> {
        Some(String::new())
    }

    fn accepts(wire_type: WireType) -> bool {
        wire_type == WireType::String
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        dest.write_string(self)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        source.read_string()
    }
}

/// Raw bytes.
impl ScalarValue for Vec<u8> {
    fn wire_type(format: DataFormat) -> Result<WireType, Error> {
        match format {
            DataFormat::Default => Ok(WireType::String),
            other => Err(unsupported_format::<Vec<u8>>(other)),
        }
    }

    fn implicit_default() -> Option<Self> {
        Some(Vec::new())
    }

    fn accepts(wire_type: WireType) -> bool {
        wire_type == WireType::String
    }

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error> {
        dest.write_bytes(self)
    }

    fn read_value(source: &mut ReadContext) -> Result<Self, Error> {
        source.read_bytes()
    }
}
