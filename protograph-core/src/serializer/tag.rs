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
use crate::serializer::{DynObject, ProtoSerializer};
use crate::types::WireType;
use log::trace;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Writes the field header in front of the value and checks the on-wire
/// type of incoming fields.
pub(crate) struct TagDecorator {
    field_number: u32,
    wire_type: WireType,
    strict: bool,
    tail: Arc<dyn ProtoSerializer>,
}

impl TagDecorator {
    pub(crate) fn new(
        field_number: u32,
        wire_type: WireType,
        strict: bool,
        tail: Arc<dyn ProtoSerializer>,
    ) -> TagDecorator {
        TagDecorator {
            field_number,
            wire_type,
            strict,
            tail,
        }
    }
}

impl ProtoSerializer for TagDecorator {
    fn expected_type(&self) -> TypeId {
        self.tail.expected_type()
    }

    fn requires_old_value(&self) -> bool {
        self.tail.requires_old_value()
    }

    fn returns_value(&self) -> bool {
        self.tail.returns_value()
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        if self.strict {
            wire_type.same_encoding(self.wire_type)
        } else {
            self.tail.accepts_wire_type(wire_type)
        }
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        dest.write_field_header(self.field_number, self.wire_type)?;
        self.tail.write(value, dest)
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let actual = source.wire_type();
        if !actual.same_encoding(self.wire_type) {
            if self.strict {
                return Err(Error::unexpected_wire_type(format!(
                    "field {} is declared as {} but arrived as {}",
                    self.field_number, self.wire_type, actual
                )));
            }
            if !self.tail.accepts_wire_type(actual) {
                trace!(
                    "skipping field {}: wire type {} cannot be decoded as {}",
                    self.field_number,
                    actual,
                    self.wire_type
                );
                source.skip_field()?;
                return Ok(None);
            }
        }
        source.hint(self.wire_type);
        self.tail.read(value, source)
    }
}
