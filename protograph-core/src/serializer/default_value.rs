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
use crate::serializer::{downcast_ref, DynObject, ProtoSerializer};
use crate::types::WireType;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Writes nothing when the value equals the default.
pub(crate) struct DefaultValueDecorator<V> {
    default: V,
    tail: Arc<dyn ProtoSerializer>,
}

impl<V> DefaultValueDecorator<V> {
    pub(crate) fn new(default: V, tail: Arc<dyn ProtoSerializer>) -> Self {
        DefaultValueDecorator { default, tail }
    }
}

impl<V: PartialEq + Send + Sync + 'static> ProtoSerializer for DefaultValueDecorator<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn requires_old_value(&self) -> bool {
        self.tail.requires_old_value()
    }

    fn returns_value(&self) -> bool {
        self.tail.returns_value()
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        self.tail.accepts_wire_type(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        if downcast_ref::<V>(value)? == &self.default {
            return Ok(());
        }
        self.tail.write(value, dest)
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        self.tail.read(value, source)
    }
}
