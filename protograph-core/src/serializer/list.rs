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
use crate::serializer::{downcast_mut, downcast_ref, unbox, DynObject, ProtoSerializer};
use crate::types::WireType;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Repeats the item chain once per element under the same field number.
pub(crate) struct ListDecorator<V> {
    field_number: u32,
    item: Arc<dyn ProtoSerializer>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ListDecorator<V> {
    pub(crate) fn new(field_number: u32, item: Arc<dyn ProtoSerializer>) -> Self {
        ListDecorator {
            field_number,
            item,
            _marker: PhantomData,
        }
    }
}

impl<V: Any + Send + Sync> ListDecorator<V> {
    fn read_item(&self, items: &mut Vec<V>, source: &mut ReadContext) -> Result<(), Error> {
        if let Some(item) = self.item.read(None, source)? {
            items.push(unbox::<V>(item)?);
        }
        Ok(())
    }
}

impl<V: Any + Send + Sync> ProtoSerializer for ListDecorator<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<Vec<V>>()
    }

    fn requires_old_value(&self) -> bool {
        true
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        self.item.accepts_wire_type(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        for item in downcast_ref::<Vec<V>>(value)? {
            self.item.write(item, dest)?;
        }
        Ok(())
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        match value {
            Some(existing) => {
                let items = downcast_mut::<Vec<V>>(existing)?;
                self.read_item(items, source)?;
                while source.try_read_field_header(self.field_number)? {
                    self.read_item(items, source)?;
                }
                Ok(None)
            }
            None => {
                let mut items = Vec::new();
                self.read_item(&mut items, source)?;
                while source.try_read_field_header(self.field_number)? {
                    self.read_item(&mut items, source)?;
                }
                Ok(Some(Box::new(items)))
            }
        }
    }
}
