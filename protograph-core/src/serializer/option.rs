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

/// `None` writes nothing; a present value is always written, even when it
/// equals the type's default.
pub(crate) struct OptionDecorator<V> {
    inner: Arc<dyn ProtoSerializer>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> OptionDecorator<V> {
    pub(crate) fn new(inner: Arc<dyn ProtoSerializer>) -> Self {
        OptionDecorator {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<V: Any + Send + Sync> ProtoSerializer for OptionDecorator<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<Option<V>>()
    }

    fn requires_old_value(&self) -> bool {
        self.inner.requires_old_value()
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        self.inner.accepts_wire_type(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        match downcast_ref::<Option<V>>(value)? {
            Some(inner) => self.inner.write(inner, dest),
            None => Ok(()),
        }
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let mut slot = match value {
            Some(existing) => Some(downcast_mut::<Option<V>>(existing)?),
            None => None,
        };
        let current = match slot.as_deref_mut() {
            Some(Some(inner)) if self.inner.requires_old_value() => Some(inner as &mut dyn Any),
            _ => None,
        };
        let decoded = match self.inner.read(current, source)? {
            Some(decoded) => Some(unbox::<V>(decoded)?),
            // merged into the existing value, or skipped
            None => return Ok(None),
        };
        match slot {
            Some(existing) => {
                *existing = decoded;
                Ok(None)
            }
            None => Ok(decoded.map(|v| Box::new(Some(v)) as DynObject)),
        }
    }
}
