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
use crate::meta::EnumMeta;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{downcast_ref, DynObject, ProtoSerializer};
use crate::types::WireType;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Writes the mapped wire value of an enum member as an integer.
pub(crate) struct EnumSerializer<E> {
    meta: Arc<EnumMeta<E>>,
}

impl<E> EnumSerializer<E> {
    pub(crate) fn new(meta: Arc<EnumMeta<E>>) -> Self {
        EnumSerializer { meta }
    }
}

impl<E> ProtoSerializer for EnumSerializer<E>
where
    E: Any + Copy + PartialEq + Send + Sync + fmt::Debug,
{
    fn expected_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn requires_old_value(&self) -> bool {
        false
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        matches!(
            wire_type,
            WireType::Variant | WireType::SignedVariant | WireType::Fixed32 | WireType::Fixed64
        )
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        let wire_value = self.meta.to_wire(*downcast_ref::<E>(value)?)?;
        dest.write_i32(wire_value)
    }

    fn read(
        &self,
        _value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let wire_value = source.read_i32()?;
        Ok(Some(Box::new(self.meta.from_wire(wire_value)?)))
    }
}
