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

//! Reference-tracked values.
//!
//! Each occurrence is wrapped in a record. The first occurrence of an
//! instance carries a fresh key and the body, later ones only the key:
//!
//! ```text
//! { 2: key, 10: { body } }   first occurrence
//! { 1: key }                 repeated occurrence
//! ```
//!
//! Keys are assigned in encounter order and shared with dynamic type keys.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::ref_resolver::net_object;
use crate::serializer::{downcast_mut, downcast_ref, unbox, DynObject, ProtoSerializer};
use crate::types::WireType;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

fn is_sub_message(wire_type: WireType) -> bool {
    matches!(wire_type, WireType::String | WireType::StartGroup)
}

/// Writes the record for the instance at `address`. The body is produced by
/// `write_body` on the first occurrence only.
fn write_record<F>(dest: &mut WriteContext, address: usize, write_body: F) -> Result<(), Error>
where
    F: FnOnce(&mut WriteContext) -> Result<(), Error>,
{
    let token = dest.start_sub_item()?;
    let (key, existed) = dest.ref_writer.add_object(address);
    if existed {
        dest.write_field_header(net_object::EXISTING_OBJECT_KEY, WireType::Variant)?;
        dest.write_u32(key)?;
    } else {
        dest.write_field_header(net_object::NEW_OBJECT_KEY, WireType::Variant)?;
        dest.write_u32(key)?;
        dest.write_field_header(net_object::OBJECT, WireType::String)?;
        let body = dest.start_sub_item()?;
        write_body(dest)?;
        dest.end_sub_item(body)?;
    }
    dest.end_sub_item(token)
}

/// An `Arc<V>` whose instances are written once per call.
pub(crate) struct SharedSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> SharedSerializer<V> {
    pub(crate) fn new() -> Self {
        SharedSerializer {
            _marker: PhantomData,
        }
    }
}

impl<V: Any + Send + Sync> ProtoSerializer for SharedSerializer<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<Arc<V>>()
    }

    fn requires_old_value(&self) -> bool {
        false
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        is_sub_message(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        let shared = downcast_ref::<Arc<V>>(value)?;
        let address = Arc::as_ptr(shared) as *const () as usize;
        write_record(dest, address, |dest| {
            dest.write_object(shared.as_ref(), TypeId::of::<V>())
        })
    }

    fn read(
        &self,
        _value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let token = source.start_sub_item()?;
        let mut new_key = None;
        let mut decoded: Option<Arc<V>> = None;
        loop {
            match source.read_field_header()? {
                0 => break,
                net_object::EXISTING_OBJECT_KEY => {
                    let key = source.read_u32()?;
                    decoded = Some(source.ref_reader.get_keyed_object::<Arc<V>>(key)?);
                }
                net_object::NEW_OBJECT_KEY => new_key = Some(source.read_u32()?),
                net_object::OBJECT => {
                    let body = source.start_sub_item()?;
                    let mut created = source.get_resolver().create(TypeId::of::<V>())?;
                    source.read_object(&mut *created, TypeId::of::<V>())?;
                    source.end_sub_item(body)?;
                    let shared = Arc::new(unbox::<V>(created)?);
                    if let Some(key) = new_key.take() {
                        source.ref_reader.set_keyed_object(key, Arc::clone(&shared))?;
                    }
                    decoded = Some(shared);
                }
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        Ok(decoded.map(|shared| Box::new(shared) as DynObject))
    }
}

/// An `Arc<RwLock<V>>`. The instance is registered before its body is read,
/// so a body may refer back to it and cyclic graphs round trip.
pub(crate) struct SharedLockSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> SharedLockSerializer<V> {
    pub(crate) fn new() -> Self {
        SharedLockSerializer {
            _marker: PhantomData,
        }
    }
}

impl<V: Any + Send + Sync> ProtoSerializer for SharedLockSerializer<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<Arc<RwLock<V>>>()
    }

    fn requires_old_value(&self) -> bool {
        true
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        is_sub_message(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        let shared = downcast_ref::<Arc<RwLock<V>>>(value)?;
        let address = Arc::as_ptr(shared) as *const () as usize;
        write_record(dest, address, |dest| {
            let guard = shared.read_recursive();
            dest.write_object(&*guard, TypeId::of::<V>())
        })
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let existing = match value {
            Some(value) => Some(Arc::clone(downcast_mut::<Arc<RwLock<V>>>(value)?)),
            None => None,
        };
        let token = source.start_sub_item()?;
        let mut new_key = None;
        let mut decoded: Option<Arc<RwLock<V>>> = None;
        loop {
            match source.read_field_header()? {
                0 => break,
                net_object::EXISTING_OBJECT_KEY => {
                    let key = source.read_u32()?;
                    decoded = Some(source.ref_reader.get_keyed_object(key)?);
                }
                net_object::NEW_OBJECT_KEY => new_key = Some(source.read_u32()?),
                net_object::OBJECT => {
                    let target = match &existing {
                        Some(existing) => Arc::clone(existing),
                        None => {
                            let created = source.get_resolver().create(TypeId::of::<V>())?;
                            Arc::new(RwLock::new(unbox::<V>(created)?))
                        }
                    };
                    if let Some(key) = new_key.take() {
                        source.ref_reader.set_keyed_object(key, Arc::clone(&target))?;
                    }
                    let body = source.start_sub_item()?;
                    {
                        let mut guard = target.try_write().ok_or_else(|| {
                            Error::reference_integrity(
                                "an object was reached again while its own body was being decoded into it",
                            )
                        })?;
                        source.read_object(&mut *guard, TypeId::of::<V>())?;
                    }
                    source.end_sub_item(body)?;
                    decoded = Some(target);
                }
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        Ok(match (decoded, existing) {
            (Some(decoded), Some(existing)) if Arc::ptr_eq(&decoded, &existing) => None,
            (decoded, _) => decoded.map(|shared| Box::new(shared) as DynObject),
        })
    }
}
