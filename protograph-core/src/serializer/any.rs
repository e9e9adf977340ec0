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
use crate::resolver::ref_resolver::net_object;
use crate::serializer::{downcast_mut, downcast_ref, DynObject, ProtoSerializer};
use crate::types::WireType;
use log::trace;
use std::any::{Any, TypeId};

fn is_sub_message(wire_type: WireType) -> bool {
    matches!(wire_type, WireType::String | WireType::StartGroup)
}

/// A boxed instance of `declared` or one of its sub-types. The concrete type
/// is carried by the sub-type sub-messages of the body itself.
pub(crate) struct PolymorphicSerializer {
    declared: TypeId,
}

impl PolymorphicSerializer {
    pub(crate) fn new(declared: TypeId) -> Self {
        PolymorphicSerializer { declared }
    }

    /// Looks ahead at the sub-message under the cursor and returns the type
    /// to materialize.
    fn concrete_type(&self, source: &ReadContext) -> Result<TypeId, Error> {
        let resolver = source.get_resolver();
        let root = resolver.get_serializer(resolver.root_of(self.declared)?)?;
        let mut probe = source.fork();
        let _token = probe.start_sub_item()?;
        let found = root.resolve_concrete(&mut probe)?;
        if resolver.is_assignable(self.declared, found) {
            Ok(found)
        } else {
            Ok(self.declared)
        }
    }
}

impl ProtoSerializer for PolymorphicSerializer {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<DynObject>()
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
        let boxed = downcast_ref::<DynObject>(value)?;
        let concrete = (**boxed).type_id();
        let resolver = dest.get_resolver();
        if !resolver.is_assignable(self.declared, concrete) {
            return Err(Error::type_error(format!(
                "a value of an unregistered type or a type unrelated to {} was assigned to a polymorphic field",
                resolver.name_of(self.declared)?
            )));
        }
        let token = dest.start_sub_item()?;
        dest.write_object(&**boxed, concrete)?;
        dest.end_sub_item(token)
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let concrete = self.concrete_type(source)?;
        let resolver = source.get_resolver();
        let token = source.start_sub_item()?;
        let slot = match value {
            Some(existing) => Some(downcast_mut::<DynObject>(existing)?),
            None => None,
        };
        let replacement = match slot {
            Some(slot) if resolver.is_assignable(concrete, (**slot).type_id()) => {
                let current = (**slot).type_id();
                source.read_object(&mut **slot, current)?;
                None
            }
            slot => {
                if slot.is_some() {
                    trace!(
                        "replacing existing value with a new {}",
                        resolver.name_of(concrete)?
                    );
                }
                let mut created = resolver.create(concrete)?;
                source.read_object(&mut *created, concrete)?;
                Some(Box::new(created) as DynObject)
            }
        };
        source.end_sub_item(token)?;
        Ok(replacement)
    }
}

/// A boxed instance of any registered type, written with its type name.
///
/// ```text
/// { 4: type key, 8: "Name", 10: { body } }   first use of a type
/// { 3: type key, 10: { body } }              later uses
/// ```
pub(crate) struct DynamicSerializer;

impl DynamicSerializer {
    pub(crate) fn new() -> Self {
        DynamicSerializer
    }
}

impl ProtoSerializer for DynamicSerializer {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<DynObject>()
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
        let boxed = downcast_ref::<DynObject>(value)?;
        let concrete = (**boxed).type_id();
        let name = dest.get_resolver().name_of(concrete).map_err(|_| {
            Error::type_error("a value of an unregistered type was assigned to a dynamic field")
        })?;
        let token = dest.start_sub_item()?;
        let (key, existed) = dest.ref_writer.add_type(concrete);
        if existed {
            dest.write_field_header(net_object::EXISTING_TYPE_KEY, WireType::Variant)?;
            dest.write_u32(key)?;
        } else {
            dest.write_field_header(net_object::NEW_TYPE_KEY, WireType::Variant)?;
            dest.write_u32(key)?;
            dest.write_field_header(net_object::TYPE_NAME, WireType::String)?;
            dest.write_string(name)?;
        }
        dest.write_field_header(net_object::OBJECT, WireType::String)?;
        let body = dest.start_sub_item()?;
        dest.write_object(&**boxed, concrete)?;
        dest.end_sub_item(body)?;
        dest.end_sub_item(token)
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let mut value = value;
        let resolver = source.get_resolver();
        let token = source.start_sub_item()?;
        let mut type_id = None;
        let mut new_type_key = None;
        let mut replacement = None;
        loop {
            match source.read_field_header()? {
                0 => break,
                net_object::EXISTING_TYPE_KEY => {
                    let key = source.read_u32()?;
                    type_id = Some(source.ref_reader.get_keyed_type(key)?);
                }
                net_object::NEW_TYPE_KEY => new_type_key = Some(source.read_u32()?),
                net_object::TYPE_NAME => {
                    let name = source.read_string()?;
                    let found = resolver.type_id_by_name(&name).ok_or_else(|| {
                        Error::type_error(format!("type name {} is not registered", name))
                    })?;
                    if let Some(key) = new_type_key.take() {
                        source.ref_reader.set_keyed_type(key, found)?;
                    }
                    type_id = Some(found);
                }
                net_object::OBJECT => {
                    let concrete = type_id.ok_or_else(|| {
                        Error::invalid_data("dynamic object arrived before its type")
                    })?;
                    let body = source.start_sub_item()?;
                    let slot = match value.as_deref_mut() {
                        Some(existing) => Some(downcast_mut::<DynObject>(existing)?),
                        None => None,
                    };
                    match slot {
                        Some(slot) if (**slot).type_id() == concrete => {
                            source.read_object(&mut **slot, concrete)?;
                        }
                        _ => {
                            let mut created = resolver.create(concrete)?;
                            source.read_object(&mut *created, concrete)?;
                            replacement = Some(Box::new(created) as DynObject);
                        }
                    }
                    source.end_sub_item(body)?;
                }
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        Ok(replacement)
    }
}
