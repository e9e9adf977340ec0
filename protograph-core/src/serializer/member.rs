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
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

/// How a field reaches its value inside the owning message `P`.
pub enum MemberAccess<P, V> {
    /// A plain field: read in place or assigned.
    Field {
        get: fn(&P) -> &V,
        get_mut: fn(&mut P) -> &mut V,
    },
    /// A getter/setter pair: decoded values are always assigned.
    Property { get: fn(&P) -> V, set: fn(&mut P, V) },
    /// A value that can be updated in place but never replaced.
    ReadOnly {
        get: fn(&P) -> &V,
        get_mut: fn(&mut P) -> &mut V,
    },
}

impl<P, V> Clone for MemberAccess<P, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, V> Copy for MemberAccess<P, V> {}

/// Head of a field chain: projects the member out of its owner.
pub(crate) struct MemberDecorator<P, V> {
    name: String,
    access: MemberAccess<P, V>,
    tail: Arc<dyn ProtoSerializer>,
}

impl<P: Any, V: Any> MemberDecorator<P, V> {
    /// Checks that decoded values can be applied through `access`.
    pub(crate) fn new(
        name: String,
        access: MemberAccess<P, V>,
        tail: Arc<dyn ProtoSerializer>,
    ) -> Result<Self, Error> {
        if tail.expected_type() != TypeId::of::<V>() {
            return Err(Error::type_error(format!(
                "member {}.{} is a {} but its codec handles another type",
                type_name::<P>(),
                name,
                type_name::<V>()
            )));
        }
        match access {
            MemberAccess::Property { .. } if !tail.returns_value() => {
                return Err(Error::invalid_configuration(format!(
                    "member {}.{} is a property, but its codec cannot produce a value to assign",
                    type_name::<P>(),
                    name
                )));
            }
            MemberAccess::ReadOnly { .. } if !tail.requires_old_value() => {
                return Err(Error::invalid_configuration(format!(
                    "member {}.{} is read-only, so decoded values would be discarded",
                    type_name::<P>(),
                    name
                )));
            }
            _ => {}
        }
        Ok(MemberDecorator { name, access, tail })
    }
}

impl<P, V> ProtoSerializer for MemberDecorator<P, V>
where
    P: Any,
    V: Any,
{
    fn expected_type(&self) -> TypeId {
        TypeId::of::<P>()
    }

    fn requires_old_value(&self) -> bool {
        true
    }

    fn returns_value(&self) -> bool {
        false
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        self.tail.accepts_wire_type(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        let owner = downcast_ref::<P>(value)?;
        match self.access {
            MemberAccess::Field { get, .. } | MemberAccess::ReadOnly { get, .. } => {
                self.tail.write(get(owner), dest)
            }
            MemberAccess::Property { get, .. } => self.tail.write(&get(owner), dest),
        }
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let owner = match value {
            Some(owner) => downcast_mut::<P>(owner)?,
            None => {
                return Err(Error::type_error(format!(
                    "member {}.{} was read without its owner",
                    type_name::<P>(),
                    self.name
                )))
            }
        };
        match self.access {
            MemberAccess::Field { get_mut, .. } => {
                let slot = get_mut(owner);
                let current = if self.tail.requires_old_value() {
                    Some(slot as &mut dyn Any)
                } else {
                    None
                };
                if let Some(decoded) = self.tail.read(current, source)? {
                    *get_mut(owner) = unbox::<V>(decoded)?;
                }
            }
            MemberAccess::Property { get, set } => {
                let mut current = get(owner);
                let decoded = if self.tail.requires_old_value() {
                    match self.tail.read(Some(&mut current as &mut dyn Any), source)? {
                        Some(decoded) => unbox::<V>(decoded)?,
                        None => current,
                    }
                } else {
                    match self.tail.read(None, source)? {
                        Some(decoded) => unbox::<V>(decoded)?,
                        None => return Ok(None),
                    }
                };
                set(owner, decoded);
            }
            MemberAccess::ReadOnly { get_mut, .. } => {
                let slot = get_mut(owner);
                if self.tail.read(Some(slot as &mut dyn Any), source)?.is_some() {
                    return Err(Error::reference_integrity(format!(
                        "member {}.{} is read-only but decoding produced a replacement value",
                        type_name::<P>(),
                        self.name
                    )));
                }
            }
        }
        Ok(None)
    }
}
