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

//! Message bodies.
//!
//! A [`TypeSerializer`] writes one registered type. Every level of an
//! inheritance chain is a nested message: the root level is the outermost,
//! and each derived level sits inside a sub-message keyed by the sub-type
//! field number its parent declared. Within a level the sub-type sub-message
//! comes first, then the level's own fields in field-number order, then any
//! preserved unknown fields.

use crate::error::Error;
use crate::meta::type_meta::{
    BaseDefinition, CallbackDefinition, ExtensionAccess, FieldDefinition, TypeDefinition,
};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeResolver;
use crate::serializer::{DynObject, FieldContext, ProtoSerializer};
use crate::types::{check_field_number, CallbackKind, WireType};
use log::{trace, warn};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

const CALLBACK_KINDS: [CallbackKind; 4] = [
    CallbackKind::BeforeSerialize,
    CallbackKind::AfterSerialize,
    CallbackKind::BeforeDeserialize,
    CallbackKind::AfterDeserialize,
];

struct FieldSerializer {
    number: u32,
    name: String,
    serializer: Arc<dyn ProtoSerializer>,
}

struct SubTypeLink {
    number: u32,
    type_id: TypeId,
}

struct LevelCallback {
    /// Index into the chain of the type that declared the callback.
    level: usize,
    callback: CallbackDefinition,
}

/// Frozen serializer of one registered type.
pub struct TypeSerializer {
    type_id: TypeId,
    name: String,
    /// Root first, this type last.
    chain: Vec<TypeId>,
    /// Base accessors from this type towards the root.
    upcasts: Vec<BaseDefinition>,
    fields: Vec<FieldSerializer>,
    sub_types: Vec<SubTypeLink>,
    callbacks: Vec<LevelCallback>,
    extension: Option<ExtensionAccess>,
}

/// Resolves members configured more than once, keeping the configuration
/// with the highest precedence, and orders the result by field number.
fn select_fields(
    definition: &TypeDefinition,
    report_shadowed: bool,
) -> Result<Vec<&FieldDefinition>, Error> {
    let mut selected: Vec<&FieldDefinition> = Vec::with_capacity(definition.fields.len());
    for field in &definition.fields {
        let Some(index) = selected.iter().position(|s| s.name == field.name) else {
            selected.push(field);
            continue;
        };
        let current = selected[index];
        if current.source == field.source {
            return Err(Error::duplicate_configuration(format!(
                "member {}.{} is configured twice by {:?}",
                definition.name, field.name, field.source
            )));
        }
        let (winner, loser) = if field.source.precedence() > current.source.precedence() {
            (field, current)
        } else {
            (current, field)
        };
        if report_shadowed {
            warn!(
                "{}.{}: {:?} configuration (field {}) shadows {:?} configuration (field {})",
                definition.name, field.name, winner.source, winner.number, loser.source, loser.number
            );
        }
        selected[index] = winner;
    }
    selected.sort_by_key(|field| field.number);
    Ok(selected)
}

fn claim(
    claimed: &mut HashMap<u32, String>,
    number: u32,
    owner: String,
) -> Result<(), Error> {
    check_field_number(number)
        .map_err(|e| Error::invalid_configuration(format!("{}: {}", owner, e)))?;
    if let Some(previous) = claimed.insert(number, owner.clone()) {
        return Err(Error::duplicate_configuration(format!(
            "field number {} is used by both {} and {}",
            number, previous, owner
        )));
    }
    Ok(())
}

impl TypeSerializer {
    pub(crate) fn build(resolver: &TypeResolver, type_id: TypeId) -> Result<TypeSerializer, Error> {
        let definition = resolver.definition(type_id)?;
        let chain = resolver.chain_of(type_id)?;

        let mut claimed = HashMap::new();
        for level in &chain {
            let level_definition = resolver.definition(*level)?;
            for field in select_fields(level_definition, false)? {
                claim(
                    &mut claimed,
                    field.number,
                    format!("{}.{}", level_definition.name, field.name),
                )?;
            }
            for sub in &level_definition.sub_types {
                claim(
                    &mut claimed,
                    sub.number,
                    format!("sub-type {} of {}", sub.type_name, level_definition.name),
                )?;
            }
            let mut kinds = Vec::with_capacity(level_definition.callbacks.len());
            for callback in &level_definition.callbacks {
                if kinds.contains(&callback.kind()) {
                    return Err(Error::duplicate_configuration(format!(
                        "{} declares more than one {:?} callback",
                        level_definition.name,
                        callback.kind()
                    )));
                }
                kinds.push(callback.kind());
            }
        }

        let mut upcasts = Vec::with_capacity(chain.len() - 1);
        for level in chain.iter().rev().take(chain.len() - 1) {
            let level_definition = resolver.definition(*level)?;
            let base = level_definition.base.clone().ok_or_else(|| {
                Error::invalid_configuration(format!("{} has no base accessor", level_definition.name))
            })?;
            upcasts.push(base);
        }

        // The nearest declaration of each kind wins.
        let mut callbacks = Vec::new();
        for kind in CALLBACK_KINDS {
            for (level, level_type) in chain.iter().enumerate().rev() {
                let level_definition = resolver.definition(*level_type)?;
                if let Some(callback) = level_definition.callbacks.iter().find(|c| c.kind() == kind) {
                    callbacks.push(LevelCallback {
                        level,
                        callback: callback.clone(),
                    });
                    break;
                }
            }
        }

        let default_strict = resolver.get_config().is_strict();
        let mut fields = Vec::new();
        for field in select_fields(definition, true)? {
            let ctx = FieldContext {
                resolver,
                field_number: field.number,
                data_format: field.data_format,
                strict: field.strict.unwrap_or(default_strict),
                elide_default: !field.required,
            };
            let serializer = (field.builder)(&ctx).map_err(|e| match e {
                Error::TypeError(msg) => {
                    Error::type_error(format!("{}.{}: {}", definition.name, field.name, msg))
                }
                other => other,
            })?;
            fields.push(FieldSerializer {
                number: field.number,
                name: field.name.clone(),
                serializer,
            });
        }

        let mut sub_types: Vec<SubTypeLink> = definition
            .sub_types
            .iter()
            .map(|sub| SubTypeLink {
                number: sub.number,
                type_id: sub.type_id,
            })
            .collect();
        sub_types.sort_by_key(|sub| sub.number);

        trace!(
            "built serializer for {}: fields {:?}",
            definition.name,
            fields.iter().map(|f| (f.number, f.name.as_str())).collect::<Vec<_>>()
        );
        Ok(TypeSerializer {
            type_id,
            name: definition.name.clone(),
            chain,
            upcasts,
            fields,
            sub_types,
            callbacks,
            extension: definition.extension.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn root_type(&self) -> TypeId {
        self.chain[0]
    }

    /// True when values of this type can stand in for `base`.
    pub fn is_assignable_to(&self, base: TypeId) -> bool {
        self.chain.contains(&base)
    }

    fn depth(&self) -> usize {
        self.chain.len() - 1
    }

    /// Views `value`, an instance of this type, as the type at `level` of
    /// the chain.
    pub(crate) fn project<'v>(&self, value: &'v dyn Any, level: usize) -> Result<&'v dyn Any, Error> {
        let mut current = value;
        for base in &self.upcasts[..self.depth() - level] {
            current = (base.upcast)(current).ok_or_else(|| self.projection_error(base))?;
        }
        Ok(current)
    }

    pub(crate) fn project_mut<'v>(
        &self,
        value: &'v mut dyn Any,
        level: usize,
    ) -> Result<&'v mut dyn Any, Error> {
        let mut current = value;
        for base in &self.upcasts[..self.depth() - level] {
            current = (base.upcast_mut)(current).ok_or_else(|| self.projection_error(base))?;
        }
        Ok(current)
    }

    #[cold]
    fn projection_error(&self, base: &BaseDefinition) -> Error {
        Error::type_error(format!(
            "value is not a {} and cannot be viewed as {}",
            self.name, base.type_name
        ))
    }

    fn root<'s>(&'s self, resolver: &'s TypeResolver) -> Result<&'s TypeSerializer, Error> {
        if self.chain.len() == 1 {
            return Ok(self);
        }
        resolver.get_serializer(self.chain[0]).map(|s| s.as_ref())
    }

    fn invoke_serialize_callback(&self, kind: CallbackKind, value: &dyn Any) -> Result<(), Error> {
        for entry in &self.callbacks {
            if let CallbackDefinition::Serialize(k, callback) = &entry.callback {
                if *k == kind {
                    callback(self.project(value, entry.level)?)?;
                }
            }
        }
        Ok(())
    }

    fn invoke_deserialize_callback(
        &self,
        kind: CallbackKind,
        value: &mut dyn Any,
    ) -> Result<(), Error> {
        for entry in &self.callbacks {
            if let CallbackDefinition::Deserialize(k, callback) = &entry.callback {
                if *k == kind {
                    callback(self.project_mut(value, entry.level)?)?;
                }
            }
        }
        Ok(())
    }

    /// Writes the full message body of `value`.
    pub fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        self.invoke_serialize_callback(CallbackKind::BeforeSerialize, value)?;
        let root = self.root(dest.get_resolver())?;
        root.write_level(value, self, dest)?;
        self.invoke_serialize_callback(CallbackKind::AfterSerialize, value)
    }

    fn write_level(
        &self,
        value: &dyn Any,
        concrete: &TypeSerializer,
        dest: &mut WriteContext,
    ) -> Result<(), Error> {
        let level = self.depth();
        if let Some(next) = concrete.chain.get(level + 1) {
            let link = self
                .sub_types
                .iter()
                .find(|sub| sub.type_id == *next)
                .ok_or_else(|| {
                    Error::invalid_configuration(format!(
                        "{} does not list {} as a sub-type",
                        self.name, concrete.name
                    ))
                })?;
            let sub = dest.get_resolver().get_serializer(link.type_id)?;
            dest.write_field_header(link.number, WireType::String)?;
            let token = dest.start_sub_item()?;
            sub.write_level(value, concrete, dest)?;
            dest.end_sub_item(token)?;
        }
        let view = concrete.project(value, level)?;
        for field in &self.fields {
            field.serializer.write(view, dest)?;
        }
        if let Some(extension) = &self.extension {
            if let Some(data) = (extension.get)(view) {
                if !data.is_empty() {
                    dest.write_raw(data.as_bytes())?;
                }
            }
        }
        Ok(())
    }

    /// Merges the message body at the cursor into `target`, an instance of
    /// this type.
    pub fn read(&self, target: &mut dyn Any, source: &mut ReadContext) -> Result<(), Error> {
        self.invoke_deserialize_callback(CallbackKind::BeforeDeserialize, target)?;
        let root = self.root(source.get_resolver())?;
        root.read_level(target, self, source)?;
        self.invoke_deserialize_callback(CallbackKind::AfterDeserialize, target)
    }

    fn read_level(
        &self,
        target: &mut dyn Any,
        concrete: &TypeSerializer,
        source: &mut ReadContext,
    ) -> Result<(), Error> {
        let level = self.depth();
        let mut last_index = 0;
        loop {
            let number = source.read_field_header()?;
            if number == 0 {
                return Ok(());
            }
            if let Some(index) = self.find_field(number, last_index) {
                last_index = index;
                let view = concrete.project_mut(target, level)?;
                self.fields[index].serializer.read(Some(view), source)?;
                continue;
            }
            if let Some(link) = self.sub_types.iter().find(|sub| sub.number == number) {
                let in_chain = concrete.chain.get(level + 1) == Some(&link.type_id);
                if in_chain && is_sub_message(source.wire_type()) {
                    let sub = source.get_resolver().get_serializer(link.type_id)?;
                    let token = source.start_sub_item()?;
                    sub.read_level(target, concrete, source)?;
                    source.end_sub_item(token)?;
                    continue;
                }
            }
            self.read_unknown(target, concrete, number, source)?;
        }
    }

    fn read_unknown(
        &self,
        target: &mut dyn Any,
        concrete: &TypeSerializer,
        number: u32,
        source: &mut ReadContext,
    ) -> Result<(), Error> {
        match &self.extension {
            Some(extension) => {
                let view = concrete.project_mut(target, self.depth())?;
                let data = (extension.get_mut)(view).ok_or_else(|| {
                    Error::type_error(format!("value is not a {}", self.name))
                })?;
                source.append_extension_data(data.bytes_mut())
            }
            None => {
                trace!("skipping unknown field {} of {}", number, self.name);
                source.skip_field()
            }
        }
    }

    /// Fields arrive mostly in order, so the search starts at the last match.
    fn find_field(&self, number: u32, last_index: usize) -> Option<usize> {
        let fields = &self.fields;
        let start = last_index.min(fields.len().checked_sub(1)?);
        let at = fields[start].number;
        if at == number {
            Some(start)
        } else if at < number {
            (start + 1..fields.len())
                .take_while(|&i| fields[i].number <= number)
                .find(|&i| fields[i].number == number)
        } else {
            (0..start)
                .rev()
                .take_while(|&i| fields[i].number >= number)
                .find(|&i| fields[i].number == number)
        }
    }

    /// Follows sub-type sub-messages from the cursor to find the most
    /// derived type of the message. Consumes input; callers look ahead on a
    /// forked context.
    pub(crate) fn resolve_concrete(&self, source: &mut ReadContext) -> Result<TypeId, Error> {
        loop {
            let number = source.read_field_header()?;
            if number == 0 {
                return Ok(self.type_id);
            }
            if let Some(link) = self.sub_types.iter().find(|sub| sub.number == number) {
                if is_sub_message(source.wire_type()) {
                    let sub = source.get_resolver().get_serializer(link.type_id)?;
                    let _token = source.start_sub_item()?;
                    return sub.resolve_concrete(source);
                }
            }
            source.skip_field()?;
        }
    }
}

#[inline(always)]
fn is_sub_message(wire_type: WireType) -> bool {
    matches!(wire_type, WireType::String | WireType::StartGroup)
}

/// A nested message of the fixed type `V`.
pub(crate) struct MessageSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> MessageSerializer<V> {
    pub(crate) fn new() -> Self {
        MessageSerializer {
            _marker: PhantomData,
        }
    }
}

impl<V: Any + Send + Sync> ProtoSerializer for MessageSerializer<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<V>()
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
        let token = dest.start_sub_item()?;
        dest.write_object(value, TypeId::of::<V>())?;
        dest.end_sub_item(token)
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        let token = source.start_sub_item()?;
        let created = match value {
            Some(existing) => {
                source.read_object(existing, TypeId::of::<V>())?;
                None
            }
            None => {
                let mut created = source.get_resolver().create(TypeId::of::<V>())?;
                source.read_object(&mut *created, TypeId::of::<V>())?;
                Some(created)
            }
        };
        source.end_sub_item(token)?;
        Ok(created)
    }
}
