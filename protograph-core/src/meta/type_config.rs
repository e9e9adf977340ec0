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

//! Declarative description of a message type.
//!
//! A [`TypeConfig<T>`] lists the fields of `T`, its immediate sub-types, the
//! accessor that exposes its base type, lifecycle callbacks and an optional
//! [`ExtensionData`] buffer for unknown fields. Registering it with a
//! [`TypeModel`](crate::model::TypeModel) erases the generic parameter into a
//! [`TypeDefinition`](super::type_meta::TypeDefinition); validation happens
//! when the type is first used.
//!
//! ```rust
//! use protograph_core::meta::{FieldConfig, TypeConfig};
//! use protograph_core::serializer::codec;
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let config = TypeConfig::<Point>::new("Point")
//!     .field(FieldConfig::new(1, "x", codec::scalar(), |p: &Point| &p.x, |p| &mut p.x))
//!     .field(FieldConfig::new(2, "y", codec::scalar(), |p: &Point| &p.y, |p| &mut p.y));
//! # let _ = config;
//! ```

use crate::error::Error;
use crate::meta::type_meta::{
    member_builder, BaseDefinition, CallbackDefinition, ExtensionAccess, FactoryFn,
    FieldDefinition, MemberBuilderFn, SubTypeDefinition, TypeDefinition,
};
use crate::serializer::member::MemberDecorator;
use crate::serializer::{DynObject, FieldContext, MemberAccess, ProtoSerializer, ValueCodec};
use crate::types::{CallbackKind, DataFormat};
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

/// Where a field configuration came from. When several sources describe the
/// same member, the one with the highest precedence is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigSource {
    ProtoMember,
    DataMember,
    XmlElement,
}

impl ConfigSource {
    /// Higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            ConfigSource::ProtoMember => 3,
            ConfigSource::DataMember => 2,
            ConfigSource::XmlElement => 1,
        }
    }
}

/// Raw bytes of fields that were read but not recognised. Written back
/// verbatim after the known fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionData {
    bytes: Vec<u8>,
}

impl ExtensionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear()
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

/// One member of a message type.
pub struct FieldConfig<T> {
    number: u32,
    name: String,
    source: ConfigSource,
    data_format: DataFormat,
    required: bool,
    strict: Option<bool>,
    builder: Arc<MemberBuilderFn>,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T: Any> FieldConfig<T> {
    fn with_access<V: Any>(
        number: u32,
        name: impl Into<String>,
        codec: ValueCodec<V>,
        access: MemberAccess<T, V>,
    ) -> Self {
        let name = name.into();
        let member_name = name.clone();
        FieldConfig {
            number,
            name,
            source: ConfigSource::ProtoMember,
            data_format: DataFormat::Default,
            required: false,
            strict: None,
            builder: member_builder(move |ctx: &FieldContext<'_>| {
                let tail = codec.build(ctx)?;
                Ok(Arc::new(MemberDecorator::new(member_name.clone(), access, tail)?)
                    as Arc<dyn ProtoSerializer>)
            }),
            _marker: std::marker::PhantomData,
        }
    }

    /// A plain struct field.
    pub fn new<V: Any>(
        number: u32,
        name: impl Into<String>,
        codec: ValueCodec<V>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self::with_access(number, name, codec, MemberAccess::Field { get, get_mut })
    }

    /// A value exposed through a getter and a setter.
    pub fn property<V: Any>(
        number: u32,
        name: impl Into<String>,
        codec: ValueCodec<V>,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
    ) -> Self {
        Self::with_access(number, name, codec, MemberAccess::Property { get, set })
    }

    /// A value that is updated in place and never replaced.
    pub fn read_only<V: Any>(
        number: u32,
        name: impl Into<String>,
        codec: ValueCodec<V>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self::with_access(number, name, codec, MemberAccess::ReadOnly { get, get_mut })
    }

    pub fn source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    pub fn data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    /// Required fields are written even when they hold their default.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Overrides the model's strictness for this field.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_definition(self) -> FieldDefinition {
        FieldDefinition {
            number: self.number,
            name: self.name,
            source: self.source,
            data_format: self.data_format,
            required: self.required,
            strict: self.strict,
            builder: self.builder,
        }
    }
}

/// Description of a message type `T`.
pub struct TypeConfig<T> {
    name: String,
    fields: Vec<FieldConfig<T>>,
    sub_types: Vec<SubTypeDefinition>,
    base: Option<BaseDefinition>,
    callbacks: Vec<CallbackDefinition>,
    extension: Option<ExtensionAccess>,
    factory: Arc<FactoryFn>,
}

impl<T: Any + Send + Sync + Default> TypeConfig<T> {
    /// Instances are created with `T::default()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_factory(name, T::default)
    }
}

impl<T: Any + Send + Sync> TypeConfig<T> {
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        TypeConfig {
            name: name.into(),
            fields: Vec::new(),
            sub_types: Vec::new(),
            base: None,
            callbacks: Vec::new(),
            extension: None,
            factory: Arc::new(move || Box::new(factory()) as DynObject),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(mut self, field: FieldConfig<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares `S` as an immediate sub-type written under `field_number`.
    /// `S` must name `T` as its base.
    pub fn sub_type<S: Any>(mut self, field_number: u32) -> Self {
        self.sub_types.push(SubTypeDefinition {
            number: field_number,
            type_id: TypeId::of::<S>(),
            type_name: type_name::<S>(),
        });
        self
    }

    /// Declares `B` as the base type of `T`, reachable through the given
    /// accessors.
    pub fn base<B: Any>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        self.base = Some(BaseDefinition::new(
            TypeId::of::<B>(),
            type_name::<B>(),
            move |value| value.downcast_ref::<T>().map(|v| get(v) as &dyn Any),
            move |value| value.downcast_mut::<T>().map(|v| get_mut(v) as &mut dyn Any),
        ));
        self
    }

    /// Enables unknown field preservation.
    pub fn extension(
        mut self,
        get: fn(&T) -> &ExtensionData,
        get_mut: fn(&mut T) -> &mut ExtensionData,
    ) -> Self {
        self.extension = Some(ExtensionAccess::new(
            move |value| value.downcast_ref::<T>().map(get),
            move |value| value.downcast_mut::<T>().map(get_mut),
        ));
        self
    }

    fn serialize_callback<F>(mut self, kind: CallbackKind, callback: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.push(CallbackDefinition::Serialize(
            kind,
            Arc::new(move |value: &dyn Any| {
                let value = crate::serializer::downcast_ref::<T>(value)?;
                callback(value).map_err(Error::from)
            }),
        ));
        self
    }

    fn deserialize_callback<F>(mut self, kind: CallbackKind, callback: F) -> Self
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.push(CallbackDefinition::Deserialize(
            kind,
            Arc::new(move |value: &mut dyn Any| {
                let value = crate::serializer::downcast_mut::<T>(value)?;
                callback(value).map_err(Error::from)
            }),
        ));
        self
    }

    pub fn before_serialize<F>(self, callback: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.serialize_callback(CallbackKind::BeforeSerialize, callback)
    }

    pub fn after_serialize<F>(self, callback: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.serialize_callback(CallbackKind::AfterSerialize, callback)
    }

    pub fn before_deserialize<F>(self, callback: F) -> Self
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.deserialize_callback(CallbackKind::BeforeDeserialize, callback)
    }

    pub fn after_deserialize<F>(self, callback: F) -> Self
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.deserialize_callback(CallbackKind::AfterDeserialize, callback)
    }

    pub(crate) fn into_definition(self) -> TypeDefinition {
        TypeDefinition {
            type_id: TypeId::of::<T>(),
            name: self.name,
            rust_name: type_name::<T>(),
            fields: self
                .fields
                .into_iter()
                .map(FieldConfig::into_definition)
                .collect(),
            sub_types: self.sub_types,
            base: self.base,
            callbacks: self.callbacks,
            extension: self.extension,
            factory: self.factory,
        }
    }
}
