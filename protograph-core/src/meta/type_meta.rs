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
use crate::meta::type_config::{ConfigSource, ExtensionData};
use crate::not_allowed;
use crate::serializer::struct_::TypeSerializer;
use crate::serializer::{DynObject, FieldContext, ProtoSerializer};
use crate::types::{CallbackKind, DataFormat};
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

pub(crate) type UpcastFn = dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync;
pub(crate) type UpcastMutFn = dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync;
pub(crate) type ExtensionFn = dyn Fn(&dyn Any) -> Option<&ExtensionData> + Send + Sync;
pub(crate) type ExtensionMutFn = dyn Fn(&mut dyn Any) -> Option<&mut ExtensionData> + Send + Sync;
pub(crate) type SerializeCallbackFn = dyn Fn(&dyn Any) -> Result<(), Error> + Send + Sync;
pub(crate) type DeserializeCallbackFn = dyn Fn(&mut dyn Any) -> Result<(), Error> + Send + Sync;
pub(crate) type MemberBuilderFn =
    dyn Fn(&FieldContext<'_>) -> Result<Arc<dyn ProtoSerializer>, Error> + Send + Sync;
pub(crate) type FactoryFn = dyn Fn() -> DynObject + Send + Sync;

pub(crate) fn member_builder<F>(f: F) -> Arc<MemberBuilderFn>
where
    F: Fn(&FieldContext<'_>) -> Result<Arc<dyn ProtoSerializer>, Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) struct FieldDefinition {
    pub number: u32,
    pub name: String,
    pub source: ConfigSource,
    pub data_format: DataFormat,
    pub required: bool,
    pub strict: Option<bool>,
    pub builder: Arc<MemberBuilderFn>,
}

#[derive(Clone, Debug)]
pub(crate) struct SubTypeDefinition {
    pub number: u32,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

/// Link from a derived type to the base value it embeds.
#[derive(Clone)]
pub(crate) struct BaseDefinition {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub upcast: Arc<UpcastFn>,
    pub upcast_mut: Arc<UpcastMutFn>,
}

impl BaseDefinition {
    pub(crate) fn new<F, G>(type_id: TypeId, type_name: &'static str, upcast: F, upcast_mut: G) -> Self
    where
        F: Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync + 'static,
        G: Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync + 'static,
    {
        BaseDefinition {
            type_id,
            type_name,
            upcast: Arc::new(upcast),
            upcast_mut: Arc::new(upcast_mut),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ExtensionAccess {
    pub get: Arc<ExtensionFn>,
    pub get_mut: Arc<ExtensionMutFn>,
}

impl ExtensionAccess {
    pub(crate) fn new<F, G>(get: F, get_mut: G) -> Self
    where
        F: Fn(&dyn Any) -> Option<&ExtensionData> + Send + Sync + 'static,
        G: Fn(&mut dyn Any) -> Option<&mut ExtensionData> + Send + Sync + 'static,
    {
        ExtensionAccess {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
        }
    }
}

#[derive(Clone)]
pub(crate) enum CallbackDefinition {
    Serialize(CallbackKind, Arc<SerializeCallbackFn>),
    Deserialize(CallbackKind, Arc<DeserializeCallbackFn>),
}

impl CallbackDefinition {
    pub(crate) fn kind(&self) -> CallbackKind {
        match self {
            CallbackDefinition::Serialize(kind, _) | CallbackDefinition::Deserialize(kind, _) => {
                *kind
            }
        }
    }
}

/// Type-erased configuration of one registered type.
pub(crate) struct TypeDefinition {
    pub type_id: TypeId,
    pub name: String,
    pub rust_name: &'static str,
    pub fields: Vec<FieldDefinition>,
    pub sub_types: Vec<SubTypeDefinition>,
    pub base: Option<BaseDefinition>,
    pub callbacks: Vec<CallbackDefinition>,
    pub extension: Option<ExtensionAccess>,
    pub factory: Arc<FactoryFn>,
}

/// A registered type: its configuration and, once built, its frozen
/// serializer.
pub struct MetaType {
    pub(crate) definition: TypeDefinition,
    pub(crate) serializer: OnceLock<Arc<TypeSerializer>>,
}

impl MetaType {
    pub(crate) fn new(definition: TypeDefinition) -> MetaType {
        MetaType {
            definition,
            serializer: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn type_id(&self) -> TypeId {
        self.definition.type_id
    }

    pub fn base_type(&self) -> Option<TypeId> {
        self.definition.base.as_ref().map(|base| base.type_id)
    }

    /// True once a serializer has been built; the configuration can no
    /// longer change.
    pub fn is_frozen(&self) -> bool {
        self.serializer.get().is_some()
    }

    pub(crate) fn definition_mut(&mut self) -> Result<&mut TypeDefinition, Error> {
        if self.is_frozen() {
            not_allowed!(
                "type {} is already in use and can no longer be changed",
                self.definition.name
            );
        }
        Ok(&mut self.definition)
    }
}
