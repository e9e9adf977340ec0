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

//! Registry of message and enum types.
//!
//! Types are registered up front; their serializers are built the first time
//! any type of an inheritance hierarchy is used, for the whole hierarchy at
//! once, after which the configuration of those types is frozen.

use crate::config::Config;
use crate::error::Error;
use crate::meta::type_meta::{SubTypeDefinition, TypeDefinition};
use crate::meta::{EnumConfig, EnumMeta, FieldConfig, MetaType, TypeConfig};
use crate::serializer::struct_::TypeSerializer;
use crate::serializer::DynObject;
use log::debug;
use parking_lot::Mutex;
use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// TypeResolver is a resolver for type metadata and serializer dispatch.
pub struct TypeResolver {
    types: HashMap<TypeId, MetaType>,
    names: HashMap<String, TypeId>,
    enums: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    config: Config,
    // serializes hierarchy builds so a type is never built twice
    build_lock: Mutex<()>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        TypeResolver::new(Config::default())
    }
}

impl TypeResolver {
    pub fn new(config: Config) -> TypeResolver {
        TypeResolver {
            types: HashMap::new(),
            names: HashMap::new(),
            enums: HashMap::new(),
            config,
            build_lock: Mutex::new(()),
        }
    }

    #[inline(always)]
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn register<T: Any + Send + Sync>(&mut self, config: TypeConfig<T>) -> Result<(), Error> {
        self.register_definition(config.into_definition())
    }

    pub(crate) fn register_definition(&mut self, definition: TypeDefinition) -> Result<(), Error> {
        if let Some(existing) = self.types.get(&definition.type_id) {
            return Err(Error::duplicate_configuration(format!(
                "{} is already registered as {}",
                definition.rust_name,
                existing.name()
            )));
        }
        if let Some(other) = self.names.get(&definition.name) {
            let other = self
                .types
                .get(other)
                .map(|meta| meta.definition.rust_name)
                .unwrap_or_default();
            return Err(Error::duplicate_configuration(format!(
                "type name {} is used by both {} and {}",
                definition.name, other, definition.rust_name
            )));
        }
        debug!(
            "registered type {} ({}) with {} fields",
            definition.name,
            definition.rust_name,
            definition.fields.len()
        );
        self.names.insert(definition.name.clone(), definition.type_id);
        self.types
            .insert(definition.type_id, MetaType::new(definition));
        Ok(())
    }

    pub fn register_enum<E>(&mut self, config: EnumConfig<E>) -> Result<(), Error>
    where
        E: Any + Copy + PartialEq + Send + Sync + std::fmt::Debug,
    {
        let type_id = TypeId::of::<E>();
        if self.enums.contains_key(&type_id) {
            return Err(Error::duplicate_configuration(format!(
                "enum {} is already registered",
                type_name::<E>()
            )));
        }
        let meta = config.build()?;
        debug!(
            "registered enum {} with {} members",
            meta.name(),
            meta.members().len()
        );
        self.enums.insert(type_id, Arc::new(meta));
        Ok(())
    }

    /// Adds a field to a registered type that is not yet in use.
    pub fn add_field<T: Any>(&mut self, field: FieldConfig<T>) -> Result<(), Error> {
        let meta = self.meta_mut(TypeId::of::<T>(), type_name::<T>())?;
        meta.definition_mut()?.fields.push(field.into_definition());
        Ok(())
    }

    /// Declares `D` as an immediate sub-type of `B`, written under
    /// `field_number`.
    pub fn add_sub_type<B: Any, D: Any>(&mut self, field_number: u32) -> Result<(), Error> {
        let meta = self.meta_mut(TypeId::of::<B>(), type_name::<B>())?;
        meta.definition_mut()?.sub_types.push(SubTypeDefinition {
            number: field_number,
            type_id: TypeId::of::<D>(),
            type_name: type_name::<D>(),
        });
        Ok(())
    }

    fn meta_mut(&mut self, type_id: TypeId, rust_name: &str) -> Result<&mut MetaType, Error> {
        self.types.get_mut(&type_id).ok_or_else(|| {
            Error::type_error(format!(
                "{} is not registered, maybe you forgot to register some types",
                rust_name
            ))
        })
    }

    pub fn get_meta(&self, type_id: TypeId) -> Result<&MetaType, Error> {
        self.types.get(&type_id).ok_or_else(|| {
            Error::type_error("TypeId not found in type registry, maybe you forgot to register some types")
        })
    }

    pub(crate) fn definition(&self, type_id: TypeId) -> Result<&TypeDefinition, Error> {
        self.get_meta(type_id).map(|meta| &meta.definition)
    }

    pub fn check_registered(&self, type_id: TypeId) -> Result<(), Error> {
        self.get_meta(type_id).map(|_| ())
    }

    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.types.contains_key(&type_id)
    }

    pub fn is_frozen(&self, type_id: TypeId) -> bool {
        self.types
            .get(&type_id)
            .map(MetaType::is_frozen)
            .unwrap_or(false)
    }

    pub fn type_id_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    pub fn name_of(&self, type_id: TypeId) -> Result<&str, Error> {
        self.get_meta(type_id).map(MetaType::name)
    }

    /// Creates a fresh instance of a registered type.
    pub fn create(&self, type_id: TypeId) -> Result<DynObject, Error> {
        let definition = self.definition(type_id)?;
        Ok((definition.factory)())
    }

    pub fn get_enum_meta<E: Any + Send + Sync>(&self) -> Result<Arc<EnumMeta<E>>, Error> {
        let meta = self.enums.get(&TypeId::of::<E>()).ok_or_else(|| {
            Error::type_error(format!(
                "enum {} is not registered, maybe you forgot to register some types",
                type_name::<E>()
            ))
        })?;
        Arc::clone(meta)
            .downcast::<EnumMeta<E>>()
            .map_err(|_| Error::type_error(format!("enum {} has a foreign registration", type_name::<E>())))
    }

    /// Types from the root of the hierarchy down to `type_id`.
    pub(crate) fn chain_of(&self, type_id: TypeId) -> Result<Vec<TypeId>, Error> {
        let mut chain = vec![type_id];
        let mut seen = HashSet::from([type_id]);
        let mut current = self.definition(type_id)?;
        while let Some(base) = &current.base {
            if !seen.insert(base.type_id) {
                return Err(Error::invalid_configuration(format!(
                    "the base types of {} form a cycle",
                    current.name
                )));
            }
            current = self.definition(base.type_id).map_err(|_| {
                Error::type_error(format!(
                    "base type {} of {} is not registered",
                    base.type_name, current.name
                ))
            })?;
            chain.push(base.type_id);
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn root_of(&self, type_id: TypeId) -> Result<TypeId, Error> {
        Ok(self.chain_of(type_id)?[0])
    }

    /// True when `concrete` is `base` or derives from it.
    pub fn is_assignable(&self, base: TypeId, concrete: TypeId) -> bool {
        self.chain_of(concrete)
            .map(|chain| chain.contains(&base))
            .unwrap_or(false)
    }

    /// The serializer of a registered type, building its hierarchy on first use.
    pub fn get_serializer(&self, type_id: TypeId) -> Result<&Arc<TypeSerializer>, Error> {
        let meta = self.get_meta(type_id)?;
        if let Some(serializer) = meta.serializer.get() {
            return Ok(serializer);
        }
        let _guard = self.build_lock.lock();
        if meta.serializer.get().is_none() {
            let root = self.root_of(type_id)?;
            if !self.is_frozen(root) {
                self.build_hierarchy(root)?;
            }
        }
        meta.serializer.get().ok_or_else(|| {
            Error::invalid_configuration(format!(
                "{} names a base type that does not list it as a sub-type",
                meta.name()
            ))
        })
    }

    fn build_hierarchy(&self, root: TypeId) -> Result<(), Error> {
        let mut order = vec![root];
        let mut seen = HashSet::from([root]);
        let mut next = 0;
        while next < order.len() {
            let parent = order[next];
            next += 1;
            let definition = self.definition(parent)?;
            for sub in &definition.sub_types {
                let sub_definition = self.definition(sub.type_id).map_err(|_| {
                    Error::type_error(format!(
                        "sub-type {} of {} is not registered",
                        sub.type_name, definition.name
                    ))
                })?;
                if sub_definition.base.as_ref().map(|base| base.type_id) != Some(parent) {
                    return Err(Error::invalid_configuration(format!(
                        "{} is declared as a sub-type of {} but does not name it as its base",
                        sub_definition.name, definition.name
                    )));
                }
                if !seen.insert(sub.type_id) {
                    return Err(Error::invalid_configuration(format!(
                        "{} is declared as a sub-type more than once",
                        sub_definition.name
                    )));
                }
                order.push(sub.type_id);
            }
        }
        let built = order
            .iter()
            .map(|type_id| TypeSerializer::build(self, *type_id).map(|s| (*type_id, s)))
            .collect::<Result<Vec<_>, Error>>()?;
        for (type_id, serializer) in built {
            if let Some(meta) = self.types.get(&type_id) {
                let _ = meta.serializer.set(Arc::new(serializer));
            }
        }
        debug!(
            "built serializers for {} types rooted at {}",
            order.len(),
            self.name_of(root)?
        );
        Ok(())
    }
}
