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

//! Value shape descriptions.
//!
//! A [`ValueCodec<V>`] says how a value of type `V` is laid out on the wire
//! without committing to a field number. The serializer chain is only
//! assembled when the owning type is first used, so configuration errors
//! (an inapplicable data format, a nested collection) surface there.
//!
//! ```rust
//! use protograph_core::serializer::codec;
//!
//! let ids = codec::list(codec::scalar::<i64>());
//! let name = codec::optional(codec::scalar::<String>());
//! # let _ = (ids, name);
//! ```

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeResolver;
use crate::serializer::any::{DynamicSerializer, PolymorphicSerializer};
use crate::serializer::arc::{SharedLockSerializer, SharedSerializer};
use crate::serializer::default_value::DefaultValueDecorator;
use crate::serializer::enum_::EnumSerializer;
use crate::serializer::list::ListDecorator;
use crate::serializer::map::MapDecorator;
use crate::serializer::option::OptionDecorator;
use crate::serializer::struct_::MessageSerializer;
use crate::serializer::tag::TagDecorator;
use crate::serializer::{downcast_ref, DynObject, ProtoSerializer, ScalarValue};
use crate::types::{DataFormat, WireType};
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Everything a codec needs to know about the field it is built for.
#[derive(Clone, Copy)]
pub struct FieldContext<'r> {
    pub resolver: &'r TypeResolver,
    pub field_number: u32,
    pub data_format: DataFormat,
    pub strict: bool,
    /// False for required fields and for items of collections.
    pub elide_default: bool,
}

impl<'r> FieldContext<'r> {
    fn for_item(&self) -> FieldContext<'r> {
        FieldContext {
            elide_default: false,
            ..*self
        }
    }

    fn for_entry_member(&self, field_number: u32) -> FieldContext<'r> {
        FieldContext {
            field_number,
            data_format: DataFormat::Default,
            elide_default: false,
            ..*self
        }
    }
}

/// Rough shape of a codec, used to reject unsupported nesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Value,
    Repeated,
    Map,
    Optional,
}

type BuildFn =
    dyn Fn(&FieldContext<'_>) -> Result<Arc<dyn ProtoSerializer>, Error> + Send + Sync;

/// Describes how values of type `V` are encoded.
pub struct ValueCodec<V> {
    shape: Shape,
    build: Arc<BuildFn>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for ValueCodec<V> {
    fn clone(&self) -> Self {
        ValueCodec {
            shape: self.shape,
            build: self.build.clone(),
            _marker: PhantomData,
        }
    }
}

impl<V> fmt::Debug for ValueCodec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("value", &type_name::<V>())
            .field("shape", &self.shape)
            .finish()
    }
}

impl<V: 'static> ValueCodec<V> {
    fn new<F>(shape: Shape, build: F) -> Self
    where
        F: Fn(&FieldContext<'_>) -> Result<Arc<dyn ProtoSerializer>, Error> + Send + Sync + 'static,
    {
        ValueCodec {
            shape,
            build: Arc::new(build),
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Assembles the serializer chain for one field.
    pub fn build(&self, ctx: &FieldContext<'_>) -> Result<Arc<dyn ProtoSerializer>, Error> {
        let serializer = (self.build)(ctx)?;
        if serializer.expected_type() != TypeId::of::<V>() {
            return Err(Error::type_error(format!(
                "codec for field {} does not produce {}",
                ctx.field_number,
                type_name::<V>()
            )));
        }
        Ok(serializer)
    }
}

/// Adapts a [`ScalarValue`] to the serializer chain.
pub(crate) struct ScalarSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> ScalarSerializer<V> {
    pub(crate) fn new() -> Self {
        ScalarSerializer {
            _marker: PhantomData,
        }
    }
}

impl<V: ScalarValue> ProtoSerializer for ScalarSerializer<V> {
    fn expected_type(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn requires_old_value(&self) -> bool {
        false
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        V::accepts(wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        downcast_ref::<V>(value)?.write_value(dest)
    }

    fn read(
        &self,
        _value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        Ok(Some(Box::new(V::read_value(source)?)))
    }
}

fn tagged(
    ctx: &FieldContext<'_>,
    wire_type: WireType,
    core: Arc<dyn ProtoSerializer>,
) -> Arc<dyn ProtoSerializer> {
    Arc::new(TagDecorator::new(ctx.field_number, wire_type, ctx.strict, core))
}

fn elided<V: PartialEq + Send + Sync + 'static>(
    ctx: &FieldContext<'_>,
    default: Option<V>,
    tail: Arc<dyn ProtoSerializer>,
) -> Arc<dyn ProtoSerializer> {
    match default {
        Some(default) if ctx.elide_default => Arc::new(DefaultValueDecorator::new(default, tail)),
        _ => tail,
    }
}

fn message_wire_type<V>(format: DataFormat) -> Result<WireType, Error> {
    match format {
        DataFormat::Default => Ok(WireType::String),
        DataFormat::Group => Ok(WireType::StartGroup),
        other => Err(crate::serializer::unsupported_format::<V>(other)),
    }
}

/// A scalar whose zero value is elided.
pub fn scalar<V: ScalarValue>() -> ValueCodec<V> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = V::wire_type(ctx.data_format)?;
        let tail = tagged(ctx, wire_type, Arc::new(ScalarSerializer::<V>::new()));
        Ok(elided(ctx, V::implicit_default(), tail))
    })
}

/// A scalar that is elided when equal to `default`.
pub fn scalar_with_default<V: ScalarValue>(default: V) -> ValueCodec<V> {
    ValueCodec::new(Shape::Value, move |ctx| {
        let wire_type = V::wire_type(ctx.data_format)?;
        let tail = tagged(ctx, wire_type, Arc::new(ScalarSerializer::<V>::new()));
        Ok(elided(ctx, Some(default.clone()), tail))
    })
}

/// An enum registered with [`EnumConfig`](crate::meta::EnumConfig).
/// `E::default()` is elided.
pub fn enumeration<E>() -> ValueCodec<E>
where
    E: Any + Copy + PartialEq + Default + Send + Sync + fmt::Debug,
{
    enumeration_with_default(E::default())
}

pub fn enumeration_with_default<E>(default: E) -> ValueCodec<E>
where
    E: Any + Copy + PartialEq + Send + Sync + fmt::Debug,
{
    ValueCodec::new(Shape::Value, move |ctx| {
        let wire_type = match ctx.data_format {
            DataFormat::Default | DataFormat::TwosComplement => WireType::Variant,
            DataFormat::ZigZag => WireType::SignedVariant,
            other => return Err(crate::serializer::unsupported_format::<E>(other)),
        };
        let meta = ctx.resolver.get_enum_meta::<E>()?;
        let tail = tagged(ctx, wire_type, Arc::new(EnumSerializer::new(meta)));
        Ok(elided(ctx, Some(default), tail))
    })
}

/// A nested message of a registered type, merged in place on decode.
pub fn message<V: Any + Send + Sync>() -> ValueCodec<V> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = message_wire_type::<V>(ctx.data_format)?;
        ctx.resolver
            .check_registered(TypeId::of::<V>())
            .map_err(Error::enhance_type_error::<V>)?;
        Ok(tagged(ctx, wire_type, Arc::new(MessageSerializer::<V>::new())))
    })
}

/// A boxed value of `B` or any of its registered sub-types. The concrete
/// type is restored on decode.
pub fn polymorphic<B: Any>() -> ValueCodec<DynObject> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = message_wire_type::<B>(ctx.data_format)?;
        ctx.resolver
            .check_registered(TypeId::of::<B>())
            .map_err(Error::enhance_type_error::<B>)?;
        Ok(tagged(
            ctx,
            wire_type,
            Arc::new(PolymorphicSerializer::new(TypeId::of::<B>())),
        ))
    })
}

/// A boxed value of any registered type; the type name travels with it.
pub fn dynamic() -> ValueCodec<DynObject> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = message_wire_type::<DynObject>(ctx.data_format)?;
        Ok(tagged(ctx, wire_type, Arc::new(DynamicSerializer::new())))
    })
}

/// A reference-tracked immutable message. Instances shared by several
/// fields are written once and shared again after decode.
pub fn shared<V: Any + Send + Sync>() -> ValueCodec<Arc<V>> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = message_wire_type::<V>(ctx.data_format)?;
        ctx.resolver
            .check_registered(TypeId::of::<V>())
            .map_err(Error::enhance_type_error::<V>)?;
        Ok(tagged(ctx, wire_type, Arc::new(SharedSerializer::<V>::new())))
    })
}

/// A reference-tracked mutable message. Supports cyclic graphs.
pub fn shared_lock<V: Any + Send + Sync>() -> ValueCodec<Arc<RwLock<V>>> {
    ValueCodec::new(Shape::Value, |ctx| {
        let wire_type = message_wire_type::<V>(ctx.data_format)?;
        ctx.resolver
            .check_registered(TypeId::of::<V>())
            .map_err(Error::enhance_type_error::<V>)?;
        Ok(tagged(ctx, wire_type, Arc::new(SharedLockSerializer::<V>::new())))
    })
}

fn check_item_shape(container: &str, shape: Shape) -> Result<(), Error> {
    match shape {
        Shape::Value => Ok(()),
        Shape::Repeated | Shape::Map => Err(Error::unsupported_shape(format!(
            "nested collections are not supported: {} of a collection",
            container
        ))),
        Shape::Optional => Err(Error::unsupported_shape(format!(
            "{} items cannot be optional",
            container
        ))),
    }
}

/// A repeated field. Decoding appends to the existing items.
pub fn list<V: Any + Send + Sync>(item: ValueCodec<V>) -> ValueCodec<Vec<V>> {
    ValueCodec::new(Shape::Repeated, move |ctx| {
        check_item_shape("list", item.shape())?;
        let item = item.build(&ctx.for_item())?;
        Ok(Arc::new(ListDecorator::<V>::new(ctx.field_number, item)))
    })
}

/// A field that is written only when present.
pub fn optional<V: Any + Send + Sync>(inner: ValueCodec<V>) -> ValueCodec<Option<V>> {
    ValueCodec::new(Shape::Optional, move |ctx| {
        if inner.shape() != Shape::Value {
            return Err(Error::unsupported_shape(format!(
                "only single values can be optional, field {} wraps a {:?}",
                ctx.field_number,
                inner.shape()
            )));
        }
        let inner = inner.build(&ctx.for_item())?;
        Ok(Arc::new(OptionDecorator::<V>::new(inner)))
    })
}

/// A dictionary encoded as repeated `{1: key, 2: value}` entries in
/// ascending key order.
pub fn map<K, V>(key: ValueCodec<K>, value: ValueCodec<V>) -> ValueCodec<HashMap<K, V>>
where
    K: Any + Ord + Hash + Clone + Default + Send + Sync,
    V: Any + Default + Send + Sync,
{
    map_codec(key, value)
}

pub fn btree_map<K, V>(key: ValueCodec<K>, value: ValueCodec<V>) -> ValueCodec<BTreeMap<K, V>>
where
    K: Any + Ord + Clone + Default + Send + Sync,
    V: Any + Default + Send + Sync,
{
    map_codec(key, value)
}

fn map_codec<M, K, V>(key: ValueCodec<K>, value: ValueCodec<V>) -> ValueCodec<M>
where
    M: crate::serializer::map::MapContainer<K, V>,
    K: Any + Ord + Clone + Default + Send + Sync,
    V: Any + Default + Send + Sync,
{
    ValueCodec::new(Shape::Map, move |ctx| {
        check_item_shape("map key", key.shape())?;
        check_item_shape("map value", value.shape())?;
        let wire_type = message_wire_type::<M>(ctx.data_format)?;
        let key = key.build(&ctx.for_entry_member(1))?;
        let value = value.build(&ctx.for_entry_member(2))?;
        Ok(Arc::new(MapDecorator::<M, K, V>::new(
            ctx.field_number,
            wire_type,
            ctx.strict,
            key,
            value,
        )))
    })
}
