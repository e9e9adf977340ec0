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

use crate::buffer::{Reader, Writer};
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::meta::{EnumConfig, FieldConfig, TypeConfig};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeResolver;
use crate::serializer::{unbox, DynObject};
use crate::types::{make_header, split_header, PrefixStyle, WireType};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

/// The length prefix at the front of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthPrefix {
    /// Field number of the `String` header preceding a `Base128` length, or
    /// 0 when there is none.
    pub field_number: u32,
    /// Length of the message body. For [`PrefixStyle::None`] this is the
    /// rest of the input.
    pub length: usize,
    /// Bytes taken by the header and the length itself.
    pub prefix_len: usize,
}

impl LengthPrefix {
    fn total_len(&self) -> usize {
        self.prefix_len + self.length
    }
}

fn read_length_prefix(
    bf: &[u8],
    style: PrefixStyle,
    expect_header: bool,
) -> Result<Option<LengthPrefix>, Error> {
    if bf.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::new(bf);
    let (field_number, length) = match style {
        PrefixStyle::None => (0, bf.len()),
        PrefixStyle::Base128 => {
            let mut field_number = 0;
            if expect_header {
                let (number, wire_type) = split_header(reader.read_varuint64()?)?;
                ensure!(
                    wire_type == WireType::String,
                    Error::unexpected_wire_type(format!(
                        "length prefix header for field {} has wire type {}",
                        number, wire_type
                    ))
                );
                field_number = number;
            }
            let length = reader.read_varuint64()?;
            let length = usize::try_from(length)
                .map_err(|_| Error::truncated_input(reader.get_cursor(), usize::MAX, bf.len()))?;
            (field_number, length)
        }
        PrefixStyle::Fixed32 => (0, reader.read_u32()? as usize),
        PrefixStyle::Fixed32BigEndian => (0, reader.read_u32_be()? as usize),
    };
    let prefix = LengthPrefix {
        field_number,
        length,
        prefix_len: if style == PrefixStyle::None {
            0
        } else {
            reader.get_cursor()
        },
    };
    // prefix_len never exceeds bf.len(), the reader would have failed first
    if prefix.length > bf.len() - prefix.prefix_len {
        return Err(Error::truncated_input(
            prefix.prefix_len,
            prefix.length,
            bf.len(),
        ));
    }
    Ok(Some(prefix))
}

/// Reads the length prefix at the front of `bf` without consuming it.
/// Returns `None` for empty input. `Base128` prefixes are read without a
/// field header.
pub fn try_read_length_prefix(
    bf: &[u8],
    style: PrefixStyle,
) -> Result<Option<LengthPrefix>, Error> {
    read_length_prefix(bf, style, false)
}

/// Finds the next message in a prefixed stream. `pick` is called with the
/// field number of each message and the message is skipped when it returns
/// `None`. Returns the chosen type, the body and the bytes consumed.
fn next_prefixed<F>(
    bf: &[u8],
    style: PrefixStyle,
    expect_header: bool,
    mut pick: F,
) -> Result<Option<(TypeId, &[u8], usize)>, Error>
where
    F: FnMut(u32) -> Option<TypeId>,
{
    let mut offset = 0;
    while let Some(prefix) = read_length_prefix(&bf[offset..], style, expect_header)? {
        let start = offset + prefix.prefix_len;
        offset += prefix.total_len();
        if let Some(type_id) = pick(prefix.field_number) {
            return Ok(Some((type_id, &bf[start..offset], offset)));
        }
    }
    Ok(None)
}

/// A registry of message types and the entry point for every operation.
///
/// Types are described with [`TypeConfig`] and registered up front. The
/// first operation touching a type builds and freezes the serializers of
/// its whole inheritance hierarchy; a `TypeModel` can then be shared
/// between threads.
///
/// # Examples
///
/// ```rust
/// use protograph_core::meta::{FieldConfig, TypeConfig};
/// use protograph_core::serializer::codec;
/// use protograph_core::TypeModel;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Test1 {
///     a: i32,
/// }
///
/// let mut model = TypeModel::default();
/// model
///     .register(TypeConfig::<Test1>::new("Test1").field(FieldConfig::new(
///         1,
///         "a",
///         codec::scalar(),
///         |t: &Test1| &t.a,
///         |t| &mut t.a,
///     )))
///     .unwrap();
///
/// let bytes = model.serialize(&Test1 { a: 150 }).unwrap();
/// assert_eq!(bytes, [0x08, 0x96, 0x01]);
/// let back: Test1 = model.deserialize(&bytes).unwrap();
/// assert_eq!(back, Test1 { a: 150 });
/// ```
#[derive(Default)]
pub struct TypeModel {
    type_resolver: TypeResolver,
}

impl TypeModel {
    pub fn new(config: Config) -> TypeModel {
        TypeModel {
            type_resolver: TypeResolver::new(config),
        }
    }

    /// Sets the maximum sub-message nesting depth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protograph_core::TypeModel;
    ///
    /// let model = TypeModel::default().max_depth(32);
    /// assert_eq!(model.config().max_depth(), 32);
    /// ```
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.type_resolver.config_mut().max_depth = max_depth;
        self
    }

    /// Makes fields reject on-wire types other than their configured one,
    /// unless a field says otherwise.
    pub fn strict(mut self, strict: bool) -> Self {
        self.type_resolver.config_mut().strict = strict;
        self
    }

    pub fn config(&self) -> &Config {
        self.type_resolver.get_config()
    }

    pub fn get_type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    pub fn register<T: Any + Send + Sync>(&mut self, config: TypeConfig<T>) -> Result<(), Error> {
        self.type_resolver.register(config)
    }

    pub fn register_enum<E>(&mut self, config: EnumConfig<E>) -> Result<(), Error>
    where
        E: Any + Copy + PartialEq + Send + Sync + fmt::Debug,
    {
        self.type_resolver.register_enum(config)
    }

    /// Adds a field to `T`. Fails once `T` is in use.
    pub fn add_field<T: Any>(&mut self, field: FieldConfig<T>) -> Result<(), Error> {
        self.type_resolver.add_field(field)
    }

    /// Declares `D` as a sub-type of `B` under `field_number`. Fails once
    /// `B` is in use.
    pub fn add_sub_type<B: Any, D: Any>(&mut self, field_number: u32) -> Result<(), Error> {
        self.type_resolver.add_sub_type::<B, D>(field_number)
    }

    /// Builds the serializers of `T`'s hierarchy now instead of on first use,
    /// reporting configuration errors early.
    pub fn prepare<T: Any>(&self) -> Result<(), Error> {
        self.type_resolver
            .get_serializer(TypeId::of::<T>())
            .map(|_| ())
            .map_err(Error::enhance_type_error::<T>)
    }

    pub fn is_frozen<T: Any>(&self) -> bool {
        self.type_resolver.is_frozen(TypeId::of::<T>())
    }

    fn write_context(&self) -> WriteContext<'_> {
        WriteContext::new(&self.type_resolver, self.type_resolver.get_config())
    }

    fn read_context<'a>(&'a self, bf: &'a [u8]) -> ReadContext<'a> {
        ReadContext::new(bf, &self.type_resolver, self.type_resolver.get_config())
    }

    pub fn serialize<T: Any>(&self, value: &T) -> Result<Vec<u8>, Error> {
        self.serialize_dyn(value)
            .map_err(Error::enhance_type_error::<T>)
    }

    /// Serializes a value of any registered type. A boxed [`DynObject`] is
    /// written as the value it holds.
    pub fn serialize_dyn(&self, value: &dyn Any) -> Result<Vec<u8>, Error> {
        let value = match value.downcast_ref::<DynObject>() {
            Some(boxed) => &**boxed as &dyn Any,
            None => value,
        };
        let mut context = self.write_context();
        context.write_object(value, value.type_id())?;
        context.close()
    }

    pub fn deserialize<T: Any>(&self, bf: &[u8]) -> Result<T, Error> {
        let mut value = self
            .type_resolver
            .create(TypeId::of::<T>())
            .map_err(Error::enhance_type_error::<T>)?;
        self.read_into(bf, &mut *value, TypeId::of::<T>())?;
        unbox(value)
    }

    /// Deserializes a `B` or any of its sub-types, as recorded in the data.
    pub fn deserialize_dyn<B: Any>(&self, bf: &[u8]) -> Result<DynObject, Error> {
        self.deserialize_type(bf, TypeId::of::<B>())
            .map_err(Error::enhance_type_error::<B>)
    }

    fn deserialize_type(&self, bf: &[u8], declared: TypeId) -> Result<DynObject, Error> {
        let resolver = &self.type_resolver;
        let root = resolver.get_serializer(resolver.root_of(declared)?)?;
        let found = root.resolve_concrete(&mut self.read_context(bf))?;
        let concrete = if resolver.is_assignable(declared, found) {
            found
        } else {
            declared
        };
        let mut value = resolver.create(concrete)?;
        self.read_into(bf, &mut *value, concrete)?;
        Ok(value)
    }

    /// Merges the message in `bf` into `target`: scalars are overwritten,
    /// repeated fields appended and nested messages merged.
    pub fn merge<T: Any>(&self, bf: &[u8], target: &mut T) -> Result<(), Error> {
        self.read_into(bf, target, TypeId::of::<T>())
            .map_err(Error::enhance_type_error::<T>)
    }

    fn read_into(&self, bf: &[u8], target: &mut dyn Any, concrete: TypeId) -> Result<(), Error> {
        let mut context = self.read_context(bf);
        context.read_object(target, concrete)?;
        context.close()
    }

    /// A copy of `value` made by serializing and deserializing it.
    pub fn deep_clone<T: Any>(&self, value: &T) -> Result<T, Error> {
        self.change_type::<T, T>(value)
    }

    /// Serializes a `S` and deserializes the bytes as a `T`; useful between
    /// types that share a wire layout.
    pub fn change_type<S: Any, T: Any>(&self, value: &S) -> Result<T, Error> {
        let bytes = self.serialize(value)?;
        self.deserialize(&bytes)
    }

    /// Serializes `value` preceded by its length. With
    /// [`PrefixStyle::Base128`] and a positive `field_number` the length is
    /// preceded by a `String` field header, so a stream of such messages is
    /// itself a valid message with a repeated field.
    pub fn serialize_with_length_prefix<T: Any>(
        &self,
        value: &T,
        style: PrefixStyle,
        field_number: u32,
    ) -> Result<Vec<u8>, Error> {
        let body = self.serialize(value)?;
        let mut writer = Writer::with_capacity(body.len() + 10);
        match style {
            PrefixStyle::None => {}
            PrefixStyle::Base128 => {
                if field_number > 0 {
                    crate::types::check_field_number(field_number)?;
                    writer.write_varuint64(make_header(field_number, WireType::String));
                }
                writer.write_varuint64(body.len() as u64);
            }
            PrefixStyle::Fixed32 | PrefixStyle::Fixed32BigEndian => {
                let length = u32::try_from(body.len()).map_err(|_| {
                    Error::encode_error(format!(
                        "message of {} bytes does not fit a 32-bit length prefix",
                        body.len()
                    ))
                })?;
                if style == PrefixStyle::Fixed32 {
                    writer.write_u32(length);
                } else {
                    writer.write_u32_be(length);
                }
            }
        }
        writer.write_bytes(&body);
        Ok(writer.into_bytes())
    }

    /// Reads the next length-prefixed `T` from `bf`, returning it with the
    /// number of bytes consumed, or `None` at the end of the input. With
    /// [`PrefixStyle::Base128`] and a positive `field_number`, messages
    /// written for other field numbers are skipped.
    pub fn deserialize_with_length_prefix<T: Any>(
        &self,
        bf: &[u8],
        style: PrefixStyle,
        field_number: u32,
    ) -> Result<Option<(T, usize)>, Error> {
        let expect_header = style == PrefixStyle::Base128 && field_number > 0;
        let next = next_prefixed(bf, style, expect_header, |actual| {
            (!expect_header || actual == field_number).then(TypeId::of::<T>)
        })?;
        match next {
            Some((_, body, consumed)) => Ok(Some((self.deserialize(body)?, consumed))),
            None => Ok(None),
        }
    }

    /// Like [`TypeModel::deserialize_with_length_prefix`], but the type of
    /// each message is chosen by `resolver` from its field number. Messages
    /// for which `resolver` returns `None` are skipped.
    pub fn deserialize_with_resolver<F>(
        &self,
        bf: &[u8],
        style: PrefixStyle,
        resolver: F,
    ) -> Result<Option<(DynObject, usize)>, Error>
    where
        F: FnMut(u32) -> Option<TypeId>,
    {
        let expect_header = style == PrefixStyle::Base128;
        match next_prefixed(bf, style, expect_header, resolver)? {
            Some((type_id, body, consumed)) => {
                Ok(Some((self.deserialize_type(body, type_id)?, consumed)))
            }
            None => Ok(None),
        }
    }

    /// Iterates over a stream of length-prefixed `T` messages. Iteration
    /// stops at the end of the input or after the first error.
    pub fn deserialize_items<'m, 'b, T: Any>(
        &'m self,
        bf: &'b [u8],
        style: PrefixStyle,
        field_number: u32,
    ) -> Items<'m, 'b, T> {
        Items {
            model: self,
            bf,
            style,
            field_number,
            offset: 0,
            done: false,
            _marker: PhantomData,
        }
    }
}

/// Iterator returned by [`TypeModel::deserialize_items`].
pub struct Items<'m, 'b, T> {
    model: &'m TypeModel,
    bf: &'b [u8],
    style: PrefixStyle,
    field_number: u32,
    offset: usize,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Iterator for Items<'_, '_, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rest = &self.bf[self.offset..];
        match self
            .model
            .deserialize_with_length_prefix::<T>(rest, self.style, self.field_number)
        {
            Ok(Some((item, consumed))) => {
                self.offset += consumed;
                Some(Ok(item))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeModel")
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}
