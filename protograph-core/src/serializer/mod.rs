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

//! Field serializers.
//!
//! Every configured field is encoded by a chain of [`ProtoSerializer`]s:
//! member access, then collection iteration, then nullable / reference
//! handling / default elision, then tag framing, and finally the value codec.
//! The chain is assembled from a [`codec::ValueCodec`] when the owning type is
//! first used, and works over `&dyn Any` so that one chain type serves every
//! field.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{DataFormat, WireType};
use std::any::{type_name, Any, TypeId};
use std::fmt;

mod any;
mod arc;
pub mod bcl;
pub mod codec;
pub mod datetime;
mod default_value;
pub mod enum_;
mod list;
mod map;
pub(crate) mod member;
mod number;
mod option;
mod string;
pub mod struct_;
mod tag;

pub use codec::{FieldContext, ValueCodec};
pub use member::MemberAccess;

/// An owned value of any registered type.
pub type DynObject = Box<dyn Any + Send + Sync>;

/// One link of a field serializer chain.
pub trait ProtoSerializer: Send + Sync {
    /// The Rust type of the values this link handles.
    fn expected_type(&self) -> TypeId;

    /// True when decoding merges into the current value, which must then be
    /// passed to [`ProtoSerializer::read`].
    fn requires_old_value(&self) -> bool;

    /// True when [`ProtoSerializer::read`] can hand back a freshly decoded value.
    fn returns_value(&self) -> bool;

    /// Whether a field arriving with `wire_type` can be decoded by this link.
    fn accepts_wire_type(&self, _wire_type: WireType) -> bool {
        true
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error>;

    /// Decodes the current field.
    ///
    /// `Some(value)` replaces the old value; `None` means the old value was
    /// updated in place, or nothing was decoded.
    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error>;
}

/// A single-valued type with a fixed wire representation.
pub trait ScalarValue: Any + Clone + PartialEq + Send + Sync + fmt::Debug {
    /// Wire type for `format`, or [`Error::UnsupportedShape`] when the format
    /// does not apply to this type.
    fn wire_type(format: DataFormat) -> Result<WireType, Error>;

    /// The value elided from the output when no explicit default is set.
    /// `None` means the value is always written.
    fn implicit_default() -> Option<Self>;

    fn accepts(wire_type: WireType) -> bool;

    fn write_value(&self, dest: &mut WriteContext) -> Result<(), Error>;

    fn read_value(source: &mut ReadContext) -> Result<Self, Error>;
}

pub(crate) fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T, Error> {
    value.downcast_ref::<T>().ok_or_else(|| {
        Error::type_error(format!("expected a value of type {}", type_name::<T>()))
    })
}

pub(crate) fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, Error> {
    value.downcast_mut::<T>().ok_or_else(|| {
        Error::type_error(format!("expected a value of type {}", type_name::<T>()))
    })
}

pub(crate) fn unbox<T: Any>(value: DynObject) -> Result<T, Error> {
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        Error::type_error(format!("decoded value is not a {}", type_name::<T>()))
    })
}

pub(crate) fn unsupported_format<T>(format: DataFormat) -> Error {
    Error::unsupported_shape(format!(
        "data format {:?} does not apply to {}",
        format,
        type_name::<T>()
    ))
}
