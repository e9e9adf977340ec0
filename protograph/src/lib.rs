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

//! # Protograph
//!
//! Protocol-buffer compatible serialization for Rust object graphs, with
//! inheritance, shared and cyclic references, unknown-field round trips and
//! lifecycle callbacks. Types are described at runtime through a
//! [`TypeModel`]; nothing is generated at compile time.
//!
//! ## Describing types
//!
//! Every message type gets a [`TypeConfig`] that lists its fields. A field
//! pairs a number with accessors and a [`codec`] that says how the value is
//! laid out:
//!
//! ```rust
//! use protograph::{codec, FieldConfig, TypeConfig, TypeModel};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Test1 {
//!     a: i32,
//! }
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Test3 {
//!     c: Test1,
//!     tags: Vec<String>,
//! }
//!
//! let mut model = TypeModel::default();
//! model
//!     .register(TypeConfig::<Test1>::new("Test1").field(FieldConfig::new(
//!         1,
//!         "a",
//!         codec::scalar(),
//!         |t: &Test1| &t.a,
//!         |t| &mut t.a,
//!     )))
//!     .unwrap();
//! model
//!     .register(
//!         TypeConfig::<Test3>::new("Test3")
//!             .field(FieldConfig::new(3, "c", codec::message(), |t: &Test3| &t.c, |t| &mut t.c))
//!             .field(FieldConfig::new(
//!                 4,
//!                 "tags",
//!                 codec::list(codec::scalar()),
//!                 |t: &Test3| &t.tags,
//!                 |t| &mut t.tags,
//!             )),
//!     )
//!     .unwrap();
//!
//! let value = Test3 {
//!     c: Test1 { a: 150 },
//!     tags: vec![],
//! };
//! let bytes = model.serialize(&value).unwrap();
//! assert_eq!(bytes, [0x1a, 0x03, 0x08, 0x96, 0x01]);
//! assert_eq!(model.deserialize::<Test3>(&bytes).unwrap(), value);
//! ```
//!
//! ## Inheritance
//!
//! A derived type embeds its base and names it with [`TypeConfig::base`];
//! the base lists the derived type with [`TypeConfig::sub_type`]. Fields
//! declared as [`codec::polymorphic`] hold a [`DynObject`] and restore the
//! concrete type on decode.
//!
//! ## Streams
//!
//! [`TypeModel::serialize_with_length_prefix`] and
//! [`TypeModel::deserialize_items`] read and write sequences of messages
//! framed by a [`PrefixStyle`].

pub use protograph_core::meta::{
    ConfigSource, EnumConfig, ExtensionData, FieldConfig, TypeConfig,
};
pub use protograph_core::serializer::bcl::{Decimal, Guid};
pub use protograph_core::serializer::codec;
pub use protograph_core::serializer::{MemberAccess, ValueCodec};
pub use protograph_core::types::{CallbackKind, DataFormat, PrefixStyle, WireType};
pub use protograph_core::{
    try_read_length_prefix, Config, DynObject, Error, LengthPrefix, TypeModel,
};
