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

//! # Protograph Core
//!
//! The core implementation of protograph: a protocol-buffer compatible
//! serializer for object graphs described at runtime.
//!
//! ## Architecture
//!
//! - **`buffer`**: varint, zigzag and fixed-width primitives over `Reader`/`Writer`
//! - **`types`**: wire types, data formats, field headers
//! - **`resolver`**: per-call read/write contexts, reference tracking and the type registry
//! - **`meta`**: type, field and enum configuration
//! - **`serializer`**: the field serializer chains and the message serializers
//! - **`model`**: [`TypeModel`], the public entry point
//! - **`config`**: limits shared by every operation of a model
//! - **`error`**: error handling
//!
//! ## Key Concepts
//!
//! ### Wire format
//!
//! Output is a standard protocol buffer message: every field is a varint
//! header `(field_number << 3) | wire_type` followed by its payload. Nested
//! messages are length-delimited, or framed with start/end group markers
//! when configured with [`types::DataFormat::Group`].
//!
//! ### Inheritance
//!
//! A base type lists its immediate sub-types under field numbers of its own.
//! An instance is written from the root of its hierarchy down: each level
//! holds the sub-message of the next level, followed by its own fields. On
//! decode the most derived type is found first and then materialized.
//!
//! ### Object graphs
//!
//! Fields described with [`serializer::codec::shared`] or
//! [`serializer::codec::shared_lock`] are reference tracked: an instance
//! reachable through several fields is written once, and the decoded graph
//! shares it again. Cycles are supported through `Arc<RwLock<T>>`.
//!
//! ## Usage
//!
//! ```rust
//! use protograph_core::meta::{FieldConfig, TypeConfig};
//! use protograph_core::serializer::codec;
//! use protograph_core::TypeModel;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Test2 {
//!     b: String,
//! }
//!
//! let mut model = TypeModel::default();
//! model
//!     .register(TypeConfig::<Test2>::new("Test2").field(FieldConfig::new(
//!         2,
//!         "b",
//!         codec::scalar(),
//!         |t: &Test2| &t.b,
//!         |t| &mut t.b,
//!     )))
//!     .unwrap();
//!
//! let bytes = model.serialize(&Test2 { b: "testing".into() }).unwrap();
//! assert_eq!(bytes, b"\x12\x07testing");
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod meta;
pub mod model;
pub mod resolver;
pub mod serializer;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use model::{try_read_length_prefix, LengthPrefix, TypeModel};
pub use serializer::DynObject;
