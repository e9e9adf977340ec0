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
use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Field numbers of a reference record.
pub mod net_object {
    pub const EXISTING_OBJECT_KEY: u32 = 1;
    pub const NEW_OBJECT_KEY: u32 = 2;
    pub const EXISTING_TYPE_KEY: u32 = 3;
    pub const NEW_TYPE_KEY: u32 = 4;
    pub const TYPE_NAME: u32 = 8;
    pub const OBJECT: u32 = 10;
}

/// Reference writer for tracking shared objects and types during serialization.
///
/// RefWriter assigns keys from one counter to object instances (by address)
/// and to type identities, so that a second appearance of either is written
/// as a key instead of being serialized again.
///
/// # Examples
///
/// ```rust
/// use protograph_core::resolver::ref_resolver::RefWriter;
/// use std::sync::Arc;
///
/// let mut ref_writer = RefWriter::new();
/// let shared = Arc::new(42);
///
/// // First encounter assigns a new key
/// assert_eq!(ref_writer.add_object(Arc::as_ptr(&shared) as *const () as usize), (0, false));
/// // Second encounter returns the same key
/// assert_eq!(ref_writer.add_object(Arc::as_ptr(&shared) as *const () as usize), (0, true));
/// ```
#[derive(Default)]
pub struct RefWriter {
    /// Maps object addresses to keys
    objects: HashMap<usize, u32>,
    /// Maps type identities to keys
    types: HashMap<TypeId, u32>,
    next_key: u32,
}

impl RefWriter {
    /// Creates a new RefWriter instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for the object at `address` and whether it was seen before.
    pub fn add_object(&mut self, address: usize) -> (u32, bool) {
        if let Some(&key) = self.objects.get(&address) {
            return (key, true);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.objects.insert(address, key);
        (key, false)
    }

    /// Returns the key for `type_id` and whether it was seen before.
    pub fn add_type(&mut self, type_id: TypeId) -> (u32, bool) {
        if let Some(&key) = self.types.get(&type_id) {
            return (key, true);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.types.insert(type_id, key);
        (key, false)
    }

    /// Clear all stored keys.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.types.clear();
        self.next_key = 0;
    }
}

enum KeyedEntry {
    Object(Box<dyn Any + Send + Sync>),
    Type(TypeId),
}

/// Reference reader resolving keys back to objects and types during
/// deserialization.
///
/// Keys may be filled out of order: an object's key is announced before its
/// body, and objects nested in that body can complete first. Keys come from
/// the input, so entries are kept sparse.
///
/// # Examples
///
/// ```rust
/// use protograph_core::resolver::ref_resolver::RefReader;
/// use std::sync::Arc;
///
/// let mut ref_reader = RefReader::new();
/// let shared = Arc::new(42);
///
/// ref_reader.set_keyed_object(0, shared.clone()).unwrap();
/// let retrieved: Arc<i32> = ref_reader.get_keyed_object(0).unwrap();
/// assert!(Arc::ptr_eq(&shared, &retrieved));
/// ```
#[derive(Default)]
pub struct RefReader {
    entries: HashMap<u32, KeyedEntry>,
}

impl RefReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: u32, entry: KeyedEntry) -> Result<(), Error> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(Error::invalid_ref(format!(
                "reference key {} is assigned twice",
                key
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Stores a handle (typically an `Arc`) under `key`.
    pub fn set_keyed_object<T: Any + Send + Sync>(&mut self, key: u32, object: T) -> Result<(), Error> {
        self.insert(key, KeyedEntry::Object(Box::new(object)))
    }

    /// Clones the handle stored under `key`.
    pub fn get_keyed_object<T: Any + Clone>(&self, key: u32) -> Result<T, Error> {
        match self.entries.get(&key) {
            Some(KeyedEntry::Object(object)) => {
                (**object).downcast_ref::<T>().cloned().ok_or_else(|| {
                    Error::invalid_ref(format!(
                        "reference key {} does not hold a {}",
                        key,
                        type_name::<T>()
                    ))
                })
            }
            Some(KeyedEntry::Type(_)) => Err(Error::invalid_ref(format!(
                "reference key {} names a type, not an object",
                key
            ))),
            None => Err(Error::invalid_ref(format!(
                "reference key {} is unknown or still being decoded",
                key
            ))),
        }
    }

    pub fn set_keyed_type(&mut self, key: u32, type_id: TypeId) -> Result<(), Error> {
        self.insert(key, KeyedEntry::Type(type_id))
    }

    pub fn get_keyed_type(&self, key: u32) -> Result<TypeId, Error> {
        match self.entries.get(&key) {
            Some(KeyedEntry::Type(type_id)) => Ok(*type_id),
            _ => Err(Error::invalid_ref(format!("type key {} is unknown", key))),
        }
    }

    /// Clear all stored references.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
