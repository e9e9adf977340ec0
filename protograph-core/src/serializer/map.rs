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
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{downcast_mut, downcast_ref, unbox, DynObject, ProtoSerializer};
use crate::types::WireType;
use log::trace;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

const KEY_FIELD: u32 = 1;
const VALUE_FIELD: u32 = 2;

/// Dictionaries that can be written as key-ordered entries.
pub trait MapContainer<K, V>: Any + Default + Send + Sync {
    /// Entries in ascending key order.
    fn sorted_entries(&self) -> Vec<(&K, &V)>;

    /// Inserts or replaces the entry for `key`.
    fn insert_entry(&mut self, key: K, value: V);
}

impl<K, V> MapContainer<K, V> for HashMap<K, V>
where
    K: Any + Ord + Hash + Send + Sync,
    V: Any + Send + Sync,
{
    fn sorted_entries(&self) -> Vec<(&K, &V)> {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V> MapContainer<K, V> for BTreeMap<K, V>
where
    K: Any + Ord + Send + Sync,
    V: Any + Send + Sync,
{
    fn sorted_entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

/// Writes every entry as a `{1: key, 2: value}` sub-message under the map's
/// field number. Key and value are always written. A strict map rejects
/// entries of another wire type instead of skipping them.
pub(crate) struct MapDecorator<M, K, V> {
    field_number: u32,
    wire_type: WireType,
    strict: bool,
    key: Arc<dyn ProtoSerializer>,
    value: Arc<dyn ProtoSerializer>,
    _marker: PhantomData<fn() -> (M, K, V)>,
}

impl<M, K, V> MapDecorator<M, K, V> {
    pub(crate) fn new(
        field_number: u32,
        wire_type: WireType,
        strict: bool,
        key: Arc<dyn ProtoSerializer>,
        value: Arc<dyn ProtoSerializer>,
    ) -> Self {
        MapDecorator {
            field_number,
            wire_type,
            strict,
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<M, K, V> MapDecorator<M, K, V>
where
    M: MapContainer<K, V>,
    K: Any + Default + Send + Sync,
    V: Any + Default + Send + Sync,
{
    fn read_entry(&self, map: &mut M, source: &mut ReadContext) -> Result<(), Error> {
        if !source.wire_type().same_encoding(self.wire_type) {
            if self.strict {
                return Err(Error::unexpected_wire_type(format!(
                    "map entry of field {} is declared as {} but arrived as {}",
                    self.field_number,
                    self.wire_type,
                    source.wire_type()
                )));
            }
            trace!(
                "skipping map entry of field {} with wire type {}",
                self.field_number,
                source.wire_type()
            );
            return source.skip_field();
        }
        let token = source.start_sub_item()?;
        let mut key = K::default();
        let mut value = V::default();
        loop {
            match source.read_field_header()? {
                0 => break,
                KEY_FIELD => {
                    if let Some(decoded) = self.key.read(Some(&mut key as &mut dyn Any), source)? {
                        key = unbox::<K>(decoded)?;
                    }
                }
                VALUE_FIELD => {
                    if let Some(decoded) = self.value.read(Some(&mut value as &mut dyn Any), source)? {
                        value = unbox::<V>(decoded)?;
                    }
                }
                _ => source.skip_field()?,
            }
        }
        source.end_sub_item(token)?;
        map.insert_entry(key, value);
        Ok(())
    }
}

impl<M, K, V> ProtoSerializer for MapDecorator<M, K, V>
where
    M: MapContainer<K, V>,
    K: Any + Default + Send + Sync,
    V: Any + Default + Send + Sync,
{
    fn expected_type(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn requires_old_value(&self) -> bool {
        true
    }

    fn returns_value(&self) -> bool {
        true
    }

    fn accepts_wire_type(&self, wire_type: WireType) -> bool {
        wire_type.same_encoding(self.wire_type)
    }

    fn write(&self, value: &dyn Any, dest: &mut WriteContext) -> Result<(), Error> {
        for (k, v) in downcast_ref::<M>(value)?.sorted_entries() {
            dest.write_field_header(self.field_number, self.wire_type)?;
            let token = dest.start_sub_item()?;
            self.key.write(k, dest)?;
            self.value.write(v, dest)?;
            dest.end_sub_item(token)?;
        }
        Ok(())
    }

    fn read(
        &self,
        value: Option<&mut dyn Any>,
        source: &mut ReadContext,
    ) -> Result<Option<DynObject>, Error> {
        match value {
            Some(existing) => {
                let map = downcast_mut::<M>(existing)?;
                self.read_entry(map, source)?;
                while source.try_read_field_header(self.field_number)? {
                    self.read_entry(map, source)?;
                }
                Ok(None)
            }
            None => {
                let mut map = M::default();
                self.read_entry(&mut map, source)?;
                while source.try_read_field_header(self.field_number)? {
                    self.read_entry(&mut map, source)?;
                }
                Ok(Some(Box::new(map)))
            }
        }
    }
}
