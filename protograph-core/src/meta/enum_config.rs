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
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug)]
struct EnumMemberConfig<E> {
    value: E,
    name: String,
    number: i32,
    wire_name: Option<String>,
    wire_value: Option<i32>,
}

/// Wire mapping of a Rust enum.
///
/// Each member is written as its underlying number unless overridden with
/// [`EnumConfig::wire_value`]. Overrides apply to the member added last.
///
/// ```rust
/// use protograph_core::meta::EnumConfig;
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// enum Level {
///     #[default]
///     Low,
///     High,
/// }
///
/// let config = EnumConfig::new("Level")
///     .member(Level::Low, "Low", 0)
///     .member(Level::High, "High", 1)
///     .rename("HIGH")
///     .wire_value(10);
/// # let _ = config;
/// ```
#[derive(Clone, Debug)]
pub struct EnumConfig<E> {
    name: String,
    members: Vec<EnumMemberConfig<E>>,
    dangling_override: bool,
}

impl<E: Copy + PartialEq + fmt::Debug> EnumConfig<E> {
    pub fn new(name: impl Into<String>) -> Self {
        EnumConfig {
            name: name.into(),
            members: Vec::new(),
            dangling_override: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(mut self, value: E, name: impl Into<String>, number: i32) -> Self {
        self.members.push(EnumMemberConfig {
            value,
            name: name.into(),
            number,
            wire_name: None,
            wire_value: None,
        });
        self
    }

    pub fn rename(mut self, wire_name: impl Into<String>) -> Self {
        match self.members.last_mut() {
            Some(member) => member.wire_name = Some(wire_name.into()),
            None => self.dangling_override = true,
        }
        self
    }

    pub fn wire_value(mut self, wire_value: i32) -> Self {
        match self.members.last_mut() {
            Some(member) => member.wire_value = Some(wire_value),
            None => self.dangling_override = true,
        }
        self
    }

    /// Validates the mapping.
    pub(crate) fn build(&self) -> Result<EnumMeta<E>, Error> {
        if self.dangling_override {
            return Err(Error::invalid_configuration(format!(
                "enum {} overrides a member before declaring one",
                self.name
            )));
        }
        let mut names: HashMap<&str, &str> = HashMap::new();
        let mut by_wire: HashMap<i32, usize> = HashMap::new();
        let mut members = Vec::with_capacity(self.members.len());
        for (index, member) in self.members.iter().enumerate() {
            if self.members[..index].iter().any(|m| m.value == member.value) {
                return Err(Error::duplicate_configuration(format!(
                    "enum {} maps {:?} twice",
                    self.name, member.value
                )));
            }
            let wire_name = member.wire_name.as_deref().unwrap_or(&member.name);
            if let Some(other) = names.insert(wire_name, member.name.as_str()) {
                return Err(Error::duplicate_configuration(format!(
                    "enum {}: members {} and {} both map to the name {}",
                    self.name, other, member.name, wire_name
                )));
            }
            let wire_value = member.wire_value.unwrap_or(member.number);
            if let Some(other) = by_wire.insert(wire_value, index) {
                return Err(Error::duplicate_configuration(format!(
                    "enum {}: members {} and {} both map to the wire value {}",
                    self.name, self.members[other].name, member.name, wire_value
                )));
            }
            members.push(EnumMember {
                value: member.value,
                name: wire_name.to_string(),
                wire_value,
            });
        }
        Ok(EnumMeta {
            name: self.name.clone(),
            members,
            by_wire,
        })
    }
}

#[derive(Clone, Debug)]
pub struct EnumMember<E> {
    pub value: E,
    pub name: String,
    pub wire_value: i32,
}

/// A validated enum mapping.
#[derive(Clone, Debug)]
pub struct EnumMeta<E> {
    name: String,
    members: Vec<EnumMember<E>>,
    by_wire: HashMap<i32, usize>,
}

impl<E: Copy + PartialEq + fmt::Debug> EnumMeta<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EnumMember<E>] {
        &self.members
    }

    pub fn to_wire(&self, value: E) -> Result<i32, Error> {
        self.members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.wire_value)
            .ok_or_else(|| {
                Error::unknown_enum(format!("{:?} is not mapped in enum {}", value, self.name))
            })
    }

    pub fn from_wire(&self, wire_value: i32) -> Result<E, Error> {
        self.by_wire
            .get(&wire_value)
            .map(|&index| self.members[index].value)
            .ok_or_else(|| {
                Error::unknown_enum(format!(
                    "wire value {} is not mapped in enum {}",
                    wire_value, self.name
                ))
            })
    }

    pub fn name_of(&self, value: E) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.name.as_str())
    }
}
