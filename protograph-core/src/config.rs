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

/// Configuration for a [`TypeModel`](crate::model::TypeModel).
///
/// Shared by the model and every `WriteContext`/`ReadContext` it creates so
/// encode and decode observe the same limits.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum sub-message nesting depth on encode and decode.
    pub max_depth: u32,
    /// Whether fields reject on-wire types other than their configured one
    /// unless the field overrides it.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: 128,
            strict: false,
        }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get maximum nesting depth.
    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Check if strict wire types are the default.
    #[inline(always)]
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}
