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

//! Types shared by the integration tests.

use protograph::{codec, ExtensionData, FieldConfig, TypeConfig, TypeModel};

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Test1 {
    pub a: i32,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Test2 {
    pub b: String,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Test3 {
    pub c: Test1,
}

/// A model with the three messages of the protocol buffer encoding guide.
pub fn guide_model() -> TypeModel {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Test1>::new("Test1").field(FieldConfig::new(
            1,
            "a",
            codec::scalar(),
            |t: &Test1| &t.a,
            |t| &mut t.a,
        )))
        .unwrap();
    model
        .register(TypeConfig::<Test2>::new("Test2").field(FieldConfig::new(
            2,
            "b",
            codec::scalar(),
            |t: &Test2| &t.b,
            |t| &mut t.b,
        )))
        .unwrap();
    model
        .register(TypeConfig::<Test3>::new("Test3").field(FieldConfig::new(
            3,
            "c",
            codec::message(),
            |t: &Test3| &t.c,
            |t| &mut t.c,
        )))
        .unwrap();
    model
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Animal {
    pub name: String,
    pub legs: i32,
    pub extension: ExtensionData,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Dog {
    pub base: Animal,
    pub breed: String,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Puppy {
    pub base: Dog,
    pub age_weeks: i32,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Cat {
    pub base: Animal,
    pub lives: i32,
}

pub fn animal_config() -> TypeConfig<Animal> {
    TypeConfig::<Animal>::new("Animal")
        .field(FieldConfig::new(1, "name", codec::scalar(), |a: &Animal| &a.name, |a| &mut a.name))
        .field(FieldConfig::new(2, "legs", codec::scalar(), |a: &Animal| &a.legs, |a| &mut a.legs))
        .sub_type::<Dog>(10)
        .sub_type::<Cat>(11)
}

pub fn dog_config() -> TypeConfig<Dog> {
    TypeConfig::<Dog>::new("Dog")
        .base::<Animal>(|d| &d.base, |d| &mut d.base)
        .field(FieldConfig::new(3, "breed", codec::scalar(), |d: &Dog| &d.breed, |d| &mut d.breed))
        .sub_type::<Puppy>(12)
}

pub fn puppy_config() -> TypeConfig<Puppy> {
    TypeConfig::<Puppy>::new("Puppy")
        .base::<Dog>(|p| &p.base, |p| &mut p.base)
        .field(FieldConfig::new(
            4,
            "age_weeks",
            codec::scalar(),
            |p: &Puppy| &p.age_weeks,
            |p| &mut p.age_weeks,
        ))
}

pub fn cat_config() -> TypeConfig<Cat> {
    TypeConfig::<Cat>::new("Cat")
        .base::<Animal>(|c| &c.base, |c| &mut c.base)
        .field(FieldConfig::new(5, "lives", codec::scalar(), |c: &Cat| &c.lives, |c| &mut c.lives))
}

/// Animal <- Dog <- Puppy, Animal <- Cat.
pub fn animal_model() -> TypeModel {
    let mut model = TypeModel::default();
    model.register(animal_config()).unwrap();
    model.register(dog_config()).unwrap();
    model.register(puppy_config()).unwrap();
    model.register(cat_config()).unwrap();
    model
}

pub fn rex() -> Dog {
    Dog {
        base: Animal {
            name: "Rex".to_string(),
            legs: 4,
            extension: ExtensionData::default(),
        },
        breed: "lab".to_string(),
    }
}
