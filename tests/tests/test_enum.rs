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

use protograph::{codec, DataFormat, EnumConfig, Error, FieldConfig, TypeConfig, TypeModel};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Mapped {
    #[default]
    Default,
    ChangeName,
    ChangeValue,
    ChangeBoth,
}

#[derive(Default, Debug, PartialEq)]
struct Holder {
    value: Mapped,
    history: Vec<Mapped>,
}

fn mapped_config() -> EnumConfig<Mapped> {
    EnumConfig::new("Mapped")
        .member(Mapped::Default, "Default", 2)
        .member(Mapped::ChangeName, "ChangeName", 3)
        .rename("FOO")
        .member(Mapped::ChangeValue, "ChangeValue", 5)
        .wire_value(19)
        .member(Mapped::ChangeBoth, "ChangeBoth", 7)
        .rename("BAR")
        .wire_value(92)
}

fn model() -> TypeModel {
    let mut model = TypeModel::default();
    model.register_enum(mapped_config()).unwrap();
    model
        .register(
            TypeConfig::<Holder>::new("Holder")
                .field(FieldConfig::new(
                    1,
                    "value",
                    codec::enumeration(),
                    |h: &Holder| &h.value,
                    |h| &mut h.value,
                ))
                .field(FieldConfig::new(
                    2,
                    "history",
                    codec::list(codec::enumeration()),
                    |h: &Holder| &h.history,
                    |h| &mut h.history,
                )),
        )
        .unwrap();
    model
}

fn encode(model: &TypeModel, value: Mapped) -> Vec<u8> {
    model
        .serialize(&Holder {
            value,
            ..Holder::default()
        })
        .unwrap()
}

#[test]
fn test_wire_values() {
    let model = model();
    assert_eq!(encode(&model, Mapped::Default), Vec::<u8>::new());
    assert_eq!(encode(&model, Mapped::ChangeName), [0x08, 3]);
    assert_eq!(encode(&model, Mapped::ChangeValue), [0x08, 19]);
    assert_eq!(encode(&model, Mapped::ChangeBoth), [0x08, 92]);
}

#[test]
fn test_wire_names() {
    let model = model();
    let meta = model.get_type_resolver().get_enum_meta::<Mapped>().unwrap();
    assert_eq!(meta.name(), "Mapped");
    assert_eq!(meta.name_of(Mapped::Default), Some("Default"));
    assert_eq!(meta.name_of(Mapped::ChangeName), Some("FOO"));
    assert_eq!(meta.name_of(Mapped::ChangeValue), Some("ChangeValue"));
    assert_eq!(meta.name_of(Mapped::ChangeBoth), Some("BAR"));
}

#[test]
fn test_decode_maps_back() {
    let model = model();
    let holder = Holder {
        value: Mapped::ChangeBoth,
        history: vec![Mapped::Default, Mapped::ChangeValue, Mapped::ChangeName],
    };
    let bytes = model.serialize(&holder).unwrap();
    assert_eq!(
        bytes,
        [0x08, 92, 0x10, 2, 0x10, 19, 0x10, 3]
    );
    assert_eq!(model.deserialize::<Holder>(&bytes).unwrap(), holder);
}

#[test]
fn test_unmapped_wire_value() {
    let model = model();
    // 5 is the underlying number of ChangeValue, but it travels as 19
    let err = model.deserialize::<Holder>(&[0x08, 5]).unwrap_err();
    assert!(matches!(err, Error::UnknownEnum(_)));
}

#[test]
fn test_conflicting_mappings() {
    let mut model = TypeModel::default();
    let err = model
        .register_enum(
            EnumConfig::new("Mapped")
                .member(Mapped::Default, "Default", 1)
                .member(Mapped::ChangeName, "ChangeName", 2)
                .wire_value(1),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateConfiguration(_)));

    let err = model
        .register_enum(
            EnumConfig::new("Mapped")
                .member(Mapped::Default, "Default", 1)
                .member(Mapped::ChangeName, "ChangeName", 2)
                .rename("Default"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateConfiguration(_)));

    model.register_enum(mapped_config()).unwrap();
    assert!(matches!(
        model.register_enum(mapped_config()),
        Err(Error::DuplicateConfiguration(_))
    ));
}

#[test]
fn test_enum_must_be_registered() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Holder>::new("Holder").field(FieldConfig::new(
            1,
            "value",
            codec::enumeration(),
            |h: &Holder| &h.value,
            |h| &mut h.value,
        )))
        .unwrap();
    assert!(matches!(model.prepare::<Holder>(), Err(Error::TypeError(_))));
}

#[test]
fn test_negative_wire_value_zigzag() {
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Sign {
        #[default]
        Zero,
        Minus,
    }
    #[derive(Default)]
    struct Signed {
        sign: Sign,
    }

    let mut model = TypeModel::default();
    model
        .register_enum(
            EnumConfig::new("Sign")
                .member(Sign::Zero, "Zero", 0)
                .member(Sign::Minus, "Minus", -1),
        )
        .unwrap();
    model
        .register(TypeConfig::<Signed>::new("Signed").field(
            FieldConfig::new(1, "sign", codec::enumeration(), |s: &Signed| &s.sign, |s| &mut s.sign)
                .data_format(DataFormat::ZigZag),
        ))
        .unwrap();
    let bytes = model.serialize(&Signed { sign: Sign::Minus }).unwrap();
    assert_eq!(bytes, [0x08, 0x01]);
    assert_eq!(model.deserialize::<Signed>(&bytes).unwrap().sign, Sign::Minus);
}
