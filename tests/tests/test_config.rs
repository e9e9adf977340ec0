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

use protograph::{codec, ConfigSource, DataFormat, Error, FieldConfig, TypeConfig, TypeModel};
use std::collections::HashMap;
use tests::{guide_model, Test1, Test3};

#[derive(Default, Debug, PartialEq)]
struct Item {
    id: i32,
    label: String,
}

#[test]
fn test_higher_precedence_source_wins() {
    let mut model = TypeModel::default();
    model
        .register(
            TypeConfig::<Item>::new("Item")
                .field(
                    FieldConfig::new(7, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)
                        .source(ConfigSource::XmlElement),
                )
                .field(
                    FieldConfig::new(1, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)
                        .source(ConfigSource::ProtoMember),
                )
                .field(
                    FieldConfig::new(5, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)
                        .source(ConfigSource::DataMember),
                ),
        )
        .unwrap();
    let bytes = model
        .serialize(&Item {
            id: 3,
            ..Item::default()
        })
        .unwrap();
    assert_eq!(bytes, [0x08, 0x03]);
}

#[test]
fn test_same_source_twice_is_rejected() {
    let mut model = TypeModel::default();
    model
        .register(
            TypeConfig::<Item>::new("Item")
                .field(FieldConfig::new(1, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id))
                .field(FieldConfig::new(2, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)),
        )
        .unwrap();
    assert!(matches!(
        model.serialize(&Item::default()),
        Err(Error::DuplicateConfiguration(_))
    ));
}

#[test]
fn test_field_number_used_twice() {
    let mut model = TypeModel::default();
    model
        .register(
            TypeConfig::<Item>::new("Item")
                .field(FieldConfig::new(1, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id))
                .field(FieldConfig::new(
                    1,
                    "label",
                    codec::scalar(),
                    |i: &Item| &i.label,
                    |i| &mut i.label,
                )),
        )
        .unwrap();
    assert!(matches!(
        model.prepare::<Item>(),
        Err(Error::DuplicateConfiguration(_))
    ));
}

#[test]
fn test_invalid_field_numbers() {
    for number in [0, 1 << 29, u32::MAX] {
        let mut model = TypeModel::default();
        model
            .register(TypeConfig::<Item>::new("Item").field(FieldConfig::new(
                number,
                "id",
                codec::scalar(),
                |i: &Item| &i.id,
                |i| &mut i.id,
            )))
            .unwrap();
        assert!(
            matches!(model.prepare::<Item>(), Err(Error::InvalidConfiguration(_))),
            "field number {} was accepted",
            number
        );
    }
}

#[test]
fn test_type_registered_twice() {
    let mut model = TypeModel::default();
    model.register(TypeConfig::<Item>::new("Item")).unwrap();
    assert!(matches!(
        model.register(TypeConfig::<Item>::new("Other")),
        Err(Error::DuplicateConfiguration(_))
    ));
    assert!(matches!(
        model.register(TypeConfig::<Test1>::new("Item")),
        Err(Error::DuplicateConfiguration(_))
    ));
}

#[test]
fn test_unregistered_type() {
    let model = guide_model();
    let err = model.serialize(&Item::default()).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));

    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Test3>::new("Test3").field(FieldConfig::new(
            3,
            "c",
            codec::message(),
            |t: &Test3| &t.c,
            |t| &mut t.c,
        )))
        .unwrap();
    assert!(matches!(model.prepare::<Test3>(), Err(Error::TypeError(_))));
}

#[test]
fn test_model_is_frozen_after_first_use() {
    let mut model = guide_model();
    assert!(!model.is_frozen::<Test1>());
    model.prepare::<Test1>().unwrap();
    assert!(model.is_frozen::<Test1>());
    // an unrelated hierarchy stays open
    assert!(!model.is_frozen::<Test3>());
    let err = model
        .add_field(FieldConfig::new(2, "b", codec::scalar(), |t: &Test1| &t.a, |t| &mut t.a))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
}

#[test]
fn test_field_added_before_first_use() {
    let mut model = TypeModel::default();
    model.register(TypeConfig::<Item>::new("Item")).unwrap();
    model
        .add_field(FieldConfig::new(
            2,
            "label",
            codec::scalar(),
            |i: &Item| &i.label,
            |i| &mut i.label,
        ))
        .unwrap();
    let item = Item {
        id: 9,
        label: "x".to_string(),
    };
    let bytes = model.serialize(&item).unwrap();
    assert_eq!(bytes, [0x12, 0x01, b'x']);
    assert_eq!(
        model.deserialize::<Item>(&bytes).unwrap(),
        Item {
            id: 0,
            label: "x".to_string()
        }
    );
}

#[test]
fn test_unsupported_data_format() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Item>::new("Item").field(
            FieldConfig::new(2, "label", codec::scalar(), |i: &Item| &i.label, |i| &mut i.label)
                .data_format(DataFormat::ZigZag),
        ))
        .unwrap();
    assert!(matches!(
        model.prepare::<Item>(),
        Err(Error::UnsupportedShape(_))
    ));
}

#[derive(Default)]
struct Nested {
    grid: Vec<Vec<i32>>,
    index: HashMap<i32, Vec<i32>>,
    maybe: Vec<Option<i32>>,
}

#[test]
fn test_nested_collections_are_rejected() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Nested>::new("Grid").field(FieldConfig::new(
            1,
            "grid",
            codec::list(codec::list(codec::scalar())),
            |n: &Nested| &n.grid,
            |n| &mut n.grid,
        )))
        .unwrap();
    assert!(matches!(
        model.prepare::<Nested>(),
        Err(Error::UnsupportedShape(_))
    ));

    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Nested>::new("Index").field(FieldConfig::new(
            1,
            "index",
            codec::map(codec::scalar(), codec::list(codec::scalar())),
            |n: &Nested| &n.index,
            |n| &mut n.index,
        )))
        .unwrap();
    assert!(matches!(
        model.prepare::<Nested>(),
        Err(Error::UnsupportedShape(_))
    ));

    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Nested>::new("Maybe").field(FieldConfig::new(
            1,
            "maybe",
            codec::list(codec::optional(codec::scalar())),
            |n: &Nested| &n.maybe,
            |n| &mut n.maybe,
        )))
        .unwrap();
    assert!(matches!(
        model.prepare::<Nested>(),
        Err(Error::UnsupportedShape(_))
    ));
}

#[derive(Default, Debug, PartialEq)]
struct Account {
    balance: i64,
    owner: Test1,
}

impl Account {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn set_balance(&mut self, balance: i64) {
        self.balance = balance * 2;
    }
}

#[test]
fn test_property_goes_through_setter() {
    let mut model = guide_model();
    model
        .register(TypeConfig::<Account>::new("Account").field(FieldConfig::property(
            1,
            "balance",
            codec::scalar(),
            Account::balance,
            Account::set_balance,
        )))
        .unwrap();
    let bytes = model
        .serialize(&Account {
            balance: 21,
            ..Account::default()
        })
        .unwrap();
    assert_eq!(bytes, [0x08, 21]);
    assert_eq!(model.deserialize::<Account>(&bytes).unwrap().balance, 42);
}

#[test]
fn test_read_only_member_is_merged_in_place() {
    let mut model = guide_model();
    model
        .register(TypeConfig::<Account>::new("Account").field(FieldConfig::read_only(
            2,
            "owner",
            codec::message(),
            |a: &Account| &a.owner,
            |a| &mut a.owner,
        )))
        .unwrap();
    let bytes = model
        .serialize(&Account {
            owner: Test1 { a: 150 },
            ..Account::default()
        })
        .unwrap();
    assert_eq!(bytes, [0x12, 0x03, 0x08, 0x96, 0x01]);
    let back: Account = model.deserialize(&bytes).unwrap();
    assert_eq!(back.owner, Test1 { a: 150 });
}

#[test]
fn test_read_only_scalar_is_rejected() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Account>::new("Account").field(FieldConfig::read_only(
            1,
            "balance",
            codec::scalar(),
            |a: &Account| &a.balance,
            |a| &mut a.balance,
        )))
        .unwrap();
    assert!(matches!(
        model.prepare::<Account>(),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_required_field_is_always_written() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Item>::new("Item").field(
            FieldConfig::new(1, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)
                .required(true),
        ))
        .unwrap();
    assert_eq!(model.serialize(&Item::default()).unwrap(), [0x08, 0x00]);
}

#[test]
fn test_explicit_default_value() {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Item>::new("Item").field(FieldConfig::new(
            1,
            "id",
            codec::scalar_with_default(7),
            |i: &Item| &i.id,
            |i| &mut i.id,
        )))
        .unwrap();
    assert_eq!(
        model.serialize(&Item { id: 7, ..Item::default() }).unwrap(),
        Vec::<u8>::new()
    );
    assert_eq!(model.serialize(&Item::default()).unwrap(), [0x08, 0x00]);
}

#[test]
fn test_custom_factory() {
    let mut model = TypeModel::default();
    model
        .register(
            TypeConfig::<Item>::with_factory("Item", || Item {
                id: 0,
                label: "fresh".to_string(),
            })
            .field(FieldConfig::new(1, "id", codec::scalar(), |i: &Item| &i.id, |i| &mut i.id)),
        )
        .unwrap();
    let value = model.deserialize_dyn::<Item>(&[0x08, 0x05]).unwrap();
    let item = value.downcast_ref::<Item>().unwrap();
    assert_eq!(item.id, 5);
    assert_eq!(item.label, "fresh");
}

#[test]
fn test_max_depth() {
    let model = guide_model().max_depth(0);
    let bytes = [0x1a, 0x03, 0x08, 0x96, 0x01];
    assert!(matches!(
        model.deserialize::<Test3>(&bytes),
        Err(Error::DepthExceed(_))
    ));
    assert!(matches!(
        model.serialize(&Test3::default()),
        Err(Error::DepthExceed(_))
    ));
    let model = guide_model().max_depth(1);
    assert_eq!(model.deserialize::<Test3>(&bytes).unwrap().c.a, 150);
}
