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

use protograph::{codec, DataFormat, Error, FieldConfig, TypeConfig, TypeModel};
use std::collections::{BTreeMap, HashMap};
use tests::{guide_model, Test1};

#[derive(Default, Debug, PartialEq)]
struct Bag {
    numbers: Vec<i32>,
    children: Vec<Test1>,
    scores: HashMap<String, i32>,
    by_id: BTreeMap<i32, Test1>,
    maybe: Option<i32>,
    maybe_child: Option<Test1>,
}

fn model() -> TypeModel {
    let mut model = guide_model();
    model
        .register(
            TypeConfig::<Bag>::new("Bag")
                .field(FieldConfig::new(
                    1,
                    "numbers",
                    codec::list(codec::scalar()),
                    |b: &Bag| &b.numbers,
                    |b| &mut b.numbers,
                ))
                .field(FieldConfig::new(
                    2,
                    "children",
                    codec::list(codec::message()),
                    |b: &Bag| &b.children,
                    |b| &mut b.children,
                ))
                .field(FieldConfig::new(
                    3,
                    "scores",
                    codec::map(codec::scalar(), codec::scalar()),
                    |b: &Bag| &b.scores,
                    |b| &mut b.scores,
                ))
                .field(FieldConfig::new(
                    4,
                    "by_id",
                    codec::btree_map(codec::scalar(), codec::message()),
                    |b: &Bag| &b.by_id,
                    |b| &mut b.by_id,
                ))
                .field(FieldConfig::new(
                    5,
                    "maybe",
                    codec::optional(codec::scalar()),
                    |b: &Bag| &b.maybe,
                    |b| &mut b.maybe,
                ))
                .field(FieldConfig::new(
                    6,
                    "maybe_child",
                    codec::optional(codec::message()),
                    |b: &Bag| &b.maybe_child,
                    |b| &mut b.maybe_child,
                )),
        )
        .unwrap();
    model
}

#[test]
fn test_empty_collections_write_nothing() {
    let model = model();
    assert!(model.serialize(&Bag::default()).unwrap().is_empty());
}

#[test]
fn test_map_entry_with_wrong_wire_type() {
    // scores as a varint, then maybe
    let bytes = [0x18, 0x05, 0x28, 0x07];
    let bag: Bag = model().deserialize(&bytes).unwrap();
    assert!(bag.scores.is_empty());
    assert_eq!(bag.maybe, Some(7));
    assert!(matches!(
        model().strict(true).deserialize::<Bag>(&bytes),
        Err(Error::UnexpectedWireType(_))
    ));
}

#[test]
fn test_repeated_scalars_keep_zero_items() {
    let model = model();
    let bag = Bag {
        numbers: vec![1, 0, 3],
        ..Bag::default()
    };
    let bytes = model.serialize(&bag).unwrap();
    assert_eq!(bytes, [0x08, 0x01, 0x08, 0x00, 0x08, 0x03]);
    assert_eq!(model.deserialize::<Bag>(&bytes).unwrap(), bag);
}

#[test]
fn test_interleaved_repeated_field() {
    let model = model();
    // numbers, maybe, numbers
    let bytes = [0x08, 0x01, 0x28, 0x07, 0x08, 0x02];
    let bag: Bag = model.deserialize(&bytes).unwrap();
    assert_eq!(bag.numbers, [1, 2]);
    assert_eq!(bag.maybe, Some(7));
}

#[test]
fn test_repeated_messages() {
    let model = model();
    let bag = Bag {
        children: vec![Test1 { a: 150 }, Test1::default()],
        ..Bag::default()
    };
    let bytes = model.serialize(&bag).unwrap();
    assert_eq!(bytes, [0x12, 0x03, 0x08, 0x96, 0x01, 0x12, 0x00]);
    assert_eq!(model.deserialize::<Bag>(&bytes).unwrap(), bag);
}

#[test]
fn test_map_entries_are_sorted_by_key() {
    let model = model();
    let bag = Bag {
        scores: HashMap::from([
            ("b".to_string(), 2),
            ("a".to_string(), 0),
            ("c".to_string(), 3),
        ]),
        ..Bag::default()
    };
    let bytes = model.serialize(&bag).unwrap();
    assert_eq!(
        bytes,
        [
            0x1a, 0x05, 0x0a, 0x01, b'a', 0x10, 0x00, // zero values are kept in entries
            0x1a, 0x05, 0x0a, 0x01, b'b', 0x10, 0x02, //
            0x1a, 0x05, 0x0a, 0x01, b'c', 0x10, 0x03,
        ]
    );
    assert_eq!(model.deserialize::<Bag>(&bytes).unwrap(), bag);
}

#[test]
fn test_map_with_message_values() {
    let model = model();
    let bag = Bag {
        by_id: BTreeMap::from([(2, Test1 { a: 20 }), (1, Test1 { a: 10 })]),
        ..Bag::default()
    };
    let bytes = model.serialize(&bag).unwrap();
    assert_eq!(
        bytes,
        [0x22, 0x06, 0x08, 0x01, 0x12, 0x02, 0x08, 0x0a, 0x22, 0x06, 0x08, 0x02, 0x12, 0x02, 0x08, 0x14]
    );
    assert_eq!(model.deserialize::<Bag>(&bytes).unwrap(), bag);
}

#[test]
fn test_map_entry_without_value_uses_default() {
    let model = model();
    let bag: Bag = model.deserialize(&[0x1a, 0x03, 0x0a, 0x01, b'k']).unwrap();
    assert_eq!(bag.scores.get("k"), Some(&0));
}

#[test]
fn test_optional_values() {
    let model = model();
    let bag = Bag {
        maybe: Some(0),
        maybe_child: Some(Test1::default()),
        ..Bag::default()
    };
    let bytes = model.serialize(&bag).unwrap();
    assert_eq!(bytes, [0x28, 0x00, 0x32, 0x00]);
    assert_eq!(model.deserialize::<Bag>(&bytes).unwrap(), bag);
}

#[test]
fn test_merge_collections() {
    let model = model();
    let mut target = Bag {
        numbers: vec![1],
        scores: HashMap::from([("a".to_string(), 1), ("b".to_string(), 1)]),
        maybe_child: Some(Test1 { a: 5 }),
        ..Bag::default()
    };
    let update = Bag {
        numbers: vec![2],
        scores: HashMap::from([("b".to_string(), 9)]),
        maybe: Some(4),
        ..Bag::default()
    };
    let bytes = model.serialize(&update).unwrap();
    model.merge(&bytes, &mut target).unwrap();
    assert_eq!(target.numbers, [1, 2]);
    assert_eq!(target.scores["a"], 1);
    assert_eq!(target.scores["b"], 9);
    assert_eq!(target.maybe, Some(4));
    assert_eq!(target.maybe_child, Some(Test1 { a: 5 }));
}

#[test]
fn test_list_of_zigzag_numbers() {
    #[derive(Default)]
    struct Deltas {
        values: Vec<i64>,
    }
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Deltas>::new("Deltas").field(
            FieldConfig::new(
                1,
                "values",
                codec::list(codec::scalar()),
                |d: &Deltas| &d.values,
                |d| &mut d.values,
            )
            .data_format(DataFormat::ZigZag),
        ))
        .unwrap();
    let bytes = model
        .serialize(&Deltas {
            values: vec![-1, 1, -64],
        })
        .unwrap();
    assert_eq!(bytes, [0x08, 0x01, 0x08, 0x02, 0x08, 0x7f]);
    assert_eq!(model.deserialize::<Deltas>(&bytes).unwrap().values, [-1, 1, -64]);
}
