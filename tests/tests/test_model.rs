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

use protograph::{codec, Config, DynObject, Error, FieldConfig, TypeConfig, TypeModel};
use std::sync::Arc;
use std::thread;
use tests::{animal_model, guide_model, rex, Dog, Puppy, Test1};

#[derive(Default, Debug, PartialEq)]
struct Renamed {
    value: i64,
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn lenient_and_strict() -> [TypeModel; 2] {
    init_logger();
    [guide_model(), guide_model().strict(true)]
}

#[test]
fn test_config_defaults() {
    let model = TypeModel::default();
    assert_eq!(model.config().max_depth(), 128);
    assert!(!model.config().is_strict());
    let model = TypeModel::new(Config {
        max_depth: 4,
        strict: true,
    });
    assert_eq!(model.config().max_depth(), 4);
    assert!(model.config().is_strict());
}

#[test]
fn test_compatible_wire_type_is_accepted_when_lenient() {
    // field 1 as Fixed32 instead of a varint
    let bytes = [0x0d, 0x96, 0x00, 0x00, 0x00];
    let [lenient, strict] = lenient_and_strict();
    assert_eq!(lenient.deserialize::<Test1>(&bytes).unwrap(), Test1 { a: 150 });
    assert!(matches!(
        strict.deserialize::<Test1>(&bytes),
        Err(Error::UnexpectedWireType(_))
    ));
}

#[test]
fn test_incompatible_wire_type_is_skipped_when_lenient() {
    let bytes = [0x0a, 0x01, b'x', 0x08, 0x02];
    let [lenient, strict] = lenient_and_strict();
    assert_eq!(lenient.deserialize::<Test1>(&bytes).unwrap(), Test1 { a: 2 });
    assert!(matches!(
        strict.deserialize::<Test1>(&bytes),
        Err(Error::UnexpectedWireType(_))
    ));
}

#[test]
fn test_field_overrides_model_strictness() {
    let mut model = TypeModel::default().strict(true);
    model
        .register(TypeConfig::<Test1>::new("Test1").field(
            FieldConfig::new(1, "a", codec::scalar(), |t: &Test1| &t.a, |t| &mut t.a).strict(false),
        ))
        .unwrap();
    assert_eq!(
        model.deserialize::<Test1>(&[0x0d, 0x01, 0x00, 0x00, 0x00]).unwrap(),
        Test1 { a: 1 }
    );
}

#[test]
fn test_serialize_dyn_unwraps_boxes() {
    let model = animal_model();
    let boxed: DynObject = Box::new(rex());
    assert_eq!(
        model.serialize_dyn(&boxed).unwrap(),
        model.serialize(&rex()).unwrap()
    );
}

#[test]
fn test_deep_clone() {
    let model = animal_model();
    let puppy = Puppy {
        base: rex(),
        age_weeks: 9,
    };
    assert_eq!(model.deep_clone(&puppy).unwrap(), puppy);
}

#[test]
fn test_change_type() {
    let mut model = guide_model();
    model
        .register(TypeConfig::<Renamed>::new("Renamed").field(FieldConfig::new(
            1,
            "value",
            codec::scalar(),
            |r: &Renamed| &r.value,
            |r| &mut r.value,
        )))
        .unwrap();
    let renamed: Renamed = model.change_type(&Test1 { a: -3 }).unwrap();
    assert_eq!(renamed, Renamed { value: -3 });
}

#[test]
fn test_merge_overwrites_scalars() {
    let model = animal_model();
    let mut dog = rex();
    model.merge(&[0x10, 0x03], &mut dog).unwrap();
    assert_eq!(dog.base.legs, 3);
    assert_eq!(dog.base.name, "Rex");
    assert_eq!(dog.breed, "lab");
}

#[test]
fn test_concurrent_first_use() {
    let model = Arc::new(animal_model());
    let expected = animal_model().serialize(&rex()).unwrap();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let model = Arc::clone(&model);
                scope.spawn(move || {
                    let bytes = model.serialize(&rex()).unwrap();
                    let back: Dog = model.deserialize(&bytes).unwrap();
                    (bytes, back)
                })
            })
            .collect();
        for handle in handles {
            let (bytes, back) = handle.join().unwrap();
            assert_eq!(bytes, expected);
            assert_eq!(back, rex());
        }
    });
    assert!(model.is_frozen::<Puppy>());
}

#[test]
fn test_model_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TypeModel>();
}
