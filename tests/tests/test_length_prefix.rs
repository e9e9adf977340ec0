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

use protograph::{try_read_length_prefix, Error, LengthPrefix, PrefixStyle};
use std::any::TypeId;
use tests::{guide_model, Test1, Test2};

fn test1(a: i32) -> Test1 {
    Test1 { a }
}

#[test]
fn test_base128_without_header() {
    let model = guide_model();
    let bytes = model
        .serialize_with_length_prefix(&test1(150), PrefixStyle::Base128, 0)
        .unwrap();
    assert_eq!(bytes, [0x03, 0x08, 0x96, 0x01]);
    let (back, consumed) = model
        .deserialize_with_length_prefix::<Test1>(&bytes, PrefixStyle::Base128, 0)
        .unwrap()
        .unwrap();
    assert_eq!(back, test1(150));
    assert_eq!(consumed, 4);
}

#[test]
fn test_base128_with_header() {
    let model = guide_model();
    let bytes = model
        .serialize_with_length_prefix(&test1(150), PrefixStyle::Base128, 1)
        .unwrap();
    assert_eq!(bytes, [0x0a, 0x03, 0x08, 0x96, 0x01]);
}

#[test]
fn test_fixed32_prefixes() {
    let model = guide_model();
    let little = model
        .serialize_with_length_prefix(&test1(150), PrefixStyle::Fixed32, 0)
        .unwrap();
    assert_eq!(little, [0x03, 0x00, 0x00, 0x00, 0x08, 0x96, 0x01]);
    let big = model
        .serialize_with_length_prefix(&test1(150), PrefixStyle::Fixed32BigEndian, 0)
        .unwrap();
    assert_eq!(big, [0x00, 0x00, 0x00, 0x03, 0x08, 0x96, 0x01]);

    for (bytes, style) in [
        (little, PrefixStyle::Fixed32),
        (big, PrefixStyle::Fixed32BigEndian),
    ] {
        let (back, consumed) = model
            .deserialize_with_length_prefix::<Test1>(&bytes, style, 0)
            .unwrap()
            .unwrap();
        assert_eq!(back, test1(150));
        assert_eq!(consumed, 7);
    }
}

#[test]
fn test_no_prefix_takes_the_whole_input() {
    let model = guide_model();
    let bytes = model
        .serialize_with_length_prefix(&test1(150), PrefixStyle::None, 0)
        .unwrap();
    assert_eq!(bytes, [0x08, 0x96, 0x01]);
    let (back, consumed) = model
        .deserialize_with_length_prefix::<Test1>(&bytes, PrefixStyle::None, 0)
        .unwrap()
        .unwrap();
    assert_eq!(back, test1(150));
    assert_eq!(consumed, 3);
}

#[test]
fn test_other_fields_are_skipped() {
    let model = guide_model();
    let mut stream = Vec::new();
    stream.extend(
        model
            .serialize_with_length_prefix(&test1(1), PrefixStyle::Base128, 2)
            .unwrap(),
    );
    stream.extend(
        model
            .serialize_with_length_prefix(&test1(2), PrefixStyle::Base128, 1)
            .unwrap(),
    );
    let (back, consumed) = model
        .deserialize_with_length_prefix::<Test1>(&stream, PrefixStyle::Base128, 1)
        .unwrap()
        .unwrap();
    assert_eq!(back, test1(2));
    assert_eq!(consumed, stream.len());
    assert!(model
        .deserialize_with_length_prefix::<Test1>(&stream, PrefixStyle::Base128, 3)
        .unwrap()
        .is_none());
}

#[test]
fn test_end_of_stream() {
    let model = guide_model();
    assert!(model
        .deserialize_with_length_prefix::<Test1>(&[], PrefixStyle::Base128, 0)
        .unwrap()
        .is_none());
    assert!(matches!(
        model.deserialize_with_length_prefix::<Test1>(&[0x05, 0x08], PrefixStyle::Base128, 0),
        Err(Error::TruncatedInput(..))
    ));
    assert!(matches!(
        model.deserialize_with_length_prefix::<Test1>(&[0x03, 0x00], PrefixStyle::Fixed32, 0),
        Err(Error::TruncatedInput(..))
    ));
}

#[test]
fn test_huge_length_is_truncated_input() {
    let model = guide_model();
    // ten byte varint for u64::MAX
    let mut bytes = vec![0xff; 9];
    bytes.push(0x01);
    assert!(matches!(
        try_read_length_prefix(&bytes, PrefixStyle::Base128),
        Err(Error::TruncatedInput(..))
    ));
    assert!(matches!(
        model.deserialize_with_length_prefix::<Test1>(&bytes, PrefixStyle::Base128, 0),
        Err(Error::TruncatedInput(..))
    ));
    assert!(matches!(
        model.deserialize_items::<Test1>(&bytes, PrefixStyle::Base128, 0).next(),
        Some(Err(Error::TruncatedInput(..)))
    ));
    assert!(matches!(
        model.deserialize_with_length_prefix::<Test1>(
            &[0xff, 0xff, 0xff, 0xff, 0x08],
            PrefixStyle::Fixed32,
            0
        ),
        Err(Error::TruncatedInput(..))
    ));
}

#[test]
fn test_items_iterator() {
    let model = guide_model();
    let mut stream = Vec::new();
    for a in 1..=3 {
        stream.extend(
            model
                .serialize_with_length_prefix(&test1(a), PrefixStyle::Fixed32, 0)
                .unwrap(),
        );
    }
    let items: Vec<Test1> = model
        .deserialize_items::<Test1>(&stream, PrefixStyle::Fixed32, 0)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(items, [test1(1), test1(2), test1(3)]);

    stream.push(0x09);
    let results: Vec<_> = model
        .deserialize_items::<Test1>(&stream, PrefixStyle::Fixed32, 0)
        .collect();
    assert_eq!(results.len(), 4);
    assert!(results[3].is_err());
}

#[test]
fn test_type_chosen_by_field_number() {
    let model = guide_model();
    let mut stream = Vec::new();
    stream.extend(
        model
            .serialize_with_length_prefix(&test1(7), PrefixStyle::Base128, 1)
            .unwrap(),
    );
    stream.extend(
        model
            .serialize_with_length_prefix(&test1(8), PrefixStyle::Base128, 9)
            .unwrap(),
    );
    stream.extend(
        model
            .serialize_with_length_prefix(
                &Test2 {
                    b: "x".to_string(),
                },
                PrefixStyle::Base128,
                2,
            )
            .unwrap(),
    );

    let pick = |field: u32| match field {
        1 => Some(TypeId::of::<Test1>()),
        2 => Some(TypeId::of::<Test2>()),
        _ => None,
    };
    let (first, consumed) = model
        .deserialize_with_resolver(&stream, PrefixStyle::Base128, pick)
        .unwrap()
        .unwrap();
    assert_eq!(first.downcast_ref::<Test1>(), Some(&test1(7)));
    let (second, rest) = model
        .deserialize_with_resolver(&stream[consumed..], PrefixStyle::Base128, pick)
        .unwrap()
        .unwrap();
    assert_eq!(second.downcast_ref::<Test2>().map(|t| t.b.as_str()), Some("x"));
    assert_eq!(consumed + rest, stream.len());
}

#[test]
fn test_peek_length_prefix() {
    let prefix = try_read_length_prefix(&[0x96, 0x01, 0xff], PrefixStyle::Base128);
    assert!(matches!(prefix, Err(Error::TruncatedInput(..))));

    let mut bytes = vec![0x96, 0x01];
    bytes.resize(2 + 150, 0);
    assert_eq!(
        try_read_length_prefix(&bytes, PrefixStyle::Base128).unwrap(),
        Some(LengthPrefix {
            field_number: 0,
            length: 150,
            prefix_len: 2,
        })
    );
    assert_eq!(
        try_read_length_prefix(&[0x00, 0x00, 0x00, 0x01, 0x08], PrefixStyle::Fixed32BigEndian)
            .unwrap()
            .map(|p| p.length),
        Some(1)
    );
    assert_eq!(try_read_length_prefix(&[], PrefixStyle::Fixed32).unwrap(), None);
}
