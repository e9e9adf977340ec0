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

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use protograph::{codec, DataFormat, Decimal, Error, FieldConfig, Guid, TypeConfig, TypeModel};
use protograph_core::serializer::ScalarValue;

#[derive(Default, Debug, PartialEq)]
struct Wrap<V> {
    v: V,
}

fn model<V: ScalarValue + Default>(format: DataFormat) -> TypeModel {
    let mut model = TypeModel::default();
    model
        .register(TypeConfig::<Wrap<V>>::new("Wrap").field(
            FieldConfig::new(1, "v", codec::scalar(), |w: &Wrap<V>| &w.v, |w| &mut w.v)
                .data_format(format),
        ))
        .unwrap();
    model
}

fn encode<V: ScalarValue + Default>(v: V) -> Vec<u8> {
    let model = model::<V>(DataFormat::Default);
    let bytes = model.serialize(&Wrap { v: v.clone() }).unwrap();
    assert_eq!(model.deserialize::<Wrap<V>>(&bytes).unwrap().v, v);
    bytes
}

#[test]
fn test_time_span_scales() {
    // zero is still written, as an empty sub-message
    assert_eq!(encode(TimeDelta::zero()), [0x0a, 0x00]);
    assert_eq!(encode(TimeDelta::days(3)), [0x0a, 0x02, 0x08, 0x06]);
    assert_eq!(encode(TimeDelta::hours(-2)), [0x0a, 0x04, 0x08, 0x03, 0x10, 0x01]);
    assert_eq!(
        encode(TimeDelta::seconds(90)),
        [0x0a, 0x05, 0x08, 0xb4, 0x01, 0x10, 0x03]
    );
    assert_eq!(
        encode(TimeDelta::milliseconds(1_500)),
        [0x0a, 0x05, 0x08, 0xb8, 0x17, 0x10, 0x04]
    );
    assert_eq!(encode(TimeDelta::nanoseconds(700)), [0x0a, 0x04, 0x08, 0x0e, 0x10, 0x05]);
}

#[test]
fn test_time_span_sentinels() {
    assert_eq!(encode(TimeDelta::MAX), [0x0a, 0x04, 0x08, 0x02, 0x10, 0x0f]);
    assert_eq!(encode(TimeDelta::MIN), [0x0a, 0x04, 0x08, 0x01, 0x10, 0x0f]);
}

#[test]
fn test_time_span_fixed_size() {
    let model = model::<TimeDelta>(DataFormat::FixedSize);
    let bytes = model
        .serialize(&Wrap {
            v: TimeDelta::milliseconds(1),
        })
        .unwrap();
    assert_eq!(bytes, [0x09, 0x10, 0x27, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        model.deserialize::<Wrap<TimeDelta>>(&bytes).unwrap().v,
        TimeDelta::milliseconds(1)
    );
}

#[test]
fn test_time_span_sub_tick_precision_is_dropped() {
    let model = model::<TimeDelta>(DataFormat::Default);
    let bytes = model
        .serialize(&Wrap {
            v: TimeDelta::nanoseconds(250),
        })
        .unwrap();
    assert_eq!(
        model.deserialize::<Wrap<TimeDelta>>(&bytes).unwrap().v,
        TimeDelta::nanoseconds(200)
    );
}

#[test]
fn test_bad_time_span_scale() {
    let model = model::<TimeDelta>(DataFormat::Default);
    let err = model
        .deserialize::<Wrap<TimeDelta>>(&[0x0a, 0x04, 0x08, 0x02, 0x10, 0x09])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn test_date_time() {
    let epoch = NaiveDateTime::default();
    assert_eq!(encode(epoch), [0x0a, 0x00]);
    assert_eq!(encode(epoch + TimeDelta::days(1)), [0x0a, 0x02, 0x08, 0x02]);
    let date = NaiveDate::from_ymd_opt(2001, 2, 3)
        .unwrap()
        .and_hms_milli_opt(4, 5, 6, 789)
        .unwrap();
    encode(date);
    encode(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
    assert_eq!(encode(NaiveDateTime::MAX), [0x0a, 0x04, 0x08, 0x02, 0x10, 0x0f]);
    assert_eq!(encode(NaiveDateTime::MIN), [0x0a, 0x04, 0x08, 0x01, 0x10, 0x0f]);
}

#[test]
fn test_date_time_fixed_size() {
    let model = model::<NaiveDateTime>(DataFormat::FixedSize);
    let value = NaiveDateTime::default() + TimeDelta::seconds(1);
    let bytes = model.serialize(&Wrap { v: value }).unwrap();
    assert_eq!(bytes, [0x09, 0x80, 0x96, 0x98, 0, 0, 0, 0, 0]);
    assert_eq!(model.deserialize::<Wrap<NaiveDateTime>>(&bytes).unwrap().v, value);
}

#[test]
fn test_decimal() {
    assert_eq!(encode(Decimal::ZERO), [0x0a, 0x00]);
    assert_eq!(
        encode(Decimal::new(15, 1).unwrap()),
        [0x0a, 0x04, 0x08, 0x0f, 0x18, 0x02]
    );
    assert_eq!(encode(Decimal::from_i64(-1)), [0x0a, 0x04, 0x08, 0x01, 0x18, 0x01]);
    let wide = Decimal::new((1i128 << 70) + 5, 28).unwrap();
    let bytes = encode(wide);
    assert_eq!(bytes, [0x0a, 0x06, 0x08, 0x05, 0x10, 0x40, 0x18, 0x38]);
    assert_eq!(wide.to_string().len(), "0.".len() + 28);
}

#[test]
fn test_zero_decimal_with_scale() {
    assert_eq!(encode(Decimal::new(0, 2).unwrap()), [0x0a, 0x00]);
    assert_eq!(encode(Decimal::new(0, 28).unwrap()), [0x0a, 0x00]);
    // a sign and scale without a mantissa is still zero
    let model = model::<Decimal>(DataFormat::Default);
    let back = model.deserialize::<Wrap<Decimal>>(&[0x0a, 0x02, 0x18, 0x05]).unwrap();
    assert_eq!(back.v, Decimal::ZERO);
    assert_eq!(back.v.to_string(), "0");
}

#[test]
fn test_decimal_scale_out_of_range() {
    let model = model::<Decimal>(DataFormat::Default);
    let err = model
        .deserialize::<Wrap<Decimal>>(&[0x0a, 0x04, 0x08, 0x01, 0x18, 0x3a])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn test_guid() {
    assert_eq!(encode(Guid::EMPTY), [0x0a, 0x00]);
    let guid = Guid::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
    assert_eq!(
        encode(guid),
        [
            0x0a, 0x12, 0x09, 1, 2, 3, 4, 5, 6, 7, 8, 0x11, 9, 10, 11, 12, 13, 14, 15, 16
        ]
    );
}

#[test]
fn test_group_format() {
    let model = model::<Guid>(DataFormat::Group);
    let bytes = model.serialize(&Wrap { v: Guid::EMPTY }).unwrap();
    assert_eq!(bytes, [0x0b, 0x0c]);
    assert_eq!(model.deserialize::<Wrap<Guid>>(&bytes).unwrap().v, Guid::EMPTY);
}
