// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! JSON wire codec.
//!
//! Payloads are UTF-8 JSON objects, one key per struct field, nested structs
//! inline. Two conventions sit on top of plain serde:
//!
//! - [`Mat4`] is flattened to sixteen keys `e00`..`e33` where `e<r><c>` is
//!   row `r` of column `c`, matching the layout Unity's `Matrix4x4` emits.
//! - A single string-valued "extra" key (a timestamp, a frame counter) can be
//!   merged into the top-level object without changing the type's schema.
//!
//! Decoding is strict about missing fields and lenient about unknown ones.
//! Non-finite floats have no JSON form: they encode as `null` and the result
//! does not decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Mat4, Vec4};

// ============================================================================
// Mat4 wire layout
// ============================================================================

/// Flattened `Mat4` as it appears on the wire.
#[derive(Serialize, Deserialize)]
pub(crate) struct Mat4Wire {
    e00: f32,
    e01: f32,
    e02: f32,
    e03: f32,
    e10: f32,
    e11: f32,
    e12: f32,
    e13: f32,
    e20: f32,
    e21: f32,
    e22: f32,
    e23: f32,
    e30: f32,
    e31: f32,
    e32: f32,
    e33: f32,
}

impl From<Mat4> for Mat4Wire {
    fn from(m: Mat4) -> Self {
        let [c0, c1, c2, c3] = m.columns;
        Self {
            e00: c0.x,
            e01: c1.x,
            e02: c2.x,
            e03: c3.x,
            e10: c0.y,
            e11: c1.y,
            e12: c2.y,
            e13: c3.y,
            e20: c0.z,
            e21: c1.z,
            e22: c2.z,
            e23: c3.z,
            e30: c0.w,
            e31: c1.w,
            e32: c2.w,
            e33: c3.w,
        }
    }
}

impl From<Mat4Wire> for Mat4 {
    fn from(w: Mat4Wire) -> Self {
        Mat4::from_columns([
            Vec4::new(w.e00, w.e10, w.e20, w.e30),
            Vec4::new(w.e01, w.e11, w.e21, w.e31),
            Vec4::new(w.e02, w.e12, w.e22, w.e32),
            Vec4::new(w.e03, w.e13, w.e23, w.e33),
        ])
    }
}

// ============================================================================
// Structured values
// ============================================================================

/// Serialize `value` to a JSON payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::Encode)
}

/// Serialize `value` and merge `extra` as a string field of the top-level
/// object. A field with the same name is replaced.
pub fn encode_with_extra<T: Serialize>(value: &T, extra: Option<(&str, &str)>) -> Result<Vec<u8>> {
    let Some((key, extra_value)) = extra else {
        return encode(value);
    };

    let mut json = serde_json::to_value(value).map_err(Error::Encode)?;
    let Value::Object(map) = &mut json else {
        return Err(Error::NotAnObject);
    };
    map.insert(key.to_string(), Value::String(extra_value.to_string()));

    serde_json::to_vec(&json).map_err(Error::Encode)
}

/// Decode a payload into `T`.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }
    serde_json::from_slice(payload).map_err(Error::Decode)
}

/// Decode a payload into `T` and pull out the side-channel field `key`.
///
/// String values come back verbatim, numbers and booleans in their JSON
/// text form. Any other kind of value (or no value) yields `None`.
pub fn decode_with_extra<T: DeserializeOwned>(
    payload: &[u8],
    key: &str,
) -> Result<(T, Option<String>)> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    let json: Value = serde_json::from_slice(payload).map_err(Error::Decode)?;
    let extra = json.get(key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    });

    let value = T::deserialize(json).map_err(Error::Decode)?;
    Ok((value, extra))
}

// ============================================================================
// Scalars
// ============================================================================

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Plain values sent as `{"value": x}` under an explicit topic.
pub trait ScalarValue: sealed::Sealed + Serialize + DeserializeOwned + Copy {}

impl ScalarValue for bool {}
impl ScalarValue for i32 {}
impl ScalarValue for u32 {}
impl ScalarValue for f32 {}
impl ScalarValue for f64 {}

#[derive(Serialize, Deserialize)]
struct ScalarWire<S> {
    value: S,
}

pub fn encode_scalar<S: ScalarValue>(value: S) -> Result<Vec<u8>> {
    encode(&ScalarWire { value })
}

pub fn decode_scalar<S: ScalarValue>(payload: &[u8]) -> Result<S> {
    decode::<ScalarWire<S>>(payload).map(|wire| wire.value)
}
