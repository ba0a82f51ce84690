//! JSON document codec.
//!
//! Encodes a single record or a sequence of records into the on-disk form,
//! optionally wrapped in a JavaScript callback so the file can be loaded as
//! a script, and decodes either form back.
//!
//! Sequences are written with a trailing `null` terminator:
//!
//! ```text
//! [
//! {"a":1},
//! {"a":2},
//! null
//! ]
//! ```
//!
//! Decoding a sequence removes `null` entries and every element equal to the
//! element type's `Default` value. That also drops legitimately zero-valued
//! records (`0`, `""`, a struct with all fields at their defaults); callers
//! storing such values should use a record type whose default never occurs
//! in real data.

mod transform;
mod wrapper;

pub use transform::{Step, Transform, filter, map};
pub use wrapper::LOOKAHEAD;

use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use thiserror::Error;

use crate::error::BoxError;

/// First line of every wrapped file.
pub const NOTICE: &str = "// Generated by gitdb. DO NOT EDIT.";

/// Longest callback name whose wrapper still fits the decoder's head window.
///
/// The notice line, the name, `(` and two newlines must leave the payload's
/// opening bracket inside the first [`LOOKAHEAD`] bytes.
pub const MAX_CALLBACK_LEN: usize = LOOKAHEAD - NOTICE.len() - 4;

// ---------------------------------------------------------------------------
// Marshal
// ---------------------------------------------------------------------------

/// A value the codec can write.
///
/// Structural serialization through [`Serialize`] is the default. Types
/// that need a different JSON form override [`custom_json`](Self::custom_json).
pub trait Marshal: Serialize {
    /// The value's own JSON encoding, or `None` to use `Serialize`.
    ///
    /// The returned bytes are written verbatim and must be a single JSON
    /// value on one line.
    fn custom_json(&self) -> Option<Result<Vec<u8>, BoxError>> {
        None
    }
}

impl Marshal for serde_json::Value {}

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Errors produced while encoding or decoding a document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Structural serialization failed.
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A [`Marshal::custom_json`] hook failed.
    ///
    /// `index` is the element position for sequences and 0 for records.
    #[error("custom marshal of element {index} failed: {source}")]
    Marshal {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A [`Transform`] failed on an element.
    #[error("transform {transform} failed on element {index}: {source}")]
    Transform {
        index: usize,
        transform: usize,
        #[source]
        source: BoxError,
    },

    /// The payload is not valid JSON for the requested type.
    #[error("invalid document: {0}")]
    Decode(#[source] serde_json::Error),

    /// A wrapped record encoded to something other than a JSON object or
    /// array, which the decoder could not unwrap again.
    #[error("only objects and arrays can be wrapped in a callback")]
    UnwrappableRecord,

    /// The callback name would not be recognized when the file is read.
    #[error("invalid callback name {name:?}: {reason}")]
    Callback { name: String, reason: &'static str },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn marshal<T: Marshal + ?Sized>(value: &T, index: usize) -> Result<Vec<u8>, CodecError> {
    match value.custom_json() {
        Some(result) => result.map_err(|source| CodecError::Marshal { index, source }),
        None => serde_json::to_vec(value).map_err(CodecError::Serialize),
    }
}

fn callback(wrapper: Option<&str>) -> Option<&str> {
    wrapper.filter(|name| !name.is_empty())
}

fn check_callback(name: &str) -> Result<(), CodecError> {
    let invalid = |reason| CodecError::Callback {
        name: name.to_owned(),
        reason,
    };
    if name.len() > MAX_CALLBACK_LEN {
        return Err(invalid("name is too long"));
    }
    if name.bytes().any(|b| b"()[]{}\r\n".contains(&b)) {
        return Err(invalid("name must not contain brackets or line breaks"));
    }
    Ok(())
}

fn open_wrapper(out: &mut Vec<u8>, wrapper: Option<&str>) -> Result<(), CodecError> {
    if let Some(name) = callback(wrapper) {
        check_callback(name)?;
        out.extend_from_slice(NOTICE.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b"(\n");
    }
    Ok(())
}

fn close_wrapper(out: &mut Vec<u8>, wrapper: Option<&str>) {
    if callback(wrapper).is_some() {
        out.extend_from_slice(b")\n");
    }
}

/// Encode a single record.
///
/// An empty or absent `wrapper` produces bare JSON. A wrapped record must
/// encode to a JSON object or array.
///
/// # Errors
/// [`CodecError::Serialize`] or [`CodecError::Marshal`] if the value cannot
/// be written as JSON, [`CodecError::UnwrappableRecord`] for a wrapped
/// scalar, [`CodecError::Callback`] for a name the decoder cannot detect.
pub fn encode_one<T: Marshal + ?Sized>(
    wrapper: Option<&str>,
    value: &T,
) -> Result<Vec<u8>, CodecError> {
    let json = marshal(value, 0)?;
    if callback(wrapper).is_some() {
        let first = json.iter().find(|b| !b.is_ascii_whitespace());
        if !first.is_some_and(|&b| b == b'{' || b == b'[') {
            return Err(CodecError::UnwrappableRecord);
        }
    }
    let mut out = Vec::new();
    open_wrapper(&mut out, wrapper)?;
    out.extend(json);
    out.push(b'\n');
    close_wrapper(&mut out, wrapper);
    Ok(out)
}

/// Encode a sequence, running each element through `transforms` in order.
///
/// # Errors
/// The first marshal or transform failure aborts the encode;
/// [`CodecError::Callback`] for a name the decoder cannot detect.
pub fn encode_many<T: Marshal>(
    wrapper: Option<&str>,
    values: &[T],
    transforms: &[&dyn Transform<T>],
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    open_wrapper(&mut out, wrapper)?;
    out.extend_from_slice(b"[\n");

    'elements: for (index, elem) in values.iter().enumerate() {
        let mut replaced: Option<T> = None;
        for (transform, t) in transforms.iter().enumerate() {
            let step = t
                .apply(replaced.as_ref().unwrap_or(elem))
                .map_err(|source| CodecError::Transform {
                    index,
                    transform,
                    source,
                })?;
            match step {
                Step::Keep => {}
                Step::Replace(value) => replaced = Some(value),
                Step::Omit => continue 'elements,
            }
        }
        out.extend(marshal(replaced.as_ref().unwrap_or(elem), index)?);
        out.extend_from_slice(b",\n");
    }

    out.extend_from_slice(b"null\n]\n");
    close_wrapper(&mut out, wrapper);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a single value, stripping a callback wrapper if present.
///
/// Only the first JSON value of the payload is read; trailing bytes are
/// ignored.
///
/// # Errors
/// [`CodecError::Decode`] if the payload is not valid JSON for `T`.
pub fn decode_one<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let payload = &data[wrapper::payload_bounds(data)];
    let mut de = serde_json::Deserializer::from_slice(payload);
    T::deserialize(&mut de).map_err(CodecError::Decode)
}

/// Decode a sequence, dropping `null` entries and default-valued elements.
///
/// # Errors
/// [`CodecError::Decode`] if the payload is not a JSON array of `T`.
pub fn decode_many<T>(data: &[u8]) -> Result<Vec<T>, CodecError>
where
    T: DeserializeOwned + Default + PartialEq,
{
    let items: Vec<Option<T>> = decode_one(data)?;
    let zero = T::default();
    Ok(items
        .into_iter()
        .flatten()
        .filter(|item| *item != zero)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Rec {
        a: i64,
    }

    impl Marshal for Rec {}

    fn recs(values: &[i64]) -> Vec<Rec> {
        values.iter().map(|&a| Rec { a }).collect()
    }

    // -- layout --

    #[test]
    fn sequence_layout_without_wrapper() {
        let out = encode_many(None, &recs(&[1, 2]), &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[\n{\"a\":1},\n{\"a\":2},\nnull\n]\n"
        );
    }

    #[test]
    fn sequence_layout_with_wrapper() {
        let out = encode_many(Some("load"), &recs(&[7]), &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "// Generated by gitdb. DO NOT EDIT.\nload(\n[\n{\"a\":7},\nnull\n]\n)\n"
        );
    }

    #[test]
    fn record_layout() {
        let bare = encode_one(None, &Rec { a: 3 }).unwrap();
        assert_eq!(bare, b"{\"a\":3}\n");
        let wrapped = encode_one(Some("cb"), &Rec { a: 3 }).unwrap();
        assert_eq!(
            String::from_utf8(wrapped).unwrap(),
            "// Generated by gitdb. DO NOT EDIT.\ncb(\n{\"a\":3}\n)\n"
        );
    }

    #[test]
    fn empty_wrapper_name_means_no_wrapper() {
        let value = json!({"k": "v"});
        assert_eq!(
            encode_one(Some(""), &value).unwrap(),
            encode_one(None, &value).unwrap()
        );
    }

    #[test]
    fn wrapped_scalar_record_is_rejected() {
        for value in [json!(5), json!("text"), json!(null), json!(true)] {
            let err = encode_one(Some("cb"), &value).unwrap_err();
            assert!(matches!(err, CodecError::UnwrappableRecord), "{value}: {err}");
            // Unwrapped scalars are fine.
            let back: Value = decode_one(&encode_one(None, &value).unwrap()).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn longest_callback_name_still_round_trips() {
        let name = "f".repeat(MAX_CALLBACK_LEN);
        let value = json!({"k": [1, 2]});
        let out = encode_one(Some(name.as_str()), &value).unwrap();
        let back: Value = decode_one(&out).unwrap();
        assert_eq!(back, value);
        let items = recs(&[1, 2]);
        let out = encode_many(Some(name.as_str()), &items, &[]).unwrap();
        let back: Vec<Rec> = decode_many(&out).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn callback_names_the_decoder_cannot_find_are_rejected() {
        let long = "f".repeat(MAX_CALLBACK_LEN + 1);
        for name in [long.as_str(), "a[0]", "cb\n"] {
            let err = encode_one(Some(name), &json!({})).unwrap_err();
            assert!(matches!(err, CodecError::Callback { .. }), "{name:?}: {err}");
            let err = encode_many::<Rec>(Some(name), &[], &[]).unwrap_err();
            assert!(matches!(err, CodecError::Callback { .. }), "{name:?}: {err}");
        }
    }

    // -- round trips --

    #[test]
    fn empty_sequence_round_trips_to_empty() {
        let out = encode_many::<Rec>(None, &[], &[]).unwrap();
        let back: Vec<Rec> = decode_many(&out).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn elements_keep_their_order() {
        let out = encode_many(None, &recs(&[1, 2]), &[]).unwrap();
        let back: Vec<Rec> = decode_many(&out).unwrap();
        assert_eq!(back, recs(&[1, 2]));
    }

    #[test]
    fn wrapped_record_decodes() {
        let value = json!({"name": "x", "tags": ["a", "b"]});
        let out = encode_one(Some("cb"), &value).unwrap();
        let back: Value = decode_one(&out).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn dynamic_values_drop_nulls() {
        let data = br#"[{"a":1}, null, {"a":2}, null]"#;
        let back: Vec<Value> = decode_many(data).unwrap();
        assert_eq!(back, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn zero_valued_elements_are_dropped() {
        let back: Vec<i64> = decode_many(b"[0, 5, 0, 6, null]").unwrap();
        assert_eq!(back, vec![5, 6]);
        let back: Vec<Rec> = decode_many(br#"[{"a":0},{"a":4}]"#).unwrap();
        assert_eq!(back, recs(&[4]));
    }

    #[test]
    fn trailing_bytes_after_payload_are_ignored() {
        let back: Value = decode_one(b"{\"a\":1}\n;garbage").unwrap();
        assert_eq!(back, json!({"a": 1}));
    }

    #[test]
    fn invalid_payload_is_a_decode_error() {
        let err = decode_many::<Rec>(b"{\"a\":1}").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    // -- transforms --

    #[test]
    fn transforms_run_in_order_and_omit_stops_the_chain() {
        let double = map(|r: &Rec| Rec { a: r.a * 2 });
        let small = filter(|r: &Rec| r.a < 5);
        let out = encode_many(None, &recs(&[1, 2, 3]), &[&double, &small]).unwrap();
        let back: Vec<Rec> = decode_many(&out).unwrap();
        assert_eq!(back, recs(&[2, 4]));
    }

    #[test]
    fn transform_failure_reports_position() {
        let ok = map(|r: &Rec| r.clone());
        let fail = |r: &Rec| -> Result<Step<Rec>, BoxError> {
            if r.a == 2 {
                Err("boom".into())
            } else {
                Ok(Step::Keep)
            }
        };
        let err = encode_many(None, &recs(&[1, 2]), &[&ok, &fail]).unwrap_err();
        match err {
            CodecError::Transform {
                index, transform, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(transform, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // -- custom marshal --

    #[derive(Serialize)]
    struct Upper(String);

    impl Marshal for Upper {
        fn custom_json(&self) -> Option<Result<Vec<u8>, BoxError>> {
            if self.0.is_empty() {
                return Some(Err("empty name".into()));
            }
            Some(Ok(format!("\"{}\"", self.0.to_uppercase()).into_bytes()))
        }
    }

    #[test]
    fn custom_marshal_is_preferred() {
        let out = encode_many(None, &[Upper("ab".into())], &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\n\"AB\",\nnull\n]\n");
    }

    #[test]
    fn custom_marshal_failure_is_reported() {
        let err = encode_one(None, &Upper(String::new())).unwrap_err();
        assert!(matches!(err, CodecError::Marshal { index: 0, .. }));
    }

    // -- properties --

    proptest! {
        #[test]
        fn omitted_elements_never_decode(values in prop::collection::vec(1i64..100, 0..40), banned in 1i64..100) {
            let drop_banned = filter(move |r: &Rec| r.a != banned);
            let out = encode_many(None, &recs(&values), &[&drop_banned]).unwrap();
            let back: Vec<Rec> = decode_many(&out).unwrap();
            prop_assert!(back.iter().all(|r| r.a != banned));
            let expected: Vec<i64> = values.iter().copied().filter(|&v| v != banned).collect();
            prop_assert_eq!(back, recs(&expected));
        }

        #[test]
        fn wrapper_does_not_change_decoded_value(
            name in "[A-Za-z_][A-Za-z0-9_]{0,24}",
            values in prop::collection::vec(prop_oneof![-1000i64..0, 1i64..1000], 0..30),
        ) {
            let plain = encode_many(None, &recs(&values), &[]).unwrap();
            let wrapped = encode_many(Some(name.as_str()), &recs(&values), &[]).unwrap();
            let a: Vec<Rec> = decode_many(&plain).unwrap();
            let b: Vec<Rec> = decode_many(&wrapped).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a, recs(&values));
        }
    }
}
