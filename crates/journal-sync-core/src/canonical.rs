//! Canonical CBOR encoding of the data an entry id is bound to.
//!
//! The binding is a definite-length array `[version, prev, sealed]` where
//! `prev` is a 32-byte string or `null`. Integers and lengths use the
//! smallest valid encoding (RFC 8949 core deterministic encoding), so two
//! clients always hash identical bytes for the same link.

use ciborium::value::Value;

use crate::types::EntryId;

/// Version tag of the binding layout.
pub const BINDING_VERSION: u8 = 1;

/// Encode the `(prev, sealed)` pair an entry id commits to.
pub fn binding_bytes(prev: Option<&EntryId>, sealed: &[u8]) -> Vec<u8> {
    let value = Value::Array(vec![
        Value::Integer(BINDING_VERSION.into()),
        match prev {
            Some(id) => Value::Bytes(id.0.to_vec()),
            None => Value::Null,
        },
        Value::Bytes(sealed.to_vec()),
    ]);

    let mut buf = Vec::with_capacity(sealed.len() + 48);
    encode_value_to(&mut buf, &value);
    buf
}

/// Recursively encode the subset of CBOR the binding uses.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            // Binding integers are small non-negative tags.
            encode_uint(buf, 0, n as u64);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Null => buf.push(0xf6),
        // Only the variants built by `binding_bytes` reach here.
        _ => unreachable!("unsupported CBOR value in binding"),
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}
