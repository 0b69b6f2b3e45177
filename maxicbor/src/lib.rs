/***************************************************************************************************
 * Copyright (c) 2024, 2025 The maxicbor project authors. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * maxicbor module definition
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949). This implementation
 * streams items over std::io readers and writers and supports value sharing, canonical
 * encoding and the common semantic tags.
 **************************************************************************************************/

#![warn(missing_docs)]

//! # MAXICBOR
//!
//! The `maxicbor` crate provides a CBOR (RFC 8949) implementation built around an owned value
//! model, for programs that want to encode and decode whole items rather than maintain
//! low-level control over the wire format. It is the allocating counterpart to the zero-copy
//! slice codecs aimed at constrained targets: values are ordinary Rust data, containers are
//! reference-counted cells, and the encoder and decoder stream over anything implementing
//! `std::io::Write` / `std::io::Read`.
//!
//! ## Features
//!
//! - All CBOR primitive types: positive and negative integers (with automatic tag 2/3 bignum
//!   promotion beyond 64 bits), `tstr`, `bstr`, arrays, maps, simple values and floats.
//!   Preferred (shortest) serialization is used for all length fields.
//! - Indefinite-length strings, arrays and maps on the decode side, with the RFC 8949 rule
//!   that every text chunk must independently be valid UTF-8.
//! - The common semantic tags: date/time (0/1), bignums (2/3), decimal fractions (4),
//!   bigfloats (5), rationals (30), regular expressions (35), MIME (36), UUID (37) and
//!   sets (258).
//! - Value sharing (tags 28/29): aliased and cyclic object graphs round-trip with identity
//!   preserved, using an index-addressed shareables table on the decode side.
//! - A canonical mode producing deterministic output: minimal-width floats and maps/sets
//!   sorted by their encoded key bytes.
//! - Unknown-tag and post-map hooks, a pluggable encode registry with lazily resolved
//!   entries, and a configurable UTF-8 error policy.
//!
//! ## Encoding
//!
//! ```
//! use maxicbor::types::CBOR;
//! use maxicbor::error::CBORError;
//!
//! fn main() -> Result<(), CBORError> {
//!     let value = CBOR::map(vec![
//!         (CBOR::from(1u8), CBOR::from(2u8)),
//!         (CBOR::from(3u8), CBOR::from(4u8)),
//!     ]);
//!     assert_eq!(maxicbor::dumps(&value)?, vec![0xa2, 0x01, 0x02, 0x03, 0x04]);
//!     Ok(())
//! }
//! ```
//!
//! ## Decoding
//!
//! ```
//! use maxicbor::types::CBOR;
//! use maxicbor::error::CBORError;
//!
//! fn main() -> Result<(), CBORError> {
//!     let value = maxicbor::loads(&[0x83, 0x01, 0x02, 0x03])?;
//!     assert_eq!(
//!         value,
//!         CBOR::array(vec![CBOR::from(1u8), CBOR::from(2u8), CBOR::from(3u8)])
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Sharing
//!
//! With `value_sharing` enabled on the encoder, a list that contains itself encodes as
//! `D8 1C 82 01 D8 1D 00` (tag 28 around the array, tag 29 referencing slot 0) and decodes
//! back to a list whose second element is the list itself.

#[cfg(feature = "trace")]
extern crate func_trace;

pub(crate) mod ast;
mod cbor_diag;
pub mod constants;
pub(crate) mod decode;
pub(crate) mod encode;
pub mod halffloat;
pub(crate) mod tags;

/// The `error` module contains error definitions used throughout `maxicbor`.
pub mod error;

use std::io::{Read, Write};

/// The `types` module exports the main [`types::CBOR`] value enum together with the
/// supporting semantic types.
pub mod types {
    pub use super::ast::{
        ArrayRef, Decimal, MapRef, Rational, SetRef, TagRef, Tagged, ValueKind, CBOR,
    };
}

/// The `encoder` module exports the streaming [`encoder::CBOREncoder`] and its configuration
/// types, including the encode-side tag registry.
pub mod encoder {
    pub use super::encode::{CBOREncoder, DefaultHandler, EncodeStyle};
    pub use super::tags::{EncodeFn, EncoderRegistry, KindLoader};
}

/// The `decoder` module exports the streaming [`decoder::CBORDecoder`] and its configuration
/// types.
pub mod decoder {
    pub use super::decode::{CBORDecoder, ObjectHook, StrErrors, TagHook};
}

/// The `debug` module exports the CBOR diagnostic notation formatter.
pub mod debug {
    pub use super::cbor_diag::{print_hex, Diag, DiagFormatter};
}

use crate::types::CBOR;

/// Encode `value` onto `fp` with the default encoder configuration.
pub fn dump<W: Write>(value: &CBOR, fp: W) -> error::Result<()> {
    encoder::CBOREncoder::new(fp).encode(value)?;
    Ok(())
}

/// Encode `value` into a byte vector with the default encoder configuration.
pub fn dumps(value: &CBOR) -> error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    encoder::CBOREncoder::new(&mut buf).encode(value)?;
    Ok(buf)
}

/// Decode a single item from `fp` with the default decoder configuration.
pub fn load<R: Read>(fp: R) -> error::Result<CBOR> {
    Ok(decoder::CBORDecoder::new(fp).decode()?)
}

/// Decode a single item from a byte slice with the default decoder configuration.
pub fn loads(buf: &[u8]) -> error::Result<CBOR> {
    Ok(decoder::CBORDecoder::new(buf).decode()?)
}
