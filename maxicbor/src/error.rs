/***************************************************************************************************
 * Copyright (c) 2024, 2025 The maxicbor project authors. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * maxicbor CBOR Error API
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949) supporting value
 * sharing, canonical encoding and the common semantic tags.
 **************************************************************************************************/
use std::io;
use std::result;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::ast::ValueKind;

/// An alias for Result<T, CBORError> used throughout this crate.
pub type Result<T> = result::Result<T, CBORError>;

/// `CBORError` is the root error type for this crate. Every failure raised across the public
/// API boundary is either an encode-side or a decode-side error.
#[derive(Error, Debug)]
pub enum CBORError {
    /// A failure while serializing a value.
    #[error(transparent)]
    Encode(#[from] CBOREncodeError),
    /// A failure while deserializing an item.
    #[error(transparent)]
    Decode(#[from] CBORDecodeError),
    /// Attempt to convert an item to an incompatible type.
    #[error("attempt to convert an item of incompatible type")]
    IncompatibleType,
    /// A number conversion has overflowed or underflowed.
    #[error("overflow or underflow in number conversion")]
    OutOfRange,
}

/// `CBOREncodeError` provides information about failures to serialize a value as CBOR.
#[derive(Error, Debug)]
pub enum CBOREncodeError {
    /// No encoder is registered for the value kind and no default handler is set.
    #[error("cannot serialize values of kind {0:?}")]
    NoEncoder(ValueKind),
    /// A cycle was found while value sharing is disabled.
    #[error("cyclic data structure detected but value_sharing is disabled")]
    CyclicStructure,
    /// A datetime without a UTC offset was encountered and the encoder has no default timezone.
    #[error("naive datetime encountered and no default timezone has been set")]
    NaiveDatetime,
    /// Simple values 20..=31 have reserved one-byte encodings and may not appear in two-byte form.
    #[error("simple value {0} is reserved and cannot be encoded")]
    ReservedSimple(u8),
    /// An encoder configuration value is not usable.
    #[error("invalid encoder configuration: {0}")]
    InvalidConfig(&'static str),
    /// Value nesting exceeded the configured maximum depth.
    #[error("maximum recursion depth exceeded while encoding")]
    RecursionLimit,
    /// The underlying writer failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// `CBORDecodeError` provides information about failures to deserialize an item. Most of the
/// variants are format errors: the input is not well-formed CBOR, or uses an encoding this
/// implementation treats as invalid.
#[derive(Error, Debug)]
pub enum CBORDecodeError {
    /// Additional information values 28..=30 are reserved in all major types.
    #[error("reserved additional information value {0}")]
    ReservedAI(u8),
    /// Additional information 31 (indefinite) read for a major type that does not permit it.
    #[error("indefinite length is not permitted for this major type")]
    InvalidLength,
    /// A break marker (0xff) was read where a data item was expected.
    #[error("break marker encountered outside an indefinite-length container")]
    UnexpectedBreak,
    /// A chunk of an indefinite-length string was not a definite-length string of the same
    /// major type.
    #[error("indefinite-length string chunk has the wrong major type or is itself indefinite")]
    InvalidChunk,
    /// The reader returned fewer bytes than the item requires.
    #[error("premature end of stream while decoding")]
    PrematureEof,
    /// A tstr did not hold valid UTF-8 (str_errors = strict).
    #[error("text string contains an invalid UTF8 sequence: {0}")]
    UTF8Error(#[source] FromUtf8Error),
    /// A tstr did not hold valid UTF-8 (str_errors = error).
    #[error("text string rejected by decode error policy: {0}")]
    TextError(#[source] FromUtf8Error),
    /// A tag 0 string is not a legal RFC3339 date/time, or a tag 1 epoch is out of range.
    #[error("bad date/time value")]
    BadDateTime,
    /// The item following tag 29 is not an unsigned integer.
    #[error("shared reference index is not an unsigned integer")]
    BadSharedIndex,
    /// A shared reference names a slot that was never allocated.
    #[error("shared reference {0} out of range")]
    SharedRefOutOfRange(u64),
    /// A shared reference names a slot whose value has not been constructed yet.
    #[error("shared value {0} referenced before it was constructed")]
    SharedRefUnset(usize),
    /// The payload of a semantic tag has the wrong shape.
    #[error("tag {tag} payload is malformed: {reason}")]
    BadTagPayload { tag: u64, reason: &'static str },
    /// Two-byte simple values below 32 are not well-formed.
    #[error("two-byte encoding of simple value {0} is not well-formed")]
    BadSimple(u8),
    /// Item nesting exceeded the configured maximum depth.
    #[error("maximum recursion depth exceeded while decoding")]
    RecursionLimit,
    /// The underlying reader failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}
