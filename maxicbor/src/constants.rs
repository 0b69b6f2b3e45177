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
 * maxicbor CBOR constants
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949) supporting value
 * sharing, canonical encoding and the common semantic tags.
 **************************************************************************************************/
/// Additional Information bitmask
pub const AI_MASK: u8 = 0b000_11111;

/// Major Type 0 (Positive integers)
pub const MT_UINT: u8 = 0;
/// Major Type 1 (Negative integers)
pub const MT_NINT: u8 = 1;
/// Major Type 2 (Byte Strings)
pub const MT_BSTR: u8 = 2;
/// Major Type 3 (Text Strings)
pub const MT_TSTR: u8 = 3;
/// Major Type 4 (Array)
pub const MT_ARRAY: u8 = 4;
/// Major Type 5 (Map)
pub const MT_MAP: u8 = 5;
/// Major Type 6 (Tag)
pub const MT_TAG: u8 = 6;
/// Major Type 7 (Floats, simple types etc.)
pub const MT_SIMPLE: u8 = 7;

/// Maximum value of a "simple" payload mapped on AI bits
pub const PAYLOAD_AI_BITS: u8 = 23;
/// Indicates one byte of length or value information follows the MT/AI byte
pub const PAYLOAD_ONE_BYTE: u8 = 24;
/// Indicates two bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_TWO_BYTES: u8 = 25;
/// Indicates four bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_FOUR_BYTES: u8 = 26;
/// Indicates eight bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_EIGHT_BYTES: u8 = 27;
/// Indicates an indefinite length item: content items follow until a break marker
pub const PAYLOAD_INDEFINITE: u8 = 31;

/// The break marker terminating an indefinite length item (MT 7, AI 31)
pub const BREAK_BYTE: u8 = 0xff;

/// Module defining the semantic tag values understood by the built-in decode dispatch table and
/// emitted by the built-in encoders. See [RFC8949], section 3.4 and the IANA CBOR tag registry.
pub mod tag {
    /// Date/time expressed as an RFC3339 text string
    pub const DATE_STRING: u64 = 0;
    /// Date/time expressed as seconds relative to the POSIX epoch
    pub const EPOCH: u64 = 1;
    /// Positive bignum (bstr holding an unsigned big-endian integer)
    pub const POS_BIGNUM: u64 = 2;
    /// Negative bignum (value is -1 - n)
    pub const NEG_BIGNUM: u64 = 3;
    /// Decimal fraction, `[exponent, mantissa]`, value mantissa * 10^exponent
    pub const DECIMAL_FRACTION: u64 = 4;
    /// Bigfloat, `[exponent, mantissa]`, value mantissa * 2^exponent
    pub const BIGFLOAT: u64 = 5;
    /// Marks the next item as potentially shared (referenceable by SHARED_REF)
    pub const SHAREABLE: u64 = 28;
    /// Reference to a previously marked shareable item, by occurrence index
    pub const SHARED_REF: u64 = 29;
    /// Rational number, `[numerator, denominator]`
    pub const RATIONAL: u64 = 30;
    /// Regular expression source text
    pub const REGEX: u64 = 35;
    /// MIME message (headers and body) as text
    pub const MIME: u64 = 36;
    /// Binary UUID (16 bytes)
    pub const UUID: u64 = 37;
    /// Mathematical set of unique items, wrapped around an array
    pub const SET: u64 = 258;
}
