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
 * IEEE 754 binary16 pack/unpack
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949) supporting value
 * sharing, canonical encoding and the common semantic tags.
 **************************************************************************************************/
use half::f16;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The canonical half-float encoding of NaN (0xf9 plus 0x7e00).
pub const NAN_BYTES: [u8; 3] = [0xf9, 0x7e, 0x00];
/// The canonical half-float encoding of positive infinity (0xf9 plus 0x7c00).
pub const POS_INF_BYTES: [u8; 3] = [0xf9, 0x7c, 0x00];
/// The canonical half-float encoding of negative infinity (0xf9 plus 0xfc00).
pub const NEG_INF_BYTES: [u8; 3] = [0xf9, 0xfc, 0x00];

/// Widen a binary16 bit pattern (1 sign bit, 5 exponent bits, 10 mantissa bits) to an f64.
///
/// Exponent 31 yields NaN or an infinity depending on the mantissa; exponent 0 yields zero or
/// a subnormal, `mantissa/1024 * 2^-14`; everything else is a normal value,
/// `(1 + mantissa/1024) * 2^(exp - 15)`. All of these are exactly representable in an f64,
/// so widening is lossless.
#[cfg_attr(feature = "trace", trace)]
pub fn unpack(bits: u16) -> f64 {
    f16::from_bits(bits).to_f64()
}

/// Narrow an f64 to a binary16 bit pattern, with round-to-nearest-even, returning `None`
/// unless the value survives the round trip exactly. Used by the canonical path to test
/// whether a float may be emitted at half width.
#[cfg_attr(feature = "trace", trace)]
pub fn pack(v: f64) -> Option<u16> {
    let h = f16::from_f64(v);
    if h.to_f64() == v {
        Some(h.to_bits())
    } else {
        None
    }
}

/// Narrow an f64 to an f32, returning `None` unless the value survives the round trip
/// exactly. The single-width leg of the canonical minimal-float probe.
pub fn narrow_single(v: f64) -> Option<f32> {
    let s = v as f32;
    if s as f64 == v {
        Some(s)
    } else {
        None
    }
}
