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
 * Test cases from RFC8949, for encoding
 *
 * Test cases from RFC8949, Appendix A.
 **************************************************************************************************/

extern crate maxicbor;

use maxicbor::dumps;
use maxicbor::error::{CBORError, CBOREncodeError};
use maxicbor::types::CBOR;

use num_bigint::BigInt;

#[test]
fn rfc8949_encode_uint() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_uint =====================>");
    for (val, expect) in [
        (0u64, vec![0x00]),
        (1, vec![0x01]),
        (10, vec![0x0a]),
        (23, vec![0x17]),
        (24, vec![0x18, 0x18]),
        (25, vec![0x18, 0x19]),
        (100, vec![0x18, 0x64]),
        (1000, vec![0x19, 0x03, 0xe8]),
        (1000000, vec![0x1a, 0x00, 0x0f, 0x42, 0x40]),
        (
            1000000000000,
            vec![0x1b, 0x00, 0x00, 0x00, 0xe8, 0xd4, 0xa5, 0x10, 0x00],
        ),
        (
            18446744073709551615,
            vec![0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        ),
    ] {
        println!("<======================= Encode u64 {} =====================>", val);
        assert_eq!(dumps(&CBOR::from(val))?, expect);
    }
    Ok(())
}

#[test]
fn rfc8949_encode_nint() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_nint =====================>");
    for (val, expect) in [
        (-1i64, vec![0x20]),
        (-10, vec![0x29]),
        (-100, vec![0x38, 0x63]),
        (-1000, vec![0x39, 0x03, 0xe7]),
    ] {
        println!("<======================= Encode i64 {} =====================>", val);
        assert_eq!(dumps(&CBOR::from(val))?, expect);
    }
    // The most negative value encodable on major type 1
    assert_eq!(
        dumps(&CBOR::from(-18446744073709551616i128))?,
        vec![0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );
    Ok(())
}

#[test]
fn rfc8949_encode_bignum() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_bignum =====================>");
    let two_pow_64 = BigInt::from(u64::MAX) + 1i32;
    assert_eq!(
        dumps(&CBOR::from(two_pow_64.clone()))?,
        vec![0xc2, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        dumps(&CBOR::from(-two_pow_64.clone() - 1))?,
        vec![0xc3, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    // Values inside the 64-bit ranges normalize to plain integers even if constructed big
    assert_eq!(dumps(&CBOR::from(BigInt::from(5)))?, vec![0x05]);
    assert_eq!(dumps(&CBOR::from(BigInt::from(-5)))?, vec![0x24]);
    Ok(())
}

#[test]
fn rfc8949_encode_bstr() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_bstr =====================>");
    assert_eq!(dumps(&CBOR::from(Vec::<u8>::new()))?, vec![0x40]);
    assert_eq!(
        dumps(&CBOR::from(vec![0x01u8, 0x02, 0x03, 0x04]))?,
        vec![0x44, 0x01, 0x02, 0x03, 0x04]
    );
    Ok(())
}

#[test]
fn rfc8949_encode_tstr() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_tstr =====================>");
    assert_eq!(dumps(&CBOR::from(""))?, vec![0x60]);
    assert_eq!(dumps(&CBOR::from("a"))?, vec![0x61, 0x61]);
    assert_eq!(dumps(&CBOR::from("IETF"))?, vec![0x64, 0x49, 0x45, 0x54, 0x46]);
    assert_eq!(dumps(&CBOR::from("\"\\"))?, vec![0x62, 0x22, 0x5c]);
    assert_eq!(dumps(&CBOR::from("\u{00fc}"))?, vec![0x62, 0xc3, 0xbc]);
    Ok(())
}

#[test]
fn rfc8949_encode_array() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_array =====================>");
    assert_eq!(dumps(&CBOR::array(vec![]))?, vec![0x80]);
    assert_eq!(
        dumps(&CBOR::array(vec![
            CBOR::from(1u8),
            CBOR::from(2u8),
            CBOR::from(3u8)
        ]))?,
        vec![0x83, 0x01, 0x02, 0x03]
    );
    assert_eq!(
        dumps(&CBOR::array(vec![
            CBOR::from(1u8),
            CBOR::array(vec![CBOR::from(2u8), CBOR::from(3u8)]),
            CBOR::array(vec![CBOR::from(4u8), CBOR::from(5u8)]),
        ]))?,
        vec![0x83, 0x01, 0x82, 0x02, 0x03, 0x82, 0x04, 0x05]
    );
    let longer: Vec<CBOR> = (1u64..=25).map(CBOR::from).collect();
    let mut expect = vec![0x98, 0x19];
    for i in 1u8..=23 {
        expect.push(i);
    }
    expect.extend_from_slice(&[0x18, 0x18, 0x18, 0x19]);
    assert_eq!(dumps(&CBOR::array(longer))?, expect);
    Ok(())
}

#[test]
fn rfc8949_encode_map() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_map =====================>");
    assert_eq!(dumps(&CBOR::map(vec![]))?, vec![0xa0]);
    assert_eq!(
        dumps(&CBOR::map(vec![
            (CBOR::from(1u8), CBOR::from(2u8)),
            (CBOR::from(3u8), CBOR::from(4u8)),
        ]))?,
        vec![0xa2, 0x01, 0x02, 0x03, 0x04]
    );
    // Insertion order is preserved in the regular style
    assert_eq!(
        dumps(&CBOR::map(vec![
            (CBOR::from(3u8), CBOR::from(4u8)),
            (CBOR::from(1u8), CBOR::from(2u8)),
        ]))?,
        vec![0xa2, 0x03, 0x04, 0x01, 0x02]
    );
    Ok(())
}

#[test]
fn rfc8949_encode_float() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_float =====================>");
    // The regular style always emits doubles for finite values
    assert_eq!(
        dumps(&CBOR::from(1.1f64))?,
        vec![0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]
    );
    assert_eq!(
        dumps(&CBOR::from(1.0e300f64))?,
        vec![0xfb, 0x7e, 0x37, 0xe4, 0x3c, 0x88, 0x00, 0x75, 0x9c]
    );
    // Non-finite values use the canonical half-float specials in every style
    assert_eq!(dumps(&CBOR::from(f64::NAN))?, vec![0xf9, 0x7e, 0x00]);
    assert_eq!(dumps(&CBOR::from(f64::INFINITY))?, vec![0xf9, 0x7c, 0x00]);
    assert_eq!(dumps(&CBOR::from(f64::NEG_INFINITY))?, vec![0xf9, 0xfc, 0x00]);
    Ok(())
}

#[test]
fn rfc8949_encode_simple() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_simple =====================>");
    assert_eq!(dumps(&CBOR::False)?, vec![0xf4]);
    assert_eq!(dumps(&CBOR::True)?, vec![0xf5]);
    assert_eq!(dumps(&CBOR::Null)?, vec![0xf6]);
    assert_eq!(dumps(&CBOR::Undefined)?, vec![0xf7]);
    assert_eq!(dumps(&CBOR::Simple(16))?, vec![0xf0]);
    assert_eq!(dumps(&CBOR::Simple(32))?, vec![0xf8, 0x20]);
    assert_eq!(dumps(&CBOR::Simple(255))?, vec![0xf8, 0xff]);
    Ok(())
}

#[test]
fn encode_simple_reserved_range_fails() {
    println!("<================== encode_simple_reserved_range_fails ============>");
    for v in 20u8..=31 {
        match dumps(&CBOR::Simple(v)) {
            Err(CBORError::Encode(CBOREncodeError::ReservedSimple(got))) => assert_eq!(got, v),
            other => panic!("expected ReservedSimple for {}, got {:?}", v, other),
        }
    }
}

#[test]
fn rfc8949_encode_tag() -> Result<(), CBORError> {
    println!("<======================= rfc8949_encode_tag =====================>");
    assert_eq!(
        dumps(&CBOR::tag(32, CBOR::from("http://www.example.com")))?,
        vec![
            0xd8, 0x20, 0x76, 0x68, 0x74, 0x74, 0x70, 0x3a, 0x2f, 0x2f, 0x77, 0x77, 0x77, 0x2e,
            0x65, 0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d
        ]
    );
    // Tag 23: expected conversion to base16
    assert_eq!(
        dumps(&CBOR::tag(23, CBOR::from(vec![0x01u8, 0x02, 0x03, 0x04])))?,
        vec![0xd7, 0x44, 0x01, 0x02, 0x03, 0x04]
    );
    Ok(())
}

#[test]
fn encode_set() -> Result<(), CBORError> {
    println!("<======================= encode_set =====================>");
    assert_eq!(
        dumps(&CBOR::set(vec![
            CBOR::from(1u8),
            CBOR::from(2u8),
            CBOR::from(3u8)
        ]))?,
        vec![0xd9, 0x01, 0x02, 0x83, 0x01, 0x02, 0x03]
    );
    Ok(())
}
