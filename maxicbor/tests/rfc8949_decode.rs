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
 * Test cases from RFC8949, for decoding
 *
 * Test cases from RFC8949, Appendix A, including the indefinite-length forms.
 **************************************************************************************************/

extern crate maxicbor;

use std::convert::TryFrom;

use maxicbor::error::CBORError;
use maxicbor::loads;
use maxicbor::types::CBOR;

#[test]
fn rfc8949_decode_int() -> Result<(), CBORError> {
    println!("<======================= rfc8949_decode_int =====================>");
    for (bytes, expect) in [
        (vec![0x00u8], 0i128),
        (vec![0x01], 1),
        (vec![0x0a], 10),
        (vec![0x17], 23),
        (vec![0x18, 0x18], 24),
        (vec![0x19, 0x03, 0xe8], 1000),
        (vec![0x1a, 0x00, 0x0f, 0x42, 0x40], 1000000),
        (
            vec![0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            18446744073709551615,
        ),
        (vec![0x20], -1),
        (vec![0x29], -10),
        (vec![0x38, 0x63], -100),
        (vec![0x39, 0x03, 0xe7], -1000),
        (
            vec![0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            -18446744073709551616,
        ),
    ] {
        let item = loads(&bytes)?;
        assert_eq!(i128::try_from(&item)?, expect);
    }
    Ok(())
}

#[test]
fn rfc8949_decode_float() -> Result<(), CBORError> {
    println!("<======================= rfc8949_decode_float =====================>");
    for (bytes, expect) in [
        (vec![0xf9u8, 0x00, 0x00], 0.0f64),
        (vec![0xf9, 0x80, 0x00], -0.0),
        (vec![0xf9, 0x3c, 0x00], 1.0),
        (vec![0xf9, 0x3e, 0x00], 1.5),
        (vec![0xf9, 0x7b, 0xff], 65504.0),
        (vec![0xf9, 0x00, 0x01], 5.960464477539063e-8),
        (vec![0xf9, 0x04, 0x00], 0.00006103515625),
        (vec![0xf9, 0xc4, 0x00], -4.0),
        (vec![0xfa, 0x47, 0xc3, 0x50, 0x00], 100000.0),
        (vec![0xfa, 0x7f, 0x7f, 0xff, 0xff], 3.4028234663852886e38),
        (
            vec![0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a],
            1.1,
        ),
        (vec![0xfb, 0xc0, 0x10, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66], -4.1),
    ] {
        let item = loads(&bytes)?;
        assert_eq!(f64::try_from(&item)?, expect);
    }
    // Non-finite values, at every width
    for bytes in [
        vec![0xf9u8, 0x7e, 0x00],
        vec![0xfa, 0x7f, 0xc0, 0x00, 0x00],
        vec![0xfb, 0x7f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    ] {
        match loads(&bytes)? {
            CBOR::Float(v) => assert!(v.is_nan()),
            other => panic!("expected a float, got {:?}", other),
        }
    }
    assert_eq!(loads(&[0xf9, 0x7c, 0x00])?, CBOR::Float(f64::INFINITY));
    assert_eq!(loads(&[0xf9, 0xfc, 0x00])?, CBOR::Float(f64::NEG_INFINITY));
    Ok(())
}

#[test]
fn rfc8949_decode_simple() -> Result<(), CBORError> {
    println!("<======================= rfc8949_decode_simple =====================>");
    assert_eq!(loads(&[0xf4])?, CBOR::False);
    assert_eq!(loads(&[0xf5])?, CBOR::True);
    assert_eq!(loads(&[0xf6])?, CBOR::Null);
    assert_eq!(loads(&[0xf7])?, CBOR::Undefined);
    assert_eq!(loads(&[0xf0])?, CBOR::Simple(16));
    assert_eq!(loads(&[0xf8, 0xff])?, CBOR::Simple(255));
    Ok(())
}

#[test]
fn rfc8949_decode_strings() -> Result<(), CBORError> {
    println!("<======================= rfc8949_decode_strings =====================>");
    assert_eq!(loads(&[0x40])?, CBOR::Bstr(vec![]));
    assert_eq!(
        loads(&[0x44, 0x01, 0x02, 0x03, 0x04])?,
        CBOR::Bstr(vec![0x01, 0x02, 0x03, 0x04])
    );
    assert_eq!(loads(&[0x60])?, CBOR::Tstr(String::new()));
    assert_eq!(
        loads(&[0x64, 0x49, 0x45, 0x54, 0x46])?,
        CBOR::Tstr("IETF".to_owned())
    );
    assert_eq!(loads(&[0x62, 0xc3, 0xbc])?, CBOR::Tstr("\u{00fc}".to_owned()));
    Ok(())
}

#[test]
fn rfc8949_decode_containers() -> Result<(), CBORError> {
    println!("<======================= rfc8949_decode_containers =====================>");
    assert_eq!(loads(&[0x80])?, CBOR::array(vec![]));
    assert_eq!(
        loads(&[0x83, 0x01, 0x02, 0x03])?,
        CBOR::array(vec![CBOR::from(1u8), CBOR::from(2u8), CBOR::from(3u8)])
    );
    assert_eq!(
        loads(&[0x83, 0x01, 0x82, 0x02, 0x03, 0x82, 0x04, 0x05])?,
        CBOR::array(vec![
            CBOR::from(1u8),
            CBOR::array(vec![CBOR::from(2u8), CBOR::from(3u8)]),
            CBOR::array(vec![CBOR::from(4u8), CBOR::from(5u8)]),
        ])
    );
    assert_eq!(loads(&[0xa0])?, CBOR::map(vec![]));
    assert_eq!(
        loads(&[0xa2, 0x01, 0x02, 0x03, 0x04])?,
        CBOR::map(vec![
            (CBOR::from(1u8), CBOR::from(2u8)),
            (CBOR::from(3u8), CBOR::from(4u8)),
        ])
    );
    assert_eq!(
        loads(&[0x82, 0x61, 0x61, 0xa1, 0x61, 0x62, 0x61, 0x63])?,
        CBOR::array(vec![
            CBOR::from("a"),
            CBOR::map(vec![(CBOR::from("b"), CBOR::from("c"))]),
        ])
    );
    Ok(())
}

#[test]
fn rfc8949_decode_indefinite_strings() -> Result<(), CBORError> {
    println!("<================== rfc8949_decode_indefinite_strings =============>");
    // (_ h'0102', h'030405')
    assert_eq!(
        loads(&[0x5f, 0x42, 0x01, 0x02, 0x43, 0x03, 0x04, 0x05, 0xff])?,
        CBOR::Bstr(vec![0x01, 0x02, 0x03, 0x04, 0x05])
    );
    // (_ "strea", "ming")
    assert_eq!(
        loads(&[
            0x7f, 0x65, 0x73, 0x74, 0x72, 0x65, 0x61, 0x64, 0x6d, 0x69, 0x6e, 0x67, 0xff
        ])?,
        CBOR::Tstr("streaming".to_owned())
    );
    // Empty chunk sequences collapse to empty strings
    assert_eq!(loads(&[0x5f, 0xff])?, CBOR::Bstr(vec![]));
    assert_eq!(loads(&[0x7f, 0xff])?, CBOR::Tstr(String::new()));
    Ok(())
}

#[test]
fn rfc8949_decode_indefinite_containers() -> Result<(), CBORError> {
    println!("<================== rfc8949_decode_indefinite_containers ==========>");
    assert_eq!(loads(&[0x9f, 0xff])?, CBOR::array(vec![]));
    assert_eq!(
        loads(&[0x9f, 0x01, 0x82, 0x02, 0x03, 0x9f, 0x04, 0x05, 0xff, 0xff])?,
        CBOR::array(vec![
            CBOR::from(1u8),
            CBOR::array(vec![CBOR::from(2u8), CBOR::from(3u8)]),
            CBOR::array(vec![CBOR::from(4u8), CBOR::from(5u8)]),
        ])
    );
    assert_eq!(
        loads(&[0xbf, 0x61, 0x61, 0x01, 0x61, 0x62, 0x9f, 0x02, 0x03, 0xff, 0xff])?,
        CBOR::map(vec![
            (CBOR::from("a"), CBOR::from(1u8)),
            (
                CBOR::from("b"),
                CBOR::array(vec![CBOR::from(2u8), CBOR::from(3u8)])
            ),
        ])
    );
    Ok(())
}

#[test]
fn decode_array_key_materializes_as_tuple() -> Result<(), CBORError> {
    println!("<================== decode_array_key_materializes_as_tuple ========>");
    // {[1, 2]: "x"} - the key decodes in immutable mode
    let item = loads(&[0xa1, 0x82, 0x01, 0x02, 0x61, 0x78])?;
    match item {
        CBOR::Map(cell) => {
            let pairs = cell.borrow();
            assert_eq!(pairs.len(), 1);
            match &pairs[0].0 {
                CBOR::Tuple(items) => {
                    assert_eq!(items.as_ref(), &vec![CBOR::from(1u8), CBOR::from(2u8)])
                }
                other => panic!("expected a tuple key, got {:?}", other),
            }
            assert_eq!(pairs[0].1, CBOR::from("x"));
        }
        other => panic!("expected a map, got {:?}", other),
    }
    Ok(())
}

#[test]
fn decode_round_trips_preserve_value() -> Result<(), CBORError> {
    println!("<================== decode_round_trips_preserve_value =============>");
    let value = CBOR::map(vec![
        (CBOR::from("numbers"), CBOR::array(vec![
            CBOR::from(0u8),
            CBOR::from(-1000i64),
            CBOR::from(1.5f64),
        ])),
        (CBOR::from("flags"), CBOR::array(vec![CBOR::True, CBOR::False, CBOR::Null])),
        (CBOR::from("blob"), CBOR::from(vec![0xde_u8, 0xad, 0xbe, 0xef])),
    ]);
    let encoded = maxicbor::dumps(&value)?;
    assert_eq!(loads(&encoded)?, value);
    Ok(())
}
