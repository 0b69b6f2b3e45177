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
 * Test cases for the canonical (deterministic) encoding style
 **************************************************************************************************/

extern crate maxicbor;

use maxicbor::encoder::{CBOREncoder, EncodeStyle};
use maxicbor::error::CBORError;
use maxicbor::types::CBOR;

fn dumps_canonical(value: &CBOR) -> Result<Vec<u8>, CBORError> {
    let mut buf = Vec::new();
    CBOREncoder::new(&mut buf)
        .style(EncodeStyle::Canonical)
        .encode(value)?;
    Ok(buf)
}

#[test]
fn canonical_minimal_floats() -> Result<(), CBORError> {
    println!("<======================= canonical_minimal_floats =====================>");
    for (val, expect) in [
        (0.0f64, vec![0xf9u8, 0x00, 0x00]),
        (-0.0, vec![0xf9, 0x80, 0x00]),
        (1.0, vec![0xf9, 0x3c, 0x00]),
        (1.5, vec![0xf9, 0x3e, 0x00]),
        (65504.0, vec![0xf9, 0x7b, 0xff]),
        // The smallest positive half-float subnormal
        (5.960464477539063e-8, vec![0xf9, 0x00, 0x01]),
        (0.00006103515625, vec![0xf9, 0x04, 0x00]),
        (-4.0, vec![0xf9, 0xc4, 0x00]),
        // Fits a single but not a half
        (100000.0, vec![0xfa, 0x47, 0xc3, 0x50, 0x00]),
        (3.4028234663852886e38, vec![0xfa, 0x7f, 0x7f, 0xff, 0xff]),
        // Fits neither
        (1.1, vec![0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]),
        (1.0e300, vec![0xfb, 0x7e, 0x37, 0xe4, 0x3c, 0x88, 0x00, 0x75, 0x9c]),
    ] {
        println!("<======================= Canonical float {} =====================>", val);
        assert_eq!(dumps_canonical(&CBOR::from(val))?, expect);
    }
    assert_eq!(dumps_canonical(&CBOR::from(f64::NAN))?, vec![0xf9, 0x7e, 0x00]);
    assert_eq!(
        dumps_canonical(&CBOR::from(f64::INFINITY))?,
        vec![0xf9, 0x7c, 0x00]
    );
    assert_eq!(
        dumps_canonical(&CBOR::from(f64::NEG_INFINITY))?,
        vec![0xf9, 0xfc, 0x00]
    );
    Ok(())
}

#[test]
fn canonical_map_key_order() -> Result<(), CBORError> {
    println!("<======================= canonical_map_key_order =====================>");
    // Keys sort by the length of their encoded form first, then by the bytes themselves:
    // 10 (0a), -1 (20), false (f4), 100 (18 64), "z" (61 7a), [-1] (81 20),
    // "aa" (62 61 61), [100] (81 18 64)
    let value = CBOR::map(vec![
        (CBOR::array(vec![CBOR::from(100u8)]), CBOR::from(8u8)),
        (CBOR::from("aa"), CBOR::from(7u8)),
        (CBOR::from(-1i64), CBOR::from(2u8)),
        (CBOR::from("z"), CBOR::from(5u8)),
        (CBOR::array(vec![CBOR::from(-1i64)]), CBOR::from(6u8)),
        (CBOR::from(10u8), CBOR::from(1u8)),
        (CBOR::False, CBOR::from(3u8)),
        (CBOR::from(100u8), CBOR::from(4u8)),
    ]);
    let expect: Vec<u8> = vec![
        0xa8, // map of 8 pairs
        0x0a, 0x01, // 10: 1
        0x20, 0x02, // -1: 2
        0xf4, 0x03, // false: 3
        0x18, 0x64, 0x04, // 100: 4
        0x61, 0x7a, 0x05, // "z": 5
        0x81, 0x20, 0x06, // [-1]: 6
        0x62, 0x61, 0x61, 0x07, // "aa": 7
        0x81, 0x18, 0x64, 0x08, // [100]: 8
    ];
    assert_eq!(dumps_canonical(&value)?, expect);
    Ok(())
}

#[test]
fn canonical_is_insertion_order_independent() -> Result<(), CBORError> {
    println!("<================== canonical_is_insertion_order_independent ======>");
    let forwards = CBOR::map(vec![
        (CBOR::from(1u8), CBOR::from("one")),
        (CBOR::from(2u8), CBOR::from("two")),
        (CBOR::from("three"), CBOR::from(3u8)),
    ]);
    let backwards = CBOR::map(vec![
        (CBOR::from("three"), CBOR::from(3u8)),
        (CBOR::from(2u8), CBOR::from("two")),
        (CBOR::from(1u8), CBOR::from("one")),
    ]);
    assert_eq!(dumps_canonical(&forwards)?, dumps_canonical(&backwards)?);
    Ok(())
}

#[test]
fn canonical_set_member_order() -> Result<(), CBORError> {
    println!("<======================= canonical_set_member_order ===================>");
    let value = CBOR::set(vec![
        CBOR::from(vec![0x01u8, 0x02]),
        CBOR::from("a"),
        CBOR::from(1u8),
    ]);
    // Members sort by encoded form: 01, 61 61, 42 01 02
    assert_eq!(
        dumps_canonical(&value)?,
        vec![0xd9, 0x01, 0x02, 0x83, 0x01, 0x61, 0x61, 0x42, 0x01, 0x02]
    );
    Ok(())
}

#[test]
fn canonical_nested_maps_sort_recursively() -> Result<(), CBORError> {
    println!("<================== canonical_nested_maps_sort_recursively ========>");
    let inner_a = CBOR::map(vec![
        (CBOR::from(2u8), CBOR::from(20u8)),
        (CBOR::from(1u8), CBOR::from(10u8)),
    ]);
    let inner_b = CBOR::map(vec![
        (CBOR::from(2u8), CBOR::from(20u8)),
        (CBOR::from(1u8), CBOR::from(10u8)),
    ]);
    let value = CBOR::array(vec![inner_a, inner_b]);
    assert_eq!(
        dumps_canonical(&value)?,
        vec![0x82, 0xa2, 0x01, 0x0a, 0x02, 0x14, 0xa2, 0x01, 0x0a, 0x02, 0x14]
    );
    Ok(())
}

#[test]
fn canonical_length_fields_are_minimal() -> Result<(), CBORError> {
    println!("<================== canonical_length_fields_are_minimal ===========>");
    // 23 rides the AI bits, 24 takes one extra byte, and so on upward
    assert_eq!(dumps_canonical(&CBOR::from(23u8))?, vec![0x17]);
    assert_eq!(dumps_canonical(&CBOR::from(24u8))?, vec![0x18, 0x18]);
    assert_eq!(dumps_canonical(&CBOR::from(255u64))?, vec![0x18, 0xff]);
    assert_eq!(dumps_canonical(&CBOR::from(256u64))?, vec![0x19, 0x01, 0x00]);
    assert_eq!(dumps_canonical(&CBOR::from(65535u64))?, vec![0x19, 0xff, 0xff]);
    assert_eq!(
        dumps_canonical(&CBOR::from(65536u64))?,
        vec![0x1a, 0x00, 0x01, 0x00, 0x00]
    );
    assert_eq!(
        dumps_canonical(&CBOR::from(4294967295u64))?,
        vec![0x1a, 0xff, 0xff, 0xff, 0xff]
    );
    assert_eq!(
        dumps_canonical(&CBOR::from(4294967296u64))?,
        vec![0x1b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
    );
    Ok(())
}
