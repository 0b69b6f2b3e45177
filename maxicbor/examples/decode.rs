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

extern crate maxicbor;

use maxicbor::debug::{print_hex, Diag};
use maxicbor::encoder::CBOREncoder;
use maxicbor::loads;
use maxicbor::types::CBOR;

use std::convert::TryFrom;
use std::error::Error;
use std::io::stdout;

fn main() -> Result<(), Box<dyn Error>> {
    // Just about simplest ever: the below decodes as 1000
    let item = loads(&[0x19, 0x03, 0xe8])?;

    let v1 = u16::try_from(&item); // should succeed
    let v2 = u32::try_from(&item); // should succeed
    let v3 = i32::try_from(&item); // should succeed
    let v4 = u8::try_from(&item); // should fail
    println!("v1 = {:?}, v2 = {:?}, v3 = {:?}, v4 = {:?}", v1, v2, v3, v4);

    // A small structure, printed in diagnostic notation
    let value = CBOR::map(vec![
        (CBOR::from("serial"), CBOR::from(1000u64)),
        (
            CBOR::from("versions"),
            CBOR::array(vec![CBOR::from("3.1"), CBOR::from(1u8)]),
        ),
    ]);
    let bytes = maxicbor::dumps(&value)?;
    print_hex(&bytes, &mut stdout())?;
    loads(&bytes)?.cbor_diag(&mut stdout())?;
    println!();

    // The same structure shared between two slots of an array: with value sharing on, the
    // second occurrence is a tag 29 back-reference
    let both = CBOR::array(vec![value.clone(), value]);
    let mut shared = Vec::new();
    CBOREncoder::new(&mut shared).value_sharing(true).encode(&both)?;
    print_hex(&shared, &mut stdout())?;
    loads(&shared)?.cbor_diag(&mut stdout())?;
    println!();
    Ok(())
}
