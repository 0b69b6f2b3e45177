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
//! # diag - CBOR diagnostic style output for structured binary data
//!
//! CBOR diagnostic notation is defined in RFC8949 and extended slightly in RFC8610.
//!
//! ## Format recap
//!
//! - `<tag> ( <data> )` is used to denote tags.
//! - uint, int, float types are formatted in their natural programming language formats.
//! - -Infinity, +Infinity and NaN are written as you might expect.
//! - true, false, null and undefined mean what you would expect.
//! - Strings are written "as a string" in double quotes.
//! - Byte strings are written as h'0123456789abcdef'.
//!
//! Nesting is capped so that diagnostic output of a cyclic graph terminates; levels beyond the
//! cap print as an ellipsis.
use crate::ast::{Decimal, CBOR};
use crate::constants::tag;

use std::error::Error;
use std::io::Write;

/// Nesting levels beyond this print as "..."; keeps cyclic graphs printable.
const MAX_NESTING: u32 = 64;

/// Trait defining helper functions for conveniently displaying information in CBOR
/// diagnostic format.
pub trait Diag {
    fn cbor_diag(&self, outfp: &mut dyn Write) -> Result<(), Box<dyn Error>>;
}

impl Diag for CBOR {
    fn cbor_diag(&self, outfp: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        self.diag(outfp, 0)?;
        Ok(())
    }
}

/// The DiagFormatter trait should be implemented for any data structure that is intended to be
/// displayed using the CBOR diagnostic format.
pub trait DiagFormatter {
    fn diag(&self, buf: &mut dyn Write, level: u32) -> Result<(), std::io::Error>;
}

impl DiagFormatter for CBOR {
    fn diag(&self, buf: &mut dyn Write, level: u32) -> Result<(), std::io::Error> {
        if level > MAX_NESTING {
            return write!(buf, "...");
        }
        match self {
            CBOR::UInt(v) => write!(buf, "{}", v),
            CBOR::NInt(v) => write!(buf, "{}", -1 - (*v as i128)),
            CBOR::BigNum(v) => write!(buf, "{}", v),
            CBOR::Float(v) => diag_float(buf, *v),
            CBOR::Bstr(bytes) => diag_bstr(buf, bytes),
            CBOR::Tstr(s) => write!(buf, "\"{}\"", s.escape_default()),
            CBOR::Array(cell) => diag_seq(buf, &cell.borrow(), level, "[", "]"),
            CBOR::Tuple(items) => diag_seq(buf, items, level, "[", "]"),
            CBOR::Map(cell) => diag_map(buf, &cell.borrow(), level),
            CBOR::Tag(cell) => {
                let tagged = cell.borrow();
                write!(buf, "{}(", tagged.tag)?;
                tagged.value.diag(buf, level + 1)?;
                write!(buf, ")")
            }
            CBOR::Simple(v) => write!(buf, "simple({})", v),
            CBOR::False => write!(buf, "false"),
            CBOR::True => write!(buf, "true"),
            CBOR::Null => write!(buf, "null"),
            CBOR::Undefined => write!(buf, "undefined"),
            CBOR::Break => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "break marker is not a value",
            )),
            CBOR::DateTime(dt) => write!(buf, "0(\"{}\")", dt.to_rfc3339()),
            CBOR::NaiveDateTime(dt) => write!(buf, "0(\"{}\")", dt),
            CBOR::Date(date) => write!(buf, "0(\"{}\")", date),
            CBOR::Decimal(decimal) => diag_decimal(buf, decimal, level),
            CBOR::Rational(r) => {
                write!(buf, "{}([{}, {}])", tag::RATIONAL, r.numerator, r.denominator)
            }
            CBOR::Regex(re) => write!(buf, "{}(\"{}\")", tag::REGEX, re.as_str().escape_default()),
            CBOR::Mime(s) => write!(buf, "{}(\"{}\")", tag::MIME, s.escape_default()),
            CBOR::Uuid(uuid) => {
                write!(buf, "{}(", tag::UUID)?;
                diag_bstr(buf, uuid.as_bytes())?;
                write!(buf, ")")
            }
            CBOR::Set(cell) => {
                write!(buf, "{}(", tag::SET)?;
                diag_seq(buf, &cell.borrow(), level, "[", "]")?;
                write!(buf, ")")
            }
            CBOR::FrozenSet(members) => {
                write!(buf, "{}(", tag::SET)?;
                diag_seq(buf, members, level, "[", "]")?;
                write!(buf, ")")
            }
        }
    }
}

fn diag_float(buf: &mut dyn Write, v: f64) -> Result<(), std::io::Error> {
    if v.is_nan() {
        write!(buf, "NaN")
    } else if v == f64::INFINITY {
        write!(buf, "+Infinity")
    } else if v == f64::NEG_INFINITY {
        write!(buf, "-Infinity")
    } else {
        write!(buf, "{:?}", v)
    }
}

fn diag_bstr(buf: &mut dyn Write, bytes: &[u8]) -> Result<(), std::io::Error> {
    write!(buf, "h'")?;
    for byte in bytes {
        write!(buf, "{:02x}", byte)?;
    }
    write!(buf, "'")
}

fn diag_seq(
    buf: &mut dyn Write,
    items: &[CBOR],
    level: u32,
    open: &str,
    close: &str,
) -> Result<(), std::io::Error> {
    write!(buf, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(buf, ", ")?;
        }
        item.diag(buf, level + 1)?;
    }
    write!(buf, "{}", close)
}

fn diag_map(
    buf: &mut dyn Write,
    pairs: &[(CBOR, CBOR)],
    level: u32,
) -> Result<(), std::io::Error> {
    write!(buf, "{{")?;
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            write!(buf, ", ")?;
        }
        key.diag(buf, level + 1)?;
        write!(buf, ": ")?;
        value.diag(buf, level + 1)?;
    }
    write!(buf, "}}")
}

fn diag_decimal(buf: &mut dyn Write, decimal: &Decimal, _level: u32) -> Result<(), std::io::Error> {
    match decimal {
        Decimal::Finite { exponent, mantissa } => {
            write!(buf, "{}([{}, {}])", tag::DECIMAL_FRACTION, exponent, mantissa)
        }
        Decimal::NaN => write!(buf, "NaN"),
        Decimal::Infinity => write!(buf, "+Infinity"),
        Decimal::NegInfinity => write!(buf, "-Infinity"),
    }
}

/// Dump a byte buffer as hex, sixteen bytes to a line with offsets. A debugging aid for
/// looking at encoder output next to its diagnostic form.
pub fn print_hex(buf: &[u8], outfp: &mut dyn Write) -> Result<(), std::io::Error> {
    for (line, chunk) in buf.chunks(16).enumerate() {
        write!(outfp, "{:08x} ", line * 16)?;
        for byte in chunk {
            write!(outfp, " {:02x}", byte)?;
        }
        writeln!(outfp)?;
    }
    Ok(())
}
