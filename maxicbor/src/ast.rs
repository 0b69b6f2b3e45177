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
 * CBOR Abstract Syntax Tree
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949) supporting value
 * sharing, canonical encoding and the common semantic tags.
 **************************************************************************************************/
use crate::error::CBORError;

use std::cell::RefCell;
use std::convert::TryFrom;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use regex::Regex;
use uuid::Uuid;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// A shared, mutable array cell. The cell address is the value identity used by the value
/// sharing subsystem, so two `CBOR::Array` items cloned from the same cell alias each other.
pub type ArrayRef = Rc<RefCell<Vec<CBOR>>>;

/// A shared, mutable map cell holding key/value pairs in insertion order.
pub type MapRef = Rc<RefCell<Vec<(CBOR, CBOR)>>>;

/// A shared, mutable set cell. Members are kept in insertion order; uniqueness is the
/// producer's responsibility, as it is on the wire.
pub type SetRef = Rc<RefCell<Vec<CBOR>>>;

/// A shared, mutable tagged-item cell.
pub type TagRef = Rc<RefCell<Tagged>>;

/// A semantic tag wrapping a single item. Used both for user-supplied tags on encode and for
/// tags with no built-in handler on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    /// The tag number (major type 6 length field).
    pub tag: u64,
    /// The wrapped item.
    pub value: CBOR,
}

/// A decimal fraction (semantic tag 4). A finite value is `mantissa * 10^exponent`; the
/// non-finite classifications exist because they serialize as half-float specials rather
/// than as tag 4.
#[derive(Debug, Clone, PartialEq)]
pub enum Decimal {
    Finite { exponent: i64, mantissa: BigInt },
    NaN,
    Infinity,
    NegInfinity,
}

/// A rational number (semantic tag 30), `numerator / denominator`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    pub numerator: BigInt,
    pub denominator: BigInt,
}

/// The data type for CBOR items.
///
/// CBOR item representations are as follows:
///
/// - Positive and negative integers are stored as a u64 with enum tags used to distinguish
///   positive (UInt) and negative (NInt) numbers. An NInt holds n where the value is -1 - n.
/// - Integers outside the 64-bit ranges are stored as `BigNum` and travel as tag 2/3 bignums.
/// - The bstr and tstr types are owned byte and text buffers.
/// - Arrays, maps, sets and tagged items are reference-counted cells; cloning an item clones
///   the handle, not the contents, and the cell address is the identity used for value
///   sharing (tags 28/29).
/// - `Tuple` and `FrozenSet` are the immutable materializations produced when an array or set
///   is decoded in an immutable context (for example as a map key).
/// - The semantic variants (`DateTime` onwards) are produced and consumed by the tag
///   dispatch table.
/// - `Break` is the internal sentinel for the 0xff break marker and never escapes `decode`.
#[derive(Debug, Clone)]
pub enum CBOR {
    UInt(u64),
    NInt(u64),
    BigNum(BigInt),
    Float(f64),
    Bstr(Vec<u8>),
    Tstr(String),
    Array(ArrayRef),
    Tuple(Rc<Vec<CBOR>>),
    Map(MapRef),
    Tag(TagRef),
    Simple(u8),
    False,
    True,
    Null,
    Undefined,
    Break,
    DateTime(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Decimal(Decimal),
    Rational(Rational),
    Regex(Regex),
    Mime(String),
    Uuid(Uuid),
    Set(SetRef),
    FrozenSet(Rc<Vec<CBOR>>),
}

/// The kind of a CBOR item: one discriminant per [`CBOR`] variant, with `True` and `False`
/// collapsed into `Bool`. Used as the lookup key of the encode-side tag registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    UInt,
    NInt,
    BigNum,
    Float,
    Bstr,
    Tstr,
    Array,
    Tuple,
    Map,
    Tag,
    Simple,
    Bool,
    Null,
    Undefined,
    Break,
    DateTime,
    NaiveDateTime,
    Date,
    Decimal,
    Rational,
    Regex,
    Mime,
    Uuid,
    Set,
    FrozenSet,
}

impl ValueKind {
    /// The parent kind in the subkind relation consulted by the registry fall-through
    /// search: an immutable materialization is a subkind of its mutable counterpart.
    pub fn parent(self) -> Option<ValueKind> {
        match self {
            ValueKind::Tuple => Some(ValueKind::Array),
            ValueKind::FrozenSet => Some(ValueKind::Set),
            _ => None,
        }
    }

    /// Return `true` if `self` is a strict subkind of `other`.
    pub fn is_subkind_of(self, other: ValueKind) -> bool {
        let mut kind = self.parent();
        while let Some(k) = kind {
            if k == other {
                return true;
            }
            kind = k.parent();
        }
        false
    }
}

impl CBOR {
    /// Construct an array item from its members.
    pub fn array(items: Vec<CBOR>) -> CBOR {
        CBOR::Array(Rc::new(RefCell::new(items)))
    }

    /// Construct a map item from its key/value pairs, preserving order.
    pub fn map(pairs: Vec<(CBOR, CBOR)>) -> CBOR {
        CBOR::Map(Rc::new(RefCell::new(pairs)))
    }

    /// Construct a set item from its members.
    pub fn set(members: Vec<CBOR>) -> CBOR {
        CBOR::Set(Rc::new(RefCell::new(members)))
    }

    /// Construct a tagged item.
    pub fn tag(tag: u64, value: CBOR) -> CBOR {
        CBOR::Tag(Rc::new(RefCell::new(Tagged { tag, value })))
    }

    /// The kind of this item.
    #[cfg_attr(feature = "trace", trace)]
    pub fn kind(&self) -> ValueKind {
        match self {
            CBOR::UInt(_) => ValueKind::UInt,
            CBOR::NInt(_) => ValueKind::NInt,
            CBOR::BigNum(_) => ValueKind::BigNum,
            CBOR::Float(_) => ValueKind::Float,
            CBOR::Bstr(_) => ValueKind::Bstr,
            CBOR::Tstr(_) => ValueKind::Tstr,
            CBOR::Array(_) => ValueKind::Array,
            CBOR::Tuple(_) => ValueKind::Tuple,
            CBOR::Map(_) => ValueKind::Map,
            CBOR::Tag(_) => ValueKind::Tag,
            CBOR::Simple(_) => ValueKind::Simple,
            CBOR::False | CBOR::True => ValueKind::Bool,
            CBOR::Null => ValueKind::Null,
            CBOR::Undefined => ValueKind::Undefined,
            CBOR::Break => ValueKind::Break,
            CBOR::DateTime(_) => ValueKind::DateTime,
            CBOR::NaiveDateTime(_) => ValueKind::NaiveDateTime,
            CBOR::Date(_) => ValueKind::Date,
            CBOR::Decimal(_) => ValueKind::Decimal,
            CBOR::Rational(_) => ValueKind::Rational,
            CBOR::Regex(_) => ValueKind::Regex,
            CBOR::Mime(_) => ValueKind::Mime,
            CBOR::Uuid(_) => ValueKind::Uuid,
            CBOR::Set(_) => ValueKind::Set,
            CBOR::FrozenSet(_) => ValueKind::FrozenSet,
        }
    }

    /// The identity of this item for the purposes of value sharing: the address of the
    /// reference-counted cell, or `None` for items without identity.
    pub fn cell_id(&self) -> Option<usize> {
        match self {
            CBOR::Array(rc) => Some(Rc::as_ptr(rc) as usize),
            CBOR::Map(rc) => Some(Rc::as_ptr(rc) as usize),
            CBOR::Set(rc) => Some(Rc::as_ptr(rc) as usize),
            CBOR::Tag(rc) => Some(Rc::as_ptr(rc) as usize),
            CBOR::Tuple(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
            CBOR::FrozenSet(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
            _ => None,
        }
    }
}

/// Structural equality with an identity fast path: two handles to the same cell are equal
/// without looking at the contents, which lets self-referential values compare with
/// themselves. Distinct but isomorphic cyclic graphs are not comparable and will not
/// terminate, as in most host languages.
impl PartialEq for CBOR {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CBOR::UInt(a), CBOR::UInt(b)) => a == b,
            (CBOR::NInt(a), CBOR::NInt(b)) => a == b,
            (CBOR::BigNum(a), CBOR::BigNum(b)) => a == b,
            (CBOR::Float(a), CBOR::Float(b)) => a == b,
            (CBOR::Bstr(a), CBOR::Bstr(b)) => a == b,
            (CBOR::Tstr(a), CBOR::Tstr(b)) => a == b,
            (CBOR::Array(a), CBOR::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (CBOR::Tuple(a), CBOR::Tuple(b)) => Rc::ptr_eq(a, b) || a == b,
            (CBOR::Map(a), CBOR::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (CBOR::Tag(a), CBOR::Tag(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (CBOR::Simple(a), CBOR::Simple(b)) => a == b,
            (CBOR::False, CBOR::False) => true,
            (CBOR::True, CBOR::True) => true,
            (CBOR::Null, CBOR::Null) => true,
            (CBOR::Undefined, CBOR::Undefined) => true,
            (CBOR::Break, CBOR::Break) => true,
            (CBOR::DateTime(a), CBOR::DateTime(b)) => a == b,
            (CBOR::NaiveDateTime(a), CBOR::NaiveDateTime(b)) => a == b,
            (CBOR::Date(a), CBOR::Date(b)) => a == b,
            (CBOR::Decimal(a), CBOR::Decimal(b)) => a == b,
            (CBOR::Rational(a), CBOR::Rational(b)) => a == b,
            (CBOR::Regex(a), CBOR::Regex(b)) => a.as_str() == b.as_str(),
            (CBOR::Mime(a), CBOR::Mime(b)) => a == b,
            (CBOR::Uuid(a), CBOR::Uuid(b)) => a == b,
            (CBOR::Set(a), CBOR::Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (CBOR::FrozenSet(a), CBOR::FrozenSet(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: From value to CBOR. Always succeeds
 **************************************************************************************************/

/// Convert a bool into CBOR
impl From<bool> for CBOR {
    #[inline(always)]
    fn from(v: bool) -> Self {
        if v {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Convert a u8 into CBOR
impl From<u8> for CBOR {
    #[inline(always)]
    fn from(v: u8) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u16 into CBOR
impl From<u16> for CBOR {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u32 into CBOR
impl From<u32> for CBOR {
    #[inline(always)]
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u64 into CBOR
impl From<u64> for CBOR {
    #[inline(always)]
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

/// Convert an i8 into CBOR
impl From<i8> for CBOR {
    #[inline]
    fn from(v: i8) -> Self {
        (v as i64).into()
    }
}

/// Convert an i16 into CBOR
impl From<i16> for CBOR {
    #[inline]
    fn from(v: i16) -> Self {
        (v as i64).into()
    }
}

/// Convert an i32 into CBOR
impl From<i32> for CBOR {
    #[inline]
    fn from(v: i32) -> Self {
        (v as i64).into()
    }
}

/// Convert an i64 into CBOR
impl From<i64> for CBOR {
    #[inline]
    fn from(v: i64) -> Self {
        if v < 0 {
            Self::NInt(!(v as u64))
        } else {
            Self::UInt(v as u64)
        }
    }
}

/// Convert an i128 into CBOR. Values outside the 64-bit wire ranges become bignums.
impl From<i128> for CBOR {
    fn from(v: i128) -> Self {
        if v < 0 {
            let n = -1 - v;
            if n <= u64::MAX as i128 {
                Self::NInt(n as u64)
            } else {
                Self::BigNum(BigInt::from(v))
            }
        } else if v <= u64::MAX as i128 {
            Self::UInt(v as u64)
        } else {
            Self::BigNum(BigInt::from(v))
        }
    }
}

/// Convert a BigInt into CBOR. Values inside the 64-bit wire ranges normalize to
/// `UInt`/`NInt`, matching what the decoder produces for tags 2 and 3.
impl From<BigInt> for CBOR {
    fn from(v: BigInt) -> Self {
        if v.sign() != Sign::Minus {
            match v.to_u64() {
                Some(u) => Self::UInt(u),
                None => Self::BigNum(v),
            }
        } else {
            // Stored magnitude is -1 - v
            let n = -(v.clone() + 1i32);
            match n.to_u64() {
                Some(u) => Self::NInt(u),
                None => Self::BigNum(v),
            }
        }
    }
}

/// Convert an f64 into CBOR
impl From<f64> for CBOR {
    #[inline(always)]
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Convert an f32 into CBOR, widening losslessly
impl From<f32> for CBOR {
    #[inline(always)]
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

/// Convert an &str into CBOR. The text is copied into an owned buffer.
impl From<&str> for CBOR {
    #[inline]
    fn from(v: &str) -> Self {
        Self::Tstr(v.to_owned())
    }
}

/// Convert a String into CBOR
impl From<String> for CBOR {
    #[inline]
    fn from(v: String) -> Self {
        Self::Tstr(v)
    }
}

/// Convert an &[u8] into CBOR. The bytes are copied into an owned buffer.
impl From<&[u8]> for CBOR {
    #[inline]
    fn from(v: &[u8]) -> Self {
        Self::Bstr(v.to_vec())
    }
}

/// Convert a Vec<u8> into CBOR
impl From<Vec<u8>> for CBOR {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Self::Bstr(v)
    }
}

/// Convert a Vec<CBOR> into a CBOR array
impl From<Vec<CBOR>> for CBOR {
    #[inline]
    fn from(v: Vec<CBOR>) -> Self {
        CBOR::array(v)
    }
}

/// Convert a timezone-aware datetime into CBOR
impl From<DateTime<FixedOffset>> for CBOR {
    #[inline]
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(v)
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: Try to convert CBOR into a value. Always fallible
 **************************************************************************************************/

/// Attempt to convert CBOR into bool
impl TryFrom<&CBOR> for bool {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::True => Ok(true),
            CBOR::False => Ok(false),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into u8
impl TryFrom<&CBOR> for u8 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= u8::MAX as u64 => Ok(*v as u8),
            CBOR::UInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into u16
impl TryFrom<&CBOR> for u16 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= u16::MAX as u64 => Ok(*v as u16),
            CBOR::UInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into u32
impl TryFrom<&CBOR> for u32 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= u32::MAX as u64 => Ok(*v as u32),
            CBOR::UInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into u64
impl TryFrom<&CBOR> for u64 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) => Ok(*v),
            CBOR::NInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i8
///
/// This will fail, for unsigned values, if n > i8::MAX
/// This will fail, for negative values, if n < i8::MIN
///
/// For negative values it is sufficient to check the stored magnitude against i8::MAX,
/// because the magnitude is -1 - n: the value -128 (i8::MIN) is stored as 127.
impl TryFrom<&CBOR> for i8 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= i8::MAX as u64 => Ok(*v as i8),
            CBOR::NInt(v) if *v <= i8::MAX as u64 => Ok(-1 - (*v as i8)),
            CBOR::UInt(_) | CBOR::NInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i16
///
/// This will fail, for unsigned values, if n > i16::MAX
/// This will fail, for negative values, if n < i16::MIN
impl TryFrom<&CBOR> for i16 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= i16::MAX as u64 => Ok(*v as i16),
            CBOR::NInt(v) if *v <= i16::MAX as u64 => Ok(-1 - (*v as i16)),
            CBOR::UInt(_) | CBOR::NInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i32
///
/// This will fail, for unsigned values, if n > i32::MAX
/// This will fail, for negative values, if n < i32::MIN
impl TryFrom<&CBOR> for i32 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v <= i32::MAX as u64 => Ok(*v as i32),
            CBOR::NInt(v) if *v <= i32::MAX as u64 => Ok(-1 - (*v as i32)),
            CBOR::UInt(_) | CBOR::NInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i64
///
/// This will fail, for unsigned values, if n > i64::MAX.
/// This will fail, for negative values, if n < i64::MIN: the stored magnitude is -1 - n, so
/// checking the top bit of the stored u64 is sufficient in both directions.
impl TryFrom<&CBOR> for i64 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) if *v & (1 << 63) == 0 => Ok(*v as i64),
            CBOR::NInt(v) if *v & (1 << 63) == 0 => Ok(!(*v) as i64),
            CBOR::UInt(_) | CBOR::NInt(_) => Err(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i128
///
/// This will always succeed for `UInt`/`NInt` as CBOR 64-bit values all fit on 128 bits.
impl TryFrom<&CBOR> for i128 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) => Ok(*v as i128),
            CBOR::NInt(v) => Ok(-1 - (*v as i128)),
            CBOR::BigNum(v) => v.to_i128().ok_or(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into f64
impl TryFrom<&CBOR> for f64 {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Float(v) => Ok(*v),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR item into a String
impl TryFrom<&CBOR> for String {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Tstr(s) => Ok(s.clone()),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR item into a Vec<u8>
impl TryFrom<&CBOR> for Vec<u8> {
    type Error = CBORError;

    fn try_from(value: &CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Bstr(bytes) => Ok(bytes.clone()),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}
