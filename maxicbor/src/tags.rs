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
 * maxicbor semantic tag support
 *
 * Two-layer structure: the encode side is an insertion-ordered map from value kind to handler,
 * supporting deferred entries and a subkind fall-through search; the decode side is a fixed
 * dispatch over the tag numbers with built-in handlers.
 **************************************************************************************************/
use crate::ast::{Decimal, Rational, Tagged, ValueKind, CBOR};
use crate::constants::tag;
use crate::decode::CBORDecoder;
use crate::encode::CBOREncoder;
use crate::error::{CBORDecodeError, CBOREncodeError};

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};
use regex::Regex;
use uuid::Uuid;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/***************************************************************************************************
 * Encode-side registry
 **************************************************************************************************/

/// An encode handler: serializes values of one kind on the given encoder.
pub type EncodeFn<W> = fn(&mut CBOREncoder<W>, &CBOR) -> Result<(), CBOREncodeError>;

/// A loader for a deferred registry entry, producing the kind the entry applies to. Invoked at
/// most once, on the first lookup that has to walk the registry.
pub type KindLoader = fn() -> ValueKind;

enum RegistryKey {
    Resolved(ValueKind),
    Deferred {
        cell: OnceLock<ValueKind>,
        loader: KindLoader,
    },
}

/// The encode-side handler registry: an insertion-ordered map from value kind to encode
/// handler.
///
/// A lookup first consults the exact-kind index. On a miss it walks the entries in insertion
/// order, materializing deferred entries as it goes, and accepts the first entry whose kind the
/// probe kind is a subkind of; a hit is memoized under the concrete kind so subsequent lookups
/// are O(1).
pub struct EncoderRegistry<W> {
    entries: Vec<(RegistryKey, EncodeFn<W>)>,
    index: HashMap<ValueKind, usize>,
}

impl<W> EncoderRegistry<W> {
    /// Construct an empty registry.
    pub fn new() -> Self {
        EncoderRegistry {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous handler for the same kind.
    pub fn register(&mut self, kind: ValueKind, handler: EncodeFn<W>) {
        if let Some(&i) = self.index.get(&kind) {
            self.entries[i].1 = handler;
        } else {
            self.entries.push((RegistryKey::Resolved(kind), handler));
            self.index.insert(kind, self.entries.len() - 1);
        }
    }

    /// Register `handler` under a deferred key. The loader runs at most once, on the first
    /// lookup that misses the exact-kind index, and its result replaces the deferred key.
    pub fn register_deferred(&mut self, loader: KindLoader, handler: EncodeFn<W>) {
        self.entries.push((
            RegistryKey::Deferred {
                cell: OnceLock::new(),
                loader,
            },
            handler,
        ));
    }

    /// Find the handler for `kind`, if any.
    pub fn lookup(&mut self, kind: ValueKind) -> Option<EncodeFn<W>> {
        if let Some(&i) = self.index.get(&kind) {
            return Some(self.entries[i].1);
        }
        for i in 0..self.entries.len() {
            let entry_kind = match &self.entries[i].0 {
                RegistryKey::Resolved(k) => *k,
                RegistryKey::Deferred { cell, loader } => {
                    let k = *cell.get_or_init(*loader);
                    self.entries[i].0 = RegistryKey::Resolved(k);
                    self.index.insert(k, i);
                    k
                }
            };
            if kind == entry_kind || kind.is_subkind_of(entry_kind) {
                // Memoize so the fall-through search runs at most once per concrete kind
                self.index.insert(kind, i);
                return Some(self.entries[i].1);
            }
        }
        None
    }
}

impl<W> Default for EncoderRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

/***************************************************************************************************
 * Decode-side dispatch
 **************************************************************************************************/

/// Decode the item following a major type 6 head and apply the built-in handler for the tag,
/// falling back to a generic tagged item (routed through the tag hook when one is set).
pub(crate) fn decode_tagged<R: Read>(
    d: &mut CBORDecoder<R>,
    tag_number: u64,
    immutable: bool,
) -> Result<CBOR, CBORDecodeError> {
    match tag_number {
        tag::DATE_STRING => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_datetime_string(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::EPOCH => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_epoch(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::POS_BIGNUM => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_bignum(&inner, false)?;
            Ok(d.set_shareable(ret))
        }
        tag::NEG_BIGNUM => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_bignum(&inner, true)?;
            Ok(d.set_shareable(ret))
        }
        tag::DECIMAL_FRACTION => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_decimal(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::BIGFLOAT => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_bigfloat(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::SHAREABLE => decode_shareable(d, immutable),
        tag::SHARED_REF => {
            let inner = d.decode_child(false, true)?;
            decode_shared_ref(d, &inner)
        }
        tag::RATIONAL => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_rational(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::REGEX => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_regex(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::MIME => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_mime(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::UUID => {
            let inner = d.decode_child(immutable, true)?;
            let ret = decode_uuid(&inner)?;
            Ok(d.set_shareable(ret))
        }
        tag::SET => decode_set(d, immutable),
        _ => decode_unknown(d, tag_number, immutable),
    }
}

/// Tag 28: allocate the next shareable slot, point the cursor at it, decode the wrapped item
/// and restore the cursor. The placeholder exists before the inner item is decoded so that
/// references from within the item's own children resolve; if the item published nothing (a
/// value without children) the slot is filled here instead.
fn decode_shareable<R: Read>(
    d: &mut CBORDecoder<R>,
    immutable: bool,
) -> Result<CBOR, CBORDecodeError> {
    let old_index = d.share_index;
    let slot = d.shareables.len();
    d.shareables.push(None);
    d.share_index = Some(slot);
    let ret = d.decode_item(immutable, false);
    // The cursor is restored on the error path too, so later independent shareables in the
    // same decode are not corrupted
    d.share_index = old_index;
    let value = ret?;
    if d.shareables[slot].is_none() {
        d.shareables[slot] = Some(value.clone());
    }
    Ok(value)
}

/// Tag 29: dereference a previously established shareable slot.
fn decode_shared_ref<R: Read>(
    d: &mut CBORDecoder<R>,
    inner: &CBOR,
) -> Result<CBOR, CBORDecodeError> {
    let index = match inner {
        CBOR::UInt(n) => *n,
        _ => return Err(CBORDecodeError::BadSharedIndex),
    };
    let slot = usize::try_from(index).map_err(|_| CBORDecodeError::SharedRefOutOfRange(index))?;
    match d.shareables.get(slot) {
        Some(Some(value)) => Ok(value.clone()),
        Some(None) => Err(CBORDecodeError::SharedRefUnset(slot)),
        None => Err(CBORDecodeError::SharedRefOutOfRange(index)),
    }
}

/// Tag 258: a set wrapped around an array. Members are decoded in immutable mode, as they are
/// in the host model required to be hashable set elements.
fn decode_set<R: Read>(d: &mut CBORDecoder<R>, immutable: bool) -> Result<CBOR, CBORDecodeError> {
    let inner = d.decode_child(true, true)?;
    let members = match inner {
        CBOR::Tuple(items) => items.as_ref().clone(),
        CBOR::Array(items) => items.borrow().clone(),
        _ => {
            return Err(CBORDecodeError::BadTagPayload {
                tag: tag::SET,
                reason: "expected an array of members",
            })
        }
    };
    let ret = if immutable {
        CBOR::FrozenSet(Rc::new(members))
    } else {
        CBOR::Set(Rc::new(RefCell::new(members)))
    };
    Ok(d.set_shareable(ret))
}

/// A tag with no built-in handler: build a tagged item, publishing it before the wrapped item
/// is decoded so self-references through unknown tags resolve, then pass it through the tag
/// hook when one is registered.
fn decode_unknown<R: Read>(
    d: &mut CBORDecoder<R>,
    tag_number: u64,
    immutable: bool,
) -> Result<CBOR, CBORDecodeError> {
    let cell = Rc::new(RefCell::new(Tagged {
        tag: tag_number,
        value: CBOR::Null,
    }));
    let ret = d.set_shareable(CBOR::Tag(cell.clone()));
    let inner = d.decode_child(immutable, true)?;
    cell.borrow_mut().value = inner;
    if let Some(hook) = d.tag_hook.clone() {
        let transformed = hook(d, ret)?;
        Ok(d.set_shareable(transformed))
    } else {
        Ok(ret)
    }
}

/***************************************************************************************************
 * Built-in semantic handlers
 **************************************************************************************************/

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-(\d\d)-(\d\d)T(\d\d):(\d\d):(\d\d)(?:\.(\d{1,6})\d*)?(?:Z|([+-]\d\d):(\d\d))$",
        )
        .expect("datetime pattern compiles")
    })
}

/// Tag 0: an RFC3339 date/time string. Fractional seconds are accepted up to six digits and
/// zero-padded to microseconds; the offset is either `Z` or `+-HH:MM`.
#[cfg_attr(feature = "trace", trace)]
fn decode_datetime_string(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    let text = match inner {
        CBOR::Tstr(s) => s,
        _ => {
            return Err(CBORDecodeError::BadTagPayload {
                tag: tag::DATE_STRING,
                reason: "expected a text string",
            })
        }
    };
    let caps = datetime_re()
        .captures(text)
        .ok_or(CBORDecodeError::BadDateTime)?;
    let field = |i: usize| -> Result<u32, CBORDecodeError> {
        caps[i].parse().map_err(|_| CBORDecodeError::BadDateTime)
    };
    let year: i32 = caps[1].parse().map_err(|_| CBORDecodeError::BadDateTime)?;
    let (month, day) = (field(2)?, field(3)?);
    let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);
    let micros: u32 = match caps.get(7) {
        Some(frac) => format!("{:0<6}", frac.as_str())
            .parse()
            .map_err(|_| CBORDecodeError::BadDateTime)?,
        None => 0,
    };
    let offset_secs = match caps.get(8) {
        Some(hh) => {
            // The sign is read off the text: "-00" parses to 0 and would lose it
            let hours: i32 = hh.as_str().parse().map_err(|_| CBORDecodeError::BadDateTime)?;
            let minutes: i32 = caps[9].parse().map_err(|_| CBORDecodeError::BadDateTime)?;
            let magnitude = hours.abs() * 3600 + minutes * 60;
            if hh.as_str().starts_with('-') {
                -magnitude
            } else {
                magnitude
            }
        }
        None => 0,
    };
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_micro_opt(hour, minute, second, micros))
        .ok_or(CBORDecodeError::BadDateTime)?;
    let offset = FixedOffset::east_opt(offset_secs).ok_or(CBORDecodeError::BadDateTime)?;
    let datetime = naive
        .and_local_timezone(offset)
        .single()
        .ok_or(CBORDecodeError::BadDateTime)?;
    Ok(CBOR::DateTime(datetime))
}

/// Tag 1: seconds relative to the POSIX epoch, as an integer or a float, in UTC.
fn decode_epoch(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    let utc = match inner {
        CBOR::UInt(n) => {
            let secs = i64::try_from(*n).map_err(|_| CBORDecodeError::BadDateTime)?;
            DateTime::from_timestamp(secs, 0)
        }
        CBOR::NInt(n) => {
            let secs = i64::try_from(*n)
                .ok()
                .and_then(|v| (-1i64).checked_sub(v))
                .ok_or(CBORDecodeError::BadDateTime)?;
            DateTime::from_timestamp(secs, 0)
        }
        CBOR::Float(f) if f.is_finite() => DateTime::from_timestamp_micros((*f * 1e6).round() as i64),
        _ => {
            return Err(CBORDecodeError::BadTagPayload {
                tag: tag::EPOCH,
                reason: "expected an integer or float",
            })
        }
    };
    let datetime = utc.ok_or(CBORDecodeError::BadDateTime)?;
    Ok(CBOR::DateTime(datetime.fixed_offset()))
}

/// Tags 2 and 3: an arbitrary precision integer held in a byte string, big-endian. Values that
/// fit the 64-bit wire ranges normalize to plain integers.
fn decode_bignum(inner: &CBOR, negative: bool) -> Result<CBOR, CBORDecodeError> {
    let bytes = match inner {
        CBOR::Bstr(bytes) => bytes,
        _ => {
            return Err(CBORDecodeError::BadTagPayload {
                tag: if negative { tag::NEG_BIGNUM } else { tag::POS_BIGNUM },
                reason: "expected a byte string",
            })
        }
    };
    let magnitude = BigInt::from(BigUint::from_bytes_be(bytes));
    let value = if negative { -1 - magnitude } else { magnitude };
    Ok(CBOR::from(value))
}

fn as_bigint(item: &CBOR) -> Option<BigInt> {
    match item {
        CBOR::UInt(n) => Some(BigInt::from(*n)),
        CBOR::NInt(n) => Some(-1 - BigInt::from(*n)),
        CBOR::BigNum(n) => Some(n.clone()),
        _ => None,
    }
}

fn as_i64(item: &CBOR) -> Option<i64> {
    match item {
        CBOR::UInt(n) => i64::try_from(*n).ok(),
        CBOR::NInt(n) => i64::try_from(*n).ok().and_then(|v| (-1i64).checked_sub(v)),
        _ => None,
    }
}

fn pair(inner: &CBOR) -> Option<(CBOR, CBOR)> {
    match inner {
        CBOR::Tuple(items) if items.len() == 2 => Some((items[0].clone(), items[1].clone())),
        CBOR::Array(items) => {
            let items = items.borrow();
            if items.len() == 2 {
                Some((items[0].clone(), items[1].clone()))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Tag 4: a decimal fraction `[exponent, mantissa]`, value `mantissa * 10^exponent`.
fn decode_decimal(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    let bad = CBORDecodeError::BadTagPayload {
        tag: tag::DECIMAL_FRACTION,
        reason: "expected [exponent, mantissa]",
    };
    let (exp, mantissa) = pair(inner).ok_or(bad)?;
    match (as_i64(&exp), as_bigint(&mantissa)) {
        (Some(exponent), Some(mantissa)) => Ok(CBOR::Decimal(Decimal::Finite { exponent, mantissa })),
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::DECIMAL_FRACTION,
            reason: "expected [exponent, mantissa]",
        }),
    }
}

/// Tag 5: a bigfloat `[exponent, mantissa]`, value `mantissa * 2^exponent`, widened to f64.
fn decode_bigfloat(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    let bad = CBORDecodeError::BadTagPayload {
        tag: tag::BIGFLOAT,
        reason: "expected [exponent, mantissa]",
    };
    let (exp, mantissa) = pair(inner).ok_or(bad)?;
    match (as_i64(&exp), as_bigint(&mantissa)) {
        (Some(exponent), Some(mantissa)) => {
            let m = mantissa.to_f64().unwrap_or(f64::NAN);
            let value = if m == 0.0 {
                0.0
            } else if exponent > 1100 {
                m * f64::INFINITY
            } else if exponent < -1100 {
                m * 0.0
            } else {
                m * 2f64.powi(exponent as i32)
            };
            Ok(CBOR::Float(value))
        }
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::BIGFLOAT,
            reason: "expected [exponent, mantissa]",
        }),
    }
}

/// Tag 30: a rational `[numerator, denominator]`.
fn decode_rational(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    let bad = CBORDecodeError::BadTagPayload {
        tag: tag::RATIONAL,
        reason: "expected [numerator, denominator]",
    };
    let (num, den) = pair(inner).ok_or(bad)?;
    match (as_bigint(&num), as_bigint(&den)) {
        (Some(numerator), Some(denominator)) => {
            if denominator.is_zero() {
                Err(CBORDecodeError::BadTagPayload {
                    tag: tag::RATIONAL,
                    reason: "zero denominator",
                })
            } else {
                Ok(CBOR::Rational(Rational {
                    numerator,
                    denominator,
                }))
            }
        }
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::RATIONAL,
            reason: "expected [numerator, denominator]",
        }),
    }
}

/// Tag 35: a compiled regular expression from its source text.
fn decode_regex(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    match inner {
        CBOR::Tstr(pattern) => Regex::new(pattern)
            .map(CBOR::Regex)
            .map_err(|_| CBORDecodeError::BadTagPayload {
                tag: tag::REGEX,
                reason: "pattern does not compile",
            }),
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::REGEX,
            reason: "expected a text string",
        }),
    }
}

/// Tag 36: a MIME message kept as its serialized text.
fn decode_mime(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    match inner {
        CBOR::Tstr(message) => Ok(CBOR::Mime(message.clone())),
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::MIME,
            reason: "expected a text string",
        }),
    }
}

/// Tag 37: a binary UUID.
fn decode_uuid(inner: &CBOR) -> Result<CBOR, CBORDecodeError> {
    match inner {
        CBOR::Bstr(bytes) => Uuid::from_slice(bytes)
            .map(CBOR::Uuid)
            .map_err(|_| CBORDecodeError::BadTagPayload {
                tag: tag::UUID,
                reason: "expected 16 bytes",
            }),
        _ => Err(CBORDecodeError::BadTagPayload {
            tag: tag::UUID,
            reason: "expected a byte string",
        }),
    }
}
