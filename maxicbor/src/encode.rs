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
 * CBOR Encoder
 *
 * A fairly comprehensive serializer for CBOR (RFC8949). The encoder streams items onto any
 * `std::io::Write`, dispatching on the value kind, with optional value sharing (tags 28/29)
 * and a canonical mode producing deterministic output.
 **************************************************************************************************/
use crate::ast::{Decimal, ValueKind, CBOR};
use crate::constants::tag;
use crate::constants::{
    MT_ARRAY, MT_BSTR, MT_MAP, MT_NINT, MT_TAG, MT_TSTR, MT_UINT, PAYLOAD_EIGHT_BYTES,
    PAYLOAD_FOUR_BYTES, PAYLOAD_ONE_BYTE, PAYLOAD_TWO_BYTES,
};
use crate::error::CBOREncodeError;
use crate::halffloat;
use crate::tags::{EncodeFn, EncoderRegistry};

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

/// Selects the encoder dispatch style.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EncodeStyle {
    /// The regular encoders: floats always at 64 bits, maps in insertion order.
    #[default]
    Regular,
    /// Deterministic output: minimal floats, maps and sets sorted by encoded key.
    Canonical,
    /// Skip the built-in fast path entirely and resolve every kind through the registry.
    Custom,
}

/// The fallback handler invoked when no encoder is registered for a value's kind.
pub type DefaultHandler<W> = Rc<dyn Fn(&mut CBOREncoder<W>, &CBOR) -> Result<(), CBOREncodeError>>;

/// Identity table entry for a container seen during the current top-level encode. The value
/// handle keeps the cell alive so its address cannot be reused while the table refers to it.
struct SharedEntry {
    _value: CBOR,
    index: Option<usize>,
}

/// A streaming CBOR encoder over a writer.
///
/// An encoder carries mutable state (the shared-value identity table, the recursion depth and
/// the capture stack) and must not be entered concurrently; distinct instances are
/// independent. The identity table is cleared at the start of every top-level `encode` call.
pub struct CBOREncoder<W> {
    write: W,
    registry: EncoderRegistry<W>,
    default_handler: Option<DefaultHandler<W>>,
    shared: HashMap<usize, SharedEntry>,
    timezone: Option<FixedOffset>,
    timestamp_format: bool,
    value_sharing: bool,
    enc_style: EncodeStyle,
    depth: usize,
    max_depth: usize,
    capture: Vec<Vec<u8>>,
}

impl<W: Write> CBOREncoder<W> {
    /// Construct an encoder over `write` with the default configuration: regular style, no
    /// value sharing, datetimes as RFC3339 strings, no default timezone.
    pub fn new(write: W) -> Self {
        let mut registry = EncoderRegistry::new();
        // The rarely used semantic kinds resolve lazily, in insertion order
        registry.register_deferred(|| ValueKind::Decimal, Self::encode_decimal as EncodeFn<W>);
        registry.register_deferred(|| ValueKind::Rational, Self::encode_rational);
        registry.register_deferred(|| ValueKind::Regex, Self::encode_regex);
        registry.register_deferred(|| ValueKind::Mime, Self::encode_mime);
        registry.register_deferred(|| ValueKind::Uuid, Self::encode_uuid);
        registry.register(ValueKind::Tag, Self::encode_semantic);
        registry.register(ValueKind::Simple, Self::encode_simple);
        registry.register(ValueKind::Undefined, Self::encode_undefined);
        CBOREncoder {
            write,
            registry,
            default_handler: None,
            shared: HashMap::new(),
            timezone: None,
            timestamp_format: false,
            value_sharing: false,
            enc_style: EncodeStyle::Regular,
            depth: 0,
            max_depth: 512,
            capture: Vec::new(),
        }
    }

    /// Encode datetimes as tag 1 epoch timestamps instead of tag 0 strings.
    pub fn datetime_as_timestamp(mut self, enabled: bool) -> Self {
        self.timestamp_format = enabled;
        self
    }

    /// Set the timezone attached to naive datetimes (and used for date promotion).
    pub fn timezone(mut self, tz: FixedOffset) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Enable or disable value sharing. When enabled, containers seen more than once are
    /// emitted once under tag 28 and referenced by tag 29 afterwards, which round-trips
    /// cyclic and aliased graphs. When disabled, a cycle is an error.
    pub fn value_sharing(mut self, enabled: bool) -> Self {
        self.value_sharing = enabled;
        self
    }

    /// Select the dispatch style.
    pub fn style(mut self, style: EncodeStyle) -> Self {
        self.enc_style = style;
        self
    }

    /// Set the handler invoked for kinds with no registered encoder.
    pub fn default_handler(mut self, handler: DefaultHandler<W>) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// Set the maximum value nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Access the encode-side handler registry, to register additional kind handlers.
    pub fn registry_mut(&mut self) -> &mut EncoderRegistry<W> {
        &mut self.registry
    }

    /// Consume the encoder, returning the writer.
    pub fn into_inner(self) -> W {
        self.write
    }

    /***********************************************************************************************
     * Main entry points
     **********************************************************************************************/

    /// Encode a single value onto the writer.
    ///
    /// `encode` is re-entrant: registered handlers and the default handler call back into it
    /// for nested items. Nesting is bounded by the configured maximum depth. On failure the
    /// writer is left with whatever bytes were already flushed; the encoder does not buffer
    /// whole items.
    pub fn encode(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        if self.depth == 0 {
            self.shared.clear();
        }
        if self.depth >= self.max_depth {
            return Err(CBOREncodeError::RecursionLimit);
        }
        self.depth += 1;
        let ret = self.encode_item(value);
        self.depth -= 1;
        ret
    }

    /// Encode a single value into a fresh byte buffer, leaving the writer untouched. Runs on
    /// the same encoder state, so shared-value identities assigned here stay consistent with
    /// the surrounding encode.
    pub fn encode_to_bytes(&mut self, value: &CBOR) -> Result<Vec<u8>, CBOREncodeError> {
        self.capture.push(Vec::new());
        let ret = self.encode(value);
        let bytes = self.capture.pop().unwrap_or_default();
        ret?;
        Ok(bytes)
    }

    fn encode_item(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        match self.enc_style {
            EncodeStyle::Canonical => match value {
                CBOR::Float(v) => return self.encode_minimal_float(*v),
                CBOR::Map(_) => return self.encode_shared(Self::encode_canonical_map_inner, value),
                CBOR::Set(_) | CBOR::FrozenSet(_) => {
                    return self.encode_shared(Self::encode_canonical_set_inner, value)
                }
                _ => {}
            },
            EncodeStyle::Custom => return self.encode_with_registry(value),
            EncodeStyle::Regular => {}
        }
        match value {
            CBOR::Bstr(bytes) => self.encode_bytes(bytes),
            CBOR::Tstr(text) => self.encode_string(text),
            CBOR::UInt(v) => self.encode_length(MT_UINT, *v),
            CBOR::NInt(v) => self.encode_length(MT_NINT, *v),
            CBOR::BigNum(v) => self.encode_bignum(v),
            CBOR::Float(v) => self.encode_float(*v),
            CBOR::True => self.fp_write(&[0xf5]),
            CBOR::False => self.fp_write(&[0xf4]),
            CBOR::Null => self.fp_write(&[0xf6]),
            CBOR::Array(_) | CBOR::Tuple(_) => self.encode_shared(Self::encode_array_inner, value),
            CBOR::Map(_) => self.encode_shared(Self::encode_map_inner, value),
            CBOR::DateTime(dt) => self.encode_datetime(*dt),
            CBOR::NaiveDateTime(dt) => self.encode_naive_datetime(*dt),
            CBOR::Date(date) => self.encode_date(*date),
            CBOR::Set(_) | CBOR::FrozenSet(_) => self.encode_shared(Self::encode_set_inner, value),
            _ => self.encode_with_registry(value),
        }
    }

    fn encode_with_registry(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let kind = value.kind();
        if let Some(handler) = self.registry.lookup(kind) {
            handler(self, value)
        } else if let Some(default) = self.default_handler.clone() {
            default(self, value)
        } else {
            Err(CBOREncodeError::NoEncoder(kind))
        }
    }

    /***********************************************************************************************
     * Byte-level output
     **********************************************************************************************/

    /// Write pre-encoded bytes directly to the output. Intended for registered handlers and
    /// default handlers that assemble item bytes themselves.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), CBOREncodeError> {
        self.fp_write(bytes)
    }

    fn fp_write(&mut self, buf: &[u8]) -> Result<(), CBOREncodeError> {
        match self.capture.last_mut() {
            Some(capture) => {
                capture.extend_from_slice(buf);
                Ok(())
            }
            None => Ok(self.write.write_all(buf)?),
        }
    }

    /// Write the head of an item: the MT/AI byte, with the length on the AI bits when it fits
    /// and on the following 1, 2, 4 or 8 bytes otherwise. The shortest form that fits is
    /// always chosen.
    pub(crate) fn encode_length(&mut self, major: u8, length: u64) -> Result<(), CBOREncodeError> {
        if length < 24 {
            self.fp_write(&[major << 5 | length as u8])
        } else if length <= u8::MAX as u64 {
            self.fp_write(&[major << 5 | PAYLOAD_ONE_BYTE, length as u8])
        } else if length <= u16::MAX as u64 {
            let mut buf = [major << 5 | PAYLOAD_TWO_BYTES, 0, 0];
            buf[1..].copy_from_slice(&(length as u16).to_be_bytes());
            self.fp_write(&buf)
        } else if length <= u32::MAX as u64 {
            let mut buf = [major << 5 | PAYLOAD_FOUR_BYTES, 0, 0, 0, 0];
            buf[1..].copy_from_slice(&(length as u32).to_be_bytes());
            self.fp_write(&buf)
        } else {
            let mut buf = [major << 5 | PAYLOAD_EIGHT_BYTES, 0, 0, 0, 0, 0, 0, 0, 0];
            buf[1..].copy_from_slice(&length.to_be_bytes());
            self.fp_write(&buf)
        }
    }

    /***********************************************************************************************
     * Shared-reference wrapper
     **********************************************************************************************/

    /// Serialize a container through the identity table.
    ///
    /// With sharing enabled, the first sight of a cell assigns it the next index and wraps the
    /// encoding in tag 28; later sights emit tag 29 plus the index. With sharing disabled the
    /// table only detects re-entrant sights, which are cycles and fail.
    fn encode_shared(
        &mut self,
        encoder: EncodeFn<W>,
        value: &CBOR,
    ) -> Result<(), CBOREncodeError> {
        let id = match value.cell_id() {
            Some(id) => id,
            None => return encoder(self, value),
        };
        if self.value_sharing {
            match self.shared.get(&id).map(|entry| entry.index) {
                Some(Some(index)) => {
                    self.encode_length(MT_TAG, tag::SHARED_REF)?;
                    self.encode_length(MT_UINT, index as u64)
                }
                Some(None) => Err(CBOREncodeError::CyclicStructure),
                None => {
                    let index = self.shared.len();
                    self.shared.insert(
                        id,
                        SharedEntry {
                            _value: value.clone(),
                            index: Some(index),
                        },
                    );
                    self.encode_length(MT_TAG, tag::SHAREABLE)?;
                    encoder(self, value)
                }
            }
        } else if self.shared.contains_key(&id) {
            Err(CBOREncodeError::CyclicStructure)
        } else {
            self.shared.insert(
                id,
                SharedEntry {
                    _value: value.clone(),
                    index: None,
                },
            );
            let ret = encoder(self, value);
            self.shared.remove(&id);
            ret
        }
    }

    /***********************************************************************************************
     * Regular encoders
     **********************************************************************************************/

    /// Serialize an integer of arbitrary precision: major type 0/1 when the magnitude fits 64
    /// bits, otherwise a tag 2/3 bignum holding the minimal big-endian bytes of the magnitude
    /// (of -1 - v for negative values).
    fn encode_bignum(&mut self, value: &BigInt) -> Result<(), CBOREncodeError> {
        if value.sign() != Sign::Minus {
            if let Some(v) = value.to_u64() {
                return self.encode_length(MT_UINT, v);
            }
            let (_, bytes) = value.to_bytes_be();
            self.encode_length(MT_TAG, tag::POS_BIGNUM)?;
            self.encode_length(MT_BSTR, bytes.len() as u64)?;
            self.fp_write(&bytes)
        } else {
            let magnitude = -(value.clone() + 1i32);
            if let Some(v) = magnitude.to_u64() {
                return self.encode_length(MT_NINT, v);
            }
            let (_, bytes) = magnitude.to_bytes_be();
            self.encode_length(MT_TAG, tag::NEG_BIGNUM)?;
            self.encode_length(MT_BSTR, bytes.len() as u64)?;
            self.fp_write(&bytes)
        }
    }

    fn encode_bytes(&mut self, bytes: &[u8]) -> Result<(), CBOREncodeError> {
        self.encode_length(MT_BSTR, bytes.len() as u64)?;
        self.fp_write(bytes)
    }

    fn encode_string(&mut self, text: &str) -> Result<(), CBOREncodeError> {
        self.encode_length(MT_TSTR, text.len() as u64)?;
        self.fp_write(text.as_bytes())
    }

    /// Serialize a float at full width. NaN and the infinities use their canonical half-float
    /// forms in every style.
    fn encode_float(&mut self, value: f64) -> Result<(), CBOREncodeError> {
        if value.is_nan() {
            self.fp_write(&halffloat::NAN_BYTES)
        } else if value.is_infinite() {
            if value > 0.0 {
                self.fp_write(&halffloat::POS_INF_BYTES)
            } else {
                self.fp_write(&halffloat::NEG_INF_BYTES)
            }
        } else {
            let mut buf = [0u8; 9];
            buf[0] = 0xfb;
            buf[1..].copy_from_slice(&value.to_be_bytes());
            self.fp_write(&buf)
        }
    }

    fn encode_array_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let items: Vec<CBOR> = match value {
            CBOR::Array(cell) => cell.borrow().clone(),
            CBOR::Tuple(items) => items.as_ref().clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_ARRAY, items.len() as u64)?;
        for item in &items {
            self.encode(item)?;
        }
        Ok(())
    }

    fn encode_map_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let pairs: Vec<(CBOR, CBOR)> = match value {
            CBOR::Map(cell) => cell.borrow().clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_MAP, pairs.len() as u64)?;
        for (key, val) in &pairs {
            self.encode(key)?;
            self.encode(val)?;
        }
        Ok(())
    }

    fn encode_set_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let members: Vec<CBOR> = match value {
            CBOR::Set(cell) => cell.borrow().clone(),
            CBOR::FrozenSet(members) => members.as_ref().clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag::SET)?;
        self.encode_length(MT_ARRAY, members.len() as u64)?;
        for member in &members {
            self.encode(member)?;
        }
        Ok(())
    }

    /// Serialize a user-supplied tagged item: major type 6 with the tag number, then the
    /// wrapped item.
    fn encode_semantic(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        self.encode_shared(Self::encode_semantic_inner, value)
    }

    fn encode_semantic_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let (tag_number, inner) = match value {
            CBOR::Tag(cell) => {
                let tagged = cell.borrow();
                (tagged.tag, tagged.value.clone())
            }
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag_number)?;
        self.encode(&inner)
    }

    /// Serialize a simple value. Values 0..=19 ride on the AI bits; 32..=255 take the two-byte
    /// form. 20..=23 are the booleans, null and undefined, and 24..=31 are reserved, so none
    /// of 20..=31 may appear as an explicit simple value.
    fn encode_simple(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let v = match value {
            CBOR::Simple(v) => *v,
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        if v < 20 {
            self.fp_write(&[0xe0 | v])
        } else if v < 32 {
            Err(CBOREncodeError::ReservedSimple(v))
        } else {
            self.fp_write(&[0xf8, v])
        }
    }

    fn encode_undefined(&mut self, _value: &CBOR) -> Result<(), CBOREncodeError> {
        self.fp_write(&[0xf7])
    }

    /***********************************************************************************************
     * Dates and times
     **********************************************************************************************/

    fn encode_datetime(&mut self, value: DateTime<FixedOffset>) -> Result<(), CBOREncodeError> {
        if self.timestamp_format {
            self.encode_timestamp(value)
        } else {
            self.encode_datestr(value)
        }
    }

    /// Tag 1: seconds relative to the POSIX epoch, as an integer when the value is whole and
    /// as a float otherwise.
    fn encode_timestamp(&mut self, value: DateTime<FixedOffset>) -> Result<(), CBOREncodeError> {
        self.fp_write(&[0xc1])?;
        let micros = value.timestamp_subsec_micros();
        if micros == 0 {
            let secs = value.timestamp();
            if secs < 0 {
                self.encode_length(MT_NINT, !(secs as u64))
            } else {
                self.encode_length(MT_UINT, secs as u64)
            }
        } else {
            self.encode_float(value.timestamp() as f64 + micros as f64 / 1e6)
        }
    }

    /// Tag 0: an RFC3339 string. A `+00:00` suffix is rewritten as a trailing `Z`.
    fn encode_datestr(&mut self, value: DateTime<FixedOffset>) -> Result<(), CBOREncodeError> {
        let mut text = value.to_rfc3339();
        if text.ends_with("+00:00") {
            text.truncate(text.len() - 6);
            text.push('Z');
        }
        self.fp_write(&[0xc0])?;
        self.encode_string(&text)
    }

    /// A datetime without an offset takes the encoder's default timezone; with no default set
    /// it cannot be encoded.
    fn encode_naive_datetime(&mut self, value: NaiveDateTime) -> Result<(), CBOREncodeError> {
        match self.timezone {
            Some(tz) => {
                let aware = value
                    .and_local_timezone(tz)
                    .single()
                    .ok_or(CBOREncodeError::NaiveDatetime)?;
                self.encode_datetime(aware)
            }
            None => Err(CBOREncodeError::NaiveDatetime),
        }
    }

    /// A bare date promotes to midnight in the default timezone and encodes as a datetime.
    fn encode_date(&mut self, value: NaiveDate) -> Result<(), CBOREncodeError> {
        self.encode_naive_datetime(value.and_time(NaiveTime::MIN))
    }

    /***********************************************************************************************
     * Registry-resolved semantic encoders
     **********************************************************************************************/

    /// Tag 4: `[exponent, mantissa]`. Non-finite decimals serialize as the corresponding
    /// half-float specials. The bracketing array is emitted directly, outside the sharing
    /// machinery.
    fn encode_decimal(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let decimal = match value {
            CBOR::Decimal(d) => d.clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        match decimal {
            Decimal::NaN => self.fp_write(&halffloat::NAN_BYTES),
            Decimal::Infinity => self.fp_write(&halffloat::POS_INF_BYTES),
            Decimal::NegInfinity => self.fp_write(&halffloat::NEG_INF_BYTES),
            Decimal::Finite { exponent, mantissa } => {
                self.encode_length(MT_TAG, tag::DECIMAL_FRACTION)?;
                self.encode_length(MT_ARRAY, 2)?;
                if exponent < 0 {
                    self.encode_length(MT_NINT, !(exponent as u64))?;
                } else {
                    self.encode_length(MT_UINT, exponent as u64)?;
                }
                self.encode_bignum(&mantissa)
            }
        }
    }

    /// Tag 30: `[numerator, denominator]`, emitted directly, outside the sharing machinery.
    fn encode_rational(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let rational = match value {
            CBOR::Rational(r) => r.clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag::RATIONAL)?;
        self.encode_length(MT_ARRAY, 2)?;
        self.encode_bignum(&rational.numerator)?;
        self.encode_bignum(&rational.denominator)
    }

    /// Tag 35: the regular expression source text.
    fn encode_regex(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let pattern = match value {
            CBOR::Regex(re) => re.as_str().to_owned(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag::REGEX)?;
        self.encode_string(&pattern)
    }

    /// Tag 36: the serialized MIME message text.
    fn encode_mime(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let message = match value {
            CBOR::Mime(text) => text.clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag::MIME)?;
        self.encode_string(&message)
    }

    /// Tag 37: the 16-byte binary form of the UUID.
    fn encode_uuid(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let uuid = match value {
            CBOR::Uuid(uuid) => *uuid,
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        self.encode_length(MT_TAG, tag::UUID)?;
        self.encode_bytes(uuid.as_bytes())
    }

    /***********************************************************************************************
     * Canonical encoders
     **********************************************************************************************/

    /// Serialize a float at the smallest width among half, single and double that preserves
    /// the value exactly.
    fn encode_minimal_float(&mut self, value: f64) -> Result<(), CBOREncodeError> {
        if value.is_nan() {
            self.fp_write(&halffloat::NAN_BYTES)
        } else if value.is_infinite() {
            if value > 0.0 {
                self.fp_write(&halffloat::POS_INF_BYTES)
            } else {
                self.fp_write(&halffloat::NEG_INF_BYTES)
            }
        } else if let Some(bits) = halffloat::pack(value) {
            let mut buf = [0xf9, 0, 0];
            buf[1..].copy_from_slice(&bits.to_be_bytes());
            self.fp_write(&buf)
        } else if let Some(single) = halffloat::narrow_single(value) {
            let mut buf = [0xfa, 0, 0, 0, 0];
            buf[1..].copy_from_slice(&single.to_be_bytes());
            self.fp_write(&buf)
        } else {
            let mut buf = [0u8; 9];
            buf[0] = 0xfb;
            buf[1..].copy_from_slice(&value.to_be_bytes());
            self.fp_write(&buf)
        }
    }

    /// Serialize a map with its entries ordered by the length, then the bytes, of each
    /// pre-encoded key. The keys are pre-encoded on this encoder, then written verbatim.
    fn encode_canonical_map_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let pairs: Vec<(CBOR, CBOR)> = match value {
            CBOR::Map(cell) => cell.borrow().clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        let mut keyed: Vec<(Vec<u8>, CBOR)> = Vec::with_capacity(pairs.len());
        for (key, val) in &pairs {
            let bytes = self.encode_to_bytes(key)?;
            keyed.push((bytes, val.clone()));
        }
        keyed.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
        self.encode_length(MT_MAP, keyed.len() as u64)?;
        for (key_bytes, val) in &keyed {
            self.fp_write(key_bytes)?;
            self.encode(val)?;
        }
        Ok(())
    }

    /// Serialize a set with its members ordered by the length, then the bytes, of their
    /// pre-encoded forms.
    fn encode_canonical_set_inner(&mut self, value: &CBOR) -> Result<(), CBOREncodeError> {
        let members: Vec<CBOR> = match value {
            CBOR::Set(cell) => cell.borrow().clone(),
            CBOR::FrozenSet(members) => members.as_ref().clone(),
            _ => return Err(CBOREncodeError::NoEncoder(value.kind())),
        };
        let mut encoded: Vec<Vec<u8>> = Vec::with_capacity(members.len());
        for member in &members {
            encoded.push(self.encode_to_bytes(member)?);
        }
        encoded.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        self.encode_length(MT_TAG, tag::SET)?;
        self.encode_length(MT_ARRAY, encoded.len() as u64)?;
        for member_bytes in &encoded {
            self.fp_write(member_bytes)?;
        }
        Ok(())
    }
}
