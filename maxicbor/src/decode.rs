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
 * CBOR Decoder
 *
 * A fairly comprehensive deserializer for CBOR (RFC8949). The decoder reads items from any
 * `std::io::Read`, dispatching on the lead byte, reconstructing shared and cyclic graphs
 * (tags 28/29) through an indexed shareables table.
 **************************************************************************************************/
use crate::ast::{ArrayRef, MapRef, CBOR};
use crate::constants::{
    AI_MASK, BREAK_BYTE, MT_ARRAY, MT_BSTR, MT_MAP, MT_NINT, MT_TAG, MT_TSTR, MT_UINT,
    PAYLOAD_INDEFINITE,
};
use crate::error::CBORDecodeError;
use crate::halffloat;
use crate::tags;

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;

/// Reads are bounded to this step so a corrupt length header cannot force a huge allocation
/// before any payload bytes have actually arrived.
const READ_CHUNK: usize = 65536;

/// The policy applied when a text string does not hold valid UTF-8.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StrErrors {
    /// Fail the decode with `UTF8Error`.
    #[default]
    Strict,
    /// Fail the decode with the distinct `TextError` kind.
    Error,
    /// Substitute U+FFFD for each undecodable sequence.
    Replace,
}

/// Hook invoked for tags with no built-in handler. Receives the assembled tagged item and
/// returns the value to use in its place.
pub type TagHook<R> = Rc<dyn Fn(&mut CBORDecoder<R>, CBOR) -> Result<CBOR, CBORDecodeError>>;

/// Hook invoked after each map has been fully decoded. Receives the map and returns the value
/// to use in its place.
pub type ObjectHook<R> = Rc<dyn Fn(&mut CBORDecoder<R>, CBOR) -> Result<CBOR, CBORDecodeError>>;

/// A streaming CBOR decoder over a reader.
///
/// A decoder carries mutable state (the shareables table, the share cursor and the recursion
/// depth) and must not be entered concurrently; distinct instances are independent. The
/// shareables table is reset at the start of every top-level `decode` call and owns its
/// entries for the duration of the call.
pub struct CBORDecoder<R> {
    read: R,
    pub(crate) tag_hook: Option<TagHook<R>>,
    pub(crate) object_hook: Option<ObjectHook<R>>,
    pub(crate) shareables: Vec<Option<CBOR>>,
    pub(crate) share_index: Option<usize>,
    str_errors: StrErrors,
    depth: usize,
    max_depth: usize,
}

impl<R: Read> CBORDecoder<R> {
    /// Construct a decoder over `read` with the default configuration: strict UTF-8 handling,
    /// no hooks.
    pub fn new(read: R) -> Self {
        CBORDecoder {
            read,
            tag_hook: None,
            object_hook: None,
            shareables: Vec::new(),
            share_index: None,
            str_errors: StrErrors::Strict,
            depth: 0,
            max_depth: 512,
        }
    }

    /// Set the hook invoked for tags with no built-in handler.
    pub fn tag_hook(mut self, hook: TagHook<R>) -> Self {
        self.tag_hook = Some(hook);
        self
    }

    /// Set the hook invoked after each decoded map.
    pub fn object_hook(mut self, hook: ObjectHook<R>) -> Self {
        self.object_hook = Some(hook);
        self
    }

    /// Set the policy for text strings that are not valid UTF-8.
    pub fn str_errors(mut self, policy: StrErrors) -> Self {
        self.str_errors = policy;
        self
    }

    /// Set the maximum item nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Consume the decoder, returning the reader.
    pub fn into_inner(self) -> R {
        self.read
    }

    /***********************************************************************************************
     * Main entry point
     **********************************************************************************************/

    /// Decode a single item from the reader.
    ///
    /// On failure the reader is left positioned wherever the error was detected; a decoder
    /// whose call was aborted should be discarded.
    pub fn decode(&mut self) -> Result<CBOR, CBORDecodeError> {
        self.shareables.clear();
        self.share_index = None;
        self.decode_child(false, false)
    }

    /// Decode one item, rejecting a break marker. Used wherever a data item is required:
    /// the top level, definite-length containers, tag content and chunk positions.
    pub(crate) fn decode_child(
        &mut self,
        immutable: bool,
        unshared: bool,
    ) -> Result<CBOR, CBORDecodeError> {
        match self.decode_item(immutable, unshared)? {
            CBOR::Break => Err(CBORDecodeError::UnexpectedBreak),
            item => Ok(item),
        }
    }

    /// Decode one item. `immutable` selects the tuple/frozen-set materialization of
    /// containers; `unshared` detaches the share cursor for the duration of the item, so
    /// items that must not participate in sharing (children of published containers, map
    /// keys, tag internals) cannot publish into the enclosing slot.
    pub(crate) fn decode_item(
        &mut self,
        immutable: bool,
        unshared: bool,
    ) -> Result<CBOR, CBORDecodeError> {
        if self.depth >= self.max_depth {
            return Err(CBORDecodeError::RecursionLimit);
        }
        self.depth += 1;
        let saved = self.share_index;
        if unshared {
            self.share_index = None;
        }
        let ret = self.decode_inner(immutable);
        if unshared {
            self.share_index = saved;
        }
        self.depth -= 1;
        ret
    }

    fn decode_inner(&mut self, immutable: bool) -> Result<CBOR, CBORDecodeError> {
        let lead = self.read_byte()?;
        let major = lead >> 5;
        let subtype = lead & AI_MASK;
        match major {
            MT_UINT => {
                let n = self.decode_length(subtype)?;
                Ok(self.set_shareable(CBOR::UInt(n)))
            }
            MT_NINT => {
                let n = self.decode_length(subtype)?;
                Ok(self.set_shareable(CBOR::NInt(n)))
            }
            MT_BSTR => self.decode_bytestring(subtype),
            MT_TSTR => self.decode_textstring(subtype),
            MT_ARRAY => self.decode_array(subtype, immutable),
            MT_MAP => self.decode_map(subtype, immutable),
            MT_TAG => {
                let tag_number = self.decode_length(subtype)?;
                tags::decode_tagged(self, tag_number, immutable)
            }
            _ => self.decode_special(subtype),
        }
    }

    /// Publish `value` into the slot the share cursor points at, if it points anywhere.
    /// Containers publish themselves before decoding children so self-references resolve;
    /// values without identity publish on construction, which is equivalent for them.
    pub(crate) fn set_shareable(&mut self, value: CBOR) -> CBOR {
        if let Some(index) = self.share_index {
            self.shareables[index] = Some(value.clone());
        }
        value
    }

    /***********************************************************************************************
     * Byte-level input
     **********************************************************************************************/

    fn read_byte(&mut self) -> Result<u8, CBORDecodeError> {
        let mut buf = [0u8; 1];
        self.read_exact_buf(&mut buf)?;
        Ok(buf[0])
    }

    fn read_exact_buf(&mut self, buf: &mut [u8]) -> Result<(), CBORDecodeError> {
        self.read.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                CBORDecodeError::PrematureEof
            } else {
                CBORDecodeError::Io(e)
            }
        })
    }

    fn read_bytes(&mut self, length: u64) -> Result<Vec<u8>, CBORDecodeError> {
        let length = usize::try_from(length).map_err(|_| CBORDecodeError::PrematureEof)?;
        let mut buf = Vec::with_capacity(length.min(READ_CHUNK));
        let mut remaining = length;
        while remaining > 0 {
            let step = remaining.min(READ_CHUNK);
            let start = buf.len();
            buf.resize(start + step, 0);
            self.read_exact_buf(&mut buf[start..])?;
            remaining -= step;
        }
        Ok(buf)
    }

    /***********************************************************************************************
     * Length decoding
     **********************************************************************************************/

    /// Decode the length (or value) field of an item head. Subtypes 0..=23 carry the value
    /// inline; 24..=27 pull 1, 2, 4 or 8 following big-endian bytes; 28..=30 are reserved;
    /// 31 yields `None` and is only legal where the caller allows an indefinite length.
    fn decode_length_or_indefinite(&mut self, subtype: u8) -> Result<Option<u64>, CBORDecodeError> {
        match subtype {
            0..=23 => Ok(Some(subtype as u64)),
            24 => Ok(Some(self.read_byte()? as u64)),
            25 => {
                let mut buf = [0u8; 2];
                self.read_exact_buf(&mut buf)?;
                Ok(Some(u16::from_be_bytes(buf) as u64))
            }
            26 => {
                let mut buf = [0u8; 4];
                self.read_exact_buf(&mut buf)?;
                Ok(Some(u32::from_be_bytes(buf) as u64))
            }
            27 => {
                let mut buf = [0u8; 8];
                self.read_exact_buf(&mut buf)?;
                Ok(Some(u64::from_be_bytes(buf)))
            }
            28..=30 => Err(CBORDecodeError::ReservedAI(subtype)),
            _ => Ok(None),
        }
    }

    fn decode_length(&mut self, subtype: u8) -> Result<u64, CBORDecodeError> {
        self.decode_length_or_indefinite(subtype)?
            .ok_or(CBORDecodeError::InvalidLength)
    }

    /***********************************************************************************************
     * Strings
     **********************************************************************************************/

    fn text_from_bytes(&self, bytes: Vec<u8>) -> Result<String, CBORDecodeError> {
        match self.str_errors {
            StrErrors::Strict => String::from_utf8(bytes).map_err(CBORDecodeError::UTF8Error),
            StrErrors::Error => String::from_utf8(bytes).map_err(CBORDecodeError::TextError),
            StrErrors::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Read the head of one chunk of an indefinite-length string. Chunks must be definite
    /// strings of the same major type; the break marker ends the sequence.
    fn chunk_length(&mut self, major: u8) -> Result<Option<u64>, CBORDecodeError> {
        let lead = self.read_byte()?;
        if lead == BREAK_BYTE {
            return Ok(None);
        }
        if lead >> 5 != major {
            return Err(CBORDecodeError::InvalidChunk);
        }
        let subtype = lead & AI_MASK;
        if subtype == PAYLOAD_INDEFINITE {
            return Err(CBORDecodeError::InvalidChunk);
        }
        Ok(Some(self.decode_length(subtype)?))
    }

    fn decode_bytestring(&mut self, subtype: u8) -> Result<CBOR, CBORDecodeError> {
        match self.decode_length_or_indefinite(subtype)? {
            Some(length) => {
                let bytes = self.read_bytes(length)?;
                Ok(self.set_shareable(CBOR::Bstr(bytes)))
            }
            None => {
                let mut buf = Vec::new();
                while let Some(length) = self.chunk_length(MT_BSTR)? {
                    buf.extend_from_slice(&self.read_bytes(length)?);
                }
                Ok(self.set_shareable(CBOR::Bstr(buf)))
            }
        }
    }

    /// Text strings decode chunk by chunk: every chunk must independently be valid UTF-8, so
    /// a code point split across chunk boundaries is a format error rather than silently
    /// reassembled.
    fn decode_textstring(&mut self, subtype: u8) -> Result<CBOR, CBORDecodeError> {
        match self.decode_length_or_indefinite(subtype)? {
            Some(length) => {
                let bytes = self.read_bytes(length)?;
                let text = self.text_from_bytes(bytes)?;
                Ok(self.set_shareable(CBOR::Tstr(text)))
            }
            None => {
                let mut text = String::new();
                while let Some(length) = self.chunk_length(MT_TSTR)? {
                    let bytes = self.read_bytes(length)?;
                    text.push_str(&self.text_from_bytes(bytes)?);
                }
                Ok(self.set_shareable(CBOR::Tstr(text)))
            }
        }
    }

    /***********************************************************************************************
     * Containers
     **********************************************************************************************/

    fn decode_array(&mut self, subtype: u8, immutable: bool) -> Result<CBOR, CBORDecodeError> {
        let length = self.decode_length_or_indefinite(subtype)?;
        if immutable {
            let mut items = Vec::new();
            match length {
                Some(n) => {
                    for _ in 0..n {
                        items.push(self.decode_child(true, true)?);
                    }
                }
                None => loop {
                    match self.decode_item(true, true)? {
                        CBOR::Break => break,
                        item => items.push(item),
                    }
                },
            }
            // An immutable container cannot observe itself, so it publishes only once complete
            Ok(self.set_shareable(CBOR::Tuple(Rc::new(items))))
        } else {
            let cell: ArrayRef = Rc::new(RefCell::new(Vec::new()));
            self.set_shareable(CBOR::Array(cell.clone()));
            match length {
                Some(n) => {
                    for _ in 0..n {
                        let item = self.decode_child(false, true)?;
                        cell.borrow_mut().push(item);
                    }
                }
                None => loop {
                    match self.decode_item(false, true)? {
                        CBOR::Break => break,
                        item => cell.borrow_mut().push(item),
                    }
                },
            }
            Ok(CBOR::Array(cell))
        }
    }

    /// Keys decode in immutable mode, so arrays used as keys materialize as tuples and sets
    /// as frozen sets.
    fn decode_map(&mut self, subtype: u8, _immutable: bool) -> Result<CBOR, CBORDecodeError> {
        let length = self.decode_length_or_indefinite(subtype)?;
        let cell: MapRef = Rc::new(RefCell::new(Vec::new()));
        self.set_shareable(CBOR::Map(cell.clone()));
        match length {
            Some(n) => {
                for _ in 0..n {
                    let key = self.decode_child(true, true)?;
                    let value = self.decode_child(false, true)?;
                    cell.borrow_mut().push((key, value));
                }
            }
            None => loop {
                let key = match self.decode_item(true, true)? {
                    CBOR::Break => break,
                    key => key,
                };
                let value = self.decode_child(false, true)?;
                cell.borrow_mut().push((key, value));
            },
        }
        let ret = CBOR::Map(cell);
        if let Some(hook) = self.object_hook.clone() {
            let transformed = hook(self, ret)?;
            Ok(self.set_shareable(transformed))
        } else {
            Ok(ret)
        }
    }

    /***********************************************************************************************
     * Major type 7
     **********************************************************************************************/

    fn decode_special(&mut self, subtype: u8) -> Result<CBOR, CBORDecodeError> {
        match subtype {
            0..=19 => Ok(CBOR::Simple(subtype)),
            20 => Ok(CBOR::False),
            21 => Ok(CBOR::True),
            22 => Ok(CBOR::Null),
            23 => Ok(CBOR::Undefined),
            24 => {
                let v = self.read_byte()?;
                if v < 32 {
                    Err(CBORDecodeError::BadSimple(v))
                } else {
                    Ok(CBOR::Simple(v))
                }
            }
            25 => {
                let mut buf = [0u8; 2];
                self.read_exact_buf(&mut buf)?;
                let value = halffloat::unpack(u16::from_be_bytes(buf));
                Ok(self.set_shareable(CBOR::Float(value)))
            }
            26 => {
                let mut buf = [0u8; 4];
                self.read_exact_buf(&mut buf)?;
                let value = f32::from_be_bytes(buf) as f64;
                Ok(self.set_shareable(CBOR::Float(value)))
            }
            27 => {
                let mut buf = [0u8; 8];
                self.read_exact_buf(&mut buf)?;
                let value = f64::from_be_bytes(buf);
                Ok(self.set_shareable(CBOR::Float(value)))
            }
            28..=30 => Err(CBORDecodeError::ReservedAI(subtype)),
            _ => Ok(CBOR::Break),
        }
    }
}
