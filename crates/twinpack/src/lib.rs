//! # Twinpack
//!
//! A strict, bounded, schema-agnostic byte format for the twin call protocol.
//!
//! ## Philosophy
//!
//! - **TLV Architecture**: `[Tag][Length?][Value]` structure enables safe skipping of unknown fields.
//! - **Bounded**: Encoders track open scopes explicitly. Decoders are zero-copy, bounds-checked views.
//! - **Self-describing records**: a record carries its class name, so a peer can
//!   rebuild an object graph without knowing the type up front.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are Little-Endian.

#[cfg(test)]
mod tests;

/// Twinpack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte does not correspond to a valid `Tag`.
    InvalidTag(u8),
    /// String data is not valid UTF-8, or a char is not a valid scalar value.
    InvalidUtf8,
    /// Closing a scope that does not match the active scope stack.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the Root remains.
    ScopeUnderflow,
    /// Attempted to finalize the buffer with open scopes.
    ScopeStillOpen,
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Blob or container length exceeds `u32::MAX`.
    BlobTooLarge(usize),
    /// Attempted to write a second payload into a `Field`.
    TooManyItems(Scope),
    /// Attempted to close a `Field` without a payload.
    EmptyField,
    /// Attempted to write something other than a `Field` directly into a `Record`.
    InvalidRecordEntry,
    /// A `Map` was closed, or read, with a key that has no value.
    UnpairedMapKey,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "Invalid Tag byte: {:#04x}", b),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "Scope Mismatch: expected {:?}, found {:?}", expected, actual)
            }
            Error::TooManyItems(s) => write!(f, "Too many items in scope {:?}; expected exactly 1", s),
            Error::BlobTooLarge(len) => write!(f, "Blob of {} bytes exceeds the u32 length header", len),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for Twinpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Absent value.
    Null = 0x00,

    // Fixed-width scalars
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    I8 = 0x03,
    I16 = 0x04,
    I32 = 0x05,
    I64 = 0x06,
    F32 = 0x07,
    F64 = 0x08,
    Char = 0x09,

    // Blobs (Tag + u32 Len + Bytes)
    Str = 0x10,
    Bytes = 0x11,

    // Containers (Tag + u32 Len + Body)
    List = 0x20,
    Map = 0x21,
    Record = 0x22,
    Field = 0x23,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Tag::Null),
            0x01 => Some(Tag::BoolTrue),
            0x02 => Some(Tag::BoolFalse),
            0x03 => Some(Tag::I8),
            0x04 => Some(Tag::I16),
            0x05 => Some(Tag::I32),
            0x06 => Some(Tag::I64),
            0x07 => Some(Tag::F32),
            0x08 => Some(Tag::F64),
            0x09 => Some(Tag::Char),
            0x10 => Some(Tag::Str),
            0x11 => Some(Tag::Bytes),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Map),
            0x22 => Some(Tag::Record),
            0x23 => Some(Tag::Field),
            _ => None,
        }
    }

    /// Width of the data that follows a fixed-width tag, or `None` for
    /// length-prefixed tags.
    fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::Null | Tag::BoolTrue | Tag::BoolFalse => Some(0),
            Tag::I8 => Some(1),
            Tag::I16 => Some(2),
            Tag::I32 | Tag::F32 | Tag::Char => Some(4),
            Tag::I64 | Tag::F64 => Some(8),
            Tag::Str | Tag::Bytes | Tag::List | Tag::Map | Tag::Record | Tag::Field => None,
        }
    }
}

/// Internal state tracking for the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows any item.
    Root,
    /// Ordered sequence; allows any number of items.
    List,
    /// Alternating keys and values; must close on an even count.
    Map,
    /// Named object; strictly allows only `Field` items.
    Record,
    /// Named slot; allows exactly one item after the name.
    Field,
}

/// An open container on the `Encoder` stack.
struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// A bounded, state-machine driven encoder.
///
/// The Encoder keeps a stack of open scopes to enforce structure and
/// back-patches the length header of each container when it closes.
///
/// # Structural Invariants
///
/// 1.  **Record Scopes**: Only `field_begin()` may write into a record.
/// 2.  **Field Scopes**: Exactly one payload item must be written.
/// 3.  **Map Scopes**: Items alternate key, value; the count must be even on close.
/// 4.  **Root Scope**: The encoder must end in the Root scope to finalize bytes.
pub struct Encoder {
    buf: Vec<u8>,
    /// Bottom is always `Scope::Root`.
    stack: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates a new encoder with default capacity.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
            stack: vec![Frame { start: 0, scope: Scope::Root, count: 0 }],
        }
    }

    /// Consumes the encoder and returns the final byte vector.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if any container is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    /// Returns the current nesting depth (0 at the root).
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn top(&self) -> &Frame {
        // the root frame is never popped, see `end_scope`
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn check_write(&self, tag: Tag) -> Result<()> {
        let frame = self.top();
        match frame.scope {
            Scope::Root | Scope::List | Scope::Map => Ok(()),
            Scope::Record if tag == Tag::Field => Ok(()),
            Scope::Record => Err(Error::InvalidRecordEntry),
            Scope::Field if frame.count >= 1 => Err(Error::TooManyItems(Scope::Field)),
            Scope::Field => Ok(()),
        }
    }

    fn on_item_written(&mut self) {
        self.top_mut().count += 1;
    }

    fn scalar(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(data);
        self.on_item_written();
        Ok(())
    }

    fn blob(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| Error::BlobTooLarge(data.len()))?;
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(data);
        self.on_item_written();
        Ok(())
    }

    fn begin_scope(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // patched in end_scope
        self.stack.push(Frame { start: self.buf.len(), scope, count: 0 });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }

        let frame = self.top();
        if frame.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: frame.scope });
        }
        match frame.scope {
            Scope::Field if frame.count == 0 => return Err(Error::EmptyField),
            Scope::Map if frame.count % 2 != 0 => return Err(Error::UnpairedMapKey),
            _ => {}
        }

        let Some(frame) = self.stack.pop() else {
            return Err(Error::ScopeUnderflow);
        };
        let body_len = self.buf.len() - frame.start;
        let len = u32::try_from(body_len).map_err(|_| Error::BlobTooLarge(body_len))?;
        self.buf[frame.start - 4..frame.start].copy_from_slice(&len.to_le_bytes());

        self.on_item_written();
        Ok(())
    }

    /// Encodes an absent value.
    pub fn null(&mut self) -> Result<()> { self.scalar(Tag::Null, &[]) }

    /// Encodes a boolean value.
    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.scalar(if v { Tag::BoolTrue } else { Tag::BoolFalse }, &[])
    }

    /// Encodes a signed 8-bit integer.
    pub fn i8(&mut self, v: i8) -> Result<()> { self.scalar(Tag::I8, &v.to_le_bytes()) }
    /// Encodes a signed 16-bit integer (LE).
    pub fn i16(&mut self, v: i16) -> Result<()> { self.scalar(Tag::I16, &v.to_le_bytes()) }
    /// Encodes a signed 32-bit integer (LE).
    pub fn i32(&mut self, v: i32) -> Result<()> { self.scalar(Tag::I32, &v.to_le_bytes()) }
    /// Encodes a signed 64-bit integer (LE).
    pub fn i64(&mut self, v: i64) -> Result<()> { self.scalar(Tag::I64, &v.to_le_bytes()) }
    /// Encodes a 32-bit float (LE).
    pub fn f32(&mut self, v: f32) -> Result<()> { self.scalar(Tag::F32, &v.to_le_bytes()) }
    /// Encodes a 64-bit float (LE).
    pub fn f64(&mut self, v: f64) -> Result<()> { self.scalar(Tag::F64, &v.to_le_bytes()) }
    /// Encodes a char as its u32 scalar value (LE).
    pub fn char(&mut self, v: char) -> Result<()> { self.scalar(Tag::Char, &(v as u32).to_le_bytes()) }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> { self.blob(Tag::Str, v.as_bytes()) }

    /// Encodes a raw byte blob.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> { self.blob(Tag::Bytes, v) }

    /// Begins a List container. Allows any number of items.
    pub fn list_begin(&mut self) -> Result<()> { self.begin_scope(Tag::List, Scope::List) }
    /// Ends a List container.
    pub fn list_end(&mut self) -> Result<()> { self.end_scope(Scope::List) }

    /// Begins a Map container.
    ///
    /// # Invariants
    /// - Items alternate key, value.
    /// - Must be closed via `map_end()` with an even item count.
    pub fn map_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Map, Scope::Map) }
    /// Ends a Map container.
    pub fn map_end(&mut self) -> Result<()> { self.end_scope(Scope::Map) }

    /// Begins a Record of the named class.
    ///
    /// The class name is metadata; only `field_begin()` may follow.
    pub fn record_begin(&mut self, class: &str) -> Result<()> {
        self.begin_scope(Tag::Record, Scope::Record)?;
        // the name is written outside the scope rules and is not an entry
        self.write_name(class)
    }
    /// Ends a Record.
    pub fn record_end(&mut self) -> Result<()> { self.end_scope(Scope::Record) }

    /// Begins a named Field inside a Record.
    ///
    /// # Invariants
    /// - **Strict:** Requires exactly one payload item before `field_end()`.
    pub fn field_begin(&mut self, name: &str) -> Result<()> {
        self.begin_scope(Tag::Field, Scope::Field)?;
        self.write_name(name)
    }
    /// Ends a Field.
    pub fn field_end(&mut self) -> Result<()> { self.end_scope(Scope::Field) }

    fn write_name(&mut self, name: &str) -> Result<()> {
        let len = u32::try_from(name.len()).map_err(|_| Error::BlobTooLarge(name.len()))?;
        self.buf.push(Tag::Str as u8);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(name.as_bytes());
        Ok(())
    }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Reading advances the cursor. Container reads return new `Decoder`
/// instances restricted to the container's body.
///
/// # Errors
/// All read operations return `Error::UnexpectedEnd` if the buffer is exhausted.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Returns true once every byte in the view has been consumed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let Some(&b) = self.buf.first() else {
            return Err(Error::UnexpectedEnd);
        };
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?) as usize)
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        self.read_bytes(1)?;
        Ok(())
    }

    /// Skips the next item and its nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.read_bytes(1)?;
        let len = match tag.fixed_width() {
            Some(width) => width,
            None => self.read_len()?,
        };
        self.read_bytes(len)?;
        Ok(())
    }

    /// Splits off the next whole item as its own decoder.
    pub fn next_item(&mut self) -> Result<Decoder<'a>> {
        let mut ahead = self.clone();
        ahead.skip()?;
        let len = self.remaining() - ahead.remaining();
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    /// Returns true if the next item is `Null`, without consuming it.
    pub fn peek_null(&self) -> bool {
        matches!(self.peek_tag(), Ok(Tag::Null))
    }

    /// Decodes `Null`.
    pub fn null(&mut self) -> Result<()> { self.expect_tag(Tag::Null) }

    /// Decodes a bool.
    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::BoolTrue => { self.read_bytes(1)?; Ok(true) }
            Tag::BoolFalse => { self.read_bytes(1)?; Ok(false) }
            tag => Err(Error::InvalidTag(tag as u8)),
        }
    }

    /// Decodes i8.
    pub fn i8(&mut self) -> Result<i8> { self.expect_tag(Tag::I8)?; Ok(i8::from_le_bytes(self.read_array()?)) }
    /// Decodes i16 (LE).
    pub fn i16(&mut self) -> Result<i16> { self.expect_tag(Tag::I16)?; Ok(i16::from_le_bytes(self.read_array()?)) }
    /// Decodes i32 (LE).
    pub fn i32(&mut self) -> Result<i32> { self.expect_tag(Tag::I32)?; Ok(i32::from_le_bytes(self.read_array()?)) }
    /// Decodes i64 (LE).
    pub fn i64(&mut self) -> Result<i64> { self.expect_tag(Tag::I64)?; Ok(i64::from_le_bytes(self.read_array()?)) }
    /// Decodes f32 (LE).
    pub fn f32(&mut self) -> Result<f32> { self.expect_tag(Tag::F32)?; Ok(f32::from_le_bytes(self.read_array()?)) }
    /// Decodes f64 (LE).
    pub fn f64(&mut self) -> Result<f64> { self.expect_tag(Tag::F64)?; Ok(f64::from_le_bytes(self.read_array()?)) }

    /// Decodes char (u32 LE).
    pub fn char(&mut self) -> Result<char> {
        self.expect_tag(Tag::Char)?;
        let raw = u32::from_le_bytes(self.read_array()?);
        char::from_u32(raw).ok_or(Error::InvalidUtf8)
    }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        self.expect_tag(Tag::Str)?;
        let len = self.read_len()?;
        std::str::from_utf8(self.read_bytes(len)?).map_err(|_| Error::InvalidUtf8)
    }

    /// Decodes a byte slice.
    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.expect_tag(Tag::Bytes)?;
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn enter_container(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.expect_tag(expected)?;
        let len = self.read_len()?;
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    /// Decodes a List into an iterator.
    pub fn list(&mut self) -> Result<ListIter<'a>> {
        Ok(ListIter { dec: self.enter_container(Tag::List)? })
    }

    /// Decodes a Map into an iterator of key/value decoders.
    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { dec: self.enter_container(Tag::Map)? })
    }

    /// Decodes a Record.
    ///
    /// Returns `(ClassName, FieldIter)`.
    pub fn record(&mut self) -> Result<(&'a str, FieldIter<'a>)> {
        let mut body = self.enter_container(Tag::Record)?;
        let class = body.str()?;
        Ok((class, FieldIter { dec: body }))
    }
}

/// Iterator for items within a List.
#[derive(Debug)]
pub struct ListIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> ListIter<'a> {
    /// Returns a Decoder for the next item, or `None` at the end of the list.
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.dec.is_empty() {
            return Ok(None);
        }
        self.dec.next_item().map(Some)
    }
}

/// Iterator for key/value pairs within a Map.
#[derive(Debug)]
pub struct MapIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> MapIter<'a> {
    /// Returns `(KeyDecoder, ValueDecoder)` for the next entry, or `None`.
    pub fn next(&mut self) -> Result<Option<(Decoder<'a>, Decoder<'a>)>> {
        if self.dec.is_empty() {
            return Ok(None);
        }
        let key = self.dec.next_item()?;
        if self.dec.is_empty() {
            return Err(Error::UnpairedMapKey);
        }
        let value = self.dec.next_item()?;
        Ok(Some((key, value)))
    }
}

/// Iterator for named fields within a Record.
#[derive(Debug)]
pub struct FieldIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> FieldIter<'a> {
    /// Returns `(FieldName, ValueDecoder)` for the next field, or `None`.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.dec.is_empty() {
            return Ok(None);
        }
        let mut field = self.dec.enter_container(Tag::Field)?;
        let name = field.str()?;
        Ok(Some((name, field)))
    }
}
