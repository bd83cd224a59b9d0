//! Self-delimiting binary message stream.
//!
//! A message is a flat sequence of typed values. Each value starts with a one-byte
//! [`ValueTag`] followed by a little-endian payload:
//!
//! - fixed-width scalars: the raw bytes of the value;
//! - strings: `u32` byte length and UTF-8 bytes (`NullString` has no payload);
//! - arrays: `u32` element count and the packed elements;
//! - nested messages: `u32` byte length and the nested message bytes, so a reader
//!   can skip a nested block it fails to understand without losing alignment;
//! - variants: the `i32` element type tag followed by the encoded scalar.
//!
//! [`MessageReader`] checks every tag and length. Any mismatch or truncation is
//! reported as a decode error and leaves the reader positioned at the failing value.

use byteorder::{ByteOrder, LittleEndian};
use meshstat_common::{Result, error::Error};

use crate::{types::ElementType, variant::Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ValueTag {
    Bool = 1,
    Int8 = 2,
    UInt8 = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float32 = 10,
    Float64 = 11,
    String = 12,
    NullString = 13,
    Float64Array = 14,
    Int32Array = 15,
    Message = 16,
    Variant = 17,
}

impl ValueTag {
    fn from_u8(value: u8) -> Option<ValueTag> {
        use ValueTag::*;
        let tag = match value {
            1 => Bool,
            2 => Int8,
            3 => UInt8,
            4 => Int16,
            5 => UInt16,
            6 => Int32,
            7 => UInt32,
            8 => Int64,
            9 => UInt64,
            10 => Float32,
            11 => Float64,
            12 => String,
            13 => NullString,
            14 => Float64Array,
            15 => Int32Array,
            16 => Message,
            17 => Variant,
            _ => return None,
        };
        Some(tag)
    }
}

/// Builds a message by appending typed values.
#[derive(Debug, Default, Clone)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> MessageWriter {
        MessageWriter::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the encoded message.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bool(&mut self, value: bool) {
        self.put_tag(ValueTag::Bool);
        self.buf.push(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.put_tag(ValueTag::Int16);
        self.put_i16(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.put_tag(ValueTag::UInt16);
        self.put_u16(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.put_tag(ValueTag::Int32);
        self.put_i32(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.put_tag(ValueTag::UInt32);
        self.put_u32(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.put_tag(ValueTag::Int64);
        self.put_i64(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.put_tag(ValueTag::UInt64);
        self.put_u64(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.put_tag(ValueTag::Float32);
        self.put_f32(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.put_tag(ValueTag::Float64);
        self.put_f64(value);
    }

    /// Writes a nullable string.
    pub fn write_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.put_tag(ValueTag::String);
                self.put_len(s.len());
                self.buf.extend_from_slice(s.as_bytes());
            }
            None => self.put_tag(ValueTag::NullString),
        }
    }

    pub fn write_f64_array(&mut self, values: &[f64]) {
        self.put_tag(ValueTag::Float64Array);
        self.put_len(values.len());
        for &v in values {
            self.put_f64(v);
        }
    }

    pub fn write_i32_array(&mut self, values: &[i32]) {
        self.put_tag(ValueTag::Int32Array);
        self.put_len(values.len());
        for &v in values {
            self.put_i32(v);
        }
    }

    /// Embeds a nested message with an explicit byte-length prefix.
    pub fn write_message(&mut self, message: &[u8]) {
        self.put_tag(ValueTag::Message);
        self.put_len(message.len());
        self.buf.extend_from_slice(message);
    }

    pub fn write_variant(&mut self, value: &Variant) {
        self.put_tag(ValueTag::Variant);
        self.put_i32(value.element_type().tag());
        match value {
            Variant::Int8(v) => self.buf.push(*v as u8),
            Variant::UInt8(v) => self.buf.push(*v),
            Variant::Int16(v) => self.put_i16(*v),
            Variant::UInt16(v) => self.put_u16(*v),
            Variant::Int32(v) => self.put_i32(*v),
            Variant::UInt32(v) => self.put_u32(*v),
            Variant::Int64(v) | Variant::IdType(v) => self.put_i64(*v),
            Variant::UInt64(v) => self.put_u64(*v),
            Variant::Float32(v) => self.put_f32(*v),
            Variant::Float64(v) => self.put_f64(*v),
            Variant::String(s) => {
                self.put_len(s.len());
                self.buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    fn put_tag(&mut self, tag: ValueTag) {
        self.buf.push(tag as u8);
    }

    fn put_len(&mut self, len: usize) {
        self.put_u32(len as u32);
    }

    fn put_i16(&mut self, value: i16) {
        let mut tmp = [0u8; 2];
        LittleEndian::write_i16(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_u16(&mut self, value: u16) {
        let mut tmp = [0u8; 2];
        LittleEndian::write_u16(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_i32(&mut self, value: i32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_i32(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_u32(&mut self, value: u32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_u32(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_i64(&mut self, value: i64) {
        let mut tmp = [0u8; 8];
        LittleEndian::write_i64(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_u64(&mut self, value: u64) {
        let mut tmp = [0u8; 8];
        LittleEndian::write_u64(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_f32(&mut self, value: f32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_f32(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    fn put_f64(&mut self, value: f64) {
        let mut tmp = [0u8; 8];
        LittleEndian::write_f64(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }
}

/// Reads typed values back from a message, in order.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(data: &'a [u8]) -> MessageReader<'a> {
        MessageReader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bool(&mut self, element: &str) -> Result<bool> {
        self.expect_tag(ValueTag::Bool, element)?;
        Ok(self.take(1, element)?[0] != 0)
    }

    pub fn read_i16(&mut self, element: &str) -> Result<i16> {
        self.expect_tag(ValueTag::Int16, element)?;
        self.get_i16(element)
    }

    pub fn read_u16(&mut self, element: &str) -> Result<u16> {
        self.expect_tag(ValueTag::UInt16, element)?;
        self.get_u16(element)
    }

    pub fn read_i32(&mut self, element: &str) -> Result<i32> {
        self.expect_tag(ValueTag::Int32, element)?;
        self.get_i32(element)
    }

    pub fn read_u32(&mut self, element: &str) -> Result<u32> {
        self.expect_tag(ValueTag::UInt32, element)?;
        self.get_u32(element)
    }

    pub fn read_i64(&mut self, element: &str) -> Result<i64> {
        self.expect_tag(ValueTag::Int64, element)?;
        self.get_i64(element)
    }

    pub fn read_u64(&mut self, element: &str) -> Result<u64> {
        self.expect_tag(ValueTag::UInt64, element)?;
        self.get_u64(element)
    }

    pub fn read_f32(&mut self, element: &str) -> Result<f32> {
        self.expect_tag(ValueTag::Float32, element)?;
        self.get_f32(element)
    }

    pub fn read_f64(&mut self, element: &str) -> Result<f64> {
        self.expect_tag(ValueTag::Float64, element)?;
        self.get_f64(element)
    }

    /// Reads a nullable string.
    pub fn read_str(&mut self, element: &str) -> Result<Option<String>> {
        let tag = self.peek_tag(element)?;
        match tag {
            ValueTag::NullString => {
                self.pos += 1;
                Ok(None)
            }
            ValueTag::String => {
                self.pos += 1;
                self.get_string(element).map(Some)
            }
            other => Err(Self::tag_mismatch(element, ValueTag::String, other)),
        }
    }

    pub fn read_f64_array(&mut self, element: &str) -> Result<Vec<f64>> {
        self.expect_tag(ValueTag::Float64Array, element)?;
        let len = self.get_len(element)?;
        self.check_available(len.saturating_mul(8), element)?;
        (0..len).map(|_| self.get_f64(element)).collect()
    }

    /// Reads a float array whose length must match `out` exactly.
    pub fn read_f64_array_into(&mut self, out: &mut [f64], element: &str) -> Result<()> {
        let values = self.read_f64_array(element)?;
        if values.len() != out.len() {
            return Err(Error::decode(
                element,
                format!("expected {} values, found {}", out.len(), values.len()),
            ));
        }
        out.copy_from_slice(&values);
        Ok(())
    }

    pub fn read_i32_array(&mut self, element: &str) -> Result<Vec<i32>> {
        self.expect_tag(ValueTag::Int32Array, element)?;
        let len = self.get_len(element)?;
        self.check_available(len.saturating_mul(4), element)?;
        (0..len).map(|_| self.get_i32(element)).collect()
    }

    pub fn read_i32_array_into(&mut self, out: &mut [i32], element: &str) -> Result<()> {
        let values = self.read_i32_array(element)?;
        if values.len() != out.len() {
            return Err(Error::decode(
                element,
                format!("expected {} values, found {}", out.len(), values.len()),
            ));
        }
        out.copy_from_slice(&values);
        Ok(())
    }

    /// Reads a nested message and returns its bytes.
    pub fn read_message(&mut self, element: &str) -> Result<&'a [u8]> {
        self.expect_tag(ValueTag::Message, element)?;
        let len = self.get_len(element)?;
        self.take(len, element)
    }

    pub fn read_variant(&mut self, element: &str) -> Result<Variant> {
        self.expect_tag(ValueTag::Variant, element)?;
        let type_tag = self.get_i32(element)?;
        let element_type = ElementType::from_tag(type_tag).ok_or_else(|| {
            Error::decode(element, format!("unknown variant element type {type_tag}"))
        })?;
        let value = match element_type {
            ElementType::Int8 => Variant::Int8(self.take(1, element)?[0] as i8),
            ElementType::UInt8 => Variant::UInt8(self.take(1, element)?[0]),
            ElementType::Int16 => Variant::Int16(self.get_i16(element)?),
            ElementType::UInt16 => Variant::UInt16(self.get_u16(element)?),
            ElementType::Int32 => Variant::Int32(self.get_i32(element)?),
            ElementType::UInt32 => Variant::UInt32(self.get_u32(element)?),
            ElementType::Int64 => Variant::Int64(self.get_i64(element)?),
            ElementType::UInt64 => Variant::UInt64(self.get_u64(element)?),
            ElementType::Float32 => Variant::Float32(self.get_f32(element)?),
            ElementType::Float64 => Variant::Float64(self.get_f64(element)?),
            ElementType::IdType => Variant::IdType(self.get_i64(element)?),
            ElementType::String => Variant::String(self.get_string(element)?),
            ElementType::Void => {
                return Err(Error::decode(element, "void variant"));
            }
        };
        Ok(value)
    }

    fn peek_tag(&self, element: &str) -> Result<ValueTag> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::decode(element, "unexpected end of message"))?;
        ValueTag::from_u8(byte)
            .ok_or_else(|| Error::decode(element, format!("unknown value tag {byte}")))
    }

    fn expect_tag(&mut self, expected: ValueTag, element: &str) -> Result<()> {
        let tag = self.peek_tag(element)?;
        if tag != expected {
            return Err(Self::tag_mismatch(element, expected, tag));
        }
        self.pos += 1;
        Ok(())
    }

    fn tag_mismatch(element: &str, expected: ValueTag, found: ValueTag) -> Error {
        Error::decode(element, format!("expected {expected:?}, found {found:?}"))
    }

    fn check_available(&self, len: usize, element: &str) -> Result<()> {
        if len > self.remaining() {
            return Err(Error::decode(
                element,
                format!("need {len} bytes, {} available", self.remaining()),
            ));
        }
        Ok(())
    }

    fn take(&mut self, len: usize, element: &str) -> Result<&'a [u8]> {
        self.check_available(len, element)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn get_len(&mut self, element: &str) -> Result<usize> {
        Ok(self.get_u32(element)? as usize)
    }

    fn get_string(&mut self, element: &str) -> Result<String> {
        let len = self.get_len(element)?;
        let bytes = self.take(len, element)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::decode(element, format!("invalid UTF-8: {e}")))
    }

    fn get_i16(&mut self, element: &str) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2, element)?))
    }

    fn get_u16(&mut self, element: &str) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2, element)?))
    }

    fn get_i32(&mut self, element: &str) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, element)?))
    }

    fn get_u32(&mut self, element: &str) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4, element)?))
    }

    fn get_i64(&mut self, element: &str) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8, element)?))
    }

    fn get_u64(&mut self, element: &str) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8, element)?))
    }

    fn get_f32(&mut self, element: &str) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4, element)?))
    }

    fn get_f64(&mut self, element: &str) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8, element)?))
    }
}
