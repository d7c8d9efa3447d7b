// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Byte-level encoding shared by the sketch and partial-result wire formats.
//!
//! Fixed-width numbers are big-endian. Counts and lengths use an unsigned LEB128 varint: seven
//! payload bits per byte, least significant group first, high bit set on every byte but the
//! last.

pub(crate) mod family;

use std::io;
use std::io::Cursor;
use std::io::Read;

use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::ReadBytesExt;

/// The longest varint encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

pub(crate) struct SketchBytes {
    bytes: Vec<u8>,
}

impl SketchBytes {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    pub fn write_f64_be(&mut self, n: f64) {
        let mut buf = [0u8; 8];
        BigEndian::write_f64(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_varint(&mut self, mut n: u64) {
        while n >= 0x80 {
            self.bytes.push((n as u8 & 0x7f) | 0x80);
            n >>= 7;
        }
        self.bytes.push(n as u8);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.write(s.as_bytes());
    }
}

/// Number of bytes [`SketchBytes::write_varint`] emits for `n`.
pub(crate) fn varint_len(n: u64) -> usize {
    let bits = 64 - n.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

pub(crate) struct SketchSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl<'a> SketchSlice<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        SketchSlice {
            slice: Cursor::new(slice),
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        let len = self.slice.get_ref().len();
        len.saturating_sub(self.slice.position() as usize)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.slice.read_exact(buf)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.slice.read_u8()
    }

    pub fn read_f64_be(&mut self) -> io::Result<f64> {
        self.slice.read_f64::<BigEndian>()
    }

    pub fn read_varint(&mut self) -> io::Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let payload = (byte & 0x7f) as u64;
            let shift = 7 * i as u32;
            if i == MAX_VARINT_LEN - 1 && payload > 1 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "varint overflows u64",
                ));
            }
            value |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "varint is longer than 10 bytes",
        ))
    }

    pub fn read_string(&mut self) -> io::Result<String> {
        let len = self.read_varint()?;
        if len > self.remaining() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "string length exceeds remaining bytes",
            ));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}
