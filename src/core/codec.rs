//! # Canonical Wire Codec
//!
//! Deterministic encode/decode of [`Packet`] to and from its canonical
//! byte layout: protobuf-style tagged fields, emitted in fixed field
//! order with default/empty fields omitted entirely.
//!
//! Canonical form matters here more than in an ordinary codec because
//! the signature covers encoded bytes. Two rules guarantee that equal
//! packets always produce identical bytes:
//!
//! 1. Fields are emitted strictly in field-number order
//!    (typ=1, id=2, src=3, dst=4, body=5, sig=6, pk=7).
//! 2. A field holding its default value (zero enum, empty string/bytes)
//!    is not written at all.
//!
//! The decoder enforces the same order: a tag whose field number does
//! not advance marks the end of one complete message, and anything after
//! it is [`TrailingBytes`](DecodeError::TrailingBytes). Decoding only
//! populates fields; it never dispatches on sender-controlled content.

use bytes::{BufMut, BytesMut};

use crate::core::packet::{Packet, PacketType};
use crate::error::DecodeError;

/// Wire type for varint-encoded scalars.
const WIRE_VARINT: u64 = 0;
/// Wire type for length-prefixed byte sequences.
const WIRE_LEN: u64 = 2;

/// Field numbers, stable across implementations.
const FIELD_TYP: u64 = 1;
const FIELD_ID: u64 = 2;
const FIELD_SRC: u64 = 3;
const FIELD_DST: u64 = 4;
const FIELD_BODY: u64 = 5;
const FIELD_SIG: u64 = 6;
const FIELD_PK: u64 = 7;

impl Packet {
    /// Canonical encoding. Total for any in-memory packet, and
    /// deterministic: equal packets yield byte-identical output.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len_hint());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    /// Encode into an existing buffer (used by sessions to reuse their
    /// write buffer).
    pub fn encode_into(&self, buf: &mut BytesMut) {
        if self.typ.as_wire() != 0 {
            put_varint(buf, tag(FIELD_TYP, WIRE_VARINT));
            put_varint(buf, self.typ.as_wire());
        }
        put_str_field(buf, FIELD_ID, &self.id);
        put_str_field(buf, FIELD_SRC, &self.src);
        put_str_field(buf, FIELD_DST, &self.dst);
        put_str_field(buf, FIELD_BODY, &self.body);
        put_bytes_field(buf, FIELD_SIG, &self.sig);
        put_bytes_field(buf, FIELD_PK, &self.pk);
    }

    /// Decode exactly one canonical packet from `data`.
    ///
    /// An empty buffer decodes to the all-default packet (which the
    /// verifier then drops as unsigned); that mirrors how the field
    /// omission rule treats a packet whose every field is default.
    pub fn from_bytes(data: &[u8]) -> Result<Packet, DecodeError> {
        let mut r = Reader::new(data);
        let mut packet = Packet::default();
        let mut last_field = 0u64;

        while !r.is_empty() {
            let key = r.varint()?;
            let field = key >> 3;
            let wire = key & 0x7;

            if field == 0 {
                return Err(DecodeError::Malformed("field number zero"));
            }
            // Canonical order is strictly ascending; a tag that does not
            // advance means one complete message already ended here.
            if field <= last_field {
                return Err(DecodeError::TrailingBytes);
            }

            match field {
                FIELD_TYP => {
                    expect_wire(wire, WIRE_VARINT)?;
                    packet.typ = PacketType::from_wire(r.varint()?)?;
                }
                FIELD_ID => packet.id = r.string(wire)?,
                FIELD_SRC => packet.src = r.string(wire)?,
                FIELD_DST => packet.dst = r.string(wire)?,
                FIELD_BODY => packet.body = r.string(wire)?,
                FIELD_SIG => packet.sig = r.bytes_field(wire)?.to_vec(),
                FIELD_PK => packet.pk = r.bytes_field(wire)?.to_vec(),
                _ => return Err(DecodeError::Malformed("unknown field number")),
            }
            last_field = field;
        }

        Ok(packet)
    }

    /// Rough upper bound on the encoded size, for buffer pre-allocation.
    fn encoded_len_hint(&self) -> usize {
        16 + self.id.len() + self.src.len() + self.dst.len() + self.body.len()
            + self.sig.len()
            + self.pk.len()
    }
}

fn tag(field: u64, wire: u64) -> u64 {
    (field << 3) | wire
}

fn expect_wire(got: u64, want: u64) -> Result<(), DecodeError> {
    if got == want {
        Ok(())
    } else {
        Err(DecodeError::Malformed("wrong wire type for field"))
    }
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

fn put_str_field(buf: &mut BytesMut, field: u64, value: &str) {
    put_bytes_field(buf, field, value.as_bytes());
}

fn put_bytes_field(buf: &mut BytesMut, field: u64, value: &[u8]) {
    // Unset optional fields are omitted, not encoded as zero-length.
    if value.is_empty() {
        return;
    }
    put_varint(buf, tag(field, WIRE_LEN));
    put_varint(buf, value.len() as u64);
    buf.put_slice(value);
}

/// Cursor over the inbound buffer. Slices out of the input; owned copies
/// are made only when a field is actually stored on the packet.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for shift in 0..10 {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(DecodeError::Truncated)?;
            self.pos += 1;
            if shift == 9 && byte > 0x01 {
                return Err(DecodeError::Malformed("varint overflows u64"));
            }
            value |= u64::from(byte & 0x7F) << (shift * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::Malformed("varint longer than 10 bytes"))
    }

    fn bytes_field(&mut self, wire: u64) -> Result<&'a [u8], DecodeError> {
        expect_wire(wire, WIRE_LEN)?;
        let len = self.varint()?;
        let len = usize::try_from(len)
            .map_err(|_| DecodeError::Malformed("field length overflows usize"))?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::Truncated)?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn string(&mut self, wire: u64) -> Result<String, DecodeError> {
        let raw = self.bytes_field(wire)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| DecodeError::Malformed("invalid utf-8 in string field"))
    }
}
