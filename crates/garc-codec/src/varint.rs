use std::io::{Read, Write};

use crate::error::{CodecError, CodecResult};

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;

/// Append `value` to `buf` as a varint.
pub fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= u64::from(CONTINUATION) {
        buf.push((value as u8 & GROUP_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes [`encode_varint`] produces for `value`.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Decode a varint from the front of `data`. Returns (value, bytes_consumed).
pub fn decode_varint(data: &[u8]) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        value |= checked_group(byte, shift)?;
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(CodecError::Truncated("varint"))
}

/// Write `value` as a varint to `writer`.
pub fn write_varint<W: Write + ?Sized>(writer: &mut W, value: u64) -> CodecResult<()> {
    let mut buf = Vec::with_capacity(encoded_len(value));
    encode_varint(&mut buf, value);
    writer.write_all(&buf)?;
    Ok(())
}

/// Read one varint from `reader`, a byte at a time.
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> CodecResult<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let mut byte = [0u8; 1];
        reader
            .read_exact(&mut byte)
            .map_err(|e| CodecError::from_read(e, "varint"))?;
        value |= checked_group(byte[0], shift)?;
        if byte[0] & CONTINUATION == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Shift one 7-bit group into place, rejecting bits past the 64th.
fn checked_group(byte: u8, shift: u32) -> CodecResult<u64> {
    let group = u64::from(byte & GROUP_MASK);
    if shift > 63 || (shift == 63 && group > 1) {
        return Err(CodecError::Overflow);
    }
    Ok(group << shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(&mut buf, value);
        buf
    }

    #[test]
    fn documented_forms() {
        let cases: &[(u64, &[u8])] = &[
            (0x00, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0xff, &[0xff, 0x01]),
            (0x100, &[0x80, 0x02]),
            (0x17f, &[0xff, 0x02]),
            (0x180, &[0x80, 0x03]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
        ];
        for &(value, bytes) in cases {
            assert_eq!(encode(value), bytes, "encoding of {value:#x}");
            assert_eq!(decode_varint(bytes).unwrap(), (value, bytes.len()));
        }
    }

    #[test]
    fn zero_is_single_byte() {
        assert_eq!(encode(0), vec![0]);
        assert_eq!(encoded_len(0), 1);
    }

    #[test]
    fn max_u64_roundtrip() {
        let buf = encode(u64::MAX);
        assert_eq!(buf.len(), 10);
        assert_eq!(decode_varint(&buf).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let (value, consumed) = decode_varint(&[0x80, 0x01, 0xAA, 0xBB]).unwrap();
        assert_eq!(value, 0x80);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn decode_truncated() {
        let err = decode_varint(&[0x80]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated(_)));
        let err = decode_varint(&[]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated(_)));
    }

    #[test]
    fn decode_overflow() {
        let mut data = vec![0xFF; 9];
        data.push(0x02);
        assert!(matches!(decode_varint(&data), Err(CodecError::Overflow)));

        let data = vec![0x80; 12];
        assert!(matches!(decode_varint(&data), Err(CodecError::Overflow)));
    }

    #[test]
    fn read_varint_from_stream() {
        let mut data: &[u8] = &[0xff, 0x7f, 0x05];
        assert_eq!(read_varint(&mut data).unwrap(), 0x3fff);
        assert_eq!(read_varint(&mut data).unwrap(), 5);
        assert!(matches!(read_varint(&mut data), Err(CodecError::Truncated(_))));
    }

    #[test]
    fn write_varint_to_stream() {
        let mut out = Vec::new();
        write_varint(&mut out, 0x4000).unwrap();
        write_varint(&mut out, 1).unwrap();
        assert_eq!(out, vec![0x80, 0x80, 0x01, 0x01]);
    }

    proptest! {
        #[test]
        fn roundtrip_any_value(value in any::<u64>()) {
            let buf = encode(value);
            prop_assert_eq!(buf.len(), encoded_len(value));
            prop_assert_eq!(decode_varint(&buf).unwrap(), (value, buf.len()));
            let mut reader = buf.as_slice();
            prop_assert_eq!(read_varint(&mut reader).unwrap(), value);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn only_last_byte_lacks_continuation(value in any::<u64>()) {
            let buf = encode(value);
            let (last, rest) = buf.split_last().unwrap();
            prop_assert!(rest.iter().all(|b| b & 0x80 != 0));
            prop_assert_eq!(last & 0x80, 0);
        }
    }
}
