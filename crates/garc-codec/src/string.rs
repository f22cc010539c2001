use std::io::{Read, Write};

use crate::error::{CodecError, CodecResult};

/// Write `bytes` followed by a NUL terminator.
///
/// The caller is responsible for ensuring `bytes` contains no NUL; an
/// embedded NUL would end the string early on read.
pub fn write_cstr<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> CodecResult<()> {
    writer.write_all(bytes)?;
    writer.write_all(&[0])?;
    Ok(())
}

/// Read bytes up to and excluding the next NUL terminator.
///
/// Fails with [`CodecError::Truncated`] if the input ends first.
pub fn read_cstr<R: Read + ?Sized>(reader: &mut R) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader
            .read_exact(&mut byte)
            .map_err(|e| CodecError::from_read(e, "string"))?;
        if byte[0] == 0 {
            return Ok(out);
        }
        out.push(byte[0]);
    }
}
