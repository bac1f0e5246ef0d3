//! The SST wire frame: a 4-byte network-order length prefix followed by
//! that many payload bytes. Length 0 means "bypass: the joiner will catch
//! up via ordered write-set replay instead" and carries no payload.

use std::io::{Read, Write};

use crate::error::{SstError, SstResult};

/// Writes one frame: `payload`'s length as a big-endian `u32`, then
/// `payload` itself (omitted entirely when empty, matching the bypass
/// convention).
pub fn send_framed(stream: &mut impl Write, payload: &[u8]) -> SstResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| SstError::PayloadTooLarge(payload.len()))?;
    stream.write_all(&len.to_be_bytes())?;
    if len > 0 {
        stream.write_all(payload)?;
    }
    Ok(())
}

/// Reads one frame. Returns `None` for a bypass frame (length 0, no
/// payload follows); `Some(bytes)` otherwise.
pub fn recv_framed(stream: &mut impl Read) -> SstResult<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    read_exact_or_short(stream, &mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len == 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; len];
    read_exact_or_short(stream, &mut buf)?;
    Ok(Some(buf))
}

fn read_exact_or_short(stream: &mut impl Read, buf: &mut [u8]) -> SstResult<()> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => SstError::ShortRead,
        _ => SstError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_payload() {
        let mut buf = Vec::new();
        send_framed(&mut buf, b"hello sst").unwrap();
        let mut cursor = Cursor::new(buf);
        let received = recv_framed(&mut cursor).unwrap();
        assert_eq!(received, Some(b"hello sst".to_vec()));
    }

    #[test]
    fn bypass_frame_has_no_payload() {
        let mut buf = Vec::new();
        send_framed(&mut buf, &[]).unwrap();
        assert_eq!(buf, 0u32.to_be_bytes().to_vec());
        let mut cursor = Cursor::new(buf);
        assert_eq!(recv_framed(&mut cursor).unwrap(), None);
    }

    #[test]
    fn short_read_on_truncated_header() {
        let mut cursor = Cursor::new(vec![0u8; 2]);
        assert!(matches!(recv_framed(&mut cursor), Err(SstError::ShortRead)));
    }

    #[test]
    fn short_read_on_truncated_payload() {
        let mut buf = 5u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"ab");
        let mut cursor = Cursor::new(buf);
        assert!(matches!(recv_framed(&mut cursor), Err(SstError::ShortRead)));
    }
}
