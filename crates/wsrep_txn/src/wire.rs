//! The read-view prefix that precedes a write-set's serialized operations.
//!
//! Per the data model, a write-set on the wire is "a prefix containing the
//! read-view GTID, followed by the concatenation of serialized operations".
//! The prefix is fixed-width (16-byte uuid + 8-byte signed seqno, network
//! order) regardless of whether the provider advertises snapshot-read-view
//! support, so a slave can always recover the originating read view; only
//! the provider-side `assign_read_view` call is gated on that capability
//! (see [`crate::master::run_master`]).

use uuid::Uuid;
use wsrep_store::Gtid;

use crate::error::TxnError;

/// Width in bytes of the encoded read-view prefix.
pub const READ_VIEW_PREFIX_LEN: usize = 24;

/// Encodes a read-view GTID as the fixed 24-byte wire prefix.
#[must_use]
pub fn encode_read_view(gtid: Gtid) -> [u8; READ_VIEW_PREFIX_LEN] {
    let mut out = [0u8; READ_VIEW_PREFIX_LEN];
    out[0..16].copy_from_slice(gtid.uuid.as_bytes());
    out[16..24].copy_from_slice(&gtid.seqno.to_be_bytes());
    out
}

/// Splits a write-set buffer into its read-view GTID and the remaining
/// operation bytes.
pub fn decode_read_view(buf: &[u8]) -> Result<(Gtid, &[u8]), TxnError> {
    if buf.len() < READ_VIEW_PREFIX_LEN {
        return Err(TxnError::MalformedWriteSet(format!(
            "write-set buffer of {} bytes is shorter than the {}-byte read-view prefix",
            buf.len(),
            READ_VIEW_PREFIX_LEN
        )));
    }
    let mut uuid_bytes = [0u8; 16];
    uuid_bytes.copy_from_slice(&buf[0..16]);
    let mut seqno_bytes = [0u8; 8];
    seqno_bytes.copy_from_slice(&buf[16..24]);
    let gtid = Gtid {
        uuid: Uuid::from_bytes(uuid_bytes),
        seqno: i64::from_be_bytes(seqno_bytes),
    };
    Ok((gtid, &buf[READ_VIEW_PREFIX_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let gtid = Gtid {
            uuid: Uuid::from_u128(7),
            seqno: 42,
        };
        let mut buf = encode_read_view(gtid).to_vec();
        buf.extend_from_slice(&[1, 2, 3]);
        let (decoded, rest) = decode_read_view(&buf).unwrap();
        assert_eq!(decoded, gtid);
        assert_eq!(rest, &[1, 2, 3]);
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(decode_read_view(&[0u8; 10]).is_err());
    }
}
