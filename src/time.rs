//! The opaque time payload carried after a Time field's length prefix. The
//! bytes are Go's `time.Time` binary-marshal format, version 1: a version
//! byte, 8 big-endian bytes of seconds counted from January 1 of year 1,
//! 4 big-endian bytes of nanoseconds, and 2 big-endian bytes of zone offset
//! in minutes, where -1 marks UTC. Version 2 appends one byte this
//! implementation ignores on parse. Timestamps are always serialised as UTC
//! so that documents stay byte-for-byte interoperable with Go peers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};

/// Seconds between year 1 and the Unix epoch.
const UNIX_TO_INTERNAL: i64 = 62_135_596_800;

const VERSION_V1: u8 = 1;
const VERSION_V2: u8 = 2;
const LEN_V1: usize = 15;
const LEN_V2: usize = 16;

/// Appends the marshalled payload (without the length prefix).
pub fn marshal(t: SystemTime, out: &mut Vec<u8>) {
    let (payload, len) = marshal_array(t);
    out.extend_from_slice(&payload[..len]);
}

/// Stack-only variant of [`marshal`] for the allocation-free encode path.
pub fn marshal_array(t: SystemTime) -> ([u8; 16], usize) {
    let (unix_secs, nanos) = match t.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
        Err(e) => {
            // Pre-epoch times count backwards; carry borrowed nanoseconds
            // into the seconds word so nanos stays in [0, 1e9).
            let d = e.duration();
            let mut secs = -(d.as_secs() as i64);
            let mut nanos = d.subsec_nanos();
            if nanos > 0 {
                secs -= 1;
                nanos = 1_000_000_000 - nanos;
            }
            (secs, nanos)
        }
    };
    let internal = unix_secs.wrapping_add(UNIX_TO_INTERNAL);

    let mut out = [0u8; 16];
    out[0] = VERSION_V1;
    BigEndian::write_i64(&mut out[1..9], internal);
    BigEndian::write_i32(&mut out[9..13], nanos as i32);
    // Offset -1 marks UTC.
    BigEndian::write_i16(&mut out[13..15], -1);
    (out, LEN_V1)
}

/// Parses a marshalled payload. Returns `None` on any shape the Go
/// marshaller does not produce; callers map that to the zero time without
/// faulting the stream.
pub fn parse(data: &[u8]) -> Option<SystemTime> {
    let version = *data.first()?;
    let expected_len = match version {
        VERSION_V1 => LEN_V1,
        VERSION_V2 => LEN_V2,
        _ => return None,
    };
    if data.len() != expected_len {
        return None;
    }
    let internal = BigEndian::read_i64(&data[1..9]);
    let nanos = BigEndian::read_i32(&data[9..13]);
    if !(0..1_000_000_000).contains(&nanos) {
        return None;
    }
    let unix_secs = internal.wrapping_sub(UNIX_TO_INTERNAL);
    let nanos = Duration::from_nanos(nanos as u64);
    if unix_secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(unix_secs as u64) + nanos)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(unix_secs.unsigned_abs()))
            .and_then(|t| t.checked_add(nanos))
    }
}
