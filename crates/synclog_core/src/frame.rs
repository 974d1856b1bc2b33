//! Record framing inside a segment.
//!
//! ## Frame Format
//!
//! ```text
//! | length (4, LE) | crc32 (4, LE) | payload (length) |
//! ```
//!
//! The checksum covers the length bytes and the payload, so a zero-filled
//! region never decodes as an empty record.
//!
//! ## Reading policy
//!
//! - **Header or payload past the readable end**: [`FrameRead::Incomplete`].
//!   Either a writer is mid-append or a crash left a torn tail; the bytes are
//!   never returned as a record.
//! - **Checksum mismatch on a complete frame**: `Err(ChecksumMismatch)`. The
//!   record is not skipped, since skipping would lose a change event.

use crate::error::{LogError, LogResult};
use synclog_storage::StorageBackend;

/// Bytes preceding every payload.
pub const FRAME_HEADER_SIZE: u64 = 8;

/// Outcome of decoding the frame at an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    /// A whole, verified frame.
    Complete {
        /// The record payload.
        payload: Vec<u8>,
        /// Offset of the following frame.
        next_offset: u64,
    },
    /// Not enough bytes for a whole frame.
    Incomplete,
}

/// Returns the on-disk size of a frame carrying `payload_len` bytes.
#[must_use]
pub const fn frame_len(payload_len: usize) -> u64 {
    FRAME_HEADER_SIZE + payload_len as u64
}

/// Wraps `payload` in a frame.
///
/// # Errors
///
/// Returns [`LogError::PayloadTooLarge`] if the payload does not fit a
/// 32-bit length.
pub fn encode(payload: &[u8]) -> LogResult<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| LogError::PayloadTooLarge { len: payload.len() })?;
    let len_bytes = len.to_le_bytes();

    let mut data = Vec::with_capacity(FRAME_HEADER_SIZE as usize + payload.len());
    data.extend_from_slice(&len_bytes);
    data.extend_from_slice(&checksum(&len_bytes, payload).to_le_bytes());
    data.extend_from_slice(payload);
    Ok(data)
}

/// Decodes the frame starting at `offset`, looking no further than `end`.
///
/// `segment` only labels errors.
///
/// # Errors
///
/// Returns [`LogError::ChecksumMismatch`] for a complete frame whose checksum
/// does not verify, or a storage error.
pub fn read_frame(
    backend: &dyn StorageBackend,
    segment: &str,
    offset: u64,
    end: u64,
) -> LogResult<FrameRead> {
    if offset.saturating_add(FRAME_HEADER_SIZE) > end {
        return Ok(FrameRead::Incomplete);
    }

    let header = backend.read_at(offset, FRAME_HEADER_SIZE as usize)?;
    let len_bytes = [header[0], header[1], header[2], header[3]];
    let len = u32::from_le_bytes(len_bytes);
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let next_offset = offset + frame_len(len as usize);
    if next_offset > end {
        return Ok(FrameRead::Incomplete);
    }

    let payload = backend.read_at(offset + FRAME_HEADER_SIZE, len as usize)?;
    let actual = checksum(&len_bytes, &payload);
    if actual != expected {
        return Err(LogError::ChecksumMismatch {
            segment: segment.to_string(),
            offset,
            expected,
            actual,
        });
    }

    Ok(FrameRead::Complete {
        payload,
        next_offset,
    })
}

/// Walks frames from `start` and returns the end of the last intact one.
///
/// Stops at the first incomplete or mismatching frame. Used to find where a
/// writer may safely resume after a crash.
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read.
pub fn scan_intact_end(
    backend: &dyn StorageBackend,
    segment: &str,
    start: u64,
    end: u64,
) -> LogResult<u64> {
    let mut offset = start;
    loop {
        match read_frame(backend, segment, offset, end) {
            Ok(FrameRead::Complete { next_offset, .. }) => offset = next_offset,
            Ok(FrameRead::Incomplete) | Err(LogError::ChecksumMismatch { .. }) => {
                return Ok(offset)
            }
            Err(err) => return Err(err),
        }
    }
}

fn checksum(len_bytes: &[u8; 4], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(len_bytes);
    hasher.update(payload);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use synclog_storage::InMemoryBackend;

    fn backend_with(frames: &[&[u8]]) -> InMemoryBackend {
        let mut data = Vec::new();
        for payload in frames {
            data.extend(encode(payload).unwrap());
        }
        InMemoryBackend::with_data(data)
    }

    #[test]
    fn header_size_matches_layout() {
        assert_eq!(encode(b"0123456789").unwrap().len(), 18);
        assert_eq!(frame_len(10) + frame_len(5), 15 + 2 * FRAME_HEADER_SIZE);
    }

    #[test]
    fn reads_consecutive_frames() {
        let backend = backend_with(&[b"first", b"second"]);
        let end = backend.size().unwrap();

        let FrameRead::Complete { payload, next_offset } =
            read_frame(&backend, "seg", 0, end).unwrap()
        else {
            panic!("expected a frame");
        };
        assert_eq!(payload, b"first");
        assert_eq!(next_offset, 13);

        let second = read_frame(&backend, "seg", next_offset, end).unwrap();
        assert_eq!(
            second,
            FrameRead::Complete {
                payload: b"second".to_vec(),
                next_offset: end
            }
        );
        assert_eq!(read_frame(&backend, "seg", end, end).unwrap(), FrameRead::Incomplete);
    }

    #[test]
    fn torn_header_is_incomplete() {
        let mut data = encode(b"complete").unwrap();
        data.extend_from_slice(&encode(b"torn").unwrap()[..5]);
        let backend = InMemoryBackend::with_data(data);
        let end = backend.size().unwrap();

        assert_eq!(read_frame(&backend, "seg", 16, end).unwrap(), FrameRead::Incomplete);
    }

    #[test]
    fn torn_payload_is_incomplete() {
        let data = encode(b"a long enough payload").unwrap();
        let backend = InMemoryBackend::with_data(data[..data.len() - 3].to_vec());

        assert_eq!(
            read_frame(&backend, "seg", 0, backend.size().unwrap()).unwrap(),
            FrameRead::Incomplete
        );
    }

    #[test]
    fn flipped_payload_bit_is_a_checksum_error() {
        let mut data = encode(b"payload").unwrap();
        let last = data.len() - 1;
        data[last] ^= 0x01;
        let backend = InMemoryBackend::with_data(data);

        let result = read_frame(&backend, "binlog.000001", 0, backend.size().unwrap());
        assert!(matches!(
            result,
            Err(LogError::ChecksumMismatch { ref segment, offset: 0, .. }) if segment == "binlog.000001"
        ));
    }

    #[test]
    fn zero_filled_region_is_not_a_record() {
        let backend = InMemoryBackend::with_data(vec![0; 32]);
        assert!(read_frame(&backend, "seg", 0, 32).is_err());
    }

    #[test]
    fn end_limits_visibility() {
        let backend = backend_with(&[b"visible", b"hidden"]);
        assert_eq!(read_frame(&backend, "seg", 15, 15).unwrap(), FrameRead::Incomplete);
    }

    #[test]
    fn scan_stops_before_torn_tail() {
        let mut data = Vec::new();
        data.extend(encode(b"one").unwrap());
        data.extend(encode(b"two").unwrap());
        let intact = data.len() as u64;
        data.extend_from_slice(&encode(b"three").unwrap()[..9]);
        let backend = InMemoryBackend::with_data(data);

        let end = backend.size().unwrap();
        assert_eq!(scan_intact_end(&backend, "seg", 0, end).unwrap(), intact);
        assert_eq!(scan_intact_end(&backend, "seg", 11, end).unwrap(), intact);
    }

    #[test]
    fn scan_stops_before_garbage() {
        let mut data = encode(b"good").unwrap();
        data.extend_from_slice(&[0xAB; 20]);
        let backend = InMemoryBackend::with_data(data);

        assert_eq!(
            scan_intact_end(&backend, "seg", 0, backend.size().unwrap()).unwrap(),
            12
        );
    }

    proptest! {
        #[test]
        fn every_truncation_hides_the_last_frame(
            payload in prop::collection::vec(any::<u8>(), 0..256),
            cut in 1usize..64,
        ) {
            let frame = encode(&payload).unwrap();
            let cut = cut.min(frame.len());
            let backend = InMemoryBackend::with_data(frame[..frame.len() - cut].to_vec());
            let end = backend.size().unwrap();
            prop_assert_eq!(read_frame(&backend, "seg", 0, end).unwrap(), FrameRead::Incomplete);
        }
    }
}
