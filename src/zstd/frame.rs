//! Frame header parsing, skippable-frame handling, and the per-frame block
//! loop. Grounded in `original_source/zstd/zstd.h`'s `parse_frames`.

use crate::bitstream::BitReader;
use crate::error::{ZstdError, ZstdResult};
use crate::xxhash64::xxhash64;
use crate::zstd::block::{self, FrameState};
use crate::zstd::tables::MAX_BLOCK_SIZE;

const SKIPPABLE_MAGIC_MIN: u32 = 0x184D_2A50;
const SKIPPABLE_MAGIC_MAX: u32 = 0x184D_2A5F;
const FRAME_MAGIC: u32 = 0xFD2F_B528;

/// What one call to [`parse`] consumed and (for a real frame) produced.
pub struct Parsed {
    pub consumed: usize,
    pub output: Vec<u8>,
}

/// Parses exactly one frame (or skips exactly one skippable frame) starting
/// at `data[0]`, returning how many bytes were consumed and any decoded
/// output (empty for a skippable frame).
pub fn parse(data: &[u8]) -> ZstdResult<Parsed> {
    let mut reader = BitReader::new(data);
    let magic = reader.read_bits(32)? as u32;

    if (SKIPPABLE_MAGIC_MIN..=SKIPPABLE_MAGIC_MAX).contains(&magic) {
        let frame_len = reader.read_bits(32)? as usize;
        let consumed = 8usize
            .checked_add(frame_len)
            .ok_or(ZstdError::CorruptedData)?;
        if consumed > data.len() {
            return Err(ZstdError::IoError);
        }
        return Ok(Parsed {
            consumed,
            output: Vec::new(),
        });
    }

    if magic != FRAME_MAGIC {
        return Err(ZstdError::InvalidMagic);
    }

    let fhd = reader.read_bits(8)? as u32;
    let dictionary_id_flag = fhd & 0b11;
    let content_checksum_flag = (fhd >> 2) & 1;
    let reserved = (fhd >> 3) & 1;
    let single_segment_flag = (fhd >> 5) & 1;
    let frame_content_size_flag = (fhd >> 6) & 0b11;

    if reserved != 0 {
        return Err(ZstdError::ReservedField);
    }
    if dictionary_id_flag != 0 {
        return Err(ZstdError::UnsupportedFeature);
    }

    let mut window_size: u64 = 0;
    if single_segment_flag == 0 {
        let wd = reader.read_bits(8)? as u32;
        let mantissa = wd & 0b111;
        let exponent = (wd >> 3) & 0b1_1111;
        let window_log = 10 + exponent as u64;
        let window_base = 1u64 << window_log;
        let window_add = (window_base / 8) * mantissa as u64;
        window_size = window_base + window_add;
    }

    let fcs_len = match (frame_content_size_flag, single_segment_flag) {
        (0, 0) => 0,
        (0, _) => 1,
        (f, _) => 1u32 << f,
    } as usize;

    let mut frame_content_size: u64 = 0;
    if fcs_len > 0 {
        let bytes = reader.read_bytes(fcs_len)?;
        let mut buf = [0u8; 8];
        buf[..fcs_len].copy_from_slice(bytes);
        frame_content_size = u64::from_le_bytes(buf);
        if fcs_len == 2 {
            frame_content_size += 256;
        }
    }
    if single_segment_flag != 0 {
        window_size = frame_content_size;
    }
    log::debug!(
        "zstd frame: window_size={} frame_content_size={}",
        window_size,
        frame_content_size
    );

    let mut state = FrameState::default();
    let mut output = Vec::new();
    let header_len = reader.byte_pos();
    let mut cursor = header_len;
    let block_ceiling = window_size.max(MAX_BLOCK_SIZE as u64) as usize;

    loop {
        let last = block::parse(data, &mut cursor, &mut output, &mut state, block_ceiling)?;
        if last {
            break;
        }
    }

    if content_checksum_flag != 0 {
        let checksum_bytes = data
            .get(cursor..cursor + 4)
            .ok_or(ZstdError::IoError)?;
        let frame_checksum = u32::from_le_bytes(checksum_bytes.try_into().unwrap());
        cursor += 4;
        let computed = (xxhash64(&output, 0) & 0xFFFF_FFFF) as u32;
        if computed != frame_checksum {
            return Err(ZstdError::ChecksumFail);
        }
    }

    Ok(Parsed {
        consumed: cursor,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let data = [0u8, 0, 0, 0];
        assert_eq!(parse(&data), Err(ZstdError::InvalidMagic));
    }

    #[test]
    fn skippable_frame_is_skipped_without_decoding() {
        let mut data = SKIPPABLE_MAGIC_MIN.to_le_bytes().to_vec();
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.consumed, data.len());
        assert!(parsed.output.is_empty());
    }
}
