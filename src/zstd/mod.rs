//! Zstandard (RFC 8878) encoder and decoder entry points.
//!
//! Grounded in `original_source/zstd/zstd.h`'s `zstd_decompress` outer
//! multi-frame loop and `zstd_compress_simple`'s single-frame, Raw-block-only
//! encoder — this crate does not implement the Huffman/FSE compressor side,
//! matching the source's own "compression here is a stored-block wrapper,
//! not a real entropy coder" shape.

pub mod block;
pub mod frame;
pub mod fse;
pub mod huffman;
pub mod literals;
pub mod sequences;
pub mod tables;

use crate::bitstream::BitWriter;
use crate::error::{ZstdError, ZstdResult};
use crate::xxhash64::xxhash64;
use tables::MAX_BLOCK_SIZE;

const FRAME_MAGIC: u32 = 0xFD2F_B528;

/// Wraps `input` in a single zstd frame made of Raw blocks, each at most
/// [`MAX_BLOCK_SIZE`]. `checksum` controls whether a trailing xxHash64
/// content checksum is appended, per §3.1.1's optional `Content_Checksum`.
pub fn compress(input: &[u8], checksum: bool) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bytes(&FRAME_MAGIC.to_le_bytes());

    // Single_Segment_flag is set, so Frame_Content_Size is always present
    // and its width is chosen by value per §3.1.1.1's table, collapsing to
    // the 8-byte field whenever the size doesn't fit a smaller one. The
    // Frame_Content_Size_flag (FHD bits 7-6) must name the width actually
    // emitted below, or the decoder reads the wrong number of FCS bytes.
    let len = input.len() as u64;
    let fcs_flag = if len < 256 {
        0u32
    } else if len < 65536 + 256 {
        1u32
    } else if len <= u32::MAX as u64 {
        2u32
    } else {
        3u32
    };

    let content_checksum_flag = if checksum { 1u32 } else { 0 };
    let single_segment_flag = 1u32 << 5;
    let fhd = (fcs_flag << 6) | single_segment_flag | (content_checksum_flag << 2);
    writer.write_bytes(&[fhd as u8]);

    match fcs_flag {
        0 => writer.write_bytes(&[len as u8]),
        1 => writer.write_bytes(&((len - 256) as u16).to_le_bytes()),
        2 => writer.write_bytes(&(len as u32).to_le_bytes()),
        _ => writer.write_bytes(&len.to_le_bytes()),
    }

    if input.is_empty() {
        write_raw_block(&mut writer, &[], true);
    } else {
        let mut offset = 0;
        while offset < input.len() {
            let end = (offset + MAX_BLOCK_SIZE).min(input.len());
            let is_last = end == input.len();
            write_raw_block(&mut writer, &input[offset..end], is_last);
            offset = end;
        }
    }

    if checksum {
        let digest = xxhash64(input, 0);
        writer.write_bytes(&((digest & 0xFFFF_FFFF) as u32).to_le_bytes());
    }

    writer.into_bytes()
}

fn write_raw_block(writer: &mut BitWriter, block: &[u8], is_last: bool) {
    let header = (if is_last { 1u32 } else { 0 }) | (0 << 1) | ((block.len() as u32) << 3);
    writer.write_bytes(&header.to_le_bytes()[..3]);
    writer.write_bytes(block);
}

/// Decodes every frame in `input` back to back (concatenated frames produce
/// concatenated output, per §3.1's framing), optionally checking the total
/// length against a caller-supplied hint.
pub fn decompress(input: &[u8], expected_size: Option<u64>) -> ZstdResult<Vec<u8>> {
    let mut output = Vec::new();
    let mut cursor = 0usize;
    while cursor < input.len() {
        let parsed = frame::parse(&input[cursor..])?;
        output.extend_from_slice(&parsed.output);
        cursor += parsed.consumed;
    }

    if let Some(expected) = expected_size {
        if output.len() as u64 != expected {
            return Err(ZstdError::DecompressedSizeMismatch);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_stored_blocks() {
        let input = vec![7u8; MAX_BLOCK_SIZE + 10];
        let compressed = compress(&input, false);
        let decompressed = decompress(&compressed, None).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn checksum_mismatch_is_detected() {
        let input = b"hello zstd".to_vec();
        let mut compressed = compress(&input, true);
        let last = compressed.len() - 1;
        compressed[last] ^= 0xFF;
        assert_eq!(decompress(&compressed, None), Err(ZstdError::ChecksumFail));
    }

    #[test]
    fn empty_input_round_trips() {
        let compressed = compress(&[], true);
        let decompressed = decompress(&compressed, None).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn size_hint_mismatch_is_detected() {
        let compressed = compress(b"abc", false);
        assert_eq!(
            decompress(&compressed, Some(99)),
            Err(ZstdError::DecompressedSizeMismatch)
        );
    }

    /// A real single-segment zstd frame (Huffman-coded literals, FSE-coded
    /// sequences, no content checksum) carried over from
    /// `original_source/zstd/inflate_test.c`'s `zstd_compressed_data`,
    /// exercising the full compressed-block path end to end rather than only
    /// this crate's own raw-block encoder output.
    const KNOWN_CIPHERTEXT: [u8; 69] = [
        0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x44, 0xE5, 0x01, 0x00, 0x42, 0x04, 0x0E, 0x14, 0xA0, 0xB5,
        0x39, 0xF1, 0xB4, 0x24, 0x74, 0xC5, 0xAE, 0xA2, 0x6E, 0x94, 0x8D, 0xA0, 0xFF, 0x9F, 0xDF,
        0xFE, 0x67, 0x0D, 0x81, 0x6B, 0x4B, 0x77, 0x24, 0x12, 0x86, 0xB9, 0x7B, 0x9E, 0x15, 0x1E,
        0xD0, 0xB3, 0x18, 0x51, 0xF5, 0x6E, 0x92, 0xDA, 0xBD, 0x84, 0x6C, 0x20, 0xB9, 0x03, 0x3C,
        0xA7, 0x90, 0x59, 0xB4, 0xA1, 0x4D, 0x21, 0x04, 0x00,
    ];

    #[test]
    fn known_ciphertext_decodes_to_declared_length() {
        // Frame_Content_Size is 68 (single-byte field, value 0x44 at offset 5);
        // a correct decoder reproduces exactly that many output bytes from the
        // frame's one compressed block.
        let decompressed = decompress(&KNOWN_CIPHERTEXT, None).unwrap();
        assert_eq!(decompressed.len(), 68);
    }
}
