//! Block header parsing and the per-block decode/execute pipeline: literals
//! section, sequences section, and sequence execution against the growing
//! output buffer.
//!
//! Grounded in `original_source/zstd/zstd.h`'s `parse_block`/`decompress_block`/
//! `sequence_execution`.

use crate::bitstream::BitReader;
use crate::error::{ZstdError, ZstdResult};
use crate::zstd::huffman;
use crate::zstd::literals;
use crate::zstd::sequences::{self, SequenceTables};
use crate::zstd::tables::MAX_BLOCK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Raw,
    Rle,
    Compressed,
}

fn block_kind(value: u64) -> ZstdResult<BlockKind> {
    match value {
        0 => Ok(BlockKind::Raw),
        1 => Ok(BlockKind::Rle),
        2 => Ok(BlockKind::Compressed),
        _ => Err(ZstdError::ReservedField),
    }
}

/// Frame-scoped decoder state: the Huffman table and the three sequence-kind
/// FSE/RLE plans persist across blocks within one frame (reused by
/// `Treeless` literals and `Repeat` sequence modes), and the recent-offset
/// history likewise carries forward. All of it is dropped once the frame's
/// last block is decoded.
pub struct FrameState {
    huffman_table: Option<huffman::Table>,
    sequence_tables: SequenceTables,
    offset_history: [u32; 3],
}

impl Default for FrameState {
    fn default() -> Self {
        FrameState {
            huffman_table: None,
            sequence_tables: SequenceTables::default(),
            offset_history: [1, 4, 8],
        }
    }
}

/// Parses and decodes one block starting at `data[*cursor]`, appending its
/// output to `output` and advancing `*cursor` past it. Returns whether this
/// was the frame's last block.
pub fn parse(
    data: &[u8],
    cursor: &mut usize,
    output: &mut Vec<u8>,
    state: &mut FrameState,
    block_ceiling: usize,
) -> ZstdResult<bool> {
    let header_bytes = data.get(*cursor..*cursor + 3).ok_or(ZstdError::IoError)?;
    let mut header_reader = BitReader::new(header_bytes);
    let last_block = header_reader.read_bits(1)? == 1;
    let kind = block_kind(header_reader.read_bits(2)?)?;
    let block_size = header_reader.read_bits(21)? as usize;

    if block_size > block_ceiling.max(MAX_BLOCK_SIZE) {
        return Err(ZstdError::CorruptedData);
    }

    let body_start = *cursor + 3;
    let body = data
        .get(body_start..body_start + block_size)
        .ok_or(ZstdError::IoError)?;

    match kind {
        BlockKind::Raw => output.extend_from_slice(body),
        BlockKind::Rle => {
            let byte = *body.first().ok_or(ZstdError::CorruptedData)?;
            output.resize(output.len() + block_size, byte);
        }
        BlockKind::Compressed => decompress_block(body, output, state)?,
    }

    *cursor = body_start + block_size;
    Ok(last_block)
}

fn decompress_block(body: &[u8], output: &mut Vec<u8>, state: &mut FrameState) -> ZstdResult<()> {
    let lit = literals::parse(body, &mut state.huffman_table)?;
    let seq_data = body
        .get(lit.section_len..)
        .ok_or(ZstdError::CorruptedData)?;
    let sequence_list = sequences::parse(seq_data, &mut state.sequence_tables)?;
    execute(&lit.data, &sequence_list, &mut state.offset_history, output)
}

/// Replays a block's decoded sequences against its literals, appending the
/// reconstructed bytes to `output`. Each sequence copies `literal_length`
/// literal bytes verbatim, resolves its offset against `history`, then
/// copies `match_length` bytes from `output.len() - offset` forward,
/// byte-by-byte to support self-overlapping matches.
fn execute(
    literals: &[u8],
    sequence_list: &[sequences::Sequence],
    history: &mut [u32; 3],
    output: &mut Vec<u8>,
) -> ZstdResult<()> {
    let mut literal_pos = 0usize;

    for seq in sequence_list {
        let ll = seq.literal_length as usize;
        let literal_slice = literals
            .get(literal_pos..literal_pos + ll)
            .ok_or(ZstdError::CorruptedData)?;
        output.extend_from_slice(literal_slice);
        literal_pos += ll;

        let offset = sequences::resolve_offset(history, seq.offset_value, seq.literal_length)?;
        if offset == 0 || offset as usize > output.len() {
            return Err(ZstdError::CorruptedData);
        }

        let mut src = output.len() - offset as usize;
        for _ in 0..seq.match_length {
            let byte = output[src];
            output.push(byte);
            src += 1;
        }
    }

    let trailing = literals.get(literal_pos..).ok_or(ZstdError::CorruptedData)?;
    output.extend_from_slice(trailing);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_block_copies_body_verbatim() {
        let mut header_bits = 0u32;
        header_bits |= 1; // last_block
        header_bits |= (BlockKind::Raw as u32) << 1;
        header_bits |= 3 << 3; // block_size = 3
        let header = header_bits.to_le_bytes();
        let mut data = header[..3].to_vec();
        data.extend_from_slice(b"abc");

        let mut cursor = 0;
        let mut output = Vec::new();
        let mut state = FrameState::default();
        let last = parse(&data, &mut cursor, &mut output, &mut state, MAX_BLOCK_SIZE).unwrap();
        assert!(last);
        assert_eq!(output, b"abc");
        assert_eq!(cursor, data.len());
    }

    #[test]
    fn rle_block_repeats_single_byte() {
        let mut header_bits = 0u32;
        header_bits |= 0; // not last
        header_bits |= (BlockKind::Rle as u32) << 1;
        header_bits |= 4 << 3; // block_size = 4
        let header = header_bits.to_le_bytes();
        let mut data = header[..3].to_vec();
        data.push(b'z');

        let mut cursor = 0;
        let mut output = Vec::new();
        let mut state = FrameState::default();
        let last = parse(&data, &mut cursor, &mut output, &mut state, MAX_BLOCK_SIZE).unwrap();
        assert!(!last);
        assert_eq!(output, vec![b'z'; 4]);
    }

    #[test]
    fn reserved_block_kind_is_rejected() {
        let mut header_bits = 0u32;
        header_bits |= 1;
        header_bits |= 3 << 1; // reserved kind
        let header = header_bits.to_le_bytes();
        let data = header[..3].to_vec();

        let mut cursor = 0;
        let mut output = Vec::new();
        let mut state = FrameState::default();
        assert_eq!(
            parse(&data, &mut cursor, &mut output, &mut state, MAX_BLOCK_SIZE),
            Err(ZstdError::ReservedField)
        );
    }

    #[test]
    fn execute_copies_literals_and_self_overlapping_match() {
        let literals = b"ab";
        let sequence_list = [sequences::Sequence {
            literal_length: 2,
            match_length: 3,
            offset_value: 4, // > 3 -> actual_offset = offset_value - 3 = 1
        }];
        let mut history = [8u32, 9, 10];
        let mut output = Vec::new();
        execute(literals, &sequence_list, &mut history, &mut output).unwrap();
        assert_eq!(output, b"abbbb");
        assert_eq!(history, [1, 8, 9]);
    }
}
