//! Literals section parsing: the Raw/RLE/Compressed/Treeless header variants
//! and their four payload shapes, per §3.1.1.3 and grounded in
//! `original_source/zstd/zstd.h`'s `parse_literals_section`/`decode_literals`.

use crate::bitstream::BitReader;
use crate::error::{ZstdError, ZstdResult};
use crate::zstd::huffman;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Raw,
    Rle,
    Compressed,
    Treeless,
}

fn block_type(value: u64) -> BlockType {
    match value {
        0 => BlockType::Raw,
        1 => BlockType::Rle,
        2 => BlockType::Compressed,
        _ => BlockType::Treeless,
    }
}

/// `(Regenerated_Size, Compressed_Size)` bit width for the Compressed/Treeless
/// header shapes, keyed by `Size_Format`.
fn field_bits(size_format: u64) -> u32 {
    match size_format {
        0 | 1 => 10,
        2 => 14,
        _ => 18,
    }
}

/// The decoded literals for one block, plus the byte length of the section
/// header and payload together (how far to advance the block cursor).
pub struct Literals {
    pub data: Vec<u8>,
    pub section_len: usize,
}

/// Parses and decodes a literals section. `huffman_table` carries the last
/// block's Huffman table across calls within a frame, read by `Treeless`
/// blocks and replaced by `Compressed` ones, per §3.1.1.3.1's note that a
/// compressed block may omit its own tree description and reuse the
/// previous one.
pub fn parse(data: &[u8], huffman_table: &mut Option<huffman::Table>) -> ZstdResult<Literals> {
    let mut reader = BitReader::new(data);
    let kind = block_type(reader.read_bits(2)?);
    let size_format = reader.read_bits(2)?;

    match kind {
        BlockType::Raw | BlockType::Rle => {
            let regenerated_size = match size_format {
                0 | 2 => (reader.read_bits(4)? << 1) + (size_format >> 1),
                1 => reader.read_bits(12)?,
                _ => reader.read_bits(20)?,
            } as usize;

            let payload = if kind == BlockType::Raw {
                reader.read_bytes(regenerated_size)?.to_vec()
            } else {
                let value = reader.read_bytes(1)?[0];
                vec![value; regenerated_size]
            };
            Ok(Literals {
                data: payload,
                section_len: reader.byte_pos(),
            })
        }
        BlockType::Compressed | BlockType::Treeless => {
            let bits = field_bits(size_format);
            let regenerated_size = reader.read_bits(bits)? as usize;
            let compressed_size = reader.read_bits(bits)? as usize;
            let streams_cnt = if size_format == 0 { 1usize } else { 4 };

            let mut tree_desc_len = 0usize;
            if kind == BlockType::Compressed {
                let (table, len) = huffman::read_tree_description(&mut reader)?;
                *huffman_table = Some(table);
                tree_desc_len = len;
            } else if huffman_table.is_none() {
                return Err(ZstdError::CorruptedData);
            }
            let table = huffman_table.as_ref().expect("checked above");

            let total_streams_size = compressed_size
                .checked_sub(tree_desc_len)
                .ok_or(ZstdError::CorruptedData)?;

            let mut out = Vec::with_capacity(regenerated_size);
            if streams_cnt == 1 {
                let stream = reader.read_bytes(total_streams_size)?;
                huffman::decode_stream(stream, table, &mut out, regenerated_size, false)?;
            } else {
                let sizes_bytes = reader.read_bytes(6)?;
                let mut sizes = [0usize; 4];
                for i in 0..3 {
                    sizes[i] =
                        u16::from_le_bytes([sizes_bytes[2 * i], sizes_bytes[2 * i + 1]]) as usize;
                }
                let first_three: usize = sizes[0..3].iter().sum();
                sizes[3] = total_streams_size
                    .checked_sub(6 + first_three)
                    .ok_or(ZstdError::CorruptedData)?;

                for &size in &sizes {
                    let stream = reader.read_bytes(size)?;
                    huffman::decode_stream(stream, table, &mut out, regenerated_size, true)?;
                }
            }

            if out.len() != regenerated_size {
                return Err(ZstdError::CorruptedData);
            }
            Ok(Literals {
                data: out,
                section_len: reader.byte_pos(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_literals_five_bit_size() {
        // block_type=Raw(0), size_format=2 (selects the "+1" offset bit),
        // 4 explicit bits = 1 -> regenerated_size = (1<<1)+1 = 3.
        let data = [0x18u8, b'a', b'b', b'c'];
        let mut table = None;
        let lit = parse(&data, &mut table).unwrap();
        assert_eq!(lit.data, b"abc");
        assert_eq!(lit.section_len, 4);
    }

    #[test]
    fn rle_literals_repeats_single_byte() {
        // block_type=Rle(1), size_format=0, 4 explicit bits = 1 -> size 2.
        let data = [0x11u8, b'x'];
        let mut table = None;
        let lit = parse(&data, &mut table).unwrap();
        assert_eq!(lit.data, vec![b'x'; 2]);
        assert_eq!(lit.section_len, 2);
    }

    #[test]
    fn treeless_without_prior_table_is_corrupted_data() {
        // block_type=Treeless(3), size_format=0 -> two 10-bit size fields,
        // both zero, fitting exactly in the 3 bytes provided.
        let data = [0x03u8, 0x00, 0x00];
        let mut table = None;
        assert_eq!(parse(&data, &mut table), Err(ZstdError::CorruptedData));
    }
}
