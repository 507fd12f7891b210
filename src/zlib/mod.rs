//! DEFLATE (RFC 1951) encoder and decoder, wrapped in the zlib idiom this
//! crate's format tag names after the C source's module naming.
//!
//! Grounded in `oozextract::extractor::mod.rs`'s block-driver shape (a loop
//! that reads a header, dispatches on a small tagged type, and decodes one
//! block's symbols before checking for a final/terminal condition) and in
//! `original_source/zlib/{zlib_compress,zlib_decompress}.h` for the exact
//! fixed-table contents and stored-block framing.

pub mod huffman;
pub mod lz77;
pub mod tables;

use crate::error::{ZlibError, ZlibResult};
use crate::bitstream::{BitReader, BitWriter};
use huffman::{DecodeTable, Tree};
use lz77::Symbol;

/// Encodes `input` as a single zlib-idiom DEFLATE stream. Infallible: the
/// stored-block fallback guarantees every input, including the empty slice,
/// produces a valid stream (see §4.2 — allocation failure has no safe-Rust
/// analogue, so there is nothing left that can fail).
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    if input.is_empty() {
        emit_stored(&mut writer, input, true);
        return writer.into_bytes();
    }

    let mut offset = 0;
    while offset < input.len() {
        let end = (offset + 32767).min(input.len());
        let block = &input[offset..end];
        let is_final = end == input.len();

        let symbols = lz77::compress(block);
        let plan = build_dynamic_plan(&symbols);

        let mut fixed_probe = BitWriter::new();
        emit_fixed(&mut fixed_probe, &symbols, is_final);
        let fixed_bytes = (fixed_probe.bit_len() + 7) / 8;

        let mut dynamic_probe = BitWriter::new();
        emit_dynamic(&mut dynamic_probe, &plan, &symbols, is_final);
        let dynamic_bytes = (dynamic_probe.bit_len() + 7) / 8;

        let threshold = block.len() + 5;
        if fixed_bytes > threshold && dynamic_bytes > threshold {
            log::debug!("block [{offset}..{end}): stored ({} bytes)", block.len());
            emit_stored(&mut writer, block, is_final);
        } else if fixed_bytes <= dynamic_bytes {
            log::debug!("block [{offset}..{end}): fixed huffman ({fixed_bytes} bytes)");
            emit_fixed(&mut writer, &symbols, is_final);
        } else {
            log::debug!("block [{offset}..{end}): dynamic huffman ({dynamic_bytes} bytes)");
            emit_dynamic(&mut writer, &plan, &symbols, is_final);
        }
        offset = end;
    }
    writer.into_bytes()
}

/// Decodes a zlib-idiom DEFLATE stream produced by [`compress`] or any
/// RFC-1951-conformant encoder.
pub fn decompress(input: &[u8]) -> ZlibResult<Vec<u8>> {
    let mut reader = BitReader::new(input);
    let mut output = Vec::new();
    loop {
        let bfinal = reader.read_bits(1)?;
        let btype = reader.read_bits(2)?;
        match btype {
            0 => decode_stored(&mut reader, &mut output)?,
            1 => {
                let lit = DecodeTable::from_lengths(&tables::fixed_literal_lengths());
                let dist = DecodeTable::from_lengths(&tables::fixed_distance_lengths());
                decode_symbols(&mut reader, &mut output, &lit, &dist)?;
            }
            2 => {
                let (lit, dist) = read_dynamic_tables(&mut reader)?;
                decode_symbols(&mut reader, &mut output, &lit, &dist)?;
            }
            3 => return Err(ZlibError::InvalidCompressionType),
            _ => unreachable!("read_bits(2) cannot return > 3"),
        }
        if bfinal == 1 {
            break;
        }
    }
    Ok(output)
}

fn map_huffman_err(e: huffman::DecodeError) -> ZlibError {
    match e {
        huffman::DecodeError::Eof => ZlibError::IoError,
        huffman::DecodeError::InvalidCode => ZlibError::InvalidDecodedValue,
    }
}

fn decode_stored(reader: &mut BitReader<'_>, output: &mut Vec<u8>) -> ZlibResult<()> {
    reader.skip_to_byte();
    let len_bytes = reader.read_bytes(2)?;
    let len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]);
    let nlen_bytes = reader.read_bytes(2)?;
    let nlen = u16::from_le_bytes([nlen_bytes[0], nlen_bytes[1]]);
    if len != !nlen {
        return Err(ZlibError::InvalidLenChecksum);
    }
    let data = reader.read_bytes(len as usize)?;
    output.extend_from_slice(data);
    Ok(())
}

fn decode_symbols(
    reader: &mut BitReader<'_>,
    output: &mut Vec<u8>,
    lit: &DecodeTable,
    dist: &DecodeTable,
) -> ZlibResult<()> {
    loop {
        let sym = lit.decode(reader).map_err(map_huffman_err)?;
        if sym as usize == tables::BLOCK_END {
            return Ok(());
        }
        if (sym as usize) < tables::BLOCK_END {
            output.push(sym as u8);
            continue;
        }

        let idx = sym as usize - (tables::BLOCK_END + 1);
        let base = *tables::LENGTH_BASE
            .get(idx)
            .ok_or(ZlibError::InvalidDecodedValue)?;
        let extra_bits = tables::LENGTH_EXTRA_BITS[idx] as u32;
        let length = base + reader.read_bits(extra_bits)? as u16;

        let dist_sym = dist.decode(reader).map_err(map_huffman_err)?;
        let didx = dist_sym as usize;
        let dbase = *tables::DISTANCE_BASE
            .get(didx)
            .ok_or(ZlibError::InvalidDecodedValue)?;
        let dextra_bits = tables::DISTANCE_EXTRA_BITS[didx] as u32;
        let distance = dbase + reader.read_bits(dextra_bits)? as u16;

        if distance as usize > output.len() {
            return Err(ZlibError::CorruptedData);
        }
        let start = output.len() - distance as usize;
        for k in 0..length as usize {
            let byte = output[start + k];
            output.push(byte);
        }
    }
}

fn read_dynamic_tables(reader: &mut BitReader<'_>) -> ZlibResult<(DecodeTable, DecodeTable)> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    let mut cl_lengths = [0u8; tables::CODE_LENGTH_ALPHABET_SIZE];
    for k in 0..hclen {
        cl_lengths[tables::CODE_LENGTH_ORDER[k]] = reader.read_bits(3)? as u8;
    }
    let cl_table = DecodeTable::from_lengths(&cl_lengths);

    let total = hlit + hdist;
    let mut combined = Vec::with_capacity(total);
    while combined.len() < total {
        let sym = cl_table.decode(reader).map_err(map_huffman_err)?;
        match sym {
            0..=15 => combined.push(sym as u8),
            16 => {
                let extra = reader.read_bits(2)? as usize + 3;
                let prev = *combined.last().ok_or(ZlibError::CorruptedData)?;
                if combined.len() + extra > total {
                    return Err(ZlibError::CorruptedData);
                }
                combined.extend(std::iter::repeat(prev).take(extra));
            }
            17 => {
                let extra = reader.read_bits(3)? as usize + 3;
                if combined.len() + extra > total {
                    return Err(ZlibError::CorruptedData);
                }
                combined.extend(std::iter::repeat(0).take(extra));
            }
            18 => {
                let extra = reader.read_bits(7)? as usize + 11;
                if combined.len() + extra > total {
                    return Err(ZlibError::CorruptedData);
                }
                combined.extend(std::iter::repeat(0).take(extra));
            }
            _ => return Err(ZlibError::InvalidDecodedValue),
        }
    }

    let lit_lengths = combined[0..hlit].to_vec();
    let dist_lengths = combined[hlit..total].to_vec();
    Ok((
        DecodeTable::from_lengths(&lit_lengths),
        DecodeTable::from_lengths(&dist_lengths),
    ))
}

struct DynamicPlan {
    lit_tree: Tree,
    dist_tree: Tree,
    cl_tree: Tree,
    hlit: usize,
    hdist: usize,
    hclen: usize,
    rle: Vec<(u8, u8)>,
}

fn trimmed_len(lengths: &[u8], min_count: usize) -> usize {
    let mut count = lengths.len();
    while count > min_count && lengths[count - 1] == 0 {
        count -= 1;
    }
    count
}

/// Run-length-encodes a concatenated literal/distance length vector using
/// the code-length alphabet's symbols 16 (repeat previous 3..6), 17 (zero run
/// 3..10) and 18 (zero run 11..138), per §4.2.
fn rle_encode(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let val = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == val {
            run += 1;
        }
        if val == 0 {
            let mut remaining = run;
            while remaining > 0 {
                if remaining < 3 {
                    for _ in 0..remaining {
                        out.push((0, 0));
                    }
                    remaining = 0;
                } else if remaining <= 10 {
                    out.push((17, (remaining - 3) as u8));
                    remaining = 0;
                } else {
                    let take = remaining.min(138);
                    out.push((18, (take - 11) as u8));
                    remaining -= take;
                }
            }
        } else {
            out.push((val, 0));
            let mut remaining = run - 1;
            while remaining > 0 {
                if remaining < 3 {
                    for _ in 0..remaining {
                        out.push((val, 0));
                    }
                    remaining = 0;
                } else {
                    let take = remaining.min(6);
                    out.push((16, (take - 3) as u8));
                    remaining -= take;
                }
            }
        }
        i += run;
    }
    out
}

fn build_dynamic_plan(symbols: &[Symbol]) -> DynamicPlan {
    let mut lit_freq = vec![0u32; tables::LITERAL_ALPHABET_SIZE];
    let mut dist_freq = vec![0u32; tables::DISTANCE_ALPHABET_SIZE];
    for s in symbols {
        match s {
            Symbol::Literal(b) => lit_freq[*b as usize] += 1,
            Symbol::Match { length, distance } => {
                lit_freq[tables::length_to_symbol(*length)] += 1;
                dist_freq[tables::distance_to_symbol(*distance)] += 1;
            }
        }
    }
    lit_freq[tables::BLOCK_END] += 1;
    if dist_freq.iter().all(|&c| c == 0) {
        dist_freq[0] = 1;
    }

    let lit_tree = Tree::from_frequencies(&lit_freq, 15);
    let dist_tree = Tree::from_frequencies(&dist_freq, 15);

    let hlit = trimmed_len(&lit_tree.lengths, 257);
    let hdist = trimmed_len(&dist_tree.lengths, 1);

    let mut combined = lit_tree.lengths[0..hlit].to_vec();
    combined.extend_from_slice(&dist_tree.lengths[0..hdist]);
    let rle = rle_encode(&combined);

    let mut cl_freq = vec![0u32; tables::CODE_LENGTH_ALPHABET_SIZE];
    for (sym, _) in &rle {
        cl_freq[*sym as usize] += 1;
    }
    let cl_tree = Tree::from_frequencies(&cl_freq, 7);
    let cl_lengths_ordered: Vec<u8> = tables::CODE_LENGTH_ORDER
        .iter()
        .map(|&i| cl_tree.lengths[i])
        .collect();
    let hclen = trimmed_len(&cl_lengths_ordered, 4);

    DynamicPlan {
        lit_tree,
        dist_tree,
        cl_tree,
        hlit,
        hdist,
        hclen,
        rle,
    }
}

fn emit_dynamic(writer: &mut BitWriter, plan: &DynamicPlan, symbols: &[Symbol], is_final: bool) {
    writer.write_bits(is_final as u64, 1);
    writer.write_bits(2, 2);
    writer.write_bits((plan.hlit - 257) as u64, 5);
    writer.write_bits((plan.hdist - 1) as u64, 5);
    writer.write_bits((plan.hclen - 4) as u64, 4);
    for k in 0..plan.hclen {
        let len = plan.cl_tree.lengths[tables::CODE_LENGTH_ORDER[k]];
        writer.write_bits(len as u64, 3);
    }
    for &(sym, extra) in &plan.rle {
        plan.cl_tree.encode(writer, sym as usize);
        match sym {
            16 => writer.write_bits(extra as u64, 2),
            17 => writer.write_bits(extra as u64, 3),
            18 => writer.write_bits(extra as u64, 7),
            _ => {}
        }
    }
    emit_match_stream(writer, &plan.lit_tree, &plan.dist_tree, symbols);
}

fn emit_fixed(writer: &mut BitWriter, symbols: &[Symbol], is_final: bool) {
    let lit_tree = Tree::from_lengths(tables::fixed_literal_lengths());
    let dist_tree = Tree::from_lengths(tables::fixed_distance_lengths());
    writer.write_bits(is_final as u64, 1);
    writer.write_bits(1, 2);
    emit_match_stream(writer, &lit_tree, &dist_tree, symbols);
}

fn emit_match_stream(writer: &mut BitWriter, lit_tree: &Tree, dist_tree: &Tree, symbols: &[Symbol]) {
    for s in symbols {
        match s {
            Symbol::Literal(b) => lit_tree.encode(writer, *b as usize),
            Symbol::Match { length, distance } => {
                let lsym = tables::length_to_symbol(*length);
                lit_tree.encode(writer, lsym);
                let lidx = lsym - (tables::BLOCK_END + 1);
                writer.write_bits(
                    (*length - tables::LENGTH_BASE[lidx]) as u64,
                    tables::LENGTH_EXTRA_BITS[lidx] as u32,
                );

                let dsym = tables::distance_to_symbol(*distance);
                dist_tree.encode(writer, dsym);
                writer.write_bits(
                    (*distance - tables::DISTANCE_BASE[dsym]) as u64,
                    tables::DISTANCE_EXTRA_BITS[dsym] as u32,
                );
            }
        }
    }
    lit_tree.encode(writer, tables::BLOCK_END);
}

fn emit_stored(writer: &mut BitWriter, data: &[u8], is_final: bool) {
    writer.write_bits(is_final as u64, 1);
    writer.write_bits(0, 2);
    writer.skip_to_byte();
    let len = data.len() as u16;
    writer.write_bytes(&len.to_le_bytes());
    writer.write_bytes(&(!len).to_le_bytes());
    writer.write_bytes(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn round_trip_short_string() {
        let s = b"This is a test string, DEFLATE.\0";
        let compressed = compress(s);
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, s);
    }

    #[test_log::test]
    fn known_ciphertext_decodes_to_test_string() {
        let ciphertext: [u8; 53] = [
            0x0B, 0xC9, 0xC8, 0x2C, 0x56, 0x00, 0xA2, 0x44, 0x85, 0x92, 0xD4, 0xE2, 0x12, 0x85,
            0xE2, 0x92, 0xA2, 0xCC, 0xBC, 0x74, 0x85, 0x92, 0x7C, 0x85, 0xE4, 0xFC, 0xDC, 0x82,
            0xA2, 0xD4, 0x62, 0xA0, 0x4C, 0x5E, 0x8A, 0x42, 0x4A, 0x2A, 0x9C, 0x5B, 0x5A, 0x0C,
            0x52, 0xE0, 0xE2, 0xEA, 0xE6, 0xE3, 0x18, 0xE2, 0xAA, 0x07, 0x00,
        ];
        let expect = b"This is a test string, DEFLATE.\0";
        assert_eq!(decompress(&ciphertext).unwrap(), expect);
    }

    #[test_log::test]
    fn dynamic_huffman_round_trip_on_repetitive_input() {
        let s = b"the quick brown fox the quick brown fox the quick brown fox jumps over!"
            .repeat(50);
        let compressed = compress(&s);
        assert_eq!(decompress(&compressed).unwrap(), s);
    }

    #[test_log::test]
    fn empty_input_round_trips() {
        let compressed = compress(&[]);
        assert_eq!(decompress(&compressed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn match_with_length_greater_than_distance_self_overlaps() {
        // A single 'a' followed by a backreference (distance=1, length=5)
        // must expand to six repeated bytes.
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1); // BFINAL
        writer.write_bits(1, 2); // BTYPE = fixed
        let lit_tree = Tree::from_lengths(tables::fixed_literal_lengths());
        let dist_tree = Tree::from_lengths(tables::fixed_distance_lengths());
        lit_tree.encode(&mut writer, b'a' as usize);
        emit_match_stream(
            &mut writer,
            &lit_tree,
            &dist_tree,
            &[Symbol::Match {
                length: 5,
                distance: 1,
            }],
        );
        let bytes = writer.into_bytes();
        let decoded = decompress(&bytes).unwrap();
        assert_eq!(decoded, b"aaaaaa");
    }

    #[test]
    fn offset_overrun_before_any_output_is_corrupted_data() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1);
        writer.write_bits(1, 2);
        let lit_tree = Tree::from_lengths(tables::fixed_literal_lengths());
        let dist_tree = Tree::from_lengths(tables::fixed_distance_lengths());
        emit_match_stream(
            &mut writer,
            &lit_tree,
            &dist_tree,
            &[Symbol::Match {
                length: 3,
                distance: 1,
            }],
        );
        let bytes = writer.into_bytes();
        assert_eq!(decompress(&bytes), Err(ZlibError::CorruptedData));
    }
}
