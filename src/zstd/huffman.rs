//! Zstd's Huffman literals coding: a weight-stream description (direct or
//! FSE-compressed) expanded into a flat, state-machine decoding table, per
//! §4.6/§3's "Zstd Huffman decoder" data model.
//!
//! Grounded in `original_source/zstd/zstd.h`'s `read_weights`/`build_huff_table`/
//! `huff_decode_stream`. The reference decodes a *state machine*, not a prefix
//! tree — as the source's own comment puts it, "those monkeys at Meta" wrote
//! RFC 8878 in tree terms while the reference (and this port) decode a flat
//! table via `UPDATE_HF_STATE`, matching `zstd-rs`'s approach.

use crate::bitstream::{BitReader, ReverseBitReader};
use crate::error::{ZstdError, ZstdResult};
use crate::zstd::fse;
use crate::zstd::tables::{HUFFMAN_WEIGHT_TABLELOG_MAX, MAXIMUM_CODE_LENGTH};

fn highest_bit(val: u32) -> u32 {
    debug_assert!(val > 0);
    32 - val.leading_zeros()
}

/// A flat Huffman decode table: physical slot `i` holds the symbol it emits
/// and the number of bits to read on the next state transition.
pub struct Table {
    symbol: Vec<u8>,
    num_bits: Vec<u8>,
    max_nb_bits: u8,
}

impl Table {
    pub fn max_nb_bits(&self) -> u8 {
        self.max_nb_bits
    }

    pub fn size(&self) -> usize {
        1 << self.max_nb_bits
    }

    /// Builds the flat table from a weight vector whose *last* entry is the
    /// already-inferred hidden weight (§4.6: the final symbol's weight is
    /// derived, not transmitted).
    fn from_weights(weights: &[u8], max_nb_bits: u8) -> ZstdResult<Self> {
        let table_size = 1usize << max_nb_bits;
        let mut symbol = vec![0u8; table_size];
        let mut num_bits = vec![0u8; table_size];

        let mut pos = 0usize;
        // Slots are filled in ascending-weight order (equivalently descending
        // nb_bits), ties broken by ascending symbol — the data model's
        // "(nb_bits desc, symbol asc)" ordering, reached by a single sorted
        // pass instead of the source's incremental insertion-sort.
        for weight in 1..=max_nb_bits + 1 {
            for (sym, &w) in weights.iter().enumerate() {
                if w as u32 != weight as u32 {
                    continue;
                }
                let nb_bits = max_nb_bits + 1 - w;
                let count = 1usize << (w - 1);
                if pos + count > table_size {
                    return Err(ZstdError::CorruptedData);
                }
                for slot in symbol.iter_mut().skip(pos).take(count) {
                    *slot = sym as u8;
                }
                for slot in num_bits.iter_mut().skip(pos).take(count) {
                    *slot = nb_bits;
                }
                pos += count;
            }
        }
        if pos != table_size {
            return Err(ZstdError::CorruptedData);
        }

        Ok(Table {
            symbol,
            num_bits,
            max_nb_bits,
        })
    }

    pub fn symbol_at(&self, state: usize) -> u8 {
        self.symbol[state]
    }

    /// `next = ((state << nb_bits) & (table_size - 1)) | read_reverse_bits(nb_bits)`.
    pub fn transition(&self, state: usize, reader: &mut ReverseBitReader<'_>) -> usize {
        let nb_bits = self.num_bits[state] as u32;
        let mask = self.size() - 1;
        ((state << nb_bits) & mask) | reader.read_bits(nb_bits) as usize
    }
}

/// Reads the 1-byte Huffman tree description header and everything it
/// introduces, returning the built decode table and the header's total byte
/// length (weights + any FSE description preceding them).
pub fn read_tree_description(reader: &mut BitReader<'_>) -> ZstdResult<(Table, usize)> {
    let start = reader.byte_pos();
    let header = reader.read_bytes(1)?[0];

    let weights = if header < 128 {
        read_fse_compressed_weights(reader, header as usize)?
    } else {
        read_direct_weights(reader, header as usize - 127)?
    };
    let desc_len = reader.byte_pos() - start;

    let exp_sum: u32 = weights
        .iter()
        .filter(|&&w| w > 0)
        .map(|&w| 1u32 << (w - 1))
        .sum();
    if exp_sum == 0 {
        return Err(ZstdError::CorruptedData);
    }
    let max_nb_bits = highest_bit(exp_sum) as u8;
    if max_nb_bits > MAXIMUM_CODE_LENGTH {
        return Err(ZstdError::CorruptedData);
    }
    let total = 1u32 << max_nb_bits;
    if total < exp_sum {
        return Err(ZstdError::CorruptedData);
    }
    let hidden_weight = highest_bit(total - exp_sum) as u8;

    let mut full_weights = weights;
    full_weights.push(hidden_weight);
    if full_weights.iter().any(|&w| w > MAXIMUM_CODE_LENGTH) {
        return Err(ZstdError::CorruptedData);
    }

    let table = Table::from_weights(&full_weights, max_nb_bits)?;
    Ok((table, desc_len))
}

/// `header >= 128`: `header - 127` weights stored as raw 4-bit nibbles, high
/// nibble first.
fn read_direct_weights(reader: &mut BitReader<'_>, count: usize) -> ZstdResult<Vec<u8>> {
    let mut weights = Vec::with_capacity(count);
    let mut pending: Option<u8> = None;
    for _ in 0..count {
        let nibble = match pending.take() {
            Some(low) => low,
            None => {
                let byte = reader.read_bytes(1)?[0];
                pending = Some(byte & 0x0F);
                (byte >> 4) & 0x0F
            }
        };
        weights.push(nibble);
    }
    Ok(weights)
}

/// `header < 128`: the next `header` bytes hold an FSE-compressed weight
/// stream — a normalized-count header followed by two interleaved FSE
/// states reading in reverse.
fn read_fse_compressed_weights(reader: &mut BitReader<'_>, total_len: usize) -> ZstdResult<Vec<u8>> {
    let section_start = reader.byte_pos();
    let table_log = reader.read_bits(4)? as u8 + 5;
    if table_log > HUFFMAN_WEIGHT_TABLELOG_MAX {
        return Err(ZstdError::CorruptedData);
    }
    // Weight alphabet is bounded by MAXIMUM_CODE_LENGTH + 1 possible values
    // (0 meaning "unused"); the normalized-count reader is given generous
    // headroom and relies on the `remaining == 1` stop condition, exactly as
    // the sequence-kind FSE tables do.
    let counts = fse::read_normalized_counts(reader, 256, table_log)?;
    let table = fse::build_table(&counts, table_log)?;

    let consumed = reader.byte_pos() - section_start;
    let remaining_bytes = total_len
        .checked_sub(consumed)
        .ok_or(ZstdError::CorruptedData)?;
    let stream = reader.read_bytes(remaining_bytes)?;

    let mut bits = ReverseBitReader::with_lower_limit(stream, -(table_log as i32));
    bits.skip_padding();

    let mut weights = Vec::new();
    let mut even_state = bits.read_bits(table_log as u32) as usize;
    let mut odd_state = bits.read_bits(table_log as u32) as usize;
    loop {
        weights.push(table.symbol_at(even_state));
        if *weights.last().unwrap() > MAXIMUM_CODE_LENGTH {
            return Err(ZstdError::CorruptedData);
        }
        even_state = table.transition(even_state, &mut bits);

        if bits.bit_pos() < 0 {
            weights.push(table.symbol_at(odd_state));
            if *weights.last().unwrap() > MAXIMUM_CODE_LENGTH {
                return Err(ZstdError::CorruptedData);
            }
            break;
        }

        weights.push(table.symbol_at(odd_state));
        if *weights.last().unwrap() > MAXIMUM_CODE_LENGTH {
            return Err(ZstdError::CorruptedData);
        }
        odd_state = table.transition(odd_state, &mut bits);

        if bits.bit_pos() < 0 {
            weights.push(table.symbol_at(even_state));
            if *weights.last().unwrap() > MAXIMUM_CODE_LENGTH {
                return Err(ZstdError::CorruptedData);
            }
            break;
        }
    }

    if bits.has_error() {
        return Err(ZstdError::CorruptedData);
    }
    if weights.len() > 255 {
        return Err(ZstdError::TooManyLiterals);
    }
    Ok(weights)
}

/// Decodes a Huffman-coded literals stream into up to `regenerated_size -
/// already_decoded` symbols, per `huff_decode_stream`. `strict_end` additionally
/// requires the cursor to land exactly on the lower limit, the check the
/// 4-substream jump-table layout applies (and the single-stream layout
/// doesn't) to catch substream boundary drift.
pub fn decode_stream(
    stream: &[u8],
    table: &Table,
    out: &mut Vec<u8>,
    regenerated_size: usize,
    strict_end: bool,
) -> ZstdResult<()> {
    let mut bits = ReverseBitReader::with_lower_limit(stream, -(table.max_nb_bits() as i32));
    bits.skip_padding();

    let mut state = bits.read_bits(table.max_nb_bits() as u32) as usize;
    while bits.above_lower_limit() && out.len() < regenerated_size {
        out.push(table.symbol_at(state));
        state = table.transition(state, &mut bits);
    }
    if bits.has_error() {
        return Err(ZstdError::CorruptedData);
    }
    if bits.byte_pos() > 0 {
        return Err(ZstdError::CorruptedData);
    }
    if strict_end && bits.bit_pos() != bits.bit_lower_limit() {
        return Err(ZstdError::CorruptedData);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_weights_high_nibble_first() {
        let data = [0x12u8, 0x30];
        let mut reader = BitReader::new(&data);
        let weights = read_direct_weights(&mut reader, 3).unwrap();
        assert_eq!(weights, vec![1, 2, 3]);
    }

    #[test]
    fn table_from_weights_covers_every_slot() {
        // Two symbols with weight 1 (1 slot each) and one with weight 2 (2
        // slots): max_nb_bits = highest_bit(1+1+2) = 2, table_size = 4.
        let weights = [1u8, 1, 2];
        let table = Table::from_weights(&weights, 2).unwrap();
        assert_eq!(table.size(), 4);
        assert!(table.num_bits.iter().all(|&b| b <= 2));
    }
}
