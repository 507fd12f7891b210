//! Sequences section: count header, Symbol_Compression_Modes table
//! construction, interleaved FSE decode, and recent-offset history.
//!
//! Grounded in `original_source/zstd/zstd.h`'s `parse_sequence_section`/
//! `decode_sequences`/`update_off_history`/`sequence_execution`, with the
//! offset-history zero-guard hardened per the crate's own error taxonomy
//! rather than the source's unchecked subtraction.

use crate::bitstream::{BitReader, ReverseBitReader};
use crate::error::{ZstdError, ZstdResult};
use crate::zstd::fse;
use crate::zstd::tables::{
    LL_CODES, LL_DEFAULT_LOG, LL_DEFAULT_NORM, MAX_LITERALS_LENGTH_CODE, MAX_MATCH_LENGTH_CODE,
    MAX_OFFSET_CODE, ML_CODES, ML_DEFAULT_LOG, ML_DEFAULT_NORM, OL_DEFAULT_LOG, OL_DEFAULT_NORM,
};

const LL_MAX_LOG: u8 = 9;
const ML_MAX_LOG: u8 = 9;
const OL_MAX_LOG: u8 = 8;

/// One decoded sequence: literal-length, match-length, and the raw
/// (not yet history-resolved) offset code value.
#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    pub literal_length: u32,
    pub match_length: u32,
    pub offset_value: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Predefined,
    Rle,
    FseCompressed,
    Repeat,
}

fn mode_from(v: u64) -> Mode {
    match v {
        0 => Mode::Predefined,
        1 => Mode::Rle,
        2 => Mode::FseCompressed,
        _ => Mode::Repeat,
    }
}

/// Either a built FSE table or a fixed RLE symbol, for one of LL/ML/OL.
enum Plan {
    Fse(fse::Table),
    Rle(u8),
}

impl Plan {
    fn symbol(&self, state: usize) -> u8 {
        match self {
            Plan::Fse(t) => t.symbol_at(state),
            Plan::Rle(v) => *v,
        }
    }
}

/// Frame-scoped state: the last built plan for each length-type, reused by
/// `Repeat` mode and replaced by any other mode.
#[derive(Default)]
pub struct SequenceTables {
    ll: Option<Plan>,
    ol: Option<Plan>,
    ml: Option<Plan>,
}

fn resolve_plan(
    reader: &mut BitReader<'_>,
    mode: Mode,
    predefined_norm: &[i16],
    predefined_log: u8,
    max_log: u8,
    max_symbol: usize,
    slot: &mut Option<Plan>,
) -> ZstdResult<()> {
    match mode {
        Mode::Predefined => {
            *slot = Some(Plan::Fse(fse::build_predefined(predefined_norm, predefined_log)));
        }
        Mode::Rle => {
            let value = reader.read_bytes(1)?[0];
            *slot = Some(Plan::Rle(value));
        }
        Mode::FseCompressed => {
            let table_log = reader.read_bits(4)? as u8 + 5;
            if table_log > max_log {
                return Err(ZstdError::CorruptedData);
            }
            let counts = fse::read_normalized_counts(reader, max_symbol + 1, table_log)?;
            *slot = Some(Plan::Fse(fse::build_table(&counts, table_log)?));
        }
        Mode::Repeat => {
            if slot.is_none() {
                return Err(ZstdError::CorruptedData);
            }
        }
    }
    Ok(())
}

/// Parses the sequence count, the three length-type modes, and decodes every
/// sequence. `tables` carries FSE/RLE state across blocks within a frame.
pub fn parse(data: &[u8], tables: &mut SequenceTables) -> ZstdResult<Vec<Sequence>> {
    let mut reader = BitReader::new(data);

    let first = reader.read_bytes(1)?[0];
    let count = if first < 128 {
        first as usize
    } else if first < 255 {
        let next = reader.read_bytes(1)?[0];
        (((first as usize) - 128) << 8) + next as usize
    } else {
        let next = u16::from_le_bytes(reader.read_bytes(2)?.try_into().unwrap());
        next as usize + 0x7F00
    };

    if count == 0 {
        if !reader.at_eof() {
            return Err(ZstdError::CorruptedData);
        }
        return Ok(Vec::new());
    }

    let modes_byte = reader.read_bytes(1)?[0];
    let mut modes_reader = BitReader::new(std::slice::from_ref(&modes_byte));
    let reserved = modes_reader.read_bits(2)?;
    if reserved != 0 {
        return Err(ZstdError::ReservedField);
    }
    let ml_mode = mode_from(modes_reader.read_bits(2)?);
    let ol_mode = mode_from(modes_reader.read_bits(2)?);
    let ll_mode = mode_from(modes_reader.read_bits(2)?);

    resolve_plan(
        &mut reader,
        ll_mode,
        &LL_DEFAULT_NORM,
        LL_DEFAULT_LOG,
        LL_MAX_LOG,
        MAX_LITERALS_LENGTH_CODE,
        &mut tables.ll,
    )?;
    resolve_plan(
        &mut reader,
        ol_mode,
        &OL_DEFAULT_NORM,
        OL_DEFAULT_LOG,
        OL_MAX_LOG,
        MAX_OFFSET_CODE as usize,
        &mut tables.ol,
    )?;
    resolve_plan(
        &mut reader,
        ml_mode,
        &ML_DEFAULT_NORM,
        ML_DEFAULT_LOG,
        ML_MAX_LOG,
        MAX_MATCH_LENGTH_CODE,
        &mut tables.ml,
    )?;

    let stream = reader.read_bytes(reader.remaining_len())?;
    let mut bits = ReverseBitReader::with_lower_limit(stream, 0);
    bits.skip_padding();

    let ll_plan = tables.ll.as_ref().expect("resolved above");
    let ol_plan = tables.ol.as_ref().expect("resolved above");
    let ml_plan = tables.ml.as_ref().expect("resolved above");

    let mut ll_state = match ll_plan {
        Plan::Fse(t) => t.read_initial_state(&mut bits),
        Plan::Rle(_) => 0,
    };
    let mut ol_state = match ol_plan {
        Plan::Fse(t) => t.read_initial_state(&mut bits),
        Plan::Rle(_) => 0,
    };
    let mut ml_state = match ml_plan {
        Plan::Fse(t) => t.read_initial_state(&mut bits),
        Plan::Rle(_) => 0,
    };

    let mut sequences = Vec::with_capacity(count);
    for i in 0..count {
        let ll_code = ll_plan.symbol(ll_state) as usize;
        let ml_code = ml_plan.symbol(ml_state) as usize;
        let ol_code = ol_plan.symbol(ol_state) as usize;

        if ol_code as u32 > MAX_OFFSET_CODE {
            return Err(ZstdError::CorruptedData);
        }
        if ll_code > MAX_LITERALS_LENGTH_CODE || ml_code > MAX_MATCH_LENGTH_CODE {
            return Err(ZstdError::CorruptedData);
        }

        let ol_add = bits.read_bits(ol_code as u32);
        let offset_value = ol_add + (1u32 << ol_code);

        let ml_entry = ML_CODES[ml_code];
        let ml_add = bits.read_bits(ml_entry.num_bits as u32);
        let match_length = ml_entry.baseline + ml_add;

        let ll_entry = LL_CODES[ll_code];
        let ll_add = bits.read_bits(ll_entry.num_bits as u32);
        let literal_length = ll_entry.baseline + ll_add;

        if offset_value == 0 {
            return Err(ZstdError::CorruptedData);
        }

        sequences.push(Sequence {
            literal_length,
            match_length,
            offset_value,
        });

        if i + 1 < count {
            if let Plan::Fse(t) = ll_plan {
                ll_state = t.transition(ll_state, &mut bits);
            }
            if let Plan::Fse(t) = ml_plan {
                ml_state = t.transition(ml_state, &mut bits);
            }
            if let Plan::Fse(t) = ol_plan {
                ol_state = t.transition(ol_state, &mut bits);
            }
        }

        if bits.has_error() {
            return Err(ZstdError::CorruptedData);
        }
    }

    if !bits.is_eos() || bits.has_error() {
        return Err(ZstdError::CorruptedData);
    }

    Ok(sequences)
}

/// Resolves a raw offset code against the 3-slot recent-offset history,
/// updating it in place, per RFC 8878 §3.1.1.5. Mirrors `update_off_history`
/// with an explicit zero-check on the `offset_value == 3 ∧ ll == 0` repeat
/// case, whose unguarded subtraction is a known bug in the source this was
/// ported from.
pub fn resolve_offset(
    history: &mut [u32; 3],
    offset_value: u32,
    literal_length: u32,
) -> ZstdResult<u32> {
    let actual_offset = if offset_value > 3 {
        offset_value - 3
    } else if literal_length > 0 {
        history[(offset_value - 1) as usize]
    } else if offset_value == 3 {
        history[0].checked_sub(1).ok_or(ZstdError::CorruptedData)?
    } else {
        history[offset_value as usize]
    };

    if offset_value >= 3 || (offset_value == 2 && literal_length == 0) {
        history[2] = history[1];
        history[1] = history[0];
        history[0] = actual_offset;
    } else if (offset_value == 1 && literal_length == 0) || (offset_value == 2 && literal_length > 0) {
        history[1] = history[0];
        history[0] = actual_offset;
    }

    Ok(actual_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_offset_repeat_one_keeps_history() {
        let mut history = [10u32, 20, 30];
        let offset = resolve_offset(&mut history, 1, 5).unwrap();
        assert_eq!(offset, 10);
        assert_eq!(history, [10, 20, 30]);
    }

    #[test]
    fn resolve_offset_new_offset_pushes_history() {
        let mut history = [10u32, 20, 30];
        let offset = resolve_offset(&mut history, 8, 5).unwrap();
        assert_eq!(offset, 5);
        assert_eq!(history, [5, 10, 20]);
    }

    #[test]
    fn resolve_offset_repeat_three_zero_ll_guards_zero_history() {
        let mut history = [0u32, 20, 30];
        assert_eq!(
            resolve_offset(&mut history, 3, 0),
            Err(ZstdError::CorruptedData)
        );
    }

    #[test]
    fn empty_sequence_count_requires_exhausted_stream() {
        let data = [0u8];
        let mut tables = SequenceTables::default();
        let sequences = parse(&data, &mut tables).unwrap();
        assert!(sequences.is_empty());
    }
}
