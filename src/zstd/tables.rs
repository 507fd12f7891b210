//! RFC 8878 Appendix constant tables: the literal-length/match-length
//! baseline+extra-bits code tables and the three sequence-kind predefined
//! FSE distributions.
//!
//! Transcribed from `original_source/zstd/zstd.h`'s `ll_codes`/`ml_codes`
//! tables and its predefined normalized-count arrays — these are RFC
//! appendix data, not original design, so the grounding is the RFC itself
//! (cross-checked against the original source for exact values) rather than
//! any idiom to imitate.

#[derive(Debug, Clone, Copy)]
pub struct CodeEntry {
    pub baseline: u32,
    pub num_bits: u8,
}

pub const MAX_LITERALS_LENGTH_CODE: usize = 35;
pub const MAX_MATCH_LENGTH_CODE: usize = 52;

pub const LL_CODES: [CodeEntry; MAX_LITERALS_LENGTH_CODE + 1] = {
    const fn e(baseline: u32, num_bits: u8) -> CodeEntry {
        CodeEntry { baseline, num_bits }
    }
    [
        e(0, 0), e(1, 0), e(2, 0), e(3, 0), e(4, 0), e(5, 0), e(6, 0), e(7, 0),
        e(8, 0), e(9, 0), e(10, 0), e(11, 0), e(12, 0), e(13, 0), e(14, 0), e(15, 0),
        e(16, 1), e(18, 1), e(20, 1), e(22, 1), e(24, 2), e(28, 2), e(32, 3), e(40, 3),
        e(48, 4), e(64, 6), e(128, 7), e(256, 8), e(512, 9), e(1024, 10), e(2048, 11),
        e(4096, 12), e(8192, 13), e(16384, 14), e(32768, 15), e(65536, 16),
    ]
};

pub const ML_CODES: [CodeEntry; MAX_MATCH_LENGTH_CODE + 1] = {
    const fn e(baseline: u32, num_bits: u8) -> CodeEntry {
        CodeEntry { baseline, num_bits }
    }
    [
        e(3, 0), e(4, 0), e(5, 0), e(6, 0), e(7, 0), e(8, 0), e(9, 0), e(10, 0),
        e(11, 0), e(12, 0), e(13, 0), e(14, 0), e(15, 0), e(16, 0), e(17, 0), e(18, 0),
        e(19, 0), e(20, 0), e(21, 0), e(22, 0), e(23, 0), e(24, 0), e(25, 0), e(26, 0),
        e(27, 0), e(28, 0), e(29, 0), e(30, 0), e(31, 0), e(32, 0), e(33, 0), e(34, 0),
        e(35, 1), e(37, 1), e(39, 1), e(41, 1), e(43, 2), e(47, 2), e(51, 3), e(59, 3),
        e(67, 4), e(83, 4), e(99, 5), e(131, 7), e(259, 8), e(515, 9), e(1027, 10),
        e(2051, 11), e(4099, 12), e(8195, 13), e(16387, 14), e(32771, 15), e(65539, 16),
    ]
};

/// Predefined literal-length distribution, table_log 6, 36 symbols.
pub const LL_DEFAULT_NORM: [i16; 36] = [
    4, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 1, 1, 1, 1, 1,
    -1, -1, -1, -1,
];
pub const LL_DEFAULT_LOG: u8 = 6;

/// Predefined match-length distribution, table_log 6, 53 symbols.
pub const ML_DEFAULT_NORM: [i16; 53] = [
    1, 4, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1,
];
pub const ML_DEFAULT_LOG: u8 = 6;

/// Predefined offset-code distribution, table_log 5, 29 symbols.
pub const OL_DEFAULT_NORM: [i16; 29] = [
    1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1,
];
pub const OL_DEFAULT_LOG: u8 = 5;

pub const MAX_OFFSET_CODE: u32 = 31;
pub const MAX_BLOCK_SIZE: usize = 128 * 1024;
pub const FSE_TABLELOG_ABSOLUTE_MAX: u8 = 15;
pub const HUFFMAN_WEIGHT_TABLELOG_MAX: u8 = 6;
pub const MAXIMUM_CODE_LENGTH: u8 = 11;
