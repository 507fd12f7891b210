//! RFC 1951 §3.2.5/§3.2.6/§3.2.7 constant tables: fixed Huffman code lengths,
//! the length/distance base+extra-bits tables, and the code-length alphabet's
//! fixed transmission order.
//!
//! Cross-checked against `original_source/zlib/zlib_compress.h`'s
//! `fixed_hf_literals_table`/`fixed_hf_literals_lengths` (dense per-symbol
//! encode-side tables) and `original_source/zlib/zlib_decompress.h`'s
//! `fixed_mins`/`fixed_maxs` (sparse per-range decode-side tables) — both
//! describe the same RFC defaults the constants below reproduce directly,
//! since a dense per-symbol length vector is all this crate's generic
//! canonical-Huffman table builder needs.

pub const BLOCK_END: usize = 256;

pub const LITERAL_ALPHABET_SIZE: usize = 288;
pub const DISTANCE_ALPHABET_SIZE: usize = 30;
pub const CODE_LENGTH_ALPHABET_SIZE: usize = 19;

/// `length[257..286)` base values, RFC 1951 §3.2.5.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// `distance[0..30)` base values, RFC 1951 §3.2.5.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Fixed transmission order for the code-length alphabet's own code lengths
/// (RFC 1951 §3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// RFC 1951 §3.2.6 fixed literal/length code lengths.
pub fn fixed_literal_lengths() -> Vec<u8> {
    (0..LITERAL_ALPHABET_SIZE)
        .map(|sym| {
            if sym < 144 {
                8
            } else if sym < 256 {
                9
            } else if sym < 280 {
                7
            } else {
                8
            }
        })
        .collect()
}

/// RFC 1951 §3.2.6 fixed distance code lengths (all 5 bits).
pub fn fixed_distance_lengths() -> Vec<u8> {
    vec![5; DISTANCE_ALPHABET_SIZE]
}

/// Maps a match length (3..=258) to its length-code symbol (257..=285).
pub fn length_to_symbol(length: u16) -> usize {
    LENGTH_BASE
        .iter()
        .rposition(|&base| base <= length)
        .expect("length in range 3..=258")
        + 257
}

/// Maps a match distance (1..=32768) to its distance-code symbol (0..=29).
pub fn distance_to_symbol(distance: u16) -> usize {
    DISTANCE_BASE
        .iter()
        .rposition(|&base| base <= distance)
        .expect("distance in range 1..=32768")
}
