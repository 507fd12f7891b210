//! DEFLATE (RFC 1951) and Zstandard (RFC 8878) compression and decompression,
//! built from the wire formats up rather than bound to either reference
//! implementation's C library.
//!
//! `zlib` and `zstd` are independently usable; [`Algorithm`] and the
//! top-level [`compress`]/[`decompress`] just pick between them.

pub mod bitstream;
pub mod error;
pub mod xxhash64;
pub mod zlib;
pub mod zstd;

pub use error::Error;

/// Which codec to use for the top-level [`compress`]/[`decompress`] helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Zlib,
    Zstd,
}

/// Compresses `input` with the chosen algorithm. Zstd output carries no
/// content checksum by default; use [`zstd::compress`] directly to request
/// one.
pub fn compress(input: &[u8], algorithm: Algorithm) -> Vec<u8> {
    match algorithm {
        Algorithm::Zlib => zlib::compress(input),
        Algorithm::Zstd => zstd::compress(input, false),
    }
}

/// Decompresses `input` with the chosen algorithm.
pub fn decompress(input: &[u8], algorithm: Algorithm) -> Result<Vec<u8>, Error> {
    match algorithm {
        Algorithm::Zlib => Ok(zlib::decompress(input)?),
        Algorithm::Zstd => Ok(zstd::decompress(input, None)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog, repeatedly, repeatedly";
        let compressed = compress(input, Algorithm::Zlib);
        let decompressed = decompress(&compressed, Algorithm::Zlib).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn zstd_round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog, repeatedly, repeatedly";
        let compressed = compress(input, Algorithm::Zstd);
        let decompressed = decompress(&compressed, Algorithm::Zstd).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn zstd_multi_frame_concatenation() {
        let mut data = zstd::compress(b"first frame ", false);
        data.extend_from_slice(&zstd::compress(b"second frame", false));
        let decompressed = zstd::decompress(&data, None).unwrap();
        assert_eq!(decompressed, b"first frame second frame");
    }

    #[test]
    fn zstd_skippable_frame_is_ignored_between_real_frames() {
        let mut data = zstd::compress(b"before ", false);
        let mut skippable = 0x184D_2A50u32.to_le_bytes().to_vec();
        skippable.extend_from_slice(&4u32.to_le_bytes());
        skippable.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        data.extend_from_slice(&skippable);
        data.extend_from_slice(&zstd::compress(b"after", false));

        let decompressed = zstd::decompress(&data, None).unwrap();
        assert_eq!(decompressed, b"before after");
    }

    #[test]
    fn dispatch_reaches_both_algorithms_independently() {
        let zlib_out = compress(b"zlib payload", Algorithm::Zlib);
        let zstd_out = compress(b"zstd payload", Algorithm::Zstd);
        assert_eq!(
            decompress(&zlib_out, Algorithm::Zlib).unwrap(),
            b"zlib payload"
        );
        assert_eq!(
            decompress(&zstd_out, Algorithm::Zstd).unwrap(),
            b"zstd payload"
        );
        // Feeding a zstd frame through the zlib path must fail rather than
        // silently accept it (the known bug this dispatch avoids compared
        // one codec's stream against itself twice instead of each format
        // against its own magic).
        assert!(decompress(&zstd_out, Algorithm::Zlib).is_err());
    }
}
