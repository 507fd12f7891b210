//! Public error taxonomies for the two codecs.
//!
//! Kept as plain data enums rather than the context-chaining struct a hand-rolled
//! error type would need in a multi-region-pointer codebase: this crate only ever
//! addresses a single input slice and a single growing output buffer, so there is
//! no "which arena did this index belong to" question to answer.

use thiserror::Error;

/// Errors produced while decoding (or, for the checksum mismatch case, re-validating)
/// a DEFLATE/zlib-idiom bitstream.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ZlibError {
    #[error("read past the end of the bitstream")]
    IoError,
    #[error("corrupted deflate stream")]
    CorruptedData,
    #[error("stored block length and its one's complement disagree")]
    InvalidLenChecksum,
    #[error("reserved block type (BTYPE = 3)")]
    InvalidCompressionType,
    #[error("decoded symbol outside its alphabet")]
    InvalidDecodedValue,
    #[error("length or distance code decoded to an invalid value")]
    InvalidLength,
}

/// Errors produced while decoding a Zstandard frame.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ZstdError {
    #[error("read past the end of the bitstream")]
    IoError,
    #[error("reserved block or field value encountered")]
    Reserved,
    #[error("FSE table_log exceeds its maximum")]
    TableLogTooLarge,
    #[error("corrupted zstd stream")]
    CorruptedData,
    #[error("maximum symbol value too small for the encoded alphabet")]
    MaxSymbolValueTooSmall,
    #[error("too many literals for the declared block size")]
    TooManyLiterals,
    #[error("content checksum does not match the decompressed output")]
    ChecksumFail,
    #[error("frame magic number is not a zstd frame or skippable frame")]
    InvalidMagic,
    #[error("reserved field was non-zero")]
    ReservedField,
    #[error("unsupported feature (e.g. dictionary id)")]
    UnsupportedFeature,
    #[error("decompressed size does not match the caller-supplied hint")]
    DecompressedSizeMismatch,
}

/// Error returned by the generic, format-dispatching [`crate::decompress`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    #[error(transparent)]
    Zlib(#[from] ZlibError),
    #[error(transparent)]
    Zstd(#[from] ZstdError),
}

pub type ZlibResult<T> = Result<T, ZlibError>;
pub type ZstdResult<T> = Result<T, ZstdError>;
