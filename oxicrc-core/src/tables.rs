//! CRC32C lookup tables built at compile time.
//!
//! All tables are pure functions of the reflected Castagnoli polynomial and are
//! evaluated by `const fn` builders into a single `static`, so they exist
//! exactly once and are never mutated.
//!
//! Values use the reflected representation: bit 31 of a `u32` holds the
//! coefficient of `x^0` and bit 0 the coefficient of `x^31`.
//!
//! - `table0`: one byte shifted through the register
//! - `word`: four byte-position tables for 16-byte swaths of four 32-bit lanes
//! - `zeroes`: `x^(8 * d * 16^k) mod P` for every non-zero base-16 digit `d`
//! - `reverse_*`: the same structures for the unextension polynomial

/// Reflected CRC32C (Castagnoli) polynomial.
pub const CRC32C_POLY: u32 = 0x82F6_3B78;

/// log2 of the digit base used by the zero-extension tables.
pub const ZEROES_BASE_LG: usize = 4;

/// Digit base used by the zero-extension tables.
pub const ZEROES_BASE: usize = 1 << ZEROES_BASE_LG;

/// Fixed capacity of a zero-extension table.
const ZEROES_CAPACITY: usize = 256;

/// Reverse the bit order of a 32-bit value.
#[inline(always)]
pub const fn reverse_bits(bits: u32) -> u32 {
    bits.reverse_bits()
}

/// Multiply two reflected polynomials modulo `poly`.
pub const fn poly_multiply(a: u32, b: u32, poly: u32) -> u32 {
    let mut m = b;
    let mut result = 0u32;
    let mut one = 0x8000_0000u32;
    while one != 0 {
        if a & one != 0 {
            result ^= m;
        }
        // m *= x
        m = if m & 1 != 0 { (m >> 1) ^ poly } else { m >> 1 };
        one >>= 1;
    }
    result
}

/// Compute `x^n mod poly` in reflected form by square-and-multiply.
pub const fn xpow_mod(n: u64, poly: u32) -> u32 {
    let mut n = n;
    let mut result = 0x8000_0000u32; // x^0
    let mut base = 0x4000_0000u32; // x^1
    while n != 0 {
        if n & 1 != 0 {
            result = poly_multiply(result, base, poly);
        }
        base = poly_multiply(base, base, poly);
        n >>= 1;
    }
    result
}

/// Build `N` byte tables for a word that is shifted through the register.
///
/// `last` is the table value for the top bit of row 0. Power-of-two entries
/// of each row are chained from the previous row by single-bit division
/// steps. The other entries follow from linearity: `T[a | b] = T[a] ^ T[b]`
/// for disjoint `a` and `b`.
pub const fn fill_word_table<const N: usize>(poly: u32, last: u32) -> [[u32; 256]; N] {
    let mut table = [[0u32; 256]; N];
    let mut j = 0;
    while j < N {
        let mut i = 128usize;
        while i != 0 {
            if j == 0 && i == 128 {
                table[j][i] = last;
            } else {
                let pred = if i == 128 {
                    table[j - 1][1]
                } else {
                    table[j][i << 1]
                };
                table[j][i] = if pred & 1 != 0 {
                    (pred >> 1) ^ poly
                } else {
                    pred >> 1
                };
            }
            i >>= 1;
        }

        let mut i = 2usize;
        while i != 256 {
            let mut k = i + 1;
            while k != i << 1 {
                table[j][k] = table[j][i] ^ table[j][k - i];
                k += 1;
            }
            i <<= 1;
        }
        j += 1;
    }
    table
}

/// Build the zero-extension table for `poly`.
///
/// Entry `15 * k + (d - 1)` holds the multiplier for `d * 16^k` zero bytes.
/// Returns the table and the number of entries written.
pub const fn fill_zeroes_table(poly: u32) -> ([u32; ZEROES_CAPACITY], usize) {
    let mut table = [0u32; ZEROES_CAPACITY];

    // x^1 squared three times: x^8, one zero byte
    let mut inc = 0x4000_0000u32;
    let mut k = 0;
    while k < 3 {
        inc = poly_multiply(inc, inc, poly);
        k += 1;
    }

    let mut j = 0usize;
    let mut inc_len: u64 = 1;
    while inc_len != 0 {
        let mut v = inc;
        let mut a = 1;
        while a != ZEROES_BASE {
            assert!(j < ZEROES_CAPACITY, "zero-extension table overflow");
            table[j] = v;
            v = poly_multiply(v, inc, poly);
            j += 1;
            a += 1;
        }
        inc = v;
        inc_len <<= ZEROES_BASE_LG;
    }
    (table, j)
}

/// Every lookup table used by the table-driven engine.
#[derive(Debug)]
pub struct Crc32Tables {
    /// Single byte through the register.
    pub table0: [u32; 256],
    /// Byte-position tables for one 32-bit lane of a 16-byte swath.
    pub word: [[u32; 256]; 4],
    /// Zero-extension multipliers.
    pub zeroes: [u32; 256],
    /// Number of used entries in `zeroes`.
    pub zeroes_len: usize,
    /// Byte table for the unextension polynomial.
    pub reverse_table0: [u32; 256],
    /// Zero-extension multipliers for the unextension polynomial.
    pub reverse_zeroes: [u32; 256],
}

impl Crc32Tables {
    /// Build every table for the CRC32C polynomial.
    pub const fn new() -> Self {
        let table0 = fill_word_table::<1>(CRC32C_POLY, CRC32C_POLY)[0];

        // The top bit of a word followed by 12 zero bytes
        let mut last = CRC32C_POLY;
        let mut i = 0;
        while i < 12 {
            last = (last >> 8) ^ table0[(last & 0xFF) as usize];
            i += 1;
        }
        let word = fill_word_table::<4>(CRC32C_POLY, last);

        let (zeroes, zeroes_len) = fill_zeroes_table(CRC32C_POLY);

        let unextend_poly = reverse_bits((CRC32C_POLY << 1) ^ 1);
        let reverse_table0 = fill_word_table::<1>(unextend_poly, unextend_poly)[0];
        let (reverse_zeroes, _) = fill_zeroes_table(unextend_poly);

        Self {
            table0,
            word,
            zeroes,
            zeroes_len,
            reverse_table0,
            reverse_zeroes,
        }
    }
}

impl Default for Crc32Tables {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide CRC32C tables.
pub static CRC32C_TABLES: Crc32Tables = Crc32Tables::new();

#[cfg(test)]
mod tests {
    use super::*;

    fn bitwise(mut crc: u32, data: &[u8]) -> u32 {
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ CRC32C_POLY
                } else {
                    crc >> 1
                };
            }
        }
        crc
    }

    #[test]
    fn test_table0_matches_bitwise_division() {
        for i in 0..256u32 {
            let expected = bitwise(0, &[i as u8]);
            assert_eq!(CRC32C_TABLES.table0[i as usize], expected, "entry {i}");
        }
        assert_eq!(CRC32C_TABLES.table0[1], 0xF26B_8303);
        assert_eq!(CRC32C_TABLES.table0[255], 0xAD7D_5351);
    }

    #[test]
    fn test_check_value() {
        let crc = bitwise(0xFFFF_FFFF, b"123456789") ^ 0xFFFF_FFFF;
        assert_eq!(crc, 0xE306_9283);
    }

    #[test]
    fn test_zeroes_table_size() {
        assert_eq!(CRC32C_TABLES.zeroes_len, 240);
        assert_eq!(CRC32C_TABLES.zeroes_len, 15 * 16);
    }

    #[test]
    fn test_zeroes_entries_are_powers_of_x() {
        // entry 15k + d - 1 is x^(8 * d * 16^k)
        for k in 0..4u32 {
            for d in 1..16u64 {
                let index = 15 * k as usize + (d as usize - 1);
                let bits = 8 * d * 16u64.pow(k);
                assert_eq!(
                    CRC32C_TABLES.zeroes[index],
                    xpow_mod(bits, CRC32C_POLY),
                    "digit {d} magnitude {k}"
                );
            }
        }
    }

    #[test]
    fn test_xpow_mod() {
        assert_eq!(xpow_mod(0, CRC32C_POLY), 0x8000_0000);
        assert_eq!(xpow_mod(1, CRC32C_POLY), 0x4000_0000);
        assert_eq!(xpow_mod(31, CRC32C_POLY), 1);
        assert_eq!(xpow_mod(32, CRC32C_POLY), CRC32C_POLY);
        assert_eq!(
            xpow_mod(64, CRC32C_POLY),
            poly_multiply(CRC32C_POLY, CRC32C_POLY, CRC32C_POLY)
        );
    }

    #[test]
    fn test_poly_multiply_identity() {
        for value in [0u32, 1, 0x1234_5678, 0xDEAD_BEEF, CRC32C_POLY] {
            assert_eq!(poly_multiply(value, 0x8000_0000, CRC32C_POLY), value);
            assert_eq!(poly_multiply(0x8000_0000, value, CRC32C_POLY), value);
            assert_eq!(poly_multiply(value, 0, CRC32C_POLY), 0);
        }
    }

    #[test]
    fn test_poly_multiply_commutes() {
        let values = [0x0000_0001u32, 0x8F6E_37A0, 0x1234_5678, 0xFFFF_FFFF, 0x0F0F_0F0F];
        for &a in &values {
            for &b in &values {
                assert_eq!(
                    poly_multiply(a, b, CRC32C_POLY),
                    poly_multiply(b, a, CRC32C_POLY)
                );
            }
        }
    }

    #[test]
    fn test_word_table_advances_lanes() {
        // A word followed by 12 zero bytes leaves word[3][b0]^..^word[0][b3]
        let word = 0xA1B2_C3D4u32;
        let mut swath = [0u8; 16];
        swath[..4].copy_from_slice(&word.to_le_bytes());
        let expected = bitwise(0, &swath);
        let t = &CRC32C_TABLES.word;
        let got = t[3][(word & 0xFF) as usize]
            ^ t[2][((word >> 8) & 0xFF) as usize]
            ^ t[1][((word >> 16) & 0xFF) as usize]
            ^ t[0][(word >> 24) as usize];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_reverse_polynomial() {
        assert_eq!(reverse_bits((CRC32C_POLY << 1) ^ 1), 0x8F6E_37A0);
        assert_eq!(reverse_bits(reverse_bits(0x1234_5678)), 0x1234_5678);
    }

    #[test]
    fn test_table_driven_byte_step() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = CRC32C_POLY;
        for &byte in data.iter() {
            crc = CRC32C_TABLES.table0[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }
        assert_eq!(crc, bitwise(CRC32C_POLY, data));
    }
}
