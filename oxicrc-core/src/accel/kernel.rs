//! Multi-stream CRC32C kernel.
//!
//! Written once against [`Ops`] and instantiated by each architecture inside
//! a `#[target_feature]` function.

use super::ops::{Ops, read_u16, read_u32, read_u64};
use super::{
    CRC32C_POWERS, CutoffStrategy, FOLD3_CONSTANTS, MAX_CRC_STREAMS, MAX_PCLMUL_STREAMS,
    MEDIUM_CUTOFF, PREFETCH_HORIZON, PREFETCH_HORIZON_MEDIUM, SMALL_CUTOFF, StreamConfig,
    reduction,
};
use crate::prefetch::prefetch_local;

/// `a * b mod P` using one carry-less multiply and one CRC step.
#[inline(always)]
pub(super) unsafe fn multiply<O: Ops>(a: u32, b: u32) -> u32 {
    unsafe {
        let product = O::low_u64(O::clmul_low(O::set(a as u64, 0), O::set(b as u64, 0)));
        // Reflected products sit one bit low
        let product = product << 1;
        ((product >> 32) as u32) ^ O::crc_u32(0, product as u32)
    }
}

/// Multiplier equivalent to extending by `length` zero bytes.
///
/// Only `length / 4` is used; the caller handles `length % 4` and requires
/// `length >= 4`.
#[inline(always)]
pub(super) unsafe fn compute_zero_constant<O: Ops>(length: usize) -> u32 {
    let mut length = length >> 2;
    let mut prev = CRC32C_POWERS[length.trailing_zeros() as usize];
    length &= length - 1;
    while length != 0 {
        let power = CRC32C_POWERS[length.trailing_zeros() as usize];
        prev = unsafe { multiply::<O>(prev, power) };
        length &= length - 1;
    }
    prev
}

#[inline(always)]
pub(super) unsafe fn extend_by_zeroes<O: Ops>(crc: u32, length: usize) -> u32 {
    unsafe {
        let mut val = crc;
        match length & 3 {
            0 => {}
            1 => val = O::crc_u8(val, 0),
            2 => val = O::crc_u16(val, 0),
            _ => {
                val = O::crc_u8(val, 0);
                val = O::crc_u16(val, 0);
            }
        }
        if length > 3 {
            val = multiply::<O>(val, compute_zero_constant::<O>(length));
        }
        val
    }
}

#[inline(always)]
unsafe fn crc_64_bytes<O: Ops>(crc: u32, ptr: *const u8) -> u32 {
    let mut crc = crc;
    for i in 0..8 {
        crc = unsafe { O::crc_u64(crc, read_u64(ptr.add(8 * i))) };
    }
    crc
}

/// Fold 64 new bytes into the four 128-bit lanes of one stream.
#[inline(always)]
unsafe fn process_64_bytes_pclmul<O: Ops>(ptr: *const u8, lanes: &mut [O::V128; 4]) {
    unsafe {
        let k1k2 = O::set(reduction::K1K2[0], reduction::K1K2[1]);
        for (i, lane) in lanes.iter_mut().enumerate() {
            let high = O::clmul_high(*lane, k1k2);
            let low = O::clmul_low(*lane, k1k2);
            *lane = O::xor(O::xor(high, low), O::load(ptr.add(16 * i)));
        }
    }
}

/// Reduce a 512-bit fold accumulator to its 32-bit CRC.
#[inline(always)]
unsafe fn finalize_pclmul_stream<O: Ops>(lanes: &[O::V128; 4]) -> u32 {
    unsafe {
        let [mut p1, p2, mut p3, p4] = *lanes;
        let mask = O::set(reduction::KMASK[0], reduction::KMASK[1]);

        // 512 -> 256
        let k5k6 = O::set(reduction::K5K6[0], reduction::K5K6[1]);
        p1 = O::xor(O::xor(O::clmul_low(k5k6, p1), O::clmul_high(k5k6, p1)), p2);
        p3 = O::xor(O::xor(O::clmul_low(k5k6, p3), O::clmul_high(k5k6, p3)), p4);

        // 256 -> 128
        let k3k4 = O::set(reduction::K3K4[0], reduction::K3K4[1]);
        let mut full = O::xor(O::xor(O::clmul_low(k3k4, p1), O::clmul_high(k3k4, p1)), p3);

        // 128 -> 96
        let tmp = O::clmul_01(k5k6, full);
        full = O::xor(O::shr_8_bytes(full), tmp);

        // 96 -> 64
        let k7k0 = O::set(reduction::K7K0[0], reduction::K7K0[1]);
        let tmp = O::shr_4_bytes(full);
        full = O::xor(O::clmul_low(k7k0, O::and(full, mask)), tmp);

        // Barrett
        let kpoly = O::set(reduction::KPOLY[0], reduction::KPOLY[1]);
        let tmp = O::and(O::clmul_01(kpoly, O::and(full, mask)), mask);
        full = O::xor(O::clmul_low(kpoly, tmp), full);

        O::extract_u32_1(full)
    }
}

/// Three CRC lanes over a medium input, folded with one carry-less multiply.
///
/// Consumes `3 * 32 * blocks` bytes starting at `*ptr`.
#[inline(always)]
unsafe fn fold3<O: Ops>(crc: u32, ptr: &mut *const u8, length: usize) -> u32 {
    unsafe {
        let blocks = length / 3 / 32;
        let lane_bytes = blocks * 32;
        let mut p0 = *ptr;
        let mut p1 = p0.add(lane_bytes);
        let mut p2 = p1.add(lane_bytes);
        let (mut l0, mut l1, mut l2) = (crc, 0u32, 0u32);

        for _ in 1..blocks {
            prefetch_local(p0.wrapping_add(PREFETCH_HORIZON_MEDIUM));
            prefetch_local(p1.wrapping_add(PREFETCH_HORIZON_MEDIUM));
            prefetch_local(p2.wrapping_add(PREFETCH_HORIZON_MEDIUM));
            for _ in 0..4 {
                l0 = O::crc_u64(l0, read_u64(p0));
                l1 = O::crc_u64(l1, read_u64(p1));
                l2 = O::crc_u64(l2, read_u64(p2));
                p0 = p0.add(8);
                p1 = p1.add(8);
                p2 = p2.add(8);
            }
        }
        for _ in 0..3 {
            l0 = O::crc_u64(l0, read_u64(p0));
            l1 = O::crc_u64(l1, read_u64(p1));
            l2 = O::crc_u64(l2, read_u64(p2));
            p0 = p0.add(8);
            p1 = p1.add(8);
            p2 = p2.add(8);
        }
        // Lane 2 holds back its last word
        l0 = O::crc_u64(l0, read_u64(p0));
        l1 = O::crc_u64(l1, read_u64(p1));

        let [k0, k1] = FOLD3_CONSTANTS[blocks - 1];
        let magic = O::set(k0, k1);
        let partial = O::set(l0 as u64, l1 as u64);
        let folded = O::xor(O::clmul_low(partial, magic), O::clmul_high(partial, magic));
        let word = O::low_u64(folded) ^ read_u64(p2);

        *ptr = p2.add(8);
        O::crc_u64(l2, word)
    }
}

/// Interleaved CRC and carry-less-multiply lanes over a large input.
#[inline(always)]
unsafe fn multi_stream<O: Ops>(
    config: StreamConfig,
    crc: u32,
    ptr: &mut *const u8,
    end: *const u8,
) -> u32 {
    unsafe {
        let mut p = *ptr;
        let mut l = crc;

        // Align to 8 bytes
        while (p as usize) & 7 != 0 {
            l = O::crc_u8(l, *p);
            p = p.add(1);
        }

        let crc_streams = config.crc_streams();
        let pclmul_streams = config.pclmul_streams();
        let blocks = (end.offset_from(p) as usize) / (crc_streams + pclmul_streams) / 64;
        let span = blocks * 64;

        let mut crc_ptr = [p; MAX_CRC_STREAMS];
        let mut crc_lanes = [0u32; MAX_CRC_STREAMS];
        crc_lanes[0] = l;
        for i in 1..crc_streams {
            crc_ptr[i] = crc_ptr[i - 1].add(span);
        }

        let mut pclmul_ptr = [p; MAX_PCLMUL_STREAMS];
        let mut pclmul_lanes = [[O::zero(); 4]; MAX_PCLMUL_STREAMS];
        for i in 0..pclmul_streams {
            let start = p.add((crc_streams + i) * span);
            for (k, lane) in pclmul_lanes[i].iter_mut().enumerate() {
                *lane = O::load(start.add(16 * k));
            }
            pclmul_ptr[i] = start.add(64);
        }

        for _ in 1..blocks {
            for &lane_ptr in &crc_ptr[..crc_streams] {
                prefetch_local(lane_ptr.wrapping_add(PREFETCH_HORIZON));
            }
            for &lane_ptr in &pclmul_ptr[..pclmul_streams] {
                prefetch_local(lane_ptr.wrapping_add(PREFETCH_HORIZON));
            }
            for (lane, lane_ptr) in crc_lanes.iter_mut().zip(crc_ptr.iter_mut()).take(crc_streams) {
                *lane = crc_64_bytes::<O>(*lane, *lane_ptr);
                *lane_ptr = lane_ptr.add(64);
            }
            for (lanes, lane_ptr) in pclmul_lanes
                .iter_mut()
                .zip(pclmul_ptr.iter_mut())
                .take(pclmul_streams)
            {
                process_64_bytes_pclmul::<O>(*lane_ptr, lanes);
                *lane_ptr = lane_ptr.add(64);
            }
        }
        // Last block of the CRC lanes; the fold lanes consumed theirs on load
        for (lane, lane_ptr) in crc_lanes.iter_mut().zip(crc_ptr.iter_mut()).take(crc_streams) {
            *lane = crc_64_bytes::<O>(*lane, *lane_ptr);
            *lane_ptr = lane_ptr.add(64);
        }

        // Same algebra as concat: shift by one lane span, xor in the next lane
        let magic = compute_zero_constant::<O>(span);
        let mut combined = crc_lanes[0];
        for &lane in &crc_lanes[1..crc_streams] {
            combined = multiply::<O>(combined, magic) ^ lane;
        }
        for lanes in &pclmul_lanes[..pclmul_streams] {
            combined = multiply::<O>(combined, magic) ^ finalize_pclmul_stream::<O>(lanes);
        }

        *ptr = if pclmul_streams > 0 {
            pclmul_ptr[pclmul_streams - 1]
        } else {
            crc_ptr[crc_streams - 1]
        };
        combined
    }
}

/// Advance `crc` over `data` using the lane layout in `config`.
#[inline(always)]
pub(super) unsafe fn extend<O: Ops>(config: StreamConfig, crc: u32, data: &[u8]) -> u32 {
    unsafe {
        let mut p = data.as_ptr();
        let end = p.add(data.len());
        let mut length = data.len();
        let mut l = crc;

        // Leave a multiple of 16 bytes
        if length & 8 != 0 {
            l = O::crc_u64(l, read_u64(p));
            p = p.add(8);
        }
        if length & 4 != 0 {
            l = O::crc_u32(l, read_u32(p));
            p = p.add(4);
        }
        if length & 2 != 0 {
            l = O::crc_u16(l, read_u16(p));
            p = p.add(2);
        }
        if length & 1 != 0 {
            l = O::crc_u8(l, *p);
            p = p.add(1);
        }
        length &= !15;
        if length == 0 {
            return l;
        }

        if config.strategy() != CutoffStrategy::Unroll64Crc && length < SMALL_CUTOFF {
            while length >= 16 {
                l = O::crc_u64(l, read_u64(p));
                l = O::crc_u64(l, read_u64(p.add(8)));
                p = p.add(16);
                length -= 16;
            }
            return l;
        }

        if length < MEDIUM_CUTOFF {
            match config.strategy() {
                CutoffStrategy::Fold3 => l = fold3::<O>(l, &mut p, length),
                CutoffStrategy::Unroll64Crc => {
                    while end.offset_from(p) >= 64 {
                        l = crc_64_bytes::<O>(l, p);
                        p = p.add(64);
                    }
                }
            }
        } else {
            l = multi_stream::<O>(config, l, &mut p, end);
        }

        while end.offset_from(p) >= 16 {
            l = O::crc_u64(l, read_u64(p));
            l = O::crc_u64(l, read_u64(p.add(8)));
            p = p.add(16);
        }
        while p != end {
            l = O::crc_u8(l, *p);
            p = p.add(1);
        }
        l
    }
}
