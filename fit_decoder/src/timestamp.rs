//! FIT epoch conversion and compressed-timestamp rollover arithmetic.
//! Supplemented from `fittie/fitfile/util.py`, which the distilled
//! specification dropped. The original masks the rollover offset to 4 bits;
//! this implementation uses the spec-correct 5 bits (the compressed
//! timestamp header carries a 5-bit `time_offset`), since compressed
//! timestamp decoding itself is not wired up yet and these are meant as the
//! correct primitives for that future work.

use time::OffsetDateTime;

pub const FIT_EPOCH_OFFSET_SECONDS: i64 = 631_065_600;

pub fn datetime_from_fit_timestamp(timestamp: u32) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(FIT_EPOCH_OFFSET_SECONDS + timestamp as i64)
        .expect("fit timestamps fit within the representable unix timestamp range")
}

const TIME_OFFSET_MASK: u32 = 0b1_1111;

/// Reconstructs a full timestamp from a previous full timestamp and a 5-bit
/// compressed offset, rolling into the next 32-second window when the new
/// offset is less than the previous timestamp's low 5 bits.
pub fn rollover_timestamp(previous_timestamp: u32, offset: u8) -> u32 {
    let offset = offset as u32 & TIME_OFFSET_MASK;
    let previous_offset = previous_timestamp & TIME_OFFSET_MASK;
    let base = previous_timestamp & !TIME_OFFSET_MASK;

    if offset >= previous_offset {
        base + offset
    } else {
        base + offset + (TIME_OFFSET_MASK + 1)
    }
}
