//! Steim encode/decode: drives a [`Bucket`] from a sample stream into a [`Record`], and
//! walks a decoded record back into samples, integrating deltas against a carry-over.

use crate::byte_order::ByteOrder;
use crate::mseed_error::MSeedError;
use crate::steim_bucket::{unpack_word, Bucket, SteimVariant};
use crate::steim_frame_block::Record;

/// Encodes `samples[offset..]` into a `number_of_frames`-frame record, stopping early
/// if the record fills before the input is exhausted. `carry_over` seeds the first
/// delta; it defaults to 0 at the start of a stream.
pub fn encode(
    variant: SteimVariant,
    samples: &[i32],
    offset: usize,
    number_of_frames: usize,
    carry_over: Option<i32>,
) -> Result<Record, MSeedError> {
    if samples[offset..].is_empty() {
        return Err(MSeedError::Compression(String::from(
            "samples array is zero size",
        )));
    }
    let mut record = Record::allocate(variant, number_of_frames);
    record.set_forward_integration_factor(samples[offset]);

    let mut previous = carry_over.unwrap_or(0);
    let mut bucket = Bucket::new(variant);

    for &sample in &samples[offset..] {
        if record.is_full() {
            break;
        }
        let delta = sample.wrapping_sub(previous);
        if !bucket.put(delta) {
            if !record.append(&mut bucket, previous)? {
                break;
            }
            bucket = Bucket::new(variant);
            if !bucket.put(delta) {
                // Only reachable for Steim-2 deltas outside the 30-bit range - an
                // inherent limitation of the format, not a bug. Stop here; the
                // caller gets a valid, shorter record instead of a panic.
                break;
            }
        }
        previous = sample;
    }
    if !record.is_full() && !bucket.is_empty() {
        record.append(&mut bucket, previous)?;
    }
    Ok(record)
}

/// Decodes a byte slice holding `number_of_frames * 64` bytes of Steim-encoded data.
/// `carry_over`, if given, overrides the record's own forward integration factor as
/// the seed for the first emitted sample. `expected_number_of_samples`, if given, caps
/// decoding and is checked against the final output length.
pub fn decode(
    variant: SteimVariant,
    bytes: &[u8],
    byte_order: ByteOrder,
    carry_over: Option<i32>,
    expected_number_of_samples: Option<usize>,
) -> Result<Vec<i32>, MSeedError> {
    let record = Record::wrap_bytes(bytes, byte_order, variant)?;
    let mut previous = carry_over.unwrap_or_else(|| record.forward_integration_factor());
    let mut out = Vec::new();
    let mut first_sample_emitted = false;

    'frames: for frame_index in 0..record.frame_count() {
        let frame = record.frame(frame_index);
        let start = if frame_index == 0 { 3 } else { 1 };
        for column in start..16 {
            let c = frame.control().get(column);
            if c == 0 {
                continue;
            }
            let deltas = unpack_word(variant, c, frame.word(column))?;
            for d in deltas {
                let mut sample = previous.wrapping_add(d);
                if !first_sample_emitted {
                    sample = record.forward_integration_factor();
                    first_sample_emitted = true;
                }
                out.push(sample);
                previous = sample;
                if let Some(expected) = expected_number_of_samples {
                    if out.len() == expected {
                        break 'frames;
                    }
                }
            }
        }
    }

    if let Some(expected) = expected_number_of_samples {
        if out.len() != expected {
            return Err(MSeedError::IntegrityMismatch(out.len(), expected));
        }
    }
    if let Some(&last) = out.last() {
        if last != record.reverse_integration_factor() {
            return Err(MSeedError::ReverseFactorMismatch(
                last,
                record.reverse_integration_factor(),
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_sequential_deltas_steim1() {
        // Frame 0 reserves words 1 and 2 for the integration factors (§4.4), so only
        // 13 of its 15 non-control words ever hold data: 13 words * 4 one-byte deltas
        // per word = 52 samples, not the full 60 this ramp supplies. The remaining 8
        // samples don't fit in a 1-frame record and are correctly left unencoded.
        let samples: Vec<i32> = (0..60).collect();
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        assert_eq!(record.forward_integration_factor(), 0);
        assert_eq!(record.reverse_integration_factor(), 51);
        assert_eq!(record.num_samples(), 52);
        let bytes = record.to_bytes(ByteOrder::Big);
        let decoded = decode(SteimVariant::Steim1, &bytes, ByteOrder::Big, None, Some(52)).unwrap();
        assert_eq!(decoded, samples[..52]);
    }

    #[test]
    fn s2_packed_word_bit_pattern() {
        let samples = [0, 1, 2, 3];
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        assert_eq!(record.frame(0).word(3), 0x0001_0101);
    }

    #[test]
    fn s3_repeated_value_round_trip() {
        let samples = [-128, -128, -128, -128];
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        let bytes = record.to_bytes(ByteOrder::Big);
        let decoded = decode(SteimVariant::Steim1, &bytes, ByteOrder::Big, None, Some(4)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn s4_steim2_seven_four_bit_deltas() {
        let samples = [0, 1, 2, 3, 4, 5, 6, 7];
        let record = encode(SteimVariant::Steim2, &samples, 0, 1, None).unwrap();
        assert_eq!(record.frame(0).word(3), 0x8111_1111);
    }

    #[test]
    fn carry_over_composition() {
        let whole: Vec<i32> = (0..40).map(|i| i * 3).collect();
        let (a, b) = whole.split_at(20);
        let record_a = encode(SteimVariant::Steim1, a, 0, 1, None).unwrap();
        let record_b = encode(SteimVariant::Steim1, b, 0, 1, Some(*a.last().unwrap())).unwrap();
        let bytes_a = record_a.to_bytes(ByteOrder::Big);
        let bytes_b = record_b.to_bytes(ByteOrder::Big);
        let mut decoded = decode(SteimVariant::Steim1, &bytes_a, ByteOrder::Big, None, Some(a.len())).unwrap();
        let decoded_b = decode(
            SteimVariant::Steim1,
            &bytes_b,
            ByteOrder::Big,
            Some(*a.last().unwrap()),
            Some(b.len()),
        )
        .unwrap();
        decoded.extend(decoded_b);
        assert_eq!(decoded, whole);
    }

    #[test]
    fn decode_rejects_reverse_factor_mismatch() {
        let samples = [1, 2, 3, 4];
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        let mut bytes = record.to_bytes(ByteOrder::Big);
        // corrupt the stored reverse integration factor
        ByteOrder::Big.write_u32(&mut bytes[8..12], 999);
        let err = decode(SteimVariant::Steim1, &bytes, ByteOrder::Big, None, Some(4)).unwrap_err();
        assert!(matches!(err, MSeedError::ReverseFactorMismatch(_, _)));
    }

    #[test]
    fn decode_rejects_sample_count_mismatch() {
        let samples: Vec<i32> = (0..10).collect();
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        let bytes = record.to_bytes(ByteOrder::Big);
        let err = decode(SteimVariant::Steim1, &bytes, ByteOrder::Big, None, Some(11)).unwrap_err();
        assert!(matches!(err, MSeedError::IntegrityMismatch(_, _)));
    }

    #[test]
    fn encode_stops_early_when_record_is_too_small() {
        let samples: Vec<i32> = (0..10_000).collect();
        let record = encode(SteimVariant::Steim1, &samples, 0, 1, None).unwrap();
        assert!(record.num_samples() < samples.len());
        assert!(record.is_full());
    }
}
