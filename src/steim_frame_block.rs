//! The two-dimensional `N frames x 16 words` layout that Steim-encoded data lives in,
//! plus the position cursor that drives sequential writes during encoding.
//!
//! Generalizes the reference `SteimFrame`/`SteimFrameBlock` pair: one frame type shared
//! by both Steim variants, and a `Record` that owns the forward/reverse integration
//! factors and the write cursor described in the frame/record component design.

use crate::byte_order::ByteOrder;
use crate::control_sequence::ControlSequence;
use crate::mseed_error::MSeedError;
use crate::steim_bucket::{Bucket, SteimVariant};

pub const WORDS_PER_FRAME: usize = 16;
pub const FRAME_BYTE_LEN: usize = WORDS_PER_FRAME * 4;

/// A single 64-byte Steim frame: one control-sequence word plus 15 data words.
#[derive(Debug, Clone)]
pub struct SteimFrame {
    control: ControlSequence,
    words: [u32; WORDS_PER_FRAME - 1],
}

impl SteimFrame {
    pub fn new() -> SteimFrame {
        SteimFrame {
            control: ControlSequence::new(),
            words: [0; WORDS_PER_FRAME - 1],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.control.value() == 0
    }

    pub fn control(&self) -> &ControlSequence {
        &self.control
    }

    /// Raw word at frame-local index `slot` (0 = the control sequence itself).
    pub fn word(&self, slot: usize) -> u32 {
        if slot == 0 {
            self.control.value()
        } else {
            self.words[slot - 1]
        }
    }

    /// Writes `word` into `slot` (1..=15) and records `control_code` in the matching
    /// control-sequence cell, per the invariant that cell `k` describes word `k`.
    pub fn set_word(&mut self, slot: usize, control_code: u32, word: u32) -> Result<(), MSeedError> {
        self.control.set(slot, control_code)?;
        self.words[slot - 1] = word;
        Ok(())
    }

    /// Sets a plain (un-coded) word directly, used for the forward/reverse integration
    /// factors stored in frame 0's words 1 and 2. Their control-sequence cells stay 0.
    pub fn set_plain_word(&mut self, slot: usize, word: u32) {
        self.words[slot - 1] = word;
    }

    pub fn to_bytes(&self, order: ByteOrder) -> [u8; FRAME_BYTE_LEN] {
        let mut out = [0u8; FRAME_BYTE_LEN];
        order.write_u32(&mut out[0..4], self.control.value());
        for (i, w) in self.words.iter().enumerate() {
            order.write_u32(&mut out[4 + 4 * i..8 + 4 * i], *w);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8], order: ByteOrder) -> Result<SteimFrame, MSeedError> {
        if bytes.len() < FRAME_BYTE_LEN {
            return Err(MSeedError::TruncatedInput(bytes.len(), FRAME_BYTE_LEN));
        }
        let control = ControlSequence::from_word(order.read_u32(&bytes[0..4]))?;
        let mut words = [0u32; WORDS_PER_FRAME - 1];
        for i in 0..words.len() {
            words[i] = order.read_u32(&bytes[4 + 4 * i..8 + 4 * i]);
        }
        Ok(SteimFrame { control, words })
    }
}

impl Default for SteimFrame {
    fn default() -> SteimFrame {
        SteimFrame::new()
    }
}

/// A contiguous sequence of `N` Steim frames: the unit the encoder fills and the
/// decoder walks. Owns the write cursor (`index`) and the forward/reverse integration
/// factors used for the round-trip integrity check.
#[derive(Debug, Clone)]
pub struct Record {
    variant: SteimVariant,
    frames: Vec<SteimFrame>,
    index: usize,
    first_append: bool,
    num_samples: usize,
    forward_integration_factor: i32,
    reverse_integration_factor: i32,
}

impl Record {
    pub fn allocate(variant: SteimVariant, num_frames: usize) -> Record {
        Record {
            variant,
            frames: (0..num_frames).map(|_| SteimFrame::new()).collect(),
            index: 0,
            first_append: true,
            num_samples: 0,
            forward_integration_factor: 0,
            reverse_integration_factor: 0,
        }
    }

    pub fn variant(&self) -> SteimVariant {
        self.variant
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> &SteimFrame {
        &self.frames[index]
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn forward_integration_factor(&self) -> i32 {
        self.forward_integration_factor
    }

    pub fn reverse_integration_factor(&self) -> i32 {
        self.reverse_integration_factor
    }

    pub fn is_full(&self) -> bool {
        self.index >= self.frames.len() * WORDS_PER_FRAME
    }

    /// Sets the forward integration factor (first decoded sample), stored verbatim at
    /// frame 0, word 1.
    pub fn set_forward_integration_factor(&mut self, v: i32) {
        self.forward_integration_factor = v;
        self.frames[0].set_plain_word(1, v as u32);
    }

    /// Sets the reverse integration factor (last decoded sample so far), stored
    /// verbatim at frame 0, word 2. Called after every `append`, not just the last.
    pub fn set_reverse_integration_factor(&mut self, v: i32) {
        self.reverse_integration_factor = v;
        self.frames[0].set_plain_word(2, v as u32);
    }

    /// Packs `bucket` and writes the result at the current cursor. Returns `Ok(false)`
    /// without consuming the bucket's contents if the record has no room left.
    ///
    /// `last_sample` is the last sample that entered `bucket` before this call; on a
    /// successful append it becomes the new reverse integration factor, per the
    /// append algorithm's "update reverse_integration_factor to the last sample that
    /// entered the bucket" step. This only happens when the write actually lands, so a
    /// bucket that gets discarded because the record is already full never stamps a
    /// reverse factor for a sample that was never packed.
    pub fn append(&mut self, bucket: &mut Bucket, last_sample: i32) -> Result<bool, MSeedError> {
        if self.is_full() {
            return Ok(false);
        }
        if self.first_append {
            // words 1, 2 of frame 0 are reserved for the integration factors.
            self.index = 3;
            self.first_append = false;
        } else if self.index % WORDS_PER_FRAME == 0 {
            self.index += 1;
        }
        if self.index >= self.frames.len() * WORDS_PER_FRAME {
            return Ok(false);
        }
        let (control, word, count) = bucket.pack(true)?;
        let row = self.index / WORDS_PER_FRAME;
        let column = self.index % WORDS_PER_FRAME;
        self.frames[row].set_word(column, control, word)?;
        self.index += 1;
        self.num_samples += count;
        self.set_reverse_integration_factor(last_sample);
        Ok(true)
    }

    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frames.len() * FRAME_BYTE_LEN);
        for frame in &self.frames {
            out.extend_from_slice(&frame.to_bytes(order));
        }
        out
    }

    /// Reconstructs a record directly from its on-disk bytes (decode path). `bytes`
    /// must be an exact multiple of the 64-byte frame length.
    pub fn wrap_bytes(bytes: &[u8], order: ByteOrder, variant: SteimVariant) -> Result<Record, MSeedError> {
        if bytes.len() % FRAME_BYTE_LEN != 0 || bytes.is_empty() {
            return Err(MSeedError::TruncatedInput(bytes.len(), FRAME_BYTE_LEN));
        }
        let frames: Result<Vec<SteimFrame>, MSeedError> = bytes
            .chunks_exact(FRAME_BYTE_LEN)
            .map(|chunk| SteimFrame::from_bytes(chunk, order))
            .collect();
        let frames = frames?;
        let forward_integration_factor = frames[0].word(1) as i32;
        let reverse_integration_factor = frames[0].word(2) as i32;
        Ok(Record {
            variant,
            frames,
            index: 0,
            first_append: false,
            num_samples: 0,
            forward_integration_factor,
            reverse_integration_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_skips_reserved_words_on_first_call() {
        let mut record = Record::allocate(SteimVariant::Steim1, 1);
        let mut bucket = Bucket::new(SteimVariant::Steim1);
        bucket.put(5);
        record.append(&mut bucket, 5).unwrap();
        // first data word lands at frame 0, word index 3
        assert_eq!(record.frame(0).control().get(3), 3);
    }

    #[test]
    fn append_advances_past_control_word_on_later_frames() {
        let mut record = Record::allocate(SteimVariant::Steim1, 2);
        for _ in 0..16 {
            let mut bucket = Bucket::new(SteimVariant::Steim1);
            bucket.put(1);
            record.append(&mut bucket, 1).unwrap();
        }
        // the 16th append should have spilled into frame 1, word 1 (word 0 skipped)
        assert!(record.frame(1).control().get(1) != 0 || record.is_full());
    }

    #[test]
    fn is_full_once_cursor_exhausts_all_frames() {
        let mut record = Record::allocate(SteimVariant::Steim1, 1);
        assert!(!record.is_full());
        for _ in 0..13 {
            let mut bucket = Bucket::new(SteimVariant::Steim1);
            bucket.put(1);
            assert!(record.append(&mut bucket, 1).unwrap());
        }
        assert!(record.is_full());
        let mut bucket = Bucket::new(SteimVariant::Steim1);
        bucket.put(1);
        assert!(!record.append(&mut bucket, 1).unwrap());
    }

    #[test]
    fn round_trip_bytes_preserves_factors() {
        let mut record = Record::allocate(SteimVariant::Steim1, 1);
        record.set_forward_integration_factor(42);
        let mut bucket = Bucket::new(SteimVariant::Steim1);
        bucket.put(1);
        record.append(&mut bucket, 1).unwrap();
        record.set_reverse_integration_factor(43);
        let bytes = record.to_bytes(ByteOrder::Big);
        let wrapped = Record::wrap_bytes(&bytes, ByteOrder::Big, SteimVariant::Steim1).unwrap();
        assert_eq!(wrapped.forward_integration_factor(), 42);
        assert_eq!(wrapped.reverse_integration_factor(), 43);
    }
}
