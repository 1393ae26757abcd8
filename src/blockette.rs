//! The blockette chain that follows the fixed header: B1000 (required, carries the
//! encoding format and declared record length) plus the optional B100 and B1001.

use crate::byte_order::ByteOrder;
use crate::mseed_error::MSeedError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Blockette {
    /// Actual sample rate, overriding the header's factor/multiplier pair.
    B100 { sample_rate: f32, flags: u8 },
    /// Encoding format, word order, and declared record length (as log2 of bytes).
    B1000 {
        encoding_format: u8,
        word_order: u8,
        data_record_length: u8,
    },
    /// Microsecond-level timing correction and frame count.
    B1001 {
        timing_quality: u8,
        microsecond: i8,
        frame_count: u8,
    },
    Unknown {
        blockette_type: u16,
        next_blockette_offset: u16,
    },
}

impl Blockette {
    pub fn blockette_type(&self) -> u16 {
        match self {
            Blockette::B100 { .. } => 100,
            Blockette::B1000 { .. } => 1000,
            Blockette::B1001 { .. } => 1001,
            Blockette::Unknown { blockette_type, .. } => *blockette_type,
        }
    }
}

/// Walks the blockette chain starting at `first_blockette_offset`, parsing each entry
/// and following its `next_blockette_offset` until it reaches 0 or leaves the record.
///
/// Bounded two ways against a corrupted or crafted chain: the walk never visits more
/// than `number_of_blockettes` entries (the count the header itself declares), and a
/// `HashSet` of visited offsets catches any cycle - not just a blockette pointing back
/// at itself, but a multi-node cycle (A -> B -> A) that would otherwise alternate
/// forever without ever revisiting the same offset twice in a row. Either guard being
/// tripped surfaces as a per-record error rather than hanging the iterator.
pub fn parse_chain(
    bytes: &[u8],
    order: ByteOrder,
    first_blockette_offset: usize,
    number_of_blockettes: usize,
) -> Result<Vec<Blockette>, MSeedError> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut offset = first_blockette_offset;
    while offset != 0 {
        if out.len() >= number_of_blockettes {
            return Err(MSeedError::Unknown(format!(
                "blockette chain did not terminate within the declared count of {}",
                number_of_blockettes
            )));
        }
        if !visited.insert(offset) {
            return Err(MSeedError::Unknown(format!(
                "blockette chain cycles back to offset {}",
                offset
            )));
        }
        if offset + 4 > bytes.len() {
            return Err(MSeedError::TruncatedInput(bytes.len(), offset + 4));
        }
        let blockette_type = order.read_u16(&bytes[offset..offset + 2]) as u16;
        let next = order.read_u16(&bytes[offset + 2..offset + 4]) as usize;
        let blockette = parse_one(bytes, order, offset, blockette_type)?;
        out.push(blockette);
        offset = next;
    }
    Ok(out)
}

fn parse_one(
    bytes: &[u8],
    order: ByteOrder,
    offset: usize,
    blockette_type: u16,
) -> Result<Blockette, MSeedError> {
    match blockette_type {
        100 => {
            if offset + 8 > bytes.len() {
                return Err(MSeedError::TruncatedInput(bytes.len(), offset + 8));
            }
            let bits = order.read_u32(&bytes[offset + 4..offset + 8]);
            let sample_rate = f32::from_bits(bits);
            let flags = bytes.get(offset + 8).copied().unwrap_or(0);
            Ok(Blockette::B100 { sample_rate, flags })
        }
        1000 => {
            if offset + 7 > bytes.len() {
                return Err(MSeedError::TruncatedInput(bytes.len(), offset + 7));
            }
            Ok(Blockette::B1000 {
                encoding_format: bytes[offset + 4],
                word_order: bytes[offset + 5],
                data_record_length: bytes[offset + 6],
            })
        }
        1001 => {
            if offset + 8 > bytes.len() {
                return Err(MSeedError::TruncatedInput(bytes.len(), offset + 8));
            }
            Ok(Blockette::B1001 {
                timing_quality: bytes[offset + 4],
                microsecond: bytes[offset + 5] as i8,
                frame_count: bytes[offset + 7],
            })
        }
        other => {
            let next = if offset + 4 <= bytes.len() {
                order.read_u16(&bytes[offset + 2..offset + 4])
            } else {
                0
            };
            Ok(Blockette::Unknown {
                blockette_type: other,
                next_blockette_offset: next,
            })
        }
    }
}

/// Finds the required B1000 in a parsed chain, or fails.
pub fn find_b1000(chain: &[Blockette]) -> Result<(u8, u8, u8), MSeedError> {
    chain
        .iter()
        .find_map(|b| match b {
            Blockette::B1000 {
                encoding_format,
                word_order,
                data_record_length,
            } => Some((*encoding_format, *word_order, *data_record_length)),
            _ => None,
        })
        .ok_or(MSeedError::MissingBlockette1000)
}
