//! `MiniseedRecord`: a parsed classic mini-SEED record - fixed header, blockette chain,
//! and the raw (still Steim-encoded) data slice - plus the glue to decode it.

use crate::blockette::{self, Blockette};
use crate::byte_order::ByteOrder;
use crate::data_encoding::DataEncoding;
use crate::header::DataHeader;
use crate::mseed_error::MSeedError;
use crate::steim;
use crate::steim_bucket::SteimVariant;
use std::fmt;

#[derive(Debug, Clone)]
pub struct MiniseedRecord<'a> {
    pub header: DataHeader,
    pub blockettes: Vec<Blockette>,
    pub data: &'a [u8],
}

impl<'a> MiniseedRecord<'a> {
    /// Parses the fixed header and blockette chain and slices out the data region;
    /// does not decode the Steim payload (call [`decode`](Self::decode) for that).
    pub fn wrap_bytes(bytes: &'a [u8]) -> Result<MiniseedRecord<'a>, MSeedError> {
        let header = DataHeader::from_bytes(bytes)?;
        let blockettes = blockette::parse_chain(
            bytes,
            header.order(),
            header.first_blockette as usize,
            header.number_of_blockettes as usize,
        )?;
        let begin = header.beginning_of_data as usize;
        if begin > bytes.len() {
            return Err(MSeedError::TruncatedInput(bytes.len(), begin));
        }
        Ok(MiniseedRecord {
            header,
            blockettes,
            data: &bytes[begin..],
        })
    }

    pub fn encoding_format(&self) -> Result<u8, MSeedError> {
        blockette::find_b1000(&self.blockettes).map(|(encoding, _, _)| encoding)
    }

    fn variant(&self) -> Result<SteimVariant, MSeedError> {
        let encoding = DataEncoding::from_int(self.encoding_format()?);
        match encoding {
            DataEncoding::STEIM1 => Ok(SteimVariant::Steim1),
            DataEncoding::STEIM2 => Ok(SteimVariant::Steim2),
            other => Err(MSeedError::UnsupportedEncoding(other.value())),
        }
    }

    /// The effective sample rate: a blockette 100, if present, overrides the header's
    /// factor/multiplier pair with an exact float.
    pub fn sample_rate(&self) -> f64 {
        for b in &self.blockettes {
            if let Blockette::B100 { sample_rate, .. } = b {
                return *sample_rate as f64;
            }
        }
        self.header.sample_rate()
    }

    /// Decodes the record's Steim payload. `carry_over`, if given, overrides the
    /// record's own forward integration factor as the seed for the first sample -
    /// callers iterating a stream pass the previous record's last sample here.
    pub fn decode(&self, carry_over: Option<i32>) -> Result<Vec<i32>, MSeedError> {
        let variant = self.variant()?;
        steim::decode(
            variant,
            self.data,
            self.header.order(),
            carry_over,
            Some(self.header.number_of_samples as usize),
        )
    }
}

impl<'a> fmt::Display for MiniseedRecord<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{} n={} @ {:?}",
            self.header.network,
            self.header.station,
            self.header.location,
            self.header.channel,
            self.header.number_of_samples,
            self.header.start_time(),
        )
    }
}

/// Assembles a complete on-disk record: fixed header, a single B1000 blockette, and
/// Steim-encoded data, padded with zeros out to `record_length` bytes.
pub fn write_record(
    header: &mut DataHeader,
    variant: SteimVariant,
    samples: &[i32],
    record_length: usize,
) -> Result<Vec<u8>, MSeedError> {
    const HEADER_AND_BLOCKETTE: usize = 48 + 8;
    if record_length <= HEADER_AND_BLOCKETTE || record_length % 64 != 0 {
        return Err(MSeedError::Compression(format!(
            "record length {} too small or not a multiple of 64",
            record_length
        )));
    }
    header.beginning_of_data = 64;
    header.first_blockette = 48;
    header.number_of_blockettes = 1;

    let number_of_frames = (record_length - header.beginning_of_data as usize) / 64;
    let encoded = steim::encode(variant, samples, 0, number_of_frames, None)?;
    header.number_of_samples = encoded.num_samples() as i16;

    let mut out = vec![0u8; record_length];
    header.write_to(&mut out[0..48])?;

    let order = header.order();
    let encoding_format = match variant {
        SteimVariant::Steim1 => 10,
        SteimVariant::Steim2 => 11,
    };
    order.write_u16(&mut out[48..50], 1000);
    order.write_u16(&mut out[50..52], 0);
    out[52] = encoding_format;
    out[53] = if order == ByteOrder::Big { 1 } else { 0 };
    out[54] = (record_length as f64).log2().round() as u8;

    let data = encoded.to_bytes(order);
    out[64..64 + data.len()].copy_from_slice(&data);
    Ok(out)
}
