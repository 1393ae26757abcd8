//! Classic (SEED v2) 48-byte fixed mini-SEED header: station/channel identifiers, start
//! time, sample-count and sample-rate fields, and the blockette chain pointers.

use crate::byte_order::ByteOrder;
use crate::mseed_error::MSeedError;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub const FIXED_HEADER_SIZE: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHeader {
    pub byte_order: ByteOrderTag,
    pub sequence_number: String,
    pub record_type: char,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub network: String,
    pub year: i16,
    pub day_of_year: i16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fraction: i16,
    pub number_of_samples: i16,
    pub sample_rate_factor: i16,
    pub sample_rate_multiplier: i16,
    pub activity_flags: u8,
    pub io_flags: u8,
    pub quality_flags: u8,
    pub number_of_blockettes: u8,
    pub time_correction: i32,
    pub beginning_of_data: i16,
    pub first_blockette: i16,
}

/// Thin wrapper so the struct itself stays plain-data-friendly while callers still get
/// a `crate::byte_order::ByteOrder` back via `.order()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteOrderTag(pub ByteOrder);

impl DataHeader {
    pub fn order(&self) -> ByteOrder {
        self.byte_order.0
    }

    /// Parses a 48-byte fixed header, auto-detecting byte order by sanity-checking the
    /// year field (bytes 20..22): big-endian is tried first, then little-endian. Fails
    /// if neither interpretation yields a year in `1900 < year < 2600`.
    pub fn from_bytes(bytes: &[u8]) -> Result<DataHeader, MSeedError> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(MSeedError::TruncatedInput(bytes.len(), FIXED_HEADER_SIZE));
        }
        let order = detect_byte_order(bytes)?;
        Self::from_bytes_with_order(bytes, order)
    }

    fn from_bytes_with_order(bytes: &[u8], order: ByteOrder) -> Result<DataHeader, MSeedError> {
        let sequence_number = ascii_trimmed(&bytes[0..6]);
        let record_type = bytes[6] as char;
        let station = ascii_trimmed(&bytes[8..13]);
        let location = ascii_trimmed(&bytes[13..15]);
        let channel = ascii_trimmed(&bytes[15..18]);
        let network = ascii_trimmed(&bytes[18..20]);
        let year = order.read_i16(&bytes[20..22]);
        let day_of_year = order.read_i16(&bytes[22..24]);
        let hour = bytes[24];
        let minute = bytes[25];
        let second = bytes[26];
        let fraction = order.read_i16(&bytes[28..30]);
        let number_of_samples = order.read_i16(&bytes[30..32]);
        let sample_rate_factor = order.read_i16(&bytes[32..34]);
        let sample_rate_multiplier = order.read_i16(&bytes[34..36]);
        let activity_flags = bytes[36];
        let io_flags = bytes[37];
        let quality_flags = bytes[38];
        let number_of_blockettes = bytes[39];
        let time_correction = order.read_i32(&bytes[40..44]);
        let beginning_of_data = order.read_i16(&bytes[44..46]);
        let first_blockette = order.read_i16(&bytes[46..48]);

        Ok(DataHeader {
            byte_order: ByteOrderTag(order),
            sequence_number,
            record_type,
            station,
            location,
            channel,
            network,
            year,
            day_of_year,
            hour,
            minute,
            second,
            fraction,
            number_of_samples,
            sample_rate_factor,
            sample_rate_multiplier,
            activity_flags,
            io_flags,
            quality_flags,
            number_of_blockettes,
            time_correction,
            beginning_of_data,
            first_blockette,
        })
    }

    pub fn write_to(&self, out: &mut [u8]) -> Result<(), MSeedError> {
        if out.len() < FIXED_HEADER_SIZE {
            return Err(MSeedError::TruncatedInput(out.len(), FIXED_HEADER_SIZE));
        }
        let order = self.order();
        write_ascii_padded(&self.sequence_number, &mut out[0..6]);
        out[6] = self.record_type as u8;
        out[7] = b' ';
        write_ascii_padded(&self.station, &mut out[8..13]);
        write_ascii_padded(&self.location, &mut out[13..15]);
        write_ascii_padded(&self.channel, &mut out[15..18]);
        write_ascii_padded(&self.network, &mut out[18..20]);
        order.write_i16(&mut out[20..22], self.year);
        order.write_i16(&mut out[22..24], self.day_of_year);
        out[24] = self.hour;
        out[25] = self.minute;
        out[26] = self.second;
        out[27] = 0;
        order.write_i16(&mut out[28..30], self.fraction);
        order.write_i16(&mut out[30..32], self.number_of_samples);
        order.write_i16(&mut out[32..34], self.sample_rate_factor);
        order.write_i16(&mut out[34..36], self.sample_rate_multiplier);
        out[36] = self.activity_flags;
        out[37] = self.io_flags;
        out[38] = self.quality_flags;
        out[39] = self.number_of_blockettes;
        order.write_i32(&mut out[40..44], self.time_correction);
        order.write_i16(&mut out[44..46], self.beginning_of_data);
        order.write_i16(&mut out[46..48], self.first_blockette);
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_SIZE] {
        let mut out = [0u8; FIXED_HEADER_SIZE];
        // write_to only fails on a too-short buffer, which a fixed-size array can't be.
        self.write_to(&mut out).expect("fixed-size buffer is always large enough");
        out
    }

    /// Assembles the start time from the year/day-of-year/H/M/S/fraction fields.
    /// `fraction` is in units of 0.0001 second, per the classic mini-SEED convention.
    pub fn start_time(&self) -> Result<DateTime<Utc>, MSeedError> {
        let base = Utc
            .with_ymd_and_hms(self.year as i32, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| MSeedError::Unknown(format!("invalid year {}", self.year)))?;
        let date = base + chrono::Duration::days(self.day_of_year as i64 - 1);
        let micros = (self.fraction as i64) * 100;
        date.with_hour(self.hour as u32)
            .and_then(|d| d.with_minute(self.minute as u32))
            .and_then(|d| d.with_second(self.second as u32))
            .and_then(|d| d.checked_add_signed(chrono::Duration::microseconds(micros)))
            .ok_or_else(|| MSeedError::Unknown(String::from("invalid start time fields")))
    }

    pub fn set_start_from_utc(&mut self, dt: DateTime<Utc>) {
        self.year = dt.year() as i16;
        self.day_of_year = dt.ordinal() as i16;
        self.hour = dt.hour() as u8;
        self.minute = dt.minute() as u8;
        self.second = dt.second() as u8;
        self.fraction = ((dt.timestamp_subsec_micros() as i64) / 100) as i16;
    }

    /// The documented mini-SEED sample-rate formula. A blockette 100, when present,
    /// overrides this with an exact float (see [`crate::blockette::Blockette::B100`]).
    ///
    /// The source computes this via an incorrect power/abs formula; that divergence is
    /// intentionally not reproduced here (see DESIGN.md).
    pub fn sample_rate(&self) -> f64 {
        let factor = self.sample_rate_factor;
        let multiplier = self.sample_rate_multiplier as f64;
        if factor == 0 {
            0.0
        } else if factor > 0 {
            factor as f64 * multiplier
        } else {
            -multiplier / factor as f64
        }
    }
}

/// Sanity-checks the year field at both endiannesses, preferring big-endian.
pub fn detect_byte_order(bytes: &[u8]) -> Result<ByteOrder, MSeedError> {
    if bytes.len() < 22 {
        return Err(MSeedError::TruncatedInput(bytes.len(), 22));
    }
    let year_be = ByteOrder::Big.read_i16(&bytes[20..22]);
    if year_be > 1900 && year_be < 2600 {
        return Ok(ByteOrder::Big);
    }
    let year_le = ByteOrder::Little.read_i16(&bytes[20..22]);
    if year_le > 1900 && year_le < 2600 {
        return Ok(ByteOrder::Little);
    }
    Err(MSeedError::ByteOrderUndetermined)
}

fn ascii_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

fn write_ascii_padded(s: &str, out: &mut [u8]) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(out.len());
    out[..n].copy_from_slice(&bytes[..n]);
    for b in out[n..].iter_mut() {
        *b = b' ';
    }
}
