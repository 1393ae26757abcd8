//! Record-length discovery and the lazy record iterator sitting above the fixed-header
//! parser: given any seekable byte source, find where records start, then walk them.

use crate::blockette::{self, Blockette};
use crate::header::DataHeader;
use crate::mseed_error::MSeedError;
use crate::record::MiniseedRecord;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

lazy_static! {
    static ref HEADER_SIGNATURE: Regex = Regex::new(r"^[0-9]{6}[VASTDRQM]").unwrap();
}

const RECORD_LENGTH_MIN: usize = 256;
const RECORD_LENGTH_MAX: usize = 32768;

fn looks_like_header(buf: &[u8]) -> bool {
    match std::str::from_utf8(buf) {
        Ok(s) => HEADER_SIGNATURE.is_match(s),
        Err(_) => false,
    }
}

/// Discovers a file's mini-SEED record length by probing power-of-two offsets for the
/// `^[0-9]{6}[VASTDRQM]` header signature. Leaves the reader's position unspecified on
/// return - callers should seek back to 0 before reading records.
pub fn record_length<R: Read + Seek>(reader: &mut R) -> Result<usize, MSeedError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut first = [0u8; 8];
    reader.read_exact(&mut first)?;
    if !looks_like_header(&first) {
        return Err(MSeedError::BadRecordIndicator(
            String::from_utf8_lossy(&first).into_owned(),
        ));
    }

    let file_len = reader.seek(SeekFrom::End(0))?;

    let mut offset = RECORD_LENGTH_MIN;
    while offset <= RECORD_LENGTH_MAX {
        if (offset as u64) + 8 <= file_len {
            reader.seek(SeekFrom::Start(offset as u64))?;
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            if looks_like_header(&buf) {
                return Ok(offset);
            }
        }
        offset *= 2;
    }

    if file_len >= RECORD_LENGTH_MIN as u64
        && file_len <= RECORD_LENGTH_MAX as u64
        && file_len.is_power_of_two()
    {
        return Ok(file_len as usize);
    }
    Err(MSeedError::RecordLengthUndetermined)
}

/// An owned copy of one parsed record: header, blockette chain, and raw data bytes.
/// Unlike [`MiniseedRecord`], which borrows a slice, this can outlive the buffer it was
/// read from - which the iterator needs since it reads one record at a time. Derives
/// `Serialize`/`Deserialize` so callers can snapshot parsed records to JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OwnedRecord {
    pub header: DataHeader,
    pub blockettes: Vec<Blockette>,
    pub data: Vec<u8>,
}

impl OwnedRecord {
    fn from_bytes(bytes: Vec<u8>) -> Result<OwnedRecord, MSeedError> {
        let header = DataHeader::from_bytes(&bytes)?;
        let blockettes = blockette::parse_chain(
            &bytes,
            header.order(),
            header.first_blockette as usize,
            header.number_of_blockettes as usize,
        )?;
        let begin = header.beginning_of_data as usize;
        if begin > bytes.len() {
            return Err(MSeedError::TruncatedInput(bytes.len(), begin));
        }
        let data = bytes[begin..].to_vec();
        Ok(OwnedRecord {
            header,
            blockettes,
            data,
        })
    }

    pub fn as_record(&self) -> MiniseedRecord<'_> {
        MiniseedRecord {
            header: self.header.clone(),
            blockettes: self.blockettes.clone(),
            data: &self.data,
        }
    }

    pub fn decode(&self, carry_over: Option<i32>) -> Result<Vec<i32>, MSeedError> {
        self.as_record().decode(carry_over)
    }
}

/// A parsed record, optionally already decompressed.
#[derive(Debug, Clone)]
pub struct IteratedRecord {
    pub record: OwnedRecord,
    pub samples: Option<Vec<i32>>,
}

/// Lazily walks fixed-length mini-SEED records from a seekable byte source.
///
/// Errors are per-record: a malformed record surfaces as `Err` for that item, but the
/// reader always advances by exactly one `record_length` and iteration continues with
/// the next record. Only a genuine I/O error or clean EOF stops iteration for good.
pub struct RecordIterator<R> {
    reader: R,
    record_length: usize,
    carry_over: Option<i32>,
    decompress: bool,
    done: bool,
}

impl<R: Read + Seek> RecordIterator<R> {
    pub fn new(mut reader: R, decompress: bool) -> Result<RecordIterator<R>, MSeedError> {
        let record_length = record_length(&mut reader)?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(RecordIterator {
            reader,
            record_length,
            carry_over: None,
            decompress,
            done: false,
        })
    }
}

impl<R: Read + Seek> Iterator for RecordIterator<R> {
    type Item = Result<IteratedRecord, MSeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = vec![0u8; self.record_length];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        }

        let record = match OwnedRecord::from_bytes(buf) {
            Ok(r) => r,
            Err(e) => return Some(Err(e)),
        };

        if !self.decompress {
            return Some(Ok(IteratedRecord {
                record,
                samples: None,
            }));
        }

        match record.decode(self.carry_over) {
            Ok(samples) => {
                self.carry_over = samples.last().copied();
                Some(Ok(IteratedRecord {
                    record,
                    samples: Some(samples),
                }))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_order::ByteOrder;
    use crate::header::ByteOrderTag;
    use crate::record::write_record;
    use crate::steim_bucket::SteimVariant;
    use std::io::Cursor;

    fn blank_header() -> DataHeader {
        DataHeader {
            byte_order: ByteOrderTag(ByteOrder::Big),
            sequence_number: String::from("000001"),
            record_type: 'D',
            station: String::from("ABC"),
            location: String::from(""),
            channel: String::from("HHZ"),
            network: String::from("XX"),
            year: 2021,
            day_of_year: 1,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: 0,
            number_of_samples: 0,
            sample_rate_factor: 40,
            sample_rate_multiplier: 1,
            activity_flags: 0,
            io_flags: 0,
            quality_flags: 0,
            number_of_blockettes: 1,
            time_correction: 0,
            beginning_of_data: 64,
            first_blockette: 48,
        }
    }

    #[test]
    fn s5_record_length_two_records_of_512() {
        let mut header = blank_header();
        let mut bytes = write_record(&mut header, SteimVariant::Steim1, &[1, 2, 3], 512).unwrap();
        let mut header2 = blank_header();
        header2.sequence_number = String::from("000002");
        let second = write_record(&mut header2, SteimVariant::Steim1, &[4, 5, 6], 512).unwrap();
        bytes.extend_from_slice(&second);
        let mut cursor = Cursor::new(bytes);
        assert_eq!(record_length(&mut cursor).unwrap(), 512);
    }

    #[test]
    fn s5_record_length_single_4096_record() {
        let mut header = blank_header();
        let bytes = write_record(&mut header, SteimVariant::Steim1, &[1, 2, 3], 4096).unwrap();
        let mut cursor = Cursor::new(bytes);
        assert_eq!(record_length(&mut cursor).unwrap(), 4096);
    }

    #[test]
    fn iterator_yields_records_in_order_and_threads_carry_over() {
        let mut header = blank_header();
        let a: Vec<i32> = (0..10).collect();
        let mut bytes = write_record(&mut header, SteimVariant::Steim1, &a, 512).unwrap();
        let mut header2 = blank_header();
        let b: Vec<i32> = (10..20).collect();
        let second = write_record(&mut header2, SteimVariant::Steim1, &b, 512).unwrap();
        bytes.extend_from_slice(&second);

        let cursor = Cursor::new(bytes);
        let mut iter = RecordIterator::new(cursor, true).unwrap();
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.samples.unwrap(), a);
        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.samples.unwrap(), b);
        assert!(iter.next().is_none());
    }

    #[test]
    fn malformed_record_surfaces_error_but_iteration_continues() {
        let mut header = blank_header();
        let a: Vec<i32> = (0..5).collect();
        let mut bytes = write_record(&mut header, SteimVariant::Steim1, &a, 512).unwrap();
        let mut header2 = blank_header();
        let b: Vec<i32> = (5..15).collect();
        let mut second = write_record(&mut header2, SteimVariant::Steim1, &b, 512).unwrap();
        // corrupt the second record's year field so byte-order detection fails
        second[20] = 0x7f;
        second[21] = 0x7f;
        bytes.extend_from_slice(&second);

        let cursor = Cursor::new(bytes);
        let mut iter = RecordIterator::new(cursor, true).unwrap();
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
