//! A library for reading and writing classic mini-SEED (SEED v2) records, built around
//! the Steim-1 / Steim-2 compression codec.
//!
//! See the format description in the SEED Reference Manual, Appendix B, or
//! <https://ds.iris.edu/ds/nodes/dmc/data/formats/miniseed/>.

mod blockette;
mod byte_order;
mod control_sequence;
mod data_encoding;
mod header;
mod iterator;
mod mseed_error;
mod record;
mod steim;
mod steim_bucket;
mod steim_frame_block;

pub use self::blockette::Blockette;
pub use self::byte_order::ByteOrder;
pub use self::control_sequence::ControlSequence;
pub use self::data_encoding::DataEncoding;
pub use self::header::{ByteOrderTag, DataHeader, FIXED_HEADER_SIZE};
pub use self::iterator::{record_length, IteratedRecord, OwnedRecord, RecordIterator};
pub use self::mseed_error::MSeedError;
pub use self::record::{write_record, MiniseedRecord};
pub use self::steim::{decode, encode};
pub use self::steim_bucket::{Bucket, SteimVariant};
pub use self::steim_frame_block::Record;

/// Reads every mini-SEED record from a seekable byte source, decompressing each one.
///
/// Errors are per-record (see [`RecordIterator`]): the first malformed record short-
/// circuits this convenience wrapper, since a `Vec` can't represent "some records, then
/// an error". Callers who need to keep going past a bad record should drive
/// [`RecordIterator`] directly instead.
pub fn read_mseed<R: std::io::Read + std::io::Seek>(
    reader: R,
) -> Result<Vec<IteratedRecord>, MSeedError> {
    RecordIterator::new(reader, true)?.collect()
}
