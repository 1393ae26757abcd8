use thiserror::Error;

#[derive(Error, Debug)]
pub enum MSeedError {
    #[error("IO Error")]
    IOError(#[from] std::io::Error),
    #[error("insufficient bytes, {0} < required {1}")]
    TruncatedInput(usize, usize),
    #[error("mini-SEED record must start with 6 ASCII digits and a record type but was `{0}`")]
    BadRecordIndicator(String),
    #[error("invalid control code {0}, must be 0..=3")]
    InvalidControlCode(u32),
    #[error("control sequence cell 0 must be 0, but was {0}")]
    ReservedControlCellNonzero(u32),
    #[error("pack called on an empty bucket")]
    PackUnderflow,
    #[error("unrecognised control/sub-code combination: control={0}, subcode={1:?}")]
    FillUnrecognised(u32, Option<u32>),
    #[error("unsupported encoding format: {0}")]
    UnsupportedEncoding(u8),
    #[error("could not determine byte order from record header")]
    ByteOrderUndetermined,
    #[error("could not determine record length")]
    RecordLengthUndetermined,
    #[error("decoded sample count {0} does not match expected count {1}")]
    IntegrityMismatch(usize, usize),
    #[error("last decoded sample {0} does not match reverse integration factor {1}")]
    ReverseFactorMismatch(i32, i32),
    #[error("record has no blockette 1000, required to locate the encoding format")]
    MissingBlockette1000,
    #[error("mini-SEED compression/decompression error: `{0}`")]
    Compression(String),
    #[error("mini-SEED error: `{0}`")]
    Unknown(String),
}
