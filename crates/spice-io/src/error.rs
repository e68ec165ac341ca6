use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record encoding failed: {0}")]
    Encode(String),

    #[error("corrupt record at offset {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    #[error("checksum mismatch at offset {offset}: expected {expected:#010x}, found {actual:#010x}")]
    Checksum {
        offset: usize,
        expected: u32,
        actual: u32,
    },

    #[error("frame at offset {offset} declares {len} bytes (limit {max})")]
    FrameTooLarge { offset: usize, len: usize, max: usize },

    #[error("catalog seed is malformed: {0}")]
    Seed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
