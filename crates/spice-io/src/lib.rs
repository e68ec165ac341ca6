//! # spice-io: the storage engines of Spice
//!
//! Two physically separate stores that share nothing but the record types:
//!
//! - [`journal`]: an append-only review journal. Each review is an `rkyv`
//!   archive framed by a length and a CRC32 checksum; on open the file is
//!   memory-mapped and replayed.
//! - [`seed`]: the one-time catalog load of restaurants and dining options
//!   from a JSON seed file.

pub mod cursor;
pub mod error;
pub mod journal;
pub mod seed;

pub use error::{Error, Result};
