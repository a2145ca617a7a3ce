//! Shared byte-stream types.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::error::RelayError;

/// Nominal chunk size for forward-only reads. Bounds in-flight memory to a
/// fixed amount regardless of media size.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A forward-only, consumed-exactly-once byte stream.
///
/// The stream exclusively owns whatever produces the bytes (network
/// connection, child process); dropping it releases those resources.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;
