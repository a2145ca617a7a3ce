//! Stream-resolution and pipelined-transcoding engine.
//!
//! Resolves a page URL to a direct media stream via an external metadata
//! tool, fetches it over HTTP, and optionally transcodes it to MP3 through
//! an ffmpeg subprocess wired as an in-process pipeline with bounded
//! buffering and backpressure.

pub mod command;
pub mod error;
pub mod filename;
pub mod orchestrator;
pub mod probe;
pub mod resolver;
pub mod source;
pub mod stream;
pub mod transcode;

pub use error::{RelayError, Result};
pub use filename::sanitize_filename;
pub use orchestrator::{OutputKind, PreparedStream, StreamOrchestrator, StreamProvider};
pub use probe::{MediaProbe, StreamDescriptor};
pub use resolver::{MetadataSource, YtDlp};
pub use source::HttpByteSource;
pub use stream::{ByteStream, STREAM_CHUNK_SIZE};
pub use transcode::TranscodePipeline;
