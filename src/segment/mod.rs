//! Time-partitioned segment management
//!
//! This module owns the segment lifecycle: the directory of segment
//! metadata, the split policy deciding when the open segment expires, and
//! the resolution logic mapping writes and time-ranged queries onto
//! segments.

mod directory;
mod error;
mod meta;
mod split;

pub use directory::SegmentDirectory;
pub use error::{SegmentError, SegmentResult};
pub use meta::SegmentMeta;
pub use split::LogSplit;

/// Segment name type (also the name of the backing collection)
pub type SegmentName = String;
