pub mod error;
pub mod mpd;
pub mod segment;
pub mod store;
pub mod timeline;

pub use error::{ParseError, Result};
pub use mpd::parser::DashParser;
pub use mpd::reader::{DocumentReader, JsonReader, XmlReader};
pub use mpd::{Manifest, RepresentationId, RepresentationRef};
pub use segment::availability::{decide_segment_list_range_for_template, SegmentRange};
pub use segment::getters::{build_segments, refresh_representation, SegmentRequest};
pub use segment::{get_segment_by_index, Segment};
pub use store::ManifestStore;
pub use timeline::{Clock, DashTimelineConverter, TimelineConverter};
