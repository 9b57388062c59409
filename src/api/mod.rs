//! Orchestration boundary
//!
//! Everything a transport needs to serve the periodic bearing broadcast and
//! the on-demand compute call: the payload type, its formatters and the
//! generate/compute pipeline.

pub mod formatting;
pub mod pipeline;

pub use formatting::{
    BearingUpdate, CsvFormatter, JsonFormatter, OutputFormat, ResultFormatter, TextFormatter,
};
pub use pipeline::RdfPipeline;
