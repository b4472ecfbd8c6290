//! Worker model: job descriptions coming in, state and errors going out.
mod error;
mod report;
mod work;

pub use error::{ErrorCode, WorkError};
pub use report::{HashedReport, ResultReport, State};
pub use work::{
    ConsumeLookup, ConsumeReportParts, ConsumeSpec, LookupMode, LookupSettings, Part, ReportSpec,
    Source, SourceType, TextReporting, Work, WorkId,
};
