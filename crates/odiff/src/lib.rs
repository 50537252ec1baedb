pub mod compare;
pub mod error;
pub mod options;
pub mod output;
pub mod sampler;

pub use compare::{Comparison, DiffResult, PixelDiff, ResultType, compare, compare_images};
pub use error::DiffError;
pub use options::{DiffOptions, IgnoreRegion, parse_hex_color};
