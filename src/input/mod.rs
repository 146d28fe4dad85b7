mod background_input_stream;
mod segmented_string;

pub use self::background_input_stream::{BackgroundInputStream, InputCheckpoint};
pub use self::segmented_string::{LookAheadResult, SegmentedString};
