#[macro_use]
mod debug_trace;

mod range;
mod text_position;

pub use self::range::Range;
pub use self::text_position::TextPosition;
