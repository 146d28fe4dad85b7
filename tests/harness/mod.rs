mod chunked_input;
mod document;

pub use self::chunked_input::ChunkedInput;
pub use self::document::{parse_document, settings, Mode, ParsedDocument};

pub static ROUNDTRIP_ENCODINGS: [&encoding_rs::Encoding; 4] = [
    encoding_rs::UTF_8,
    encoding_rs::WINDOWS_1251,
    encoding_rs::WINDOWS_1252,
    encoding_rs::SHIFT_JIS,
];
