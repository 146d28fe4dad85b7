use encoding_rs::{CoderResult, Decoder, Encoding};

// NOTE: the decoder needs room for at least one character in the buffer.
const MIN_BUFFER_SIZE: usize = 16;

/// Streaming decoder for the bytes written to the parser. Byte sequences
/// split between writes are kept in the decoder until they are complete.
pub(super) struct InputDecoder {
    decoder: Decoder,
    buffer: String,
}

impl InputDecoder {
    pub fn new(encoding: &'static Encoding, buffer_size: usize) -> Self {
        InputDecoder {
            decoder: encoding.new_decoder(),
            buffer: "\0".repeat(buffer_size.max(MIN_BUFFER_SIZE)),
        }
    }

    pub fn decode(&mut self, mut raw_input: &[u8], last: bool) -> String {
        let mut output = String::new();
        let buffer = self.buffer.as_mut_str();

        loop {
            let (status, read, written, ..) = self.decoder.decode_to_str(raw_input, buffer, last);

            output.push_str(&buffer[..written]);
            raw_input = &raw_input[read..];

            if status == CoderResult::InputEmpty {
                return output;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1251};

    #[test]
    fn sequences_split_between_writes() {
        let mut decoder = InputDecoder::new(UTF_8, 0);
        let bytes = "<p>Привет</p>".as_bytes();

        let mut text = decoder.decode(&bytes[..4], false);

        text.push_str(&decoder.decode(&bytes[4..], false));
        text.push_str(&decoder.decode(&[], true));

        assert_eq!(text, "<p>Привет</p>");
    }

    #[test]
    fn legacy_encodings() {
        let mut decoder = InputDecoder::new(WINDOWS_1251, 1024);

        assert_eq!(decoder.decode(&[0xCF, 0xF0, 0xE8], true), "При");
    }

    #[test]
    fn incomplete_sequence_at_the_end() {
        let mut decoder = InputDecoder::new(UTF_8, 1024);

        assert_eq!(decoder.decode(&[b'a', 0xD0], false), "a");
        assert_eq!(decoder.decode(&[], true), "\u{FFFD}");
    }
}
