use encoding_rs::{Encoding, UTF_8};
use rand::{thread_rng, Rng};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use std::env;
use std::fmt::{self, Formatter};

/// Test input split at random points.
///
/// The chunk size can be fixed with the `CHUNK_SIZE` environment variable
/// to reproduce a failure.
#[derive(Debug, Clone)]
pub struct ChunkedInput {
    input: String,
    chunks: Vec<Vec<u8>>,
    initialized: bool,
    encoding: &'static Encoding,
}

impl From<&str> for ChunkedInput {
    fn from(input: &str) -> Self {
        ChunkedInput {
            input: input.to_string(),
            chunks: Vec::new(),
            initialized: false,
            encoding: UTF_8,
        }
    }
}

fn chunk_size(len: usize) -> usize {
    match env::var("CHUNK_SIZE") {
        Ok(val) => val.parse().unwrap(),
        Err(_) => {
            if len > 1 {
                thread_rng().gen_range(1..len)
            } else {
                len
            }
        }
    }
}

impl ChunkedInput {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.input
    }

    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        assert!(
            self.initialized,
            "Input should be initialized before parsing"
        );

        &self.chunks
    }

    /// Encodes the input and splits the bytes. Returns the chunk size.
    pub fn init(&mut self, encoding: &'static Encoding) -> Result<usize, String> {
        let (bytes, _, had_unmappable_chars) = encoding.encode(&self.input);

        // NOTE: the encoder replaced unmappable characters with character
        // references, so the input can't be expressed in this encoding.
        if had_unmappable_chars {
            return Err(format!("Unmappable characters for {}", encoding.name()));
        }

        if self.input != encoding.decode_without_bom_handling(&bytes).0 {
            return Err(format!("ASCII characters deviation in {}", encoding.name()));
        }

        let size = chunk_size(bytes.len());

        self.encoding = encoding;
        self.chunks = if size > 0 {
            bytes.chunks(size).map(<[u8]>::to_vec).collect()
        } else {
            Vec::new()
        };
        self.initialized = true;

        Ok(size)
    }

    /// Splits the text at random character boundaries.
    pub fn str_chunks(&self) -> Vec<&str> {
        let mut rng = thread_rng();
        let mut chunks = Vec::new();
        let mut start = 0;

        for (idx, _) in self.input.char_indices().skip(1) {
            if rng.gen_bool(0.3) {
                chunks.push(&self.input[start..idx]);
                start = idx;
            }
        }

        chunks.push(&self.input[start..]);

        chunks
    }
}

impl<'de> Deserialize<'de> for ChunkedInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringVisitor;

        impl Visitor<'_> for StringVisitor {
            type Value = ChunkedInput;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.into())
            }
        }

        deserializer.deserialize_string(StringVisitor)
    }
}
