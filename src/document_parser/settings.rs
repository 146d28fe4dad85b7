use crate::xss_auditor::XssAuditorSettings;
use encoding_rs::{Encoding, UTF_8};
use std::time::Duration;
use url::Url;

/// Limits on the memory held by speculative parsing.
///
/// The background parser holds at most about
/// `outstanding_checkpoint_limit * pending_tokens_limit` tokens that the
/// consumer hasn't started to process.
#[derive(Debug, Copy, Clone)]
pub struct MemorySettings {
    /// The number of tokens after which the background parser flushes a chunk.
    pub pending_tokens_limit: usize,
    /// The number of chunks the consumer hasn't acknowledged after which the
    /// background parser stops tokenizing.
    pub outstanding_checkpoint_limit: usize,
    /// Initial capacity of the synchronous input buffer.
    pub preallocated_token_buffer_size: usize,
}

impl Default for MemorySettings {
    #[inline]
    fn default() -> Self {
        MemorySettings {
            pending_tokens_limit: 1000,
            outstanding_checkpoint_limit: 10,
            preallocated_token_buffer_size: 1024,
        }
    }
}

/// How long a single `pump` may run before it yields back to the host.
#[derive(Debug, Copy, Clone)]
pub struct SchedulingSettings {
    pub time_budget: Duration,
    /// The elapsed time is only checked once per this many tokens.
    pub tokens_per_yield_check: usize,
}

impl Default for SchedulingSettings {
    #[inline]
    fn default() -> Self {
        SchedulingSettings {
            time_budget: Duration::from_millis(500),
            tokens_per_yield_check: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParserSettings {
    /// Whether scripts are enabled in the document. Affects how `<noscript>`
    /// content is parsed.
    pub scripting_enabled: bool,
    /// Tokenize on a background thread. When disabled, or when the thread
    /// can't be spawned, all the work happens in `pump`.
    pub use_background_parser: bool,
    pub xss_auditor: Option<XssAuditorSettings>,
    /// Encoding of the bytes passed to `DocumentParser::write`.
    pub encoding: &'static Encoding,
    /// Base for the URLs of preload requests.
    pub document_url: Option<Url>,
    pub scheduling: SchedulingSettings,
    pub memory: MemorySettings,
}

impl Default for ParserSettings {
    #[inline]
    fn default() -> Self {
        ParserSettings {
            scripting_enabled: true,
            use_background_parser: true,
            xss_auditor: None,
            encoding: UTF_8,
            document_url: None,
            scheduling: SchedulingSettings::default(),
            memory: MemorySettings::default(),
        }
    }
}
