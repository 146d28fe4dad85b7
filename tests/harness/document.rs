use super::ChunkedInput;
use std::time::Duration;
use tandem_html::{
    serialize_for_test, DocumentParser, Dom, MemorySettings, ParserSettings, PumpOutcome,
    SchedulingSettings,
};

#[derive(Debug, Copy, Clone)]
pub enum Mode {
    Synchronous,
    Background(MemorySettings),
}

impl Mode {
    /// The parsing modes every document is checked in. The background ones
    /// flush and throttle much more often than the defaults.
    pub fn all() -> [Mode; 4] {
        [
            Mode::Synchronous,
            Mode::Background(MemorySettings::default()),
            Mode::Background(MemorySettings {
                pending_tokens_limit: 1,
                outstanding_checkpoint_limit: 1,
                ..MemorySettings::default()
            }),
            Mode::Background(MemorySettings {
                pending_tokens_limit: 3,
                outstanding_checkpoint_limit: 2,
                ..MemorySettings::default()
            }),
        ]
    }
}

pub fn settings(mode: Mode) -> ParserSettings {
    let (use_background_parser, memory) = match mode {
        Mode::Synchronous => (false, MemorySettings::default()),
        Mode::Background(memory) => (true, memory),
    };

    ParserSettings {
        use_background_parser,
        memory,
        scheduling: SchedulingSettings {
            time_budget: Duration::from_secs(60),
            tokens_per_yield_check: 16,
        },
        ..ParserSettings::default()
    }
}

#[derive(Debug)]
pub struct ParsedDocument {
    pub tree: String,
    pub executed_scripts: usize,
    pub preload_urls: Vec<String>,
}

/// Pumps until the parser needs input, executing blocking scripts on the way.
fn settle(
    parser: &mut DocumentParser<Dom>,
    writes: &mut dyn Iterator<Item = &str>,
    executed_scripts: &mut usize,
) -> PumpOutcome {
    let mut outcome = parser.pump().unwrap();

    loop {
        outcome = match outcome {
            PumpOutcome::BlockedOnScript => {
                if parser.take_script_to_execute().is_some() {
                    *executed_scripts += 1;

                    if let Some(text) = writes.next() {
                        parser.insert(text).unwrap();
                    }
                }

                parser.resume_after_script().unwrap()
            }
            PumpOutcome::Yielded => parser.pump().unwrap(),
            outcome => return outcome,
        }
    }
}

/// Parses the chunked input to the end. Each executed script inserts the
/// next text of `writes`, if any is left.
pub fn parse_document(
    input: &ChunkedInput,
    mut settings: ParserSettings,
    writes: &[&str],
) -> ParsedDocument {
    settings.encoding = input.encoding();

    let mut parser = DocumentParser::new(Dom::new(), settings);
    let mut writes = writes.iter().copied();
    let mut executed_scripts = 0;
    let mut preload_urls = Vec::new();

    for chunk in input.chunks() {
        parser.write(chunk).unwrap();

        let outcome = settle(&mut parser, &mut writes, &mut executed_scripts);

        assert_ne!(outcome, PumpOutcome::Stopped);
        preload_urls.extend(parser.preload_requests().into_iter().map(|r| r.url));
    }

    parser.finish().unwrap();

    assert_eq!(
        settle(&mut parser, &mut writes, &mut executed_scripts),
        PumpOutcome::Finished,
        "Input: {}",
        input.as_str()
    );

    preload_urls.extend(parser.preload_requests().into_iter().map(|r| r.url));

    ParsedDocument {
        tree: serialize_for_test(parser.sink()),
        executed_scripts,
        preload_urls,
    }
}
