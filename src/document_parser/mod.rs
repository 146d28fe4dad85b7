//! The consumer side of parsing.
//!
//! [`DocumentParser`] owns the tree builder and feeds it either with the
//! chunks of the background parser or, when the background parser is
//! disabled, with tokens of a tokenizer running on the current thread.
//!
//! Text inserted by scripts (`document.write`) is always tokenized on the
//! current thread. Once the inserted text is exhausted the parser checks
//! whether the speculation it received from the background parser still
//! holds. If it doesn't, the speculation is discarded and the background
//! parser is restarted from the state the main-thread tokenizer ended in.
mod decoder;
mod settings;

use self::decoder::InputDecoder;
use crate::background::{
    BackgroundParser, Checkpoint, ChunkEndState, ParsedChunk, ResumePoint, WorkerConfig,
    WorkerEvent, WorkerMessage,
};
use crate::errors::ParserError;
use crate::html::TextType;
use crate::input::SegmentedString;
use crate::preload_scanner::{PreloadRequest, PreloadScanner, PreloadScannerCheckpoint};
use crate::token::{AtomicToken, CompactToken};
use crate::tokenizer::{Token, Tokenizer, TokenizerState};
use crate::tree_builder::{
    ForeignNameTables, ScriptToProcess, TreeBuilder, TreeBuilderOptions, TreeSink,
};
use crate::tree_builder_simulator::{SimulatorState, TreeBuilderSimulator};
use crate::xss_auditor::{FilterRequest, XssAuditor, XssAuditorSettings, XssInfo};
use log::{debug, warn};
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

pub use self::settings::{MemorySettings, ParserSettings, SchedulingSettings};

/// The reason `pump` returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Everything that was written so far is processed.
    NeedsInput,
    /// Tree construction waits for a parser-blocking script. Take it with
    /// [`DocumentParser::take_script_to_execute`].
    BlockedOnScript,
    /// The time budget ran out. Call `pump` again later.
    Yielded,
    /// The end of the document is processed.
    Finished,
    /// The parser was stopped.
    Stopped,
}

enum ChunkPoll {
    Ready(Box<ParsedChunk>),
    /// The background parser has nothing more to say until it gets input.
    Idle,
    TimedOut,
}

enum SpeculativeStep {
    Continue,
    NeedsInput,
    TimedOut,
}

struct ChunkCursor {
    chunk: Box<ParsedChunk>,
    next_token: usize,
}

/// The last state of the background parser the tree builder has caught up
/// with: the end of a processed chunk or the point it was resumed from.
struct SpeculationPoint {
    tokenizer: Tokenizer,
    token: Token,
    simulator_state: SimulatorState,
    resume_point: ResumePoint,
    preload_scanner_checkpoint: PreloadScannerCheckpoint,
}

impl From<ChunkEndState> for SpeculationPoint {
    fn from(end_state: ChunkEndState) -> Self {
        SpeculationPoint {
            tokenizer: end_state.tokenizer,
            token: end_state.token,
            simulator_state: end_state.simulator_state,
            resume_point: ResumePoint::Chunk(end_state.input_checkpoint),
            preload_scanner_checkpoint: end_state.preload_scanner_checkpoint,
        }
    }
}

/// Incremental HTML document parser.
///
/// Input is written with [`append`](Self::append) or [`write`](Self::write)
/// and processed by [`pump`](Self::pump). When `pump` returns
/// [`PumpOutcome::BlockedOnScript`] the host takes the script, runs it
/// (inserting text with [`insert`](Self::insert) if the script writes to
/// the document) and continues with [`resume_after_script`](Self::resume_after_script).
pub struct DocumentParser<S: TreeSink> {
    tree_builder: TreeBuilder<S>,
    scripting_enabled: bool,
    scheduling: SchedulingSettings,
    document_url: Option<Url>,
    xss_auditor_settings: Option<XssAuditorSettings>,
    decoder: InputDecoder,

    // NOTE: in background mode the main-thread tokenizer only exists
    // while inserted text is processed.
    tokenizer: Option<Tokenizer>,
    token: Token,
    input: SegmentedString,
    xss_auditor: Option<XssAuditor>,
    preload_scanner: Option<PreloadScanner>,

    background: Option<BackgroundParser>,
    speculations: VecDeque<Box<ParsedChunk>>,
    current_chunk: Option<ChunkCursor>,
    speculation_point: Option<SpeculationPoint>,
    // NOTE: a copy of the network input kept until the first chunk is
    // started, in case the parser has to fall back to the current thread.
    unacknowledged_input: Option<String>,
    generation: u64,

    finish_requested: bool,
    stopped: bool,
    executing_script: bool,
    xss_findings: Vec<XssInfo>,
    preload_requests: Vec<PreloadRequest>,
}

impl<S: TreeSink> DocumentParser<S> {
    pub fn new(sink: S, settings: ParserSettings) -> Self {
        let ParserSettings {
            scripting_enabled,
            use_background_parser,
            xss_auditor,
            encoding,
            document_url,
            scheduling,
            memory,
        } = settings;

        let background = if use_background_parser {
            let config = WorkerConfig {
                scripting_enabled,
                memory,
                xss_auditor: xss_auditor.clone(),
                document_url: document_url.clone(),
            };

            match BackgroundParser::spawn(config) {
                Ok(background) => Some(background),
                Err(err) => {
                    warn!("Can't spawn the background parser, parsing on the current thread: {err}");
                    None
                }
            }
        } else {
            None
        };

        let mut parser = DocumentParser {
            tree_builder: TreeBuilder::new(
                sink,
                TreeBuilderOptions { scripting_enabled },
                Arc::new(ForeignNameTables::new()),
            ),
            scripting_enabled,
            scheduling,
            document_url,
            xss_auditor_settings: xss_auditor,
            decoder: InputDecoder::new(encoding, memory.preallocated_token_buffer_size),
            tokenizer: None,
            token: Token::default(),
            input: SegmentedString::default(),
            xss_auditor: None,
            preload_scanner: None,
            unacknowledged_input: background.as_ref().map(|_| String::new()),
            background,
            speculations: VecDeque::new(),
            current_chunk: None,
            speculation_point: None,
            generation: 0,
            finish_requested: false,
            stopped: false,
            executing_script: false,
            xss_findings: Vec::new(),
            preload_requests: Vec::new(),
        };

        if parser.background.is_none() {
            parser.start_synchronous_tokenization();
        }

        parser
    }

    /// `true` if all the tokenization happens on the current thread.
    #[inline]
    pub fn is_synchronous(&self) -> bool {
        self.background.is_none()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.tree_builder.is_finished()
    }

    #[inline]
    pub fn tree_builder(&self) -> &TreeBuilder<S> {
        &self.tree_builder
    }

    #[inline]
    pub fn sink(&self) -> &S {
        self.tree_builder.sink()
    }

    #[inline]
    pub fn into_sink(self) -> S {
        self.tree_builder.into_sink()
    }

    /// Reports of the XSS auditor received so far.
    #[inline]
    pub fn xss_findings(&self) -> &[XssInfo] {
        &self.xss_findings
    }

    /// Takes the preload requests found since the previous call.
    #[inline]
    pub fn preload_requests(&mut self) -> Vec<PreloadRequest> {
        mem::take(&mut self.preload_requests)
    }

    #[inline]
    pub fn has_parser_blocking_script(&self) -> bool {
        self.tree_builder.has_parser_blocking_script()
    }

    fn check_can_receive_input(&self) -> Result<(), ParserError> {
        if self.stopped {
            Err(ParserError::Stopped)
        } else if self.finish_requested {
            Err(ParserError::AlreadyFinished)
        } else {
            Ok(())
        }
    }

    /// Appends network input.
    pub fn append(&mut self, text: &str) -> Result<(), ParserError> {
        self.check_can_receive_input()?;
        self.append_decoded(text.to_string())
    }

    /// Appends network input in the encoding given by the settings.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ParserError> {
        self.check_can_receive_input()?;

        let text = self.decoder.decode(bytes, false);

        self.append_decoded(text)
    }

    fn append_decoded(&mut self, text: String) -> Result<(), ParserError> {
        if text.is_empty() {
            return Ok(());
        }

        match &mut self.background {
            Some(background) => {
                if let Some(unacknowledged) = &mut self.unacknowledged_input {
                    unacknowledged.push_str(&text);
                }

                background.send(WorkerMessage::Append(text))
            }
            None => {
                self.input.append(text);
                Ok(())
            }
        }
    }

    /// Signals the end of the network input.
    pub fn finish(&mut self) -> Result<(), ParserError> {
        if self.stopped {
            return Err(ParserError::Stopped);
        }

        if self.finish_requested {
            return Ok(());
        }

        let tail = self.decoder.decode(&[], true);

        self.append_decoded(tail)?;
        self.finish_requested = true;

        match &mut self.background {
            Some(background) => background.send(WorkerMessage::Finish),
            None => {
                self.input.close();
                Ok(())
            }
        }
    }

    /// Inserts text at the current insertion point, the way
    /// `document.write` does. The text is tokenized right away until it is
    /// exhausted or a script blocks the parser.
    pub fn insert(&mut self, text: &str) -> Result<(), ParserError> {
        if self.stopped {
            return Err(ParserError::Stopped);
        }

        if text.is_empty() {
            return Ok(());
        }

        if self.background.is_some() && self.tokenizer.is_none() {
            if self.current_chunk.is_some() {
                // NOTE: the insertion point is the end of the chunk that is
                // being processed, the text is tokenized once it's reached.
                self.input.append(text);
                return Ok(());
            }

            self.begin_main_thread_tokenization();
        }

        let rest = mem::take(&mut self.input);

        self.input = SegmentedString::new(text);

        while !self.tree_builder.has_parser_blocking_script() && self.process_main_token() {}

        let unconsumed = mem::replace(&mut self.input, rest);

        self.input.prepend(unconsumed);

        Ok(())
    }

    /// Takes the script the parser is blocked on. Parsing stays paused
    /// until [`resume_after_script`](Self::resume_after_script) is called.
    pub fn take_script_to_execute(&mut self) -> Option<ScriptToProcess> {
        let script = self.tree_builder.take_script_to_process()?;

        debug!("Parser is paused for the script at {}", script.position);
        self.executing_script = true;

        Some(script)
    }

    /// Continues parsing after the host has executed the blocking script.
    pub fn resume_after_script(&mut self) -> Result<PumpOutcome, ParserError> {
        if self.stopped {
            return Err(ParserError::Stopped);
        }

        // NOTE: a script found in the inserted text keeps the parser blocked.
        self.executing_script = false;

        self.pump()
    }

    /// Processes input until it runs out, a script blocks the parser or the
    /// time budget is spent.
    pub fn pump(&mut self) -> Result<PumpOutcome, ParserError> {
        let deadline = Instant::now() + self.scheduling.time_budget;

        self.pump_until(Some(deadline))
    }

    /// Processes input until it runs out or a script blocks the parser.
    /// Waits for the background parser as long as it's working.
    pub fn run_until_blocked(&mut self) -> Result<PumpOutcome, ParserError> {
        self.pump_until(None)
    }

    /// Stops parsing. Input that was not processed yet is dropped.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }

        debug!("Parser is stopped");

        self.stopped = true;
        self.background = None;
        self.speculations.clear();
        self.current_chunk = None;
        self.tokenizer = None;
        self.input.clear();
    }

    fn pump_until(&mut self, deadline: Option<Instant>) -> Result<PumpOutcome, ParserError> {
        let mut tokens_until_time_check = self.scheduling.tokens_per_yield_check;

        loop {
            if let Some(outcome) = self.blocked_outcome()? {
                return Ok(outcome);
            }

            if let Some(deadline) = deadline {
                if tokens_until_time_check == 0 {
                    if Instant::now() >= deadline {
                        log::trace!("Parser yields, the time budget is spent");
                        return Ok(PumpOutcome::Yielded);
                    }

                    tokens_until_time_check = self.scheduling.tokens_per_yield_check;
                } else {
                    tokens_until_time_check -= 1;
                }
            }

            if self.tokenizer.is_some() {
                if self.process_main_token() {
                    continue;
                }

                if self.background.is_none() {
                    return Ok(PumpOutcome::NeedsInput);
                }

                self.validate_speculations()?;
                continue;
            }

            match self.process_speculative_token(deadline)? {
                SpeculativeStep::Continue => (),
                SpeculativeStep::NeedsInput => return Ok(PumpOutcome::NeedsInput),
                SpeculativeStep::TimedOut => return Ok(PumpOutcome::Yielded),
            }
        }
    }

    fn blocked_outcome(&mut self) -> Result<Option<PumpOutcome>, ParserError> {
        if self.stopped {
            return Ok(Some(PumpOutcome::Stopped));
        }

        if self.tree_builder.is_finished() {
            return Ok(Some(PumpOutcome::Finished));
        }

        if self.executing_script || self.tree_builder.has_parser_blocking_script() {
            // NOTE: preloads found ahead of the script are useful while it's
            // being fetched and executed.
            self.receive_available_events()?;

            return Ok(Some(PumpOutcome::BlockedOnScript));
        }

        Ok(None)
    }

    fn start_synchronous_tokenization(&mut self) {
        self.tokenizer = Some(Tokenizer::new(self.scripting_enabled));
        self.token = Token::default();

        self.xss_auditor = self
            .xss_auditor_settings
            .clone()
            .map(XssAuditor::new)
            .filter(XssAuditor::is_enabled);

        self.preload_scanner = Some(PreloadScanner::new(self.document_url.clone()));
    }

    fn begin_main_thread_tokenization(&mut self) {
        match &self.speculation_point {
            Some(point) => {
                self.tokenizer = Some(point.tokenizer.clone());
                self.token = point.token.clone();
            }
            None => self.fall_back_to_synchronous(),
        }
    }

    // NOTE: nothing of the speculation has reached the tree builder yet, so
    // the network input can be tokenized here from the start.
    fn fall_back_to_synchronous(&mut self) {
        debug!("Text is inserted before the first chunk, parsing on the current thread");

        self.background = None;
        self.speculations.clear();
        self.current_chunk = None;

        if let Some(network_input) = self.unacknowledged_input.take() {
            self.input.append(network_input);
        }

        if self.finish_requested {
            self.input.close();
        }

        self.start_synchronous_tokenization();
    }

    /// Tokenizes one token of the main-thread input and constructs the tree
    /// from it. Returns `false` if the input has no complete token left.
    fn process_main_token(&mut self) -> bool {
        let Some(tokenizer) = self.tokenizer.as_mut() else {
            return false;
        };

        if !tokenizer.next_token(&mut self.input, &mut self.token) {
            return false;
        }

        let xss_info = match &mut self.xss_auditor {
            Some(auditor) => auditor.filter(&mut FilterRequest {
                token: &mut self.token,
                should_allow_cdata: tokenizer.should_allow_cdata(),
            }),
            None => None,
        };

        let token = CompactToken::new(&self.token, self.token.position());

        self.token.clear();

        if let Some(scanner) = &mut self.preload_scanner {
            scanner.scan(&token, &mut self.preload_requests);
        }

        if let Some(info) = xss_info {
            self.record_xss_finding(info);

            if self.stopped {
                return true;
            }
        }

        self.tree_builder.construct_tree(AtomicToken::from(&token));

        if let Some(tokenizer) = self.tokenizer.as_mut() {
            if let Some(text_type) = self.tree_builder.take_requested_text_state() {
                tokenizer.switch_text_type(text_type);
            }

            let in_foreign_content = self.tree_builder.adjusted_current_node_is_foreign();

            tokenizer.set_should_allow_cdata(in_foreign_content);
            tokenizer.set_force_null_character_replacement(in_foreign_content);
        }

        true
    }

    fn record_xss_finding(&mut self, info: XssInfo) {
        let blocks_page = info.did_block_entire_page;

        self.xss_findings.push(info);

        if blocks_page {
            debug!("XSS auditor blocked the page");
            self.stop();
        }
    }

    fn process_speculative_token(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<SpeculativeStep, ParserError> {
        if self.current_chunk.is_none() {
            match self.next_chunk(deadline)? {
                ChunkPoll::Ready(chunk) => self.begin_chunk(chunk)?,
                ChunkPoll::Idle => return Ok(SpeculativeStep::NeedsInput),
                ChunkPoll::TimedOut => return Ok(SpeculativeStep::TimedOut),
            }

            return Ok(SpeculativeStep::Continue);
        }

        let Some(cursor) = &mut self.current_chunk else {
            return Ok(SpeculativeStep::Continue);
        };

        if let Some(token) = cursor.chunk.tokens.get(cursor.next_token) {
            self.tree_builder.construct_tree(AtomicToken::from(token));
            cursor.next_token += 1;
        }

        let requested_text_state = self.tree_builder.take_requested_text_state();
        let chunk_is_done = cursor.next_token >= cursor.chunk.tokens.len();

        if chunk_is_done {
            if let Some(ChunkCursor { chunk, .. }) = self.current_chunk.take() {
                self.finish_chunk(*chunk, requested_text_state)?;
            }
        }

        Ok(SpeculativeStep::Continue)
    }

    fn next_chunk(&mut self, deadline: Option<Instant>) -> Result<ChunkPoll, ParserError> {
        loop {
            if let Some(chunk) = self.speculations.pop_front() {
                return Ok(ChunkPoll::Ready(chunk));
            }

            let Some(background) = self.background.as_mut() else {
                return Ok(ChunkPoll::Idle);
            };

            let event = match background.try_recv()? {
                Some(event) => event,
                None if background.is_idle() => return Ok(ChunkPoll::Idle),
                None => match background.recv(deadline)? {
                    Some(event) => event,
                    None => return Ok(ChunkPoll::TimedOut),
                },
            };

            self.handle_event(event)?;
        }
    }

    fn receive_available_events(&mut self) -> Result<(), ParserError> {
        loop {
            let Some(background) = self.background.as_mut() else {
                return Ok(());
            };

            let Some(event) = background.try_recv()? else {
                return Ok(());
            };

            self.handle_event(event)?;
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) -> Result<(), ParserError> {
        match event {
            WorkerEvent::Chunk(mut chunk) if chunk.generation == self.generation => {
                self.preload_requests.append(&mut chunk.preloads);
                self.speculations.push_back(chunk);
            }
            WorkerEvent::Chunk(chunk) => {
                log::trace!(
                    "Dropping a chunk of generation {} (current is {})",
                    chunk.generation,
                    self.generation
                );
            }
            WorkerEvent::Idle { .. } => (),
            WorkerEvent::RewindFailed(err) => return Err(err.into()),
        }

        Ok(())
    }

    fn begin_chunk(&mut self, mut chunk: Box<ParsedChunk>) -> Result<(), ParserError> {
        if let Some(background) = &mut self.background {
            background.send(WorkerMessage::StartedChunkWithCheckpoint(
                chunk.end_state.input_checkpoint,
            ))?;
        }

        self.unacknowledged_input = None;

        for info in mem::take(&mut chunk.xss_infos) {
            self.record_xss_finding(info);

            if self.stopped {
                return Ok(());
            }
        }

        self.current_chunk = Some(ChunkCursor {
            chunk,
            next_token: 0,
        });

        Ok(())
    }

    fn finish_chunk(
        &mut self,
        chunk: ParsedChunk,
        requested_text_state: Option<TextType>,
    ) -> Result<(), ParserError> {
        let ParsedChunk {
            end_state,
            stopped_for_ambiguity,
            ..
        } = chunk;

        // NOTE: a mismatch without a stop means the tree builder took a path
        // the simulator doesn't model.
        let mispredicted = !stopped_for_ambiguity
            && !self.tree_builder.is_finished()
            && end_state.simulator_state != TreeBuilderSimulator::state_for(&self.tree_builder);

        if stopped_for_ambiguity || mispredicted {
            let ChunkEndState {
                mut tokenizer,
                token,
                input_checkpoint,
                preload_scanner_checkpoint,
                ..
            } = end_state;

            if let Some(text_type) = requested_text_state {
                tokenizer.switch_text_type(text_type);
            }

            if mispredicted {
                debug!("The background parser mispredicted the tree builder state, resuming it");
            } else {
                debug!("Resuming the background parser after an ambiguous tag");
            }

            return self.resume_background_parser(
                tokenizer,
                token,
                ResumePoint::Chunk(input_checkpoint),
                preload_scanner_checkpoint,
            );
        }

        self.speculation_point = Some(end_state.into());

        // NOTE: text inserted while the chunk was processed.
        if !self.input.is_empty() && self.tokenizer.is_none() {
            self.begin_main_thread_tokenization();
        }

        Ok(())
    }

    /// Decides whether the chunks received after the main-thread tokenizer
    /// took over can still be used once it ran out of input.
    fn validate_speculations(&mut self) -> Result<(), ParserError> {
        let Some(tokenizer) = self.tokenizer.take() else {
            return Ok(());
        };

        let token = mem::take(&mut self.token);

        let speculation_holds = self.speculation_point.as_ref().is_some_and(|point| {
            point.tokenizer.state() == TokenizerState::Data
                && point.token.is_uninitialized()
                && tokenizer.state() == TokenizerState::Data
                && tokenizer.is_at_token_boundary()
                && token.is_uninitialized()
                && self.input.is_empty()
                && point.simulator_state == TreeBuilderSimulator::state_for(&self.tree_builder)
        });

        if speculation_holds {
            log::trace!("Speculation holds after the inserted text");
            return Ok(());
        }

        let (resume_point, preload_scanner_checkpoint) = match &self.speculation_point {
            Some(point) => (point.resume_point, point.preload_scanner_checkpoint.clone()),
            None => (ResumePoint::LastResumption, PreloadScannerCheckpoint::default()),
        };

        debug!("Inserted text invalidated the speculation, resuming the background parser");

        self.resume_background_parser(tokenizer, token, resume_point, preload_scanner_checkpoint)
    }

    fn resume_background_parser(
        &mut self,
        mut tokenizer: Tokenizer,
        token: Token,
        resume_point: ResumePoint,
        preload_scanner_checkpoint: PreloadScannerCheckpoint,
    ) -> Result<(), ParserError> {
        let in_foreign_content = self.tree_builder.adjusted_current_node_is_foreign();

        tokenizer.set_should_allow_cdata(in_foreign_content);
        tokenizer.set_force_null_character_replacement(in_foreign_content);

        self.generation += 1;
        self.speculations.clear();
        self.current_chunk = None;

        let unparsed_input = self.input.to_string();

        self.input.clear();

        let simulator_state = TreeBuilderSimulator::state_for(&self.tree_builder);

        // NOTE: the background parser only learns the index of the point it
        // resumes from once it handles the message, so later resumptions
        // refer to it indirectly.
        self.speculation_point = Some(SpeculationPoint {
            tokenizer: tokenizer.clone(),
            token: token.clone(),
            simulator_state: simulator_state.clone(),
            resume_point: ResumePoint::LastResumption,
            preload_scanner_checkpoint: preload_scanner_checkpoint.clone(),
        });

        debug!(
            "Resuming the background parser from {resume_point:?} (generation {})",
            self.generation
        );

        let checkpoint = Checkpoint {
            generation: self.generation,
            token,
            tokenizer,
            simulator_state,
            resume_point,
            preload_scanner_checkpoint,
            unparsed_input,
        };

        match &mut self.background {
            Some(background) => background.send(WorkerMessage::ResumeFrom(Box::new(checkpoint))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{serialize_for_test, Dom};
    use crate::xss_auditor::XssMode;
    use std::time::Duration;

    fn settings(use_background_parser: bool) -> ParserSettings {
        ParserSettings {
            use_background_parser,
            scheduling: SchedulingSettings {
                time_budget: Duration::from_secs(60),
                ..SchedulingSettings::default()
            },
            ..ParserSettings::default()
        }
    }

    /// Runs the document to the end, inserting `written` when the first
    /// script executes.
    fn parse_with_write(html: &str, written: Option<&str>, use_background_parser: bool) -> String {
        let mut parser = DocumentParser::new(Dom::new(), settings(use_background_parser));
        let mut written = written;

        parser.append(html).unwrap();
        parser.finish().unwrap();

        let mut outcome = parser.run_until_blocked().unwrap();

        while outcome != PumpOutcome::Finished {
            assert_eq!(outcome, PumpOutcome::BlockedOnScript);
            assert!(parser.take_script_to_execute().is_some());

            if let Some(text) = written.take() {
                parser.insert(text).unwrap();
            }

            outcome = parser.resume_after_script().unwrap();
        }

        serialize_for_test(parser.sink())
    }

    fn parse(html: &str, use_background_parser: bool) -> String {
        parse_with_write(html, None, use_background_parser)
    }

    #[test]
    fn parses_on_the_current_thread() {
        let mut parser = DocumentParser::new(Dom::new(), settings(false));

        assert!(parser.is_synchronous());

        parser.append("<p>Hi").unwrap();
        assert_eq!(parser.pump().unwrap(), PumpOutcome::NeedsInput);

        parser.finish().unwrap();
        assert_eq!(parser.pump().unwrap(), PumpOutcome::Finished);

        assert_eq!(
            serialize_for_test(parser.sink()),
            "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"Hi\"\n"
        );
    }

    #[test]
    fn background_parsing_builds_the_same_tree() {
        let html = "<!DOCTYPE html><title>T</title><table><tr><td>1<td>2</table>\
                    <svg><desc><b>x</b></desc></svg><textarea><p></textarea>";

        assert_eq!(parse(html, true), parse(html, false));
    }

    #[test]
    fn pauses_for_scripts() {
        let mut parser = DocumentParser::new(Dom::new(), settings(true));

        parser.append("<p>a<script>x</script>b").unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::BlockedOnScript);
        assert!(parser.has_parser_blocking_script());

        let script = parser.take_script_to_execute().unwrap();

        assert_eq!(parser.sink().text_content(script.element), "x");
        assert_eq!(parser.pump().unwrap(), PumpOutcome::BlockedOnScript);

        assert_eq!(parser.resume_after_script().unwrap(), PumpOutcome::Finished);
        assert_eq!(
            serialize_for_test(parser.sink()),
            "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"a\"\n\
             |       <script>\n|         \"x\"\n|       \"b\"\n"
        );
    }

    #[test]
    fn inserted_text_that_keeps_the_speculation() {
        let html = "<p>a<script>x</script>b</p>";
        let expected = "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"a\"\n\
                        |       <script>\n|         \"x\"\n|       <i>\n|         \"b\"\n";

        assert_eq!(parse_with_write(html, Some("<i>"), true), expected);
        assert_eq!(parse_with_write(html, Some("<i>"), false), expected);
    }

    #[test]
    fn inserted_text_that_invalidates_the_speculation() {
        let html = "<p>a<script>x</script>b</p>";
        let expected = "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"a\"\n\
                        |       <script>\n|         \"x\"\n|       <textarea>\n\
                        |         \"b</p>\"\n";

        assert_eq!(parse_with_write(html, Some("<textarea>"), true), expected);
        assert_eq!(parse_with_write(html, Some("<textarea>"), false), expected);
    }

    #[test]
    fn inserted_partial_tag_continues_with_the_network_input() {
        let html = "<script>x</script> title=\"t\">b";

        assert_eq!(
            parse_with_write(html, Some("<b"), true),
            parse_with_write(html, Some("<b"), false)
        );
    }

    #[test]
    fn text_inserted_again_before_the_next_chunk() {
        let run = |use_background_parser| {
            let mut parser = DocumentParser::new(Dom::new(), settings(use_background_parser));

            parser.append("<p>a<script>x</script>").unwrap();

            assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::BlockedOnScript);
            assert!(parser.take_script_to_execute().is_some());

            parser.insert("<title>").unwrap();
            assert_eq!(parser.resume_after_script().unwrap(), PumpOutcome::NeedsInput);

            // NOTE: the second insertion is tokenized from the state the
            // background parser was resumed with.
            parser.insert("t</title><textarea>").unwrap();
            assert_eq!(parser.pump().unwrap(), PumpOutcome::NeedsInput);

            parser.append("y<b></textarea>").unwrap();
            parser.finish().unwrap();

            assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Finished);

            serialize_for_test(parser.sink())
        };

        let expected = run(false);

        assert!(expected.contains("<textarea>\n|         \"y<b>\""), "{expected}");
        assert_eq!(run(true), expected);
    }

    #[test]
    fn ambiguous_tags_resume_the_background_parser() {
        for html in [
            "<select><style>a</b></style><option>c</select><p>d",
            "<frameset><title>x<b></title><noframes><p></noframes></frameset>",
        ] {
            assert_eq!(parse(html, true), parse(html, false), "Input: {html}");
        }
    }

    #[test]
    fn finishing_twice() {
        let mut parser = DocumentParser::new(Dom::new(), settings(true));

        parser.finish().unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.append("<p>"), Err(ParserError::AlreadyFinished));
        assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Finished);
    }

    #[test]
    fn stopped_parser_rejects_input() {
        let mut parser = DocumentParser::new(Dom::new(), settings(true));

        parser.append("<p>").unwrap();
        parser.stop();

        assert!(parser.is_stopped());
        assert_eq!(parser.append("a"), Err(ParserError::Stopped));
        assert_eq!(parser.finish(), Err(ParserError::Stopped));
        assert_eq!(parser.pump().unwrap(), PumpOutcome::Stopped);
    }

    #[test]
    fn writes_bytes_in_the_document_encoding() {
        let mut parser = DocumentParser::new(
            Dom::new(),
            ParserSettings {
                use_background_parser: false,
                encoding: encoding_rs::WINDOWS_1251,
                ..ParserSettings::default()
            },
        );

        parser.write(b"<p>\xCF").unwrap();
        parser.write(b"\xF0\xE8").unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.pump().unwrap(), PumpOutcome::Finished);

        let p = parser.sink().find_element("p").unwrap();

        assert_eq!(parser.sink().text_content(p), "При");
    }

    #[test]
    fn blocking_auditor_stops_the_parser() {
        for use_background_parser in [false, true] {
            let url = Url::parse("http://example.com/?q=<script>alert(1)</script>").unwrap();

            let mut parser = DocumentParser::new(
                Dom::new(),
                ParserSettings {
                    use_background_parser,
                    xss_auditor: Some(XssAuditorSettings {
                        mode: XssMode::Block,
                        ..XssAuditorSettings::new(url)
                    }),
                    ..ParserSettings::default()
                },
            );

            parser.append("<p>a</p><script>alert(1)</script>").unwrap();
            parser.finish().unwrap();

            assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Stopped);
            assert!(parser.xss_findings()[0].did_block_entire_page);
            assert!(!serialize_for_test(parser.sink()).contains("alert"));
        }
    }

    #[test]
    fn collects_preload_requests() {
        let url = Url::parse("http://example.com/dir/").unwrap();

        for use_background_parser in [false, true] {
            let mut parser = DocumentParser::new(
                Dom::new(),
                ParserSettings {
                    use_background_parser,
                    document_url: Some(url.clone()),
                    ..ParserSettings::default()
                },
            );

            parser
                .append("<script src=a.js></script><img src=b.png>")
                .unwrap();
            parser.finish().unwrap();

            assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::BlockedOnScript);

            let urls = parser
                .preload_requests()
                .into_iter()
                .map(|request| request.url.to_string())
                .collect::<Vec<_>>();

            assert!(urls.contains(&"http://example.com/dir/a.js".to_string()));
        }
    }
}
