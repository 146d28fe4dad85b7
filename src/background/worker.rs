use super::messages::{
    Checkpoint, ChunkEndState, ParsedChunk, ResumePoint, WorkerEvent, WorkerMessage,
};
use crate::document_parser::MemorySettings;
use crate::errors::CheckpointError;
use crate::input::{BackgroundInputStream, InputCheckpoint};
use crate::preload_scanner::{PreloadRequest, PreloadScanner};
use crate::token::CompactToken;
use crate::tokenizer::{Token, Tokenizer};
use crate::tree_builder_simulator::TreeBuilderSimulator;
use crate::xss_auditor::{FilterRequest, XssAuditor, XssAuditorSettings, XssInfo};
use crossbeam_channel::{Receiver, SendError, Sender};
use log::debug;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

type SendResult = Result<(), SendError<WorkerEvent>>;

#[derive(Debug, Clone)]
pub(crate) struct WorkerConfig {
    pub scripting_enabled: bool,
    pub memory: MemorySettings,
    pub xss_auditor: Option<XssAuditorSettings>,
    pub document_url: Option<Url>,
}

/// The tokenizing side of speculative parsing.
///
/// Runs the tokenizer, the XSS auditor, the preload scanner and the tree
/// builder simulator over the input and sends the tokens to the consumer in
/// chunks. Stops tokenizing when the consumer falls too far behind or when
/// the simulator can't predict the tokenizer state.
pub(super) struct Worker {
    receiver: Receiver<WorkerMessage>,
    sender: Sender<WorkerEvent>,
    // NOTE: set by the consumer when it stops, checked between tokens.
    cancelled: Arc<AtomicBool>,
    input: BackgroundInputStream,
    resumed_checkpoint: Option<InputCheckpoint>,
    tokenizer: Tokenizer,
    token: Token,
    simulator: TreeBuilderSimulator,
    preload_scanner: PreloadScanner,
    xss_auditor: Option<XssAuditor>,
    pending_tokens: Vec<CompactToken>,
    pending_preloads: Vec<PreloadRequest>,
    pending_xss_infos: Vec<XssInfo>,
    memory: MemorySettings,
    generation: u64,
    handled_messages: u64,
    awaiting_resume: bool,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        receiver: Receiver<WorkerMessage>,
        sender: Sender<WorkerEvent>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Worker {
            receiver,
            sender,
            cancelled,
            input: BackgroundInputStream::default(),
            resumed_checkpoint: None,
            tokenizer: Tokenizer::new(config.scripting_enabled),
            token: Token::default(),
            simulator: TreeBuilderSimulator::default(),
            preload_scanner: PreloadScanner::new(config.document_url),
            xss_auditor: config
                .xss_auditor
                .map(XssAuditor::new)
                .filter(XssAuditor::is_enabled),
            pending_tokens: Vec::with_capacity(config.memory.pending_tokens_limit),
            pending_preloads: Vec::new(),
            pending_xss_infos: Vec::new(),
            memory: config.memory,
            generation: 0,
            handled_messages: 0,
            awaiting_resume: false,
        }
    }

    pub fn run(mut self) {
        debug!("Background parser started");

        while let Ok(message) = self.receiver.recv() {
            if matches!(message, WorkerMessage::Stop) || self.is_cancelled() {
                break;
            }

            if self.handle(message).is_err() {
                debug!("Background parser consumer has gone away");
                break;
            }
        }

        debug!("Background parser stopped");
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn handle(&mut self, message: WorkerMessage) -> SendResult {
        match message {
            WorkerMessage::Append(text) => self.input.append(text),
            WorkerMessage::ResumeFrom(checkpoint) => self.resume_from(*checkpoint)?,
            WorkerMessage::StartedChunkWithCheckpoint(checkpoint) => {
                self.input.invalidate_checkpoints_before(checkpoint)
            }
            WorkerMessage::Finish => self.input.close(),
            WorkerMessage::Stop => unreachable!("Stop message should be handled by the run loop"),
        }

        self.pump_tokenizer()?;
        self.handled_messages += 1;

        self.sender.send(WorkerEvent::Idle {
            handled: self.handled_messages,
        })
    }

    fn resume_from(&mut self, checkpoint: Checkpoint) -> SendResult {
        let Checkpoint {
            generation,
            token,
            tokenizer,
            simulator_state,
            resume_point,
            preload_scanner_checkpoint,
            unparsed_input,
        } = checkpoint;

        let rewound = match resume_point {
            ResumePoint::Chunk(checkpoint) => Ok(checkpoint),
            ResumePoint::LastResumption => {
                self.resumed_checkpoint.ok_or(CheckpointError::NotResumed)
            }
        }
        .and_then(|checkpoint| {
            self.input
                .rewind_to(checkpoint, &unparsed_input)
                .map(|()| checkpoint)
        });

        let input_checkpoint = match rewound {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                debug!("Background parser can't resume: {err}");

                // NOTE: stay paused, the consumer can't trust anything produced
                // from the current state anymore.
                self.awaiting_resume = true;

                return self.sender.send(WorkerEvent::RewindFailed(err));
            }
        };

        debug!(
            "Background parser resumes from checkpoint {input_checkpoint} \
             (generation {generation}, {} characters of unparsed input)",
            unparsed_input.len()
        );

        // NOTE: the resumption point itself is the first checkpoint of the
        // rewound input, so the consumer can resume from it again.
        self.resumed_checkpoint = Some(self.input.create_checkpoint());

        self.generation = generation;
        self.token = token;
        self.tokenizer = tokenizer;
        self.simulator = TreeBuilderSimulator::from_state(&simulator_state);
        self.preload_scanner.rewind_to(preload_scanner_checkpoint);
        self.pending_tokens.clear();
        self.pending_preloads.clear();
        self.pending_xss_infos.clear();
        self.awaiting_resume = false;

        Ok(())
    }

    #[inline]
    fn is_throttled(&self) -> bool {
        self.input.outstanding_checkpoint_count() > self.memory.outstanding_checkpoint_limit
    }

    fn pump_tokenizer(&mut self) -> SendResult {
        if self.awaiting_resume || self.is_throttled() {
            return Ok(());
        }

        while self
            .tokenizer
            .next_token(self.input.current_mut(), &mut self.token)
        {
            if self.is_cancelled() {
                debug!("Background parser is cancelled, dropping pending tokens");
                self.pending_tokens.clear();

                return Ok(());
            }

            if let Some(auditor) = &mut self.xss_auditor {
                let mut request = FilterRequest {
                    token: &mut self.token,
                    should_allow_cdata: self.tokenizer.should_allow_cdata(),
                };

                if let Some(info) = auditor.filter(&mut request) {
                    self.pending_xss_infos.push(info);
                }
            }

            let token = CompactToken::new(&self.token, self.token.position());

            self.token.clear();
            self.preload_scanner.scan(&token, &mut self.pending_preloads);

            let can_continue = self.simulator.simulate(&token, &mut self.tokenizer);

            self.pending_tokens.push(token);

            if !can_continue {
                if let Some(ambiguity) = self.simulator.take_ambiguity() {
                    debug!("Background parser waits for the consumer: {ambiguity}");

                    self.flush(true)?;
                    self.awaiting_resume = true;

                    return Ok(());
                }

                self.flush(false)?;
            } else if self.pending_tokens.len() >= self.memory.pending_tokens_limit
                && self.tokenizer.is_at_token_boundary()
            {
                self.flush(false)?;
            }

            if self.is_throttled() {
                debug!(
                    "Background parser is {} chunks ahead of the consumer, pausing",
                    self.input.outstanding_checkpoint_count()
                );

                return Ok(());
            }
        }

        self.flush(false)
    }

    fn flush(&mut self, stopped_for_ambiguity: bool) -> SendResult {
        if self.pending_tokens.is_empty() {
            return Ok(());
        }

        let tokens = mem::replace(
            &mut self.pending_tokens,
            Vec::with_capacity(self.memory.pending_tokens_limit),
        );

        let chunk = ParsedChunk {
            generation: self.generation,
            tokens,
            preloads: mem::take(&mut self.pending_preloads),
            xss_infos: mem::take(&mut self.pending_xss_infos),
            end_state: ChunkEndState {
                tokenizer: self.tokenizer.clone(),
                token: self.token.clone(),
                simulator_state: self.simulator.state(),
                input_checkpoint: self.input.create_checkpoint(),
                preload_scanner_checkpoint: self.preload_scanner.checkpoint(),
            },
            stopped_for_ambiguity,
        };

        log::trace!(
            "Flushing {} tokens with checkpoint {}",
            chunk.tokens.len(),
            chunk.end_state.input_checkpoint
        );

        self.sender.send(WorkerEvent::Chunk(Box::new(chunk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::TextType;
    use crate::tokenizer::{TokenKind, TokenizerState};
    use crate::tree_builder_simulator::SimulatorState;
    use crossbeam_channel::unbounded;

    fn worker(memory: MemorySettings) -> (Worker, Receiver<WorkerEvent>) {
        let (_, receiver) = unbounded();
        let (sender, events) = unbounded();
        let config = WorkerConfig {
            scripting_enabled: true,
            memory,
            xss_auditor: None,
            document_url: None,
        };

        let cancelled = Arc::new(AtomicBool::new(false));

        (Worker::new(config, receiver, sender, cancelled), events)
    }

    fn chunks(events: &Receiver<WorkerEvent>) -> Vec<ParsedChunk> {
        events
            .try_iter()
            .filter_map(|event| match event {
                WorkerEvent::Chunk(chunk) => Some(*chunk),
                _ => None,
            })
            .collect()
    }

    fn token_data(chunk: &ParsedChunk) -> Vec<(TokenKind, String)> {
        chunk
            .tokens
            .iter()
            .map(|t| (t.kind(), t.data().to_string()))
            .collect()
    }

    #[test]
    fn stops_pumping_when_consumer_falls_behind() {
        let (mut worker, events) = worker(MemorySettings {
            pending_tokens_limit: 1,
            ..MemorySettings::default()
        });

        worker
            .handle(WorkerMessage::Append("<a>".repeat(20)))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(received.len(), 11);
        assert_eq!(worker.input.outstanding_checkpoint_count(), 11);

        worker
            .handle(WorkerMessage::StartedChunkWithCheckpoint(1))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].end_state.input_checkpoint, 11);
        assert_eq!(worker.input.outstanding_checkpoint_count(), 11);

        worker
            .handle(WorkerMessage::StartedChunkWithCheckpoint(11))
            .unwrap();

        assert_eq!(chunks(&events).len(), 8);
    }

    #[test]
    fn flushes_at_scripts_and_continues() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::Append(
                "<p>a<script>x<y</script>b".to_string(),
            ))
            .unwrap();

        worker.handle(WorkerMessage::Finish).unwrap();

        let received = chunks(&events);

        assert_eq!(
            received.iter().map(token_data).collect::<Vec<_>>(),
            [
                vec![
                    (TokenKind::StartTag, "p".to_string()),
                    (TokenKind::Character, "a".to_string()),
                    (TokenKind::StartTag, "script".to_string()),
                ],
                vec![
                    (TokenKind::Character, "x<y".to_string()),
                    (TokenKind::EndTag, "script".to_string()),
                ],
                vec![
                    (TokenKind::Character, "b".to_string()),
                    (TokenKind::EndOfFile, String::new()),
                ],
            ]
        );

        assert_eq!(
            received[0].end_state.tokenizer.state(),
            TokenizerState::ScriptData
        );
        assert!(received[2].ends_document());
    }

    #[test]
    fn partial_tokens_stay_with_the_worker() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::Append("<div>hi<scr".to_string()))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(
            token_data(&received[0]),
            [
                (TokenKind::StartTag, "div".to_string()),
                (TokenKind::Character, "hi".to_string()),
            ]
        );

        worker
            .handle(WorkerMessage::Append("ipt src=x>".to_string()))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(
            token_data(&received[0]),
            [(TokenKind::StartTag, "script".to_string())]
        );
        assert_eq!(received[0].tokens[0].get_attribute("src"), Some("x"));
    }

    #[test]
    fn resumes_from_checkpoint() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::Append("<title>".to_string()))
            .unwrap();

        let first = chunks(&events).remove(0);

        worker
            .handle(WorkerMessage::Append("a</title><b>".to_string()))
            .unwrap();

        assert_eq!(chunks(&events).len(), 1);

        // NOTE: pretend the tree builder didn't switch to RCDATA.
        let mut tokenizer = first.end_state.tokenizer.clone();

        tokenizer.switch_text_type(TextType::Data);

        worker
            .handle(WorkerMessage::ResumeFrom(Box::new(Checkpoint {
                generation: 1,
                token: Token::default(),
                tokenizer,
                simulator_state: SimulatorState::default(),
                resume_point: ResumePoint::Chunk(first.end_state.input_checkpoint),
                preload_scanner_checkpoint: first.end_state.preload_scanner_checkpoint,
                unparsed_input: "<i>".to_string(),
            })))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(received[0].generation, 1);
        assert_eq!(
            token_data(&received[0]),
            [
                (TokenKind::StartTag, "i".to_string()),
                (TokenKind::Character, "a".to_string()),
                (TokenKind::EndTag, "title".to_string()),
                (TokenKind::StartTag, "b".to_string()),
            ]
        );
        // NOTE: checkpoints 0 and 1 were created before the rewind and the
        // resumption point took 2.
        assert_eq!(worker.resumed_checkpoint, Some(2));
        assert_eq!(received[0].end_state.input_checkpoint, 3);
        assert_eq!(worker.input.outstanding_checkpoint_count(), 2);

        assert_eq!(
            worker.input.rewind_to(first.end_state.input_checkpoint, ""),
            Err(CheckpointError::Invalidated {
                checkpoint: 0,
                first_valid: 2
            })
        );
    }

    #[test]
    fn resumes_from_the_last_resumption_again() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::Append("<title>".to_string()))
            .unwrap();

        let first = chunks(&events).remove(0);

        let resume = |generation, unparsed_input: &str, resume_point| {
            WorkerMessage::ResumeFrom(Box::new(Checkpoint {
                generation,
                token: Token::default(),
                tokenizer: first.end_state.tokenizer.clone(),
                simulator_state: SimulatorState::default(),
                resume_point,
                preload_scanner_checkpoint: first.end_state.preload_scanner_checkpoint.clone(),
                unparsed_input: unparsed_input.to_string(),
            }))
        };

        worker
            .handle(resume(
                1,
                "x",
                ResumePoint::Chunk(first.end_state.input_checkpoint),
            ))
            .unwrap();

        worker
            .handle(WorkerMessage::Append("y</title>".to_string()))
            .unwrap();

        chunks(&events);

        worker
            .handle(resume(2, "z", ResumePoint::LastResumption))
            .unwrap();

        let received = chunks(&events);
        let tokens = received.iter().flat_map(token_data).collect::<Vec<_>>();

        // NOTE: the input unparsed at the last resumption is replayed too.
        let text = tokens
            .iter()
            .filter(|(kind, _)| *kind == TokenKind::Character)
            .map(|(_, data)| data.as_str())
            .collect::<String>();

        assert!(received.iter().all(|chunk| chunk.generation == 2));
        assert_eq!(text, "zxy");
        assert_eq!(
            tokens.last(),
            Some(&(TokenKind::EndTag, "title".to_string()))
        );
    }

    #[test]
    fn rejects_the_last_resumption_before_resuming() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::ResumeFrom(Box::new(Checkpoint {
                generation: 1,
                token: Token::default(),
                tokenizer: Tokenizer::default(),
                simulator_state: SimulatorState::default(),
                resume_point: ResumePoint::LastResumption,
                preload_scanner_checkpoint: Default::default(),
                unparsed_input: String::new(),
            })))
            .unwrap();

        assert!(events.try_iter().any(|event| matches!(
            event,
            WorkerEvent::RewindFailed(CheckpointError::NotResumed)
        )));
    }

    #[test]
    fn stops_pumping_once_cancelled() {
        let (mut worker, events) = worker(MemorySettings {
            pending_tokens_limit: 1,
            outstanding_checkpoint_limit: usize::MAX,
            ..MemorySettings::default()
        });

        worker.cancelled.store(true, Ordering::Relaxed);
        worker
            .handle(WorkerMessage::Append("<a>".repeat(100)))
            .unwrap();

        assert!(chunks(&events).is_empty());
        assert_eq!(worker.input.outstanding_checkpoint_count(), 0);
    }

    #[test]
    fn pauses_on_ambiguous_tags() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::Append(
                "<select><style>x".to_string(),
            ))
            .unwrap();

        let received = chunks(&events);

        assert_eq!(received.len(), 1);
        assert!(received[0].stopped_for_ambiguity);
        assert_eq!(received[0].tokens.len(), 2);

        worker
            .handle(WorkerMessage::Append("more".to_string()))
            .unwrap();

        assert!(chunks(&events).is_empty());
    }

    #[test]
    fn reports_rewind_failures() {
        let (mut worker, events) = worker(MemorySettings::default());

        worker
            .handle(WorkerMessage::ResumeFrom(Box::new(Checkpoint {
                generation: 1,
                token: Token::default(),
                tokenizer: Tokenizer::default(),
                simulator_state: SimulatorState::default(),
                resume_point: ResumePoint::Chunk(3),
                preload_scanner_checkpoint: Default::default(),
                unparsed_input: String::new(),
            })))
            .unwrap();

        assert!(events
            .try_iter()
            .any(|event| matches!(event, WorkerEvent::RewindFailed(_))));
    }
}
