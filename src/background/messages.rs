use crate::errors::CheckpointError;
use crate::input::InputCheckpoint;
use crate::preload_scanner::{PreloadRequest, PreloadScannerCheckpoint};
use crate::token::CompactToken;
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::tree_builder_simulator::SimulatorState;
use crate::xss_auditor::XssInfo;

/// Where the background parser rewinds its input to when it resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    /// The end of the chunk created with this checkpoint.
    Chunk(InputCheckpoint),
    /// The point the background parser resumed from most recently.
    LastResumption,
}

/// Everything the background parser needs to continue from a point the
/// consumer has reached.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Chunks produced after the resumption carry this generation.
    pub generation: u64,
    pub token: Token,
    pub tokenizer: Tokenizer,
    pub simulator_state: SimulatorState,
    pub resume_point: ResumePoint,
    pub preload_scanner_checkpoint: PreloadScannerCheckpoint,
    /// Input the consumer received but hasn't tokenized. It goes in front
    /// of the input replayed from `resume_point`.
    pub unparsed_input: String,
}

/// Messages from the consumer to the background parser.
#[derive(Debug)]
pub enum WorkerMessage {
    Append(String),
    ResumeFrom(Box<Checkpoint>),
    /// The consumer started processing the chunk created with this
    /// checkpoint and won't rewind to anything before it.
    StartedChunkWithCheckpoint(InputCheckpoint),
    Finish,
    Stop,
}

/// State of the background parser at the end of a chunk.
#[derive(Debug, Clone)]
pub struct ChunkEndState {
    pub tokenizer: Tokenizer,
    /// The in-progress token if the input ran out in the middle of a token.
    pub token: Token,
    pub simulator_state: SimulatorState,
    pub input_checkpoint: InputCheckpoint,
    pub preload_scanner_checkpoint: PreloadScannerCheckpoint,
}

/// A batch of tokens produced by the background parser.
#[derive(Debug)]
pub struct ParsedChunk {
    pub generation: u64,
    pub tokens: Vec<CompactToken>,
    pub preloads: Vec<PreloadRequest>,
    pub xss_infos: Vec<XssInfo>,
    pub end_state: ChunkEndState,
    /// The last token is a start tag whose effect on the tokenizer can't
    /// be predicted. The background parser waits for a `ResumeFrom`.
    pub stopped_for_ambiguity: bool,
}

impl ParsedChunk {
    #[inline]
    pub fn ends_document(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|token| token.kind() == TokenKind::EndOfFile)
    }
}

/// Messages from the background parser to the consumer.
#[derive(Debug)]
pub enum WorkerEvent {
    Chunk(Box<ParsedChunk>),
    /// All the messages up to the `handled`-th one are processed and the
    /// background parser waits for more.
    Idle { handled: u64 },
    RewindFailed(CheckpointError),
}
