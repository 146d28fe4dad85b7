//! Speculative tokenization on a dedicated thread.
//!
//! The background parser tokenizes ahead of tree construction and hands
//! the tokens over in chunks. Each chunk carries everything needed to
//! restart tokenization from its end, so when a script changes what the
//! tree builder expects the consumer can discard the speculation and
//! resume the background parser from the last trusted point.
mod messages;
mod worker;

use self::worker::Worker;
use crate::errors::ParserError;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::debug;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

pub use self::messages::{
    Checkpoint, ChunkEndState, ParsedChunk, ResumePoint, WorkerEvent, WorkerMessage,
};
pub(crate) use self::worker::WorkerConfig;

/// Owning handle of the background parser thread.
///
/// Dropping the handle cancels the thread: it stops before its next token
/// and chunks that are in flight at that moment are never read.
#[derive(Debug)]
pub struct BackgroundParser {
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerEvent>,
    cancelled: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    sent_messages: u64,
    handled_messages: u64,
}

impl BackgroundParser {
    pub(crate) fn spawn(config: WorkerConfig) -> io::Result<Self> {
        let (sender, worker_receiver) = unbounded();
        let (worker_sender, receiver) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker = Worker::new(config, worker_receiver, worker_sender, Arc::clone(&cancelled));

        let thread = thread::Builder::new()
            .name("tandem-html-background-parser".into())
            .spawn(move || worker.run())?;

        debug!("Spawned the background parser thread");

        Ok(BackgroundParser {
            sender,
            receiver,
            cancelled,
            thread: Some(thread),
            sent_messages: 0,
            handled_messages: 0,
        })
    }

    pub fn send(&mut self, message: WorkerMessage) -> Result<(), ParserError> {
        let is_stop = matches!(message, WorkerMessage::Stop);

        self.sender
            .send(message)
            .map_err(|_| ParserError::WorkerDisconnected)?;

        if !is_stop {
            self.sent_messages += 1;
        }

        Ok(())
    }

    /// `true` if the worker has handled every message sent to it, so no
    /// events beyond the ones already queued will arrive.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.handled_messages == self.sent_messages
    }

    #[inline]
    fn track(&mut self, event: WorkerEvent) -> WorkerEvent {
        if let WorkerEvent::Idle { handled } = event {
            self.handled_messages = handled;
        }

        event
    }

    pub fn try_recv(&mut self) -> Result<Option<WorkerEvent>, ParserError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(self.track(event))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ParserError::WorkerDisconnected),
        }
    }

    /// Waits for the next event, but not past `deadline`.
    pub fn recv(&mut self, deadline: Option<Instant>) -> Result<Option<WorkerEvent>, ParserError> {
        let event = match deadline {
            Some(deadline) => match self.receiver.recv_deadline(deadline) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(ParserError::WorkerDisconnected),
            },
            None => self
                .receiver
                .recv()
                .map_err(|_| ParserError::WorkerDisconnected)?,
        };

        Ok(Some(self.track(event)))
    }
}

impl Drop for BackgroundParser {
    fn drop(&mut self) {
        // NOTE: the flag interrupts a running pump, the message wakes up an
        // idle thread. The thread may have exited already if it lost the
        // consumer.
        self.cancelled.store(true, Ordering::Relaxed);
        let _ = self.sender.send(WorkerMessage::Stop);

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("Background parser thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_parser::MemorySettings;
    use crate::token::CompactToken;
    use crate::tokenizer::TokenKind;

    static_assertions::assert_impl_all!(WorkerMessage: Send);
    static_assertions::assert_impl_all!(WorkerEvent: Send);
    static_assertions::assert_impl_all!(ParsedChunk: Send);
    static_assertions::assert_impl_all!(CompactToken: Send, Sync);

    fn spawn() -> BackgroundParser {
        BackgroundParser::spawn(WorkerConfig {
            scripting_enabled: true,
            memory: MemorySettings::default(),
            xss_auditor: None,
            document_url: None,
        })
        .unwrap()
    }

    fn drain_until_idle(parser: &mut BackgroundParser) -> Vec<ParsedChunk> {
        let mut chunks = Vec::new();

        while !parser.is_idle() {
            if let Some(WorkerEvent::Chunk(chunk)) = parser.recv(None).unwrap() {
                chunks.push(*chunk);
            }
        }

        chunks
    }

    #[test]
    fn tokenizes_on_another_thread() {
        let mut parser = spawn();

        parser
            .send(WorkerMessage::Append("<p>Hi".to_string()))
            .unwrap();
        parser
            .send(WorkerMessage::Append("</p>".to_string()))
            .unwrap();
        parser.send(WorkerMessage::Finish).unwrap();

        let tokens = drain_until_idle(&mut parser)
            .into_iter()
            .flat_map(|chunk| chunk.tokens)
            .map(|token| (token.kind(), token.data().to_string()))
            .collect::<Vec<_>>();

        assert_eq!(
            tokens,
            [
                (TokenKind::StartTag, "p".to_string()),
                (TokenKind::Character, "Hi".to_string()),
                (TokenKind::EndTag, "p".to_string()),
                (TokenKind::EndOfFile, String::new()),
            ]
        );
    }

    #[test]
    fn dropping_cancels_the_worker() {
        let mut parser = spawn();

        parser
            .send(WorkerMessage::Append("<p>x".repeat(10_000)))
            .unwrap();

        let cancelled = Arc::clone(&parser.cancelled);

        assert!(!cancelled.load(Ordering::Relaxed));

        drop(parser);

        assert!(cancelled.load(Ordering::Relaxed));
    }

    #[test]
    fn idle_when_nothing_was_sent() {
        let mut parser = spawn();

        assert!(parser.is_idle());
        assert!(parser.try_recv().unwrap().is_none());
    }
}
