use super::SegmentedString;
use crate::errors::CheckpointError;
use std::collections::VecDeque;
use std::sync::Arc;

/// Index of a checkpoint created by `BackgroundInputStream::create_checkpoint`.
///
/// Indices grow monotonically over the lifetime of the stream and are never
/// reused, so a checkpoint from before a rewind can't be mistaken for one
/// created after it.
pub type InputCheckpoint = usize;

#[derive(Debug)]
struct Checkpoint {
    input: SegmentedString,
    // NOTE: absolute count of segments appended to the stream.
    segments_already_appended: usize,
}

/// Input of the background parser.
///
/// Every appended segment is logged, so the stream can be rewound to any
/// outstanding checkpoint and replay the input that arrived after it. The
/// log is trimmed once the consumer guarantees it will never rewind past a
/// checkpoint.
#[derive(Debug, Default)]
pub struct BackgroundInputStream {
    current: SegmentedString,
    segments: VecDeque<Arc<str>>,
    // NOTE: absolute index of `segments[0]`.
    first_segment_index: usize,
    checkpoints: VecDeque<Checkpoint>,
    // NOTE: absolute index of `checkpoints[0]`.
    first_valid_checkpoint: InputCheckpoint,
}

impl BackgroundInputStream {
    pub fn append(&mut self, text: impl Into<Arc<str>>) {
        let text = text.into();

        self.current.append(Arc::clone(&text));
        self.segments.push_back(text);
    }

    #[inline]
    pub fn close(&mut self) {
        self.current.close();
    }

    #[inline]
    pub fn current(&self) -> &SegmentedString {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut SegmentedString {
        &mut self.current
    }

    #[inline]
    fn next_checkpoint(&self) -> InputCheckpoint {
        self.first_valid_checkpoint + self.checkpoints.len()
    }

    #[inline]
    fn segments_appended(&self) -> usize {
        self.first_segment_index + self.segments.len()
    }

    pub fn create_checkpoint(&mut self) -> InputCheckpoint {
        let checkpoint = self.next_checkpoint();

        self.checkpoints.push_back(Checkpoint {
            input: self.current.clone(),
            segments_already_appended: self.segments_appended(),
        });

        checkpoint
    }

    /// Releases the checkpoints created before `new_first_valid` together with
    /// the logged segments that only they could replay.
    pub fn invalidate_checkpoints_before(&mut self, new_first_valid: InputCheckpoint) {
        debug_assert!(
            new_first_valid < self.next_checkpoint(),
            "Invalidating checkpoints before unknown checkpoint {new_first_valid}"
        );

        debug_assert!(
            new_first_valid >= self.first_valid_checkpoint,
            "Checkpoints must be invalidated monotonically: {new_first_valid} < {}",
            self.first_valid_checkpoint
        );

        let new_first_valid = new_first_valid.min(self.next_checkpoint());

        while self.first_valid_checkpoint < new_first_valid {
            self.checkpoints.pop_front();
            self.first_valid_checkpoint += 1;
        }

        let still_needed = self
            .checkpoints
            .front()
            .map_or(self.segments_appended(), |c| c.segments_already_appended);

        while self.first_segment_index < still_needed {
            self.segments.pop_front();
            self.first_segment_index += 1;
        }
    }

    /// Restores the input to `checkpoint`, replays the segments appended after
    /// it and puts `unparsed_input` in front. All checkpoints are invalidated.
    pub fn rewind_to(
        &mut self,
        checkpoint: InputCheckpoint,
        unparsed_input: &str,
    ) -> Result<(), CheckpointError> {
        if checkpoint >= self.next_checkpoint() {
            return Err(CheckpointError::Unknown { checkpoint });
        }

        if checkpoint < self.first_valid_checkpoint {
            return Err(CheckpointError::Invalidated {
                checkpoint,
                first_valid: self.first_valid_checkpoint,
            });
        }

        let Some(restored) = self
            .checkpoints
            .remove(checkpoint - self.first_valid_checkpoint)
        else {
            return Err(CheckpointError::Unknown { checkpoint });
        };

        let was_closed = self.current.is_closed();

        self.current = restored.input;

        let replay_from = restored.segments_already_appended - self.first_segment_index;

        for segment in self.segments.iter().skip(replay_from) {
            self.current.append(Arc::clone(segment));
        }

        if !unparsed_input.is_empty() {
            self.current.prepend(SegmentedString::new(unparsed_input));
        }

        if was_closed && !self.current.is_closed() {
            self.current.close();
        }

        // NOTE: the removed checkpoint still counts towards the next index.
        self.first_valid_checkpoint += self.checkpoints.len() + 1;
        self.checkpoints.clear();
        self.first_segment_index = self.segments_appended();
        self.segments.clear();

        Ok(())
    }

    /// Checkpoints created and not yet invalidated.
    #[inline]
    pub fn outstanding_checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    #[cfg(test)]
    fn retained_segment_count(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(input: &mut SegmentedString, count: usize) -> String {
        let mut out = String::new();

        for _ in 0..count {
            if let Some(ch) = input.current_char() {
                out.push(ch);
                input.advance();
            }
        }

        out
    }

    #[test]
    fn rewind_replays_segments_appended_after_checkpoint() {
        let mut stream = BackgroundInputStream::default();

        stream.append("<div>");
        assert_eq!(drain(stream.current_mut(), 3), "<di");

        let checkpoint = stream.create_checkpoint();

        assert_eq!(drain(stream.current_mut(), 2), "v>");
        stream.append("text");
        stream.append("</div>");
        drain(stream.current_mut(), 7);

        stream.rewind_to(checkpoint, "").unwrap();

        assert_eq!(stream.current().to_string(), "v>text</div>");
        assert_eq!(stream.outstanding_checkpoint_count(), 0);
    }

    #[test]
    fn rewind_prepends_unparsed_input_and_keeps_closed_state() {
        let mut stream = BackgroundInputStream::default();

        stream.append("abc");
        let checkpoint = stream.create_checkpoint();
        stream.append("def");
        stream.close();

        stream.rewind_to(checkpoint, "XY").unwrap();

        assert_eq!(stream.current().to_string(), "XYabcdef");
        assert!(stream.current().is_closed());
    }

    #[test]
    fn rewind_invalidates_all_checkpoints() {
        let mut stream = BackgroundInputStream::default();

        stream.append("a");
        let first = stream.create_checkpoint();
        let second = stream.create_checkpoint();

        stream.rewind_to(first, "").unwrap();

        assert_eq!(
            stream.rewind_to(second, ""),
            Err(CheckpointError::Invalidated {
                checkpoint: second,
                first_valid: 2
            })
        );
    }

    #[test]
    fn checkpoints_created_before_a_rewind_stay_invalid() {
        let mut stream = BackgroundInputStream::default();

        stream.append("abc");
        let stale = stream.create_checkpoint();
        stream.append("def");
        stream.create_checkpoint();

        stream.rewind_to(stale, "").unwrap();
        assert_eq!(drain(stream.current_mut(), 2), "ab");

        let fresh = stream.create_checkpoint();

        assert_ne!(stale, fresh);
        assert_eq!(
            stream.rewind_to(stale, ""),
            Err(CheckpointError::Invalidated {
                checkpoint: stale,
                first_valid: fresh
            })
        );

        stream.rewind_to(fresh, "").unwrap();
        assert_eq!(stream.current().to_string(), "cdef");
    }

    #[test]
    fn invalidation_releases_segments() {
        let mut stream = BackgroundInputStream::default();

        for chunk in ["a", "b", "c"] {
            stream.append(chunk);
            drain(stream.current_mut(), 1);
            stream.create_checkpoint();
        }

        stream.append("d");

        assert_eq!(stream.outstanding_checkpoint_count(), 3);
        assert_eq!(stream.retained_segment_count(), 4);

        stream.invalidate_checkpoints_before(2);

        assert_eq!(stream.outstanding_checkpoint_count(), 1);
        assert_eq!(stream.retained_segment_count(), 1);

        assert_eq!(
            stream.rewind_to(1, ""),
            Err(CheckpointError::Invalidated {
                checkpoint: 1,
                first_valid: 2
            })
        );
    }
}
