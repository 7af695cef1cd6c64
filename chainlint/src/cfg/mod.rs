//! Control-flow segments for one function body.
//!
//! The walker slices each function body into segments (maximal straight-line
//! instruction runs) while it traverses, announcing lifecycle events to the
//! rules: a segment starts with the ids of its predecessors, ends when the
//! walk moves past it, and is never revisited. Loop back-edges are not
//! re-announced; a rule that joins over predecessors therefore reads whatever
//! state a predecessor had when the successor started, which for loop headers
//! means the pre-loop state. Flow-sensitive rules compensate for that with
//! lexical loop detection.
//!
//! # Design Principles
//!
//! - **One code path per function**: never cross function boundaries
//! - **Segments are append-only**: state for an ended segment stays readable
//! - **No fixpoint**: one pass in program order, matching the walk

use smallvec::SmallVec;

/// Identifier of a control-flow segment, unique within one file walk.
pub type SegmentId = usize;

/// Predecessor list; nearly always 1 or 2 entries.
pub type Predecessors = SmallVec<[SegmentId; 2]>;

/// A breakable construct (loop or switch) currently being walked: collects
/// the segments that `break` out of it so the exit segment can list them as
/// predecessors.
#[derive(Debug, Default)]
pub struct BreakFrame {
    /// Segments that ended in a `break` targeting this construct.
    pub breaks: Predecessors,
}

/// Per-function code-path state owned by the walker.
///
/// Tracks the segment currently being filled and the stack of enclosing
/// breakable constructs. Nested functions get their own `CodePath`; the
/// enclosing one resumes untouched when the nested walk completes.
#[derive(Debug)]
pub struct CodePath {
    current: SegmentId,
    frames: Vec<BreakFrame>,
}

impl CodePath {
    /// Opens a code path whose entry segment is `entry`.
    #[must_use]
    pub fn new(entry: SegmentId) -> Self {
        Self {
            current: entry,
            frames: Vec::new(),
        }
    }

    /// The segment statements are currently appended to.
    #[must_use]
    pub fn current(&self) -> SegmentId {
        self.current
    }

    /// Moves the walk into `segment`.
    pub fn set_current(&mut self, segment: SegmentId) {
        self.current = segment;
    }

    /// Enters a breakable construct.
    pub fn push_frame(&mut self) {
        self.frames.push(BreakFrame::default());
    }

    /// Leaves a breakable construct, yielding the break-exit segments it
    /// collected.
    pub fn pop_frame(&mut self) -> Predecessors {
        self.frames.pop().map(|f| f.breaks).unwrap_or_default()
    }

    /// Records that the current segment ends in a `break`. A `break` outside
    /// any breakable construct is left to the parser's error recovery; it is
    /// simply not recorded.
    pub fn record_break(&mut self) {
        let current = self.current;
        if let Some(frame) = self.frames.last_mut() {
            frame.breaks.push(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_frames_collect_in_nesting_order() {
        let mut path = CodePath::new(0);
        path.push_frame();
        path.set_current(3);
        path.record_break();
        path.push_frame();
        path.set_current(5);
        path.record_break();
        let inner = path.pop_frame();
        assert_eq!(inner.as_slice(), &[5]);
        let outer = path.pop_frame();
        assert_eq!(outer.as_slice(), &[3]);
        assert!(path.pop_frame().is_empty());
    }

    #[test]
    fn break_outside_frame_is_ignored() {
        let mut path = CodePath::new(0);
        path.record_break();
        assert!(path.pop_frame().is_empty());
    }
}
