//! Per-frame performance counters.

use std::time::Duration;

/// Counters accumulated while a frame is being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    /// Vertices drawn from client memory.
    pub vertex_count: usize,
    /// Indices drawn from client memory.
    pub index_count: usize,
    /// Vertices drawn from buffer objects.
    pub vbo_vertex_count: usize,
    /// Indices drawn from buffer objects.
    pub vbo_index_count: usize,
    /// Draw calls issued.
    pub draw_calls: usize,
}

/// Statistics of the last completed frame.
///
/// Written exactly once per frame, by `end_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Counters of the last frame.
    pub counters: FrameCounters,
    /// Frames completed since the renderer was started.
    pub frames: u64,
    /// Time between `begin_frame` and `end_frame` of the last frame.
    pub frame_time: Duration,
}

impl ProfileInfo {
    pub(crate) fn record(&mut self, counters: FrameCounters, frame_time: Duration) {
        self.counters = counters;
        self.frames += 1;
        self.frame_time = frame_time;
    }

    /// Total vertices of the last frame, client and buffered.
    #[must_use]
    pub fn total_vertices(&self) -> usize {
        self.counters.vertex_count + self.counters.vbo_vertex_count
    }

    /// Total indices of the last frame, client and buffered.
    #[must_use]
    pub fn total_indices(&self) -> usize {
        self.counters.index_count + self.counters.vbo_index_count
    }
}
