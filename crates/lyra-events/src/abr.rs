/// Events emitted once per bitrate decision.
#[derive(Clone, Debug, PartialEq)]
pub enum AbrEvent {
    /// A bitrate was chosen for a segment.
    Decision {
        segment_index: usize,
        bitrate_kbps: u32,
        predicted_kbps: f64,
        buffer_secs: f64,
    },
    /// The chosen bitrate differs from the previous segment's.
    Switched {
        segment_index: usize,
        from_kbps: u32,
        to_kbps: u32,
    },
}
