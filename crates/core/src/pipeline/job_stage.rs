use std::fmt;

/// Where a transcode job is in its lifecycle.
///
/// Stages only move forward; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStage {
    Created,
    Demuxing,
    Decoding,
    EffectProcessing,
    Encoding,
    Muxing,
    Completed,
    Failed,
}

impl JobStage {
    pub fn name(self) -> &'static str {
        match self {
            JobStage::Created => "created",
            JobStage::Demuxing => "demux",
            JobStage::Decoding => "decode",
            JobStage::EffectProcessing => "effects",
            JobStage::Encoding => "encode",
            JobStage::Muxing => "mux",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
