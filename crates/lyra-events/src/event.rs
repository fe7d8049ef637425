use crate::{AbrEvent, PipelineEvent};

/// Unified event, one variant per subsystem.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Abr(AbrEvent),
    Pipeline(PipelineEvent),
}

impl From<AbrEvent> for Event {
    fn from(e: AbrEvent) -> Self {
        Self::Abr(e)
    }
}

impl From<PipelineEvent> for Event {
    fn from(e: PipelineEvent) -> Self {
        Self::Pipeline(e)
    }
}
