#![forbid(unsafe_code)]

//! Event bus shared by the ABR engine and the playback pipeline.

mod abr;
mod bus;
mod event;
mod pipeline;

pub use abr::AbrEvent;
pub use bus::EventBus;
pub use event::Event;
pub use pipeline::PipelineEvent;
