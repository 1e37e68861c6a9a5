//! Pipeline event fan-out: a `broadcast` channel subscribers (the WS surface,
//! logging) can observe without sitting on the request's own response path.
//! Grounded on the source material's `VoicePipeline` broadcasting a
//! `PipelineEvent` per state change; narrowed here to the events a generic
//! workflow engine (rather than one hardwired voice state machine) produces.

use crate::stage::Stage;
use vox_core::Response;

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageCompleted {
        request_id: String,
        stage: Stage,
    },
    PartialTranscript {
        request_id: String,
        text: String,
    },
    FinalTranscript {
        request_id: String,
        text: String,
    },
    Completed {
        request_id: String,
        response: Response,
    },
    Cancelled {
        request_id: String,
    },
    Failed {
        request_id: String,
        message: String,
    },
}
