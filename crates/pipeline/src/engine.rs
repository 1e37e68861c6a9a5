//! Workflow engine: runs the Voice workflow (`capture -> wake_gate -> asr ->
//! normalize(asr_output) -> intent -> handler -> normalize(tts_input) -> tts
//! -> audio_out`) and the Text workflow (`ingest -> normalize(command_input)
//! -> intent -> handler -> render`) over a `RequestContext`.
//!
//! Each stage either completes (and marks its own timestamp), short-circuits
//! with a final `Response` (unresolved intent, a handler-issued early
//! reply), or fails with a typed `vox_core::Error` that the caller maps to a
//! user-visible response and logs. Cancellation is checked at every stage
//! boundary; on cancellation the engine returns `Err(Error::Cancelled)` and
//! never publishes a partial response. Grounded on the source material's
//! `VoicePipeline::process_audio` for the overall "one stage feeds the
//! next, short-circuit on a terminal outcome" shape, generalized from one
//! hardwired voice state machine to a declarative two-workflow engine.

use crate::event::PipelineEvent;
use crate::handler::HandlerRegistry;
use crate::session::SessionStore;
use crate::stage::Stage;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use vox_config::settings::{ComponentsConfig, StageTimeouts};
use vox_coordinators::{AsrCoordinator, AudioCoordinator, TtsCoordinator};
use vox_core::request::{InputSource, RequestContext};
use vox_core::traits::TranscribeOptions;
use vox_core::{AudioFrame, Error, Response, Result};
use vox_intents::DonationStore;
use vox_text::{Stage as TextStage, TextProcessor};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct PipelineEngine {
    asr: AsrCoordinator,
    tts: TtsCoordinator,
    audio: AudioCoordinator,
    text: Arc<TextProcessor>,
    donations: Arc<DonationStore>,
    handlers: Arc<HandlerRegistry>,
    sessions: Arc<SessionStore>,
    timeouts: StageTimeouts,
    components: ComponentsConfig,
    events: broadcast::Sender<PipelineEvent>,
}

impl PipelineEngine {
    pub fn new(
        asr: AsrCoordinator,
        tts: TtsCoordinator,
        audio: AudioCoordinator,
        text: Arc<TextProcessor>,
        donations: Arc<DonationStore>,
        handlers: Arc<HandlerRegistry>,
        sessions: Arc<SessionStore>,
        timeouts: StageTimeouts,
        components: ComponentsConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            asr,
            tts,
            audio,
            text,
            donations,
            handlers,
            sessions,
            timeouts,
            components,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PipelineEvent) {
        let _ = self.events.send(event);
    }

    /// Voice workflow. `audio` is the already wake-gated and endpointed
    /// utterance; `vox-wakeword`/the transport layer own the `capture` and
    /// `wake_gate` stages proper, so this method only timestamps them before
    /// handing off to ASR.
    pub async fn run_voice(
        &self,
        source: InputSource,
        language: &str,
        session_id: Option<String>,
        audio: AudioFrame,
    ) -> Result<Response> {
        let mut ctx = RequestContext::new(source, language);
        if let Some(session_id) = session_id {
            ctx = ctx.with_session(session_id);
        }

        let result = self.run_voice_inner(&mut ctx, audio).await;
        self.publish(&ctx, &result);
        result
    }

    async fn run_voice_inner(&self, ctx: &mut RequestContext, audio: AudioFrame) -> Result<Response> {
        ctx.mark_stage(Stage::Capture.as_str());
        if self.cancelled(ctx) {
            return Err(Error::Cancelled);
        }

        ctx.mark_stage(Stage::WakeGate.as_str());
        self.check_cancelled(ctx, Stage::WakeGate)?;

        let transcript = self
            .with_timeout(
                "asr",
                self.timeouts.asr_ms,
                self.asr.transcribe(
                    &audio,
                    &TranscribeOptions {
                        language: Some(ctx.language.clone()),
                        enhance: false,
                        strict_streaming: false,
                    },
                    None,
                ),
            )
            .await?;
        ctx.mark_stage(Stage::Asr.as_str());
        self.check_cancelled(ctx, Stage::Asr)?;
        self.emit(PipelineEvent::FinalTranscript {
            request_id: ctx.request_id.clone(),
            text: transcript.clone(),
        });

        let normalized = self.text.normalize(&transcript, TextStage::AsrOutput)?;
        ctx.final_text = Some(normalized.clone());
        ctx.mark_stage(Stage::NormalizeAsrOutput.as_str());
        self.check_cancelled(ctx, Stage::NormalizeAsrOutput)?;

        if let Some(response) = self.match_intent(ctx, &normalized).await? {
            return Ok(response);
        }

        let response = self.dispatch_handler(ctx).await?;
        ctx.mark_stage(Stage::Handler.as_str());
        self.check_cancelled(ctx, Stage::Handler)?;

        if !self.components.tts {
            return Ok(response);
        }

        let tts_input = self.text.normalize(&response.text, TextStage::TtsInput)?;
        ctx.mark_stage(Stage::NormalizeTtsInput.as_str());
        self.check_cancelled(ctx, Stage::NormalizeTtsInput)?;

        let synthesized = self
            .with_timeout("tts", self.timeouts.tts_ms, self.tts.synthesize(&tts_input, None, None))
            .await?;
        ctx.mark_stage(Stage::Tts.as_str());
        self.check_cancelled(ctx, Stage::Tts)?;

        if self.components.audio_out {
            let chunk = stream::once(async move { synthesized });
            self.audio.play_stream(Box::pin(chunk), &serde_json::Value::Null, None).await?;
        }
        ctx.mark_stage(Stage::AudioOut.as_str());

        Ok(response)
    }

    /// Text workflow: `ingest -> normalize(command_input) -> intent ->
    /// handler -> render`.
    pub async fn run_text(
        &self,
        source: InputSource,
        language: &str,
        session_id: Option<String>,
        text: &str,
    ) -> Result<Response> {
        let mut ctx = RequestContext::new(source, language);
        if let Some(session_id) = session_id {
            ctx = ctx.with_session(session_id);
        }

        let result = self.run_text_inner(&mut ctx, text).await;
        self.publish(&ctx, &result);
        result
    }

    async fn run_text_inner(&self, ctx: &mut RequestContext, text: &str) -> Result<Response> {
        ctx.mark_stage(Stage::Ingest.as_str());
        self.check_cancelled(ctx, Stage::Ingest)?;

        let normalized = self.text.normalize(text, TextStage::CommandInput)?;
        ctx.final_text = Some(normalized.clone());
        ctx.mark_stage(Stage::NormalizeCommandInput.as_str());
        self.check_cancelled(ctx, Stage::NormalizeCommandInput)?;

        if let Some(response) = self.match_intent(ctx, &normalized).await? {
            return Ok(response);
        }

        let response = self.dispatch_handler(ctx).await?;
        ctx.mark_stage(Stage::Handler.as_str());
        self.check_cancelled(ctx, Stage::Handler)?;

        ctx.mark_stage(Stage::Render.as_str());
        Ok(response)
    }

    /// Shared `intent` stage. Returns `Ok(Some(response))` only when the
    /// intent system is disabled or unresolved and the workflow should
    /// short-circuit without ever reaching the handler stage.
    async fn match_intent(&self, ctx: &mut RequestContext, normalized: &str) -> Result<Option<Response>> {
        if !self.components.intent_system {
            return Ok(Some(Response::not_understood()));
        }
        let Some(matcher) = self.donations.matcher(&ctx.language) else {
            return Ok(Some(Response::not_understood()));
        };
        match matcher.match_utterance(normalized) {
            Ok(intent) => {
                ctx.intent = intent;
                ctx.mark_stage(Stage::Intent.as_str());
                self.check_cancelled(ctx, Stage::Intent)?;
                Ok(None)
            }
            Err(Error::IntentUnresolved) => {
                ctx.mark_stage(Stage::Intent.as_str());
                Ok(Some(Response::not_understood()))
            }
            Err(err) => Err(err),
        }
    }

    async fn dispatch_handler(&self, ctx: &RequestContext) -> Result<Response> {
        let handler_name = ctx.intent.handler.clone().ok_or(Error::IntentUnresolved)?;
        let method = ctx.intent.method.clone().ok_or(Error::IntentUnresolved)?;
        let locale = ctx.language.clone();
        let session_id = ctx.session_id.clone().unwrap_or_else(|| ctx.request_id.clone());
        let session_lock = self.sessions.get_or_create(&session_id, &locale);
        let mut session = session_lock.lock().await;
        self.handlers
            .dispatch(
                &handler_name,
                &method,
                &ctx.intent.slots,
                &mut session,
                Duration::from_millis(self.timeouts.handler_ms),
            )
            .await
    }

    /// Wraps a stage's future in its configured deadline, mapping a timeout
    /// into `Error::StageTimeout` rather than letting a stuck provider call
    /// hang the request indefinitely.
    async fn with_timeout<T>(&self, stage: &'static str, ms: u64, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(Duration::from_millis(ms), fut).await {
            Ok(result) => result,
            Err(_elapsed) => Err(Error::StageTimeout {
                stage: stage.to_string(),
                elapsed_ms: ms,
            }),
        }
    }

    fn cancelled(&self, ctx: &RequestContext) -> bool {
        ctx.is_cancelled()
    }

    fn check_cancelled(&self, ctx: &RequestContext, stage: Stage) -> Result<()> {
        if ctx.is_cancelled() {
            self.emit(PipelineEvent::Cancelled {
                request_id: ctx.request_id.clone(),
            });
            return Err(Error::Cancelled);
        }
        self.emit(PipelineEvent::StageCompleted {
            request_id: ctx.request_id.clone(),
            stage,
        });
        Ok(())
    }

    fn publish(&self, ctx: &RequestContext, result: &Result<Response>) {
        match result {
            Ok(response) => self.emit(PipelineEvent::Completed {
                request_id: ctx.request_id.clone(),
                response: response.clone(),
            }),
            Err(Error::Cancelled) => {}
            Err(err) => self.emit(PipelineEvent::Failed {
                request_id: ctx.request_id.clone(),
                message: err.to_string(),
            }),
        }
    }
}
