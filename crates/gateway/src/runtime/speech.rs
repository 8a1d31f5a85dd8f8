//! `text-to-speech`: synthesize the reply and store it as a voice note.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use wv_domain::error::{Error, Result};
use wv_domain::tenant::{phone_number_id, SpeechOptions};
use wv_domain::trace::TraceEvent;
use wv_platform::ObjectUri;
use wv_providers::{effective_timeout, SynthesisRequest};

use crate::inbound::media_key;

use super::PipelineContext;

#[derive(Debug, Deserialize)]
pub struct SpeechInput {
    pub text: String,
    #[serde(default)]
    pub config: SpeechOptions,
    pub wa_phone_number_arn: String,
    /// Names the output file. A fresh id is used when absent.
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOutput {
    pub bucket_name: String,
    pub key: String,
}

pub async fn synthesize_speech(
    ctx: &PipelineContext,
    input: SpeechInput,
    deadline: Instant,
) -> Result<SpeechOutput> {
    if input.text.trim().is_empty() {
        return Err(Error::Input("text is empty".into()));
    }
    let mut options = input.config;
    options.apply_defaults(&ctx.settings.tenant_defaults);

    let ext = options.file_extension().ok_or_else(|| {
        Error::Input(format!("unsupported output format '{}'", options.output_format))
    })?;
    let request_id = input
        .request_id
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let uri = ObjectUri::new(
        ctx.settings.media_bucket.clone(),
        media_key(
            phone_number_id(&input.wa_phone_number_arn),
            "audio_out",
            &format!("{request_id}.{ext}"),
        ),
    );

    let remaining = deadline.saturating_duration_since(Instant::now());
    let timeout = effective_timeout(options.request_timeout, remaining)?;

    let audio = ctx
        .synthesizer
        .synthesize(
            &SynthesisRequest {
                text: &input.text,
                options: &options,
            },
            timeout,
        )
        .await?;
    ctx.objects.put(&uri, &audio).await?;

    ctx.sink.record(TraceEvent::SpeechSynthesized {
        bucket: uri.bucket.clone(),
        key: uri.key.clone(),
        bytes: audio.len(),
        timeout_ms: timeout.as_millis() as u64,
    });
    Ok(SpeechOutput {
        bucket_name: uri.bucket,
        key: uri.key,
    })
}
