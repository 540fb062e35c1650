//! Generation endpoints (multipart uploads).
//!
//! Both endpoints share one flow: validate the request, reject unknown models
//! before touching disk, check the upload is a Standard MIDI File, then
//! allocate a save directory, store `input.mid` and hand off to the
//! controller.

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;
use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use cadenza_controller::{ControllerError, GenerationResult, SaveDirectory};
use cadenza_pipeline::{validate_performance, GenerationRequest, PipelineError, INPUT_FILE};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

/// Content types accepted for the `midi` part.
pub const ALLOWED_MIDI_TYPES: [&str; 4] = ["audio/midi", "audio/x-midi", "application/x-midi", "application/octet-stream"];

const MIDI_FIELD: &str = "midi";
const META_FIELD: &str = "meta";

/// Collected multipart parts: the upload plus every text field.
#[derive(Debug, Default)]
struct Form {
    midi: Option<Bytes>,
    fields: HashMap<String, String>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Form::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == MIDI_FIELD {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !ALLOWED_MIDI_TYPES.contains(&content_type.as_str()) {
                    return Err(ApiError::BadRequest(format!(
                        "Unsupported content type '{}' for '{}'; expected one of {}",
                        content_type,
                        MIDI_FIELD,
                        ALLOWED_MIDI_TYPES.join(", ")
                    )));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", MIDI_FIELD, e)))?;
                form.midi = Some(data);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn take_midi(&mut self) -> ApiResult<Bytes> {
        self.midi
            .take()
            .ok_or_else(|| ApiError::BadRequest(format!("Missing '{}' file part", MIDI_FIELD)))
    }

    fn required(&self, name: &str) -> ApiResult<&str> {
        self.fields.get(name).map(String::as_str).ok_or_else(|| ApiError::ValidationError {
            field: name.to_string(),
            message: "field is required".to_string(),
        })
    }

    fn parsed_or<T: FromStr>(&self, name: &str, default: T) -> ApiResult<T>
    where
        T::Err: std::fmt::Display,
    {
        match self.fields.get(name).map(|v| v.trim()) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ApiError::ValidationError {
                field: name.to_string(),
                message: format!("'{}': {}", raw, e),
            }),
        }
    }
}

/// Parse a comma-separated program list such as `"0, 33"`.
fn parse_programs(raw: &str) -> ApiResult<Vec<u8>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>().map_err(|e| ApiError::ValidationError {
                field: "program".to_string(),
                message: format!("'{}': {}", s, e),
            })
        })
        .collect()
}

fn validation_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::InvalidRequest { field, reason } => ApiError::ValidationError {
            field: field.to_string(),
            message: reason,
        },
        other => ApiError::BadRequest(other.to_string()),
    }
}

/// `POST /generate` - `midi` file part plus a `meta` JSON request.
pub async fn generate(State(state): State<ApiState>, multipart: Multipart) -> ApiResult<Json<GenerationResult>> {
    let mut form = Form::read(multipart).await?;
    let midi = form.take_midi()?;

    let meta = form.required(META_FIELD)?;
    let request: GenerationRequest = serde_json::from_str(meta).map_err(|e| ApiError::ValidationError {
        field: META_FIELD.to_string(),
        message: e.to_string(),
    })?;

    run_generation(&state, request, midi).await.map(Json)
}

/// `POST /pre_train_generate` - flat form for pretrained continuation.
pub async fn pre_train_generate(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> ApiResult<Json<GenerationResult>> {
    let mut form = Form::read(multipart).await?;
    let midi = form.take_midi()?;

    let mut request = GenerationRequest::new(
        form.required("model_type")?.trim(),
        parse_programs(form.fields.get("program").map(String::as_str).unwrap_or("0"))?,
        form.parsed_or("tempo", 120u32)?,
    );
    request.temperature = form.parsed_or("temperature", request.temperature)?;
    request.p = form.parsed_or("p", request.p)?;

    run_generation(&state, request, midi).await.map(Json)
}

async fn run_generation(state: &ApiState, request: GenerationRequest, midi: Bytes) -> ApiResult<GenerationResult> {
    request.validate().map_err(validation_error)?;

    let model_type = request.model_type.clone();
    if !state.controller.has_model(&model_type) {
        return Err(ControllerError::UnknownModel { model: model_type }.into());
    }

    let summary =
        validate_performance(&midi).map_err(|e| ApiError::BadRequest(format!("Upload is not a valid MIDI file: {}", e)))?;

    let save = SaveDirectory::allocate(&state.config.save_root);
    info!(
        request_id = %save.request_id,
        model = %model_type,
        task = %request.task,
        tracks = summary.tracks,
        notes = summary.notes,
        "Generation request accepted"
    );

    tokio::fs::create_dir_all(&save.path)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to create save directory: {}", e)))?;
    let source = save.path.join(INPUT_FILE);
    tokio::fs::write(&source, &midi)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {}", e)))?;

    let result = state
        .controller
        .generate(model_type, source, request, save.path.clone())
        .await;

    match &result {
        Ok(r) => info!(request_id = %save.request_id, output = %r.output_file.display(), "Generation complete"),
        Err(e) => warn!(request_id = %save.request_id, kind = e.kind(), "Generation failed"),
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programs() {
        assert_eq!(parse_programs("0").unwrap(), vec![0]);
        assert_eq!(parse_programs(" 0, 33 ,65").unwrap(), vec![0, 33, 65]);
        assert!(parse_programs("0,piano").is_err());
        assert!(parse_programs("300").is_err());
    }

    #[test]
    fn test_validation_error_keeps_field() {
        let err = validation_error(PipelineError::InvalidRequest {
            field: "tempo",
            reason: "must be positive".into(),
        });
        assert!(matches!(err, ApiError::ValidationError { field, .. } if field == "tempo"));
    }
}
