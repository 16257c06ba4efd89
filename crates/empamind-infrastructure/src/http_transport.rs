//! HttpChatTransport - REST client for the EmpaMind chat API.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST /chat` send a text message
//! - `POST /chat/voice` send a base64 voice message
//! - `GET /chat/{chatId}` load history
//! - `GET /chats` list conversations
//! - `PUT /chat/{chatId}` rename
//! - `DELETE /chat/{chatId}` delete

use crate::audio_codec::{decode_audio, encode_audio};
use async_trait::async_trait;
use empamind_core::auth::AuthSession;
use empamind_core::conversation::{
    AudioClip, AudioFormat, ChatSummary, Message, Sentiment, deserialize_lenient_sentiment,
};
use empamind_core::transport::{ChatTransport, TextReply, TransportMode, VoiceReply, VoiceRequest};
use empamind_core::{EmpaMindError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const VOICE_TIMEOUT_MESSAGE: &str =
    "Request timed out. Voice processing may take longer. Please try again.";
const REQUEST_FAILED_MESSAGE: &str = "Request failed";

/// Synthesized replies are MP3.
const RESPONSE_AUDIO_FORMAT: AudioFormat = AudioFormat::Mp3;

/// Distinguishes voice calls, which get a longer deadline and their own
/// timeout message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Standard,
    Voice,
}

/// Transport implementation that talks to the chat backend over HTTPS.
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    base_url: String,
    auth: Arc<dyn AuthSession>,
    request_timeout: Duration,
    voice_timeout: Duration,
}

impl HttpChatTransport {
    /// Creates a transport for `base_url` (trailing slashes are ignored).
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn AuthSession>,
        request_timeout: Duration,
        voice_timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            auth,
            request_timeout,
            voice_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn chat_url(&self, chat_id: &str) -> Result<String> {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return Err(EmpaMindError::validation("chatId is required"));
        }
        Ok(self.url(&format!("/chat/{chat_id}")))
    }

    /// Attaches the deadline and, when available, the bearer credential.
    async fn prepare(&self, builder: RequestBuilder, kind: CallKind) -> RequestBuilder {
        let timeout = match kind {
            CallKind::Standard => self.request_timeout,
            CallKind::Voice => self.voice_timeout,
        };
        let builder = builder
            .timeout(timeout)
            .header("content-type", "application/json");

        match self.auth.bearer_token().await {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Sends the request and maps transport and status failures.
    async fn send(&self, builder: RequestBuilder, kind: CallKind) -> Result<reqwest::Response> {
        let response = self
            .prepare(builder, kind)
            .await
            .send()
            .await
            .map_err(|err| map_send_error(&err, kind))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = map_http_error(status, &body);
        tracing::warn!("[HttpChatTransport] {} -> {}", status, err);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        kind: CallKind,
    ) -> Result<T> {
        let response = self.send(builder, kind).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| map_send_error(&err, kind))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Remote
    }

    async fn send_text(
        &self,
        message: &str,
        chat_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<TextReply> {
        let body = SendMessageRequest {
            message,
            chat_id: non_empty(chat_id),
            title: non_empty(title),
        };
        tracing::debug!(
            "[HttpChatTransport] POST /chat (chat_id={:?})",
            body.chat_id
        );

        let parsed: SendMessageResponse = self
            .send_json(self.client.post(self.url("/chat")).json(&body), CallKind::Standard)
            .await?;

        Ok(TextReply {
            chat_id: parsed.chat_id,
            message: parsed.message,
            sentiment: parsed.sentiment,
        })
    }

    async fn send_voice(&self, request: VoiceRequest<'_>) -> Result<VoiceReply> {
        if request.audio.is_empty() {
            return Err(EmpaMindError::validation("Audio is required"));
        }

        let body = SendVoiceRequest {
            audio: encode_audio(request.audio),
            audio_format: request.audio_format.as_str(),
            response_format: request.response_format.as_str(),
            chat_id: non_empty(request.chat_id),
            title: non_empty(request.title),
        };
        tracing::debug!(
            "[HttpChatTransport] POST /chat/voice ({} bytes, format={}, response={})",
            request.audio.len(),
            body.audio_format,
            body.response_format
        );

        let parsed: SendVoiceResponse = self
            .send_json(
                self.client.post(self.url("/chat/voice")).json(&body),
                CallKind::Voice,
            )
            .await?;

        let audio = reply_audio(parsed.audio.as_deref());

        Ok(VoiceReply {
            chat_id: parsed.chat_id,
            transcript: parsed.transcript,
            response: parsed.response,
            sentiment: parsed.sentiment,
            audio,
        })
    }

    async fn get_history(&self, chat_id: &str) -> Result<Vec<Message>> {
        let url = self.chat_url(chat_id)?;
        let parsed: HistoryResponse = self
            .send_json(self.client.get(url), CallKind::Standard)
            .await?;
        Ok(parsed.messages)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let parsed: ListChatsResponse = self
            .send_json(self.client.get(self.url("/chats")), CallKind::Standard)
            .await?;
        Ok(parsed.chats)
    }

    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<()> {
        let url = self.chat_url(chat_id)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(EmpaMindError::validation("title is required to update chat"));
        }

        self.send(
            self.client.put(url).json(&RenameRequest { title }),
            CallKind::Standard,
        )
        .await?;
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let url = self.chat_url(chat_id)?;
        self.send(self.client.delete(url), CallKind::Standard).await?;
        Ok(())
    }
}

/// Decodes the synthesized reply audio. A broken attachment is logged and
/// dropped; it never fails the reply.
fn reply_audio(payload: Option<&str>) -> Option<AudioClip> {
    let payload = payload?;
    match decode_audio(payload, RESPONSE_AUDIO_FORMAT) {
        Ok(clip) => {
            tracing::debug!("[HttpChatTransport] Decoded reply audio: {} bytes", clip.len());
            Some(clip)
        }
        Err(err) => {
            tracing::warn!("[HttpChatTransport] Dropping reply audio: {}", err);
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn map_send_error(err: &reqwest::Error, kind: CallKind) -> EmpaMindError {
    tracing::warn!("[HttpChatTransport] Request did not complete: {}", err);
    if err.is_timeout() && kind == CallKind::Voice {
        return EmpaMindError::timeout(VOICE_TIMEOUT_MESSAGE);
    }
    if err.is_decode() {
        return EmpaMindError::decode("HTTP body", err.to_string());
    }
    EmpaMindError::network(NETWORK_ERROR_MESSAGE)
}

/// Extracts the backend's `message` (or `error`) field from a failure body.
fn map_http_error(status: StatusCode, body: &str) -> EmpaMindError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .message
                .filter(|m| !m.trim().is_empty())
                .or(parsed.error.filter(|e| !e.trim().is_empty()))
        })
        .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string());

    EmpaMindError::request(Some(status.as_u16()), message)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendVoiceRequest<'a> {
    audio: String,
    audio_format: &'a str,
    response_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    message: String,
    #[serde(default, deserialize_with = "deserialize_lenient_sentiment")]
    sentiment: Option<Sentiment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendVoiceResponse {
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    response: String,
    #[serde(default, deserialize_with = "deserialize_lenient_sentiment")]
    sentiment: Option<Sentiment>,
    #[serde(default)]
    audio: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ListChatsResponse {
    #[serde(default)]
    chats: Vec<ChatSummary>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}
