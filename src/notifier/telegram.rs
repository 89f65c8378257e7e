// src/notifier/telegram.rs

use crate::errors::TransportError;
use crate::notifier::{ChatTransport, MapImage};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API client posting into one chat.
pub struct TelegramBot {
    api_base: String,
    api_key: String,
    chat_id: String,
    client: Client,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramBot {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chat_id: chat_id.into(),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.api_key, method)
    }

    fn check(resp: Response) -> Result<(), TransportError> {
        let status = resp.status();
        let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(api) if api.ok => Ok(()),
            Ok(api) => Err(TransportError::Rejected(
                api.description.unwrap_or_else(|| format!("HTTP {status}")),
            )),
            Err(_) => Err(TransportError::Api {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

impl ChatTransport for TelegramBot {
    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()?;

        Self::check(resp)
    }

    fn send_photo(&self, image: &MapImage, caption: &str) -> Result<(), TransportError> {
        let file_name = match image.content_type.subtype().as_str() {
            "png" => "map.png",
            _ => "map.jpg",
        };

        let photo = Part::bytes(image.bytes.clone())
            .file_name(file_name)
            .mime_str(image.content_type.as_ref())?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", photo);

        let resp = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()?;

        Self::check(resp)
    }
}
