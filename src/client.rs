//! Backend client for the three streaming endpoints.
//!
//! One `MenuClient` is built at startup and passed by reference to every
//! flow. It only opens streams; decoding happens in the flow that owns the
//! returned `HttpChunkStream`.

use serde::Deserialize;

use crate::ask::DishQuestion;
use crate::cart::OrderRequest;
use crate::config::Config;
use crate::error::ScanError;
use crate::image_check::MenuImage;
use crate::transport::HttpChunkStream;

pub const ANALYZE_MENU_PATH: &str = "/api/analyze-menu";
pub const GENERATE_ORDER_PATH: &str = "/api/generate-order";
pub const ASK_DISH_PATH: &str = "/api/ask-dish";

/// Error body of a non-2xx response: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MenuClient {
    http: reqwest::Client,
    base_url: String,
}

impl MenuClient {
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        log::info!("[HTTP] Backend: {}", config.base_url);
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a menu photo. The response streams `chunk` frames in the
    /// line micro-format.
    pub async fn analyze_menu(
        &self,
        image: &MenuImage,
        target_language: &str,
    ) -> Result<HttpChunkStream, ScanError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("targetLanguage", target_language.to_string());
        log::info!(
            "[HTTP] analyze-menu: {} bytes, targetLanguage={}",
            image.len(),
            target_language
        );
        let request = self.http.post(self.url(ANALYZE_MENU_PATH)).multipart(form);
        self.open_stream(request, ANALYZE_MENU_PATH).await
    }

    /// Request the two-part order script.
    pub async fn generate_order(&self, order: &OrderRequest) -> Result<HttpChunkStream, ScanError> {
        log::info!(
            "[HTTP] generate-order: {} items, lang={}, userLang={}",
            order.items.len(),
            order.lang,
            order.user_lang
        );
        let request = self.http.post(self.url(GENERATE_ORDER_PATH)).json(order);
        self.open_stream(request, GENERATE_ORDER_PATH).await
    }

    /// Ask a free-form question about one dish. Frames use the `text` field.
    pub async fn ask_dish(&self, question: &DishQuestion) -> Result<HttpChunkStream, ScanError> {
        log::info!(
            "[HTTP] ask-dish: {} ({} prior turns)",
            question.dish_name,
            question.conversation_history.len()
        );
        let request = self.http.post(self.url(ASK_DISH_PATH)).json(question);
        self.open_stream(request, ASK_DISH_PATH).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn open_stream(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<HttpChunkStream, ScanError> {
        let start = std::time::Instant::now();
        let response = request
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| {
                log::error!("[HTTP] {} request failed: {}", endpoint, e);
                ScanError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or(body);
            log::error!("[HTTP] {} returned {}: {}", endpoint, status, message);
            return Err(ScanError::Status {
                status: status.as_u16(),
                message,
            });
        }

        log::info!("[HTTP] {} TTFB: {}ms", endpoint, start.elapsed().as_millis());
        Ok(HttpChunkStream::new(response))
    }
}
