// Minimal W3C WebDriver client over reqwest (chromedriver or any remote end).
use crate::model::ExtractionError;
use crate::scraper::traits::{Browser, BrowserSession, ElementId, Locator};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::info;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Deserialize)]
struct WdResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct WdError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

/// Unwraps the `{"value": ...}` envelope or turns an error reply into
/// `ExtractionError::WebDriver`.
fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ExtractionError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<WdResponse<WdError>>(body)
            .map(|r| format!("{}: {}", r.value.error, r.value.message))
            .unwrap_or_else(|_| body.to_string());
        return Err(ExtractionError::WebDriver { status, message });
    }
    serde_json::from_str::<WdResponse<T>>(body)
        .map(|r| r.value)
        .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))
}

async fn call<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ExtractionError> {
    let response = req.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    decode(status, &body)
}

pub struct WebDriverBrowser {
    client: Client,
    base_url: String,
    chrome_args: Vec<String>,
}

impl WebDriverBrowser {
    pub fn new(
        base_url: &str,
        chrome_args: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            chrome_args,
        })
    }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": self.chrome_args }
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        let url = format!("{}/session", self.base_url);
        let session: NewSession = call(self.client.post(&url).json(&self.capabilities())).await?;
        info!("WebDriver session {} started", session.session_id);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session.session_id),
            closed: false,
        }))
    }
}

pub struct WebDriverSession {
    client: Client,
    session_url: String,
    closed: bool,
}

impl WebDriverSession {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.session_url, path)
    }
}

#[async_trait::async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError> {
        call(self.client.post(self.url("url")).json(&json!({ "url": url }))).await
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementId>, ExtractionError> {
        let (using, value) = locator.strategy();
        let found: Vec<ElementRef> = call(
            self.client
                .post(self.url("elements"))
                .json(&json!({ "using": using, "value": value })),
        )
        .await?;
        Ok(found.into_iter().map(|e| ElementId(e.id)).collect())
    }

    async fn click(&mut self, element: &ElementId) -> Result<(), ExtractionError> {
        let path = format!("element/{}/click", element.0);
        call(self.client.post(self.url(&path)).json(&json!({}))).await
    }

    async fn enter_frame(&mut self, frame: Option<&ElementId>) -> Result<(), ExtractionError> {
        let id = match frame {
            Some(el) => json!({ ELEMENT_KEY: el.0 }),
            None => serde_json::Value::Null,
        };
        call(self.client.post(self.url("frame")).json(&json!({ "id": id }))).await
    }

    async fn source(&mut self) -> Result<String, ExtractionError> {
        call(self.client.get(self.url("source"))).await
    }

    async fn document_url(&mut self) -> Result<String, ExtractionError> {
        let script = json!({ "script": "return document.baseURI;", "args": [] });
        call(self.client.post(self.url("execute/sync")).json(&script)).await
    }

    async fn quit(&mut self) -> Result<(), ExtractionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        call::<serde_json::Value>(self.client.delete(&self.session_url)).await?;
        info!("WebDriver session closed");
        Ok(())
    }
}
