use std::fmt;
use std::time::Duration;

use driftnet_core::DeviceProfile;

use crate::decode::decode_html;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub page_load_timeout: Duration,
    pub desktop_user_agent: String,
    pub mobile_user_agent: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(30),
            desktop_user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
            mobile_user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                 AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148"
                .to_string(),
        }
    }
}

impl RenderSettings {
    fn user_agent(&self, profile: DeviceProfile) -> &str {
        match profile {
            DeviceProfile::Desktop => &self.desktop_user_agent,
            DeviceProfile::Mobile => &self.mobile_user_agent,
        }
    }
}

/// A fully loaded page: the URL the fetch ended up on after redirects,
/// and its markup decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub kind: RenderFailure,
    pub message: String,
}

impl RenderError {
    pub(crate) fn new(kind: RenderFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RenderError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::InvalidUrl => write!(f, "invalid url"),
            RenderFailure::HttpStatus(code) => write!(f, "http status {code}"),
            RenderFailure::Timeout => write!(f, "timeout"),
            RenderFailure::Network => write!(f, "network error"),
        }
    }
}

/// The page-rendering capability the pipeline consumes. `render` loads a
/// page under a device profile and reports where redirects landed;
/// `fetch_raw` pulls a document verbatim (used for feed XML, which must
/// not go through text decoding).
///
/// The shipped implementation is [`HttpRenderer`]. A headless-browser
/// renderer can be slotted in behind this trait without touching the
/// pipeline.
#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        url: &str,
        profile: DeviceProfile,
    ) -> Result<RenderedPage, RenderError>;

    async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, RenderError>;
}

/// Plain-HTTP renderer over reqwest. No cookie store is configured, so
/// every fetch starts with a clean session; redirects are followed and
/// the final URL is reported back.
#[derive(Debug, Clone, Default)]
pub struct HttpRenderer {
    settings: RenderSettings,
}

impl HttpRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, user_agent: &str) -> Result<reqwest::Client, RenderError> {
        reqwest::Client::builder()
            .timeout(self.settings.page_load_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| RenderError::new(RenderFailure::Network, err.to_string()))
    }

    async fn get(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<(String, Vec<u8>, Option<String>), RenderError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| RenderError::new(RenderFailure::InvalidUrl, err.to_string()))?;
        let client = self.build_client(user_agent)?;

        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::new(
                RenderFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok((final_url, bytes.to_vec(), content_type))
    }
}

#[async_trait::async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(
        &self,
        url: &str,
        profile: DeviceProfile,
    ) -> Result<RenderedPage, RenderError> {
        let user_agent = self.settings.user_agent(profile).to_string();
        let (final_url, bytes, content_type) = self.get(url, &user_agent).await?;
        let decoded = decode_html(&bytes, content_type.as_deref());
        Ok(RenderedPage {
            final_url,
            html: decoded.html,
        })
    }

    async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        let user_agent = self.settings.desktop_user_agent.clone();
        let (_, bytes, _) = self.get(url, &user_agent).await?;
        Ok(bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        return RenderError::new(RenderFailure::Timeout, err.to_string());
    }
    RenderError::new(RenderFailure::Network, err.to_string())
}
