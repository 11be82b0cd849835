//! Linkcard
//!
//! Renders small PNG "link cards": a rounded panel with a page title, a
//! shortened description and a QR code pointing at the page, drawn in one
//! of a few named styles.
//!
//! # Pipeline
//!
//! - **Validation**: the URL is normalized and checked, the style id and
//!   optional overrides are verified ([`validate`]).
//! - **Metadata**: when an override is missing the page is fetched and
//!   scraped; failures degrade to placeholder text ([`metadata`]).
//! - **Rendering**: text fitting, QR placement and PNG encoding
//!   ([`rendering`]).
//!
//! # Example
//!
//! ```no_run
//! use linkcard::{CardConfig, CardGenerator, CardRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = CardGenerator::new(CardConfig::default())?;
//! let request = CardRequest::new("example.com", "white")
//!     .with_title("Hello")
//!     .with_description("World");
//! let card = generator.generate(&request)?;
//! std::fs::write("card.png", &card.png)?;
//! println!("{} ({}x{})", card.title, card.width, card.height);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod error;
pub use error::{Error, ErrorBody, ErrorCategory, Result};

pub mod fonts;
pub mod metadata;
pub mod qr;
pub mod rendering;
pub mod style;
pub mod validate;

// Async front-end over a pool of render threads
pub mod async_api;

pub use async_api::RenderPool;
pub use fonts::FontBook;
pub use metadata::{HttpMetadataResolver, MetadataResolver, PageInfo};
pub use qr::{QrCodeProvider, QrProvider};
pub use rendering::{CardRenderer, RenderedCard};
pub use style::{StyleDefinition, StyleRegistry};

use validate::{check_override, clamp_chars, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};

/// Bundled CJK font, relative to the working directory or the crate root.
pub const DEFAULT_FONT: &str = "assets/fonts/NotoSansCJKsc-Regular.otf";

/// Configuration for card generation
///
/// The defaults suit a server: a desktop user agent for page fetches, a
/// 10 second fetch timeout, the bundled CJK font plus system fonts, and one
/// render worker per CPU.
///
/// # Examples
///
/// ```
/// let cfg = linkcard::CardConfig::default();
/// assert_eq!(cfg.timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone)]
pub struct CardConfig {
    /// User agent string sent when fetching page metadata
    pub user_agent: String,
    /// Metadata fetch timeout in milliseconds
    pub timeout_ms: u64,
    /// Font files loaded at startup, in priority order
    pub font_paths: Vec<PathBuf>,
    /// Whether installed system fonts are used as fallbacks
    pub load_system_fonts: bool,
    /// Number of threads in a [`RenderPool`]
    pub render_workers: usize,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            timeout_ms: 10_000,
            font_paths: default_font_paths(),
            load_system_fonts: true,
            render_workers: num_cpus::get().max(1),
        }
    }
}

fn default_font_paths() -> Vec<PathBuf> {
    let local = PathBuf::from(DEFAULT_FONT);
    let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_FONT);
    if bundled == local {
        vec![local]
    } else {
        vec![local, bundled]
    }
}

/// A card request as received from a caller.
///
/// Absent fields deserialize to empty values so that [`CardRequest::validate`]
/// reports them as structured validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub custom_description: Option<String>,
}

impl CardRequest {
    pub fn new(url: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            style: style.into(),
            custom_title: None,
            custom_description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.custom_title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.custom_description = Some(description.into());
        self
    }

    /// Check every field without touching fonts or the network.
    pub fn validate(&self) -> Result<ValidRequest> {
        let (link, url) = validate::normalize_link(&self.url)?;
        if self.style.trim().is_empty() {
            return Err(Error::MissingStyle);
        }
        StyleRegistry::global().lookup(&self.style)?;
        let title = check_override(self.custom_title.as_deref(), "title", MAX_TITLE_CHARS)?;
        let description = check_override(
            self.custom_description.as_deref(),
            "description",
            MAX_DESCRIPTION_CHARS,
        )?;

        Ok(ValidRequest {
            link,
            url,
            style: self.style.clone(),
            title,
            description,
        })
    }
}

/// A request that passed [`CardRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    /// The link as the user gave it, with `https://` added when missing.
    /// This is what the QR code encodes.
    pub link: String,
    /// Parsed form of `link`, used for fetching
    pub url: Url,
    pub style: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Validates requests, resolves missing metadata and renders cards.
///
/// Holds only read-only state, so one generator can serve any number of
/// threads at once.
pub struct CardGenerator {
    renderer: CardRenderer,
    resolver: Box<dyn MetadataResolver>,
}

impl CardGenerator {
    /// Load fonts and build the HTTP metadata resolver.
    pub fn new(config: CardConfig) -> Result<Self> {
        let fonts = FontBook::load(&config.font_paths, config.load_system_fonts)?;
        let resolver = HttpMetadataResolver::new(&config)?;
        Ok(Self::from_parts(
            Arc::new(fonts),
            Arc::new(QrCodeProvider),
            Box::new(resolver),
        ))
    }

    pub fn from_parts(
        fonts: Arc<FontBook>,
        qr: Arc<dyn QrProvider>,
        resolver: Box<dyn MetadataResolver>,
    ) -> Self {
        Self {
            renderer: CardRenderer::new(fonts, qr),
            resolver,
        }
    }

    pub fn generate(&self, request: &CardRequest) -> Result<RenderedCard> {
        let valid = request.validate()?;

        let (title, description) = match (valid.title.clone(), valid.description.clone()) {
            (Some(title), Some(description)) => (title, description),
            (title, description) => {
                debug!("Resolving metadata for {}", valid.url);
                let info = self.resolver.resolve(&valid.url);
                (
                    title.unwrap_or_else(|| clamp_chars(&info.title, MAX_TITLE_CHARS)),
                    description
                        .unwrap_or_else(|| clamp_chars(&info.description, MAX_DESCRIPTION_CHARS)),
                )
            }
        };

        self.renderer.render(&valid, &title, &description)
    }
}
