use std::sync::Arc;

use crate::config::Config;
use crate::pdf::PdfRasterizer;
use crate::platform::Platform;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub platform: Platform,
    /// First-page preview renderer. MuPDF in production.
    pub pdf: Arc<dyn PdfRasterizer>,
    pub config: Config,
}
