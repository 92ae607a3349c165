pub mod http;
pub mod keyword;
pub mod retry;

pub use http::HttpClassifier;
pub use keyword::KeywordClassifier;
pub use retry::RetryConfig;

use anyhow::{Context, Result};
use emoquest_core::config::{ClassifierConfig, ClassifierProvider};
use emoquest_core::EmotionClassifier;
use std::sync::Arc;

/// Build the classifier backend selected in config.
pub fn from_config(config: &ClassifierConfig) -> Result<Arc<dyn EmotionClassifier>> {
    match config.provider {
        ClassifierProvider::Keyword => {
            tracing::info!("Using offline keyword classifier");
            Ok(Arc::new(KeywordClassifier::new()))
        }
        ClassifierProvider::Http => {
            let classifier = HttpClassifier::from_config(config)
                .context("Failed to build HTTP classifier")?;
            tracing::info!("Using HTTP classifier at {}", classifier.endpoint());
            Ok(Arc::new(classifier))
        }
    }
}
