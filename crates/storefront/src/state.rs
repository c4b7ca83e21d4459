//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Repositories;
use crate::services::email::EmailService;
use crate::services::media::{MediaService, MediaStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories, media storage and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repos: Repositories,
    media: Arc<dyn MediaStore>,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `repos` - Repository handles (`PostgreSQL` in production)
    /// * `media` - Where uploaded product images are written
    /// * `email` - SMTP mailer, if configured
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        repos: Repositories,
        media: Arc<dyn MediaStore>,
        email: Option<EmailService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                media,
                email,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Media service writing to the configured store.
    #[must_use]
    pub fn media(&self) -> MediaService<'_> {
        MediaService::new(
            self.inner.media.as_ref(),
            &self.inner.config.media.public_url,
        )
    }

    /// Get the mailer, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
