pub mod auth_handlers;
pub mod visitor_handlers;

use std::sync::Arc;

use crate::config::{chrono_duration, AppConfig};
use crate::services::{
    AuthService, Authenticator, BrowserProvider, Clock, CookieJar, PendingAuthStore,
    SessionStore, VisitorCacheService, VisitorScraper,
};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub session_store: Arc<SessionStore>,
    pub scraper: Arc<VisitorScraper>,
    pub auth_service: Arc<AuthService>,
    pub visitor_cache: Arc<VisitorCacheService>,
}

impl AppStateInner {
    /// Wires every service around one browser provider and one clock.
    pub fn new(config: AppConfig, provider: Arc<dyn BrowserProvider>, clock: Arc<dyn Clock>) -> Self {
        let credentials = config.require_vendor().ok();
        let jar = Arc::new(CookieJar::new(config.cookie_file.clone()));

        let authenticator = Arc::new(Authenticator::new(
            provider.clone(),
            jar,
            clock.clone(),
            config.nuveq_base_url.clone(),
            credentials,
            config.timeouts.clone(),
        ));

        let session_store = Arc::new(SessionStore::new(
            provider.clone(),
            authenticator.clone(),
            clock.clone(),
            chrono_duration(config.session_ttl),
            chrono_duration(config.session_buffer),
            config.retry.clone(),
        ));

        let pending = Arc::new(PendingAuthStore::new(
            clock.clone(),
            chrono_duration(config.pending_otp_ttl),
        ));

        let auth_service = Arc::new(AuthService::new(
            session_store.clone(),
            authenticator,
            pending,
        ));

        let scraper = Arc::new(VisitorScraper::new(
            provider,
            config.nuveq_base_url.clone(),
            config.timeouts.clone(),
        ));

        let visitor_cache = Arc::new(VisitorCacheService::new(config.visitor_cache_file.clone()));

        Self {
            config,
            clock,
            session_store,
            scraper,
            auth_service,
            visitor_cache,
        }
    }
}
