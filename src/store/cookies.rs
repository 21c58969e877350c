use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use super::{CredentialStore, StoredCookie};

/// Cookie jar for the HTTP client that writes every `Set-Cookie` through to
/// the credential store, so the refresh cookie outlives the process.
///
/// Domain, path and expiry matching is left to reqwest's [`Jar`]; stored
/// cookies are replayed into it on start-up.
pub struct PersistentCookieJar {
    jar: Jar,
    store: Arc<dyn CredentialStore>,
    cookies: Mutex<Vec<StoredCookie>>,
}

impl PersistentCookieJar {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let cookies = store.cookies();
        let jar = Jar::default();
        for cookie in &cookies {
            match Url::parse(&cookie.url) {
                Ok(url) => jar.add_cookie_str(&cookie.raw, &url),
                Err(e) => warn!(url = %cookie.url, error = %e, "skipping stored cookie"),
            }
        }
        debug!(count = cookies.len(), "cookie jar restored");

        Self {
            jar,
            store,
            cookies: Mutex::new(cookies),
        }
    }
}

fn cookie_name(raw: &str) -> &str {
    raw.split(';').next().and_then(|pair| pair.split('=').next()).unwrap_or_default().trim()
}

fn same_cookie(stored: &StoredCookie, name: &str, host: Option<&str>) -> bool {
    let stored_host = Url::parse(&stored.url).ok();
    cookie_name(&stored.raw) == name && stored_host.as_ref().and_then(Url::host_str) == host
}

impl CookieStore for PersistentCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();

        let snapshot = {
            let mut cookies = self.cookies.lock();
            for raw in headers.iter().filter_map(|h| h.to_str().ok()) {
                let name = cookie_name(raw);
                cookies.retain(|stored| !same_cookie(stored, name, url.host_str()));
                cookies.push(StoredCookie {
                    url: url.to_string(),
                    raw: raw.to_string(),
                });
            }
            cookies.clone()
        };

        let mut replay = headers.into_iter();
        self.jar.set_cookies(&mut replay, url);

        if let Err(e) = self.store.save_cookies(snapshot) {
            warn!(error = %e, "failed to persist cookies");
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}
