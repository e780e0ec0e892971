//! Public URL composition.
//!
//! Returned URLs are built from the scheme and host the request arrived
//! with, not from a configured base URL. Behind a reverse proxy, enable
//! `trust_proxy` so `X-Forwarded-Proto` and `X-Forwarded-Host` win.
//!
//! The origin is resolved and validated before an upload is staged, so a
//! request that cannot be answered with a URL never reaches the store.

use axum::http::{header, HeaderMap, Uri};
use url::Url;

use crate::error::DepotError;
use crate::naming::StoredName;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

/// Scheme and host a request was addressed to, as a validated base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    base: Url,
}

impl RequestOrigin {
    /// Resolve the origin of a request.
    ///
    /// Host comes from the `Host` header, then the URI authority. Scheme comes
    /// from the URI, defaulting to `http`. Fails with
    /// [`DepotError::InvalidHost`] unless the pair forms a bare
    /// `http(s)://host[:port]` URL.
    pub fn resolve(headers: &HeaderMap, uri: &Uri, trust_proxy: bool) -> Result<Self, DepotError> {
        let forwarded = |name: &str| {
            trust_proxy
                .then(|| first_value(headers, name))
                .flatten()
        };

        let scheme = forwarded(FORWARDED_PROTO)
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = forwarded(FORWARDED_HOST)
            .or_else(|| first_value(headers, header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .ok_or_else(|| DepotError::InvalidHost {
                host: String::new(),
            })?;

        Self::from_parts(&scheme.to_ascii_lowercase(), &host)
    }

    /// Build an origin from an explicit scheme and host.
    pub fn from_parts(scheme: &str, host: &str) -> Result<Self, DepotError> {
        let invalid = || DepotError::InvalidHost {
            host: host.to_string(),
        };

        if !matches!(scheme, "http" | "https") {
            return Err(invalid());
        }

        let base = Url::parse(&format!("{}://{}", scheme, host)).map_err(|_| invalid())?;
        // Anything beyond host and port means the header smuggled in a path or credentials
        let bare = base.host().is_some()
            && base.path() == "/"
            && base.query().is_none()
            && base.fragment().is_none()
            && base.username().is_empty()
            && base.password().is_none();
        if !bare {
            return Err(invalid());
        }

        Ok(Self { base })
    }

    pub fn scheme(&self) -> &str {
        self.base.scheme()
    }

    /// Host with the port, if one was given and is not the scheme default.
    pub fn host(&self) -> String {
        match (self.base.host_str(), self.base.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }

    /// Absolute URL of `name` under `route`.
    pub fn public_url(&self, route: &str, name: &StoredName) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("{}/{}", route.trim_end_matches('/'), name));
        url
    }
}

fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
