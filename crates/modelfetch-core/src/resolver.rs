//! Manual redirect resolution
//!
//! The hosting API answers every valid download request with a redirect
//! whose `Location` header carries the real CDN URL and, in an opaque query
//! parameter, the filename. Automatic redirect following must stay disabled
//! on the client so those headers can be inspected before they would be
//! followed transparently; following the redirect blindly loses the
//! filename.

use crate::error::FetchError;
use modelfetch_types::ResolvedTarget;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

/// Statuses the API is allowed to redirect with. Anything else that is not
/// a 404 violates the download contract.
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Resolves a download URL to its final CDN location and filename.
pub struct RedirectResolver {
    client: Client,
}

impl RedirectResolver {
    /// The client must have automatic redirects disabled.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve `url` to the real asset location.
    ///
    /// Returns the resolved target together with the already-opened response
    /// for the final URL: the request that discovers the filename is
    /// immediately followed by the request that supplies the body and its
    /// `Content-Length`, and the second response is handed to the stream
    /// writer as-is.
    pub async fn resolve(
        &self,
        url: &str,
        token: &str,
    ) -> Result<(ResolvedTarget, Response), FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let response = self.client.get(parsed).bearer_auth(token).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !REDIRECT_STATUSES.contains(&status.as_u16()) {
            return Err(FetchError::NoRedirect {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::MalformedRedirect(format!("missing Location header from {url}"))
            })?;

        let filename = filename_from_location(&location)?;
        debug!("Resolved {} -> {} ({})", url, location, filename);

        let body = self.client.get(&location).bearer_auth(token).send().await?;
        let total_size = body.content_length();

        Ok((
            ResolvedTarget {
                final_url: location,
                filename,
                total_size,
            },
            body,
        ))
    }
}

/// Extract the download filename from a redirect `Location` URL.
///
/// The CDN encodes it in the `response-content-disposition` query parameter
/// as `filename="..."`; when that is absent the last path segment of the
/// URL is used instead.
fn filename_from_location(location: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(location)
        .map_err(|_| FetchError::MalformedRedirect(format!("unparsable Location: {location}")))?;

    let disposition = parsed
        .query_pairs()
        .find(|(key, _)| key == "response-content-disposition")
        .map(|(_, value)| value.into_owned());

    if let Some(disposition) = disposition {
        if let Some(raw) = disposition.split("filename=").nth(1) {
            let name = urlencoding::decode(raw.trim_matches('"'))
                .map_err(|_| {
                    FetchError::MalformedRedirect(format!(
                        "undecodable filename in {disposition}"
                    ))
                })?
                .trim_matches('"')
                .to_string();
            return validated(name, location);
        }
    }

    let fallback = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("")
        .to_string();
    validated(fallback, location)
}

/// A usable filename is non-empty and names a file, not a path.
fn validated(name: String, location: &str) -> Result<String, FetchError> {
    if name.is_empty() {
        return Err(FetchError::MalformedRedirect(format!(
            "no filename in {location}"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FetchError::MalformedRedirect(format!(
            "filename contains path separators: {name}"
        )));
    }
    Ok(name)
}
