use url::Url;

use crate::error::IngestError;

/// Parse a user-supplied catalog API base URL.
///
/// Accepts `http` and `https` URLs with a host. The path is normalized to end
/// in `/` so endpoint names can be appended as path segments.
pub fn parse_catalog_url(input: &str) -> Result<Url, IngestError> {
    let trimmed = input.trim();
    let mut url = Url::parse(trimmed).map_err(|source| IngestError::InvalidCatalogUrl {
        input: input.to_string(),
        message: format!("invalid URL: {source}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(IngestError::InvalidCatalogUrl {
            input: input.to_string(),
            message: format!("expected an http or https URL, found '{}'", url.scheme()),
        });
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(IngestError::InvalidCatalogUrl {
            input: input.to_string(),
            message: "URL is missing a host".to_string(),
        });
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(IngestError::InvalidCatalogUrl {
            input: input.to_string(),
            message: "expected a base URL without query or fragment".to_string(),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
