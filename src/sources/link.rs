use chrono::NaiveDate;
use reqwest::Url;

use crate::error::{ImportError, ImportResult};
use crate::helpers::time::format_changes_since;
use crate::utils::constants::CHANGES_SINCE_PARAM;

/// A link the server never populated means "no data".
pub fn is_missing(link: Option<&str>) -> bool {
    link.map_or(true, |l| l.trim().is_empty())
}

/// Base URL with a trailing slash so `join` appends instead of replacing the last segment.
pub fn normalize_base(base: &str) -> ImportResult<Url> {
    let mut raw = base.trim().to_owned();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ImportError::InvalidLink { link: base.to_owned(), reason: e.to_string() })
}

/// Server links may be absolute, host-absolute (`/api/...`) or relative to the API base.
pub fn resolve(base: &Url, link: &str) -> ImportResult<Url> {
    let link = link.trim();
    base.join(link)
        .map_err(|e| ImportError::InvalidLink { link: link.to_owned(), reason: e.to_string() })
}

/// Sets `changesSince=YYYY-MM-DD` on the URL.
///
/// An existing `changesSince` pair is replaced, so the parameter occurs exactly once
/// however often the filter is applied.
pub fn with_changes_since(mut url: Url, since: NaiveDate) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CHANGES_SINCE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(CHANGES_SINCE_PARAM, &format_changes_since(since));
    }
    url
}
