//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Path of the fingerprinted stylesheet, or the plain one when the build
/// script could not hash it.
///
/// Usage in templates: `{{ ""|css_url }}`
#[askama::filter_fn]
pub fn css_url(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_url("/static/css", "main", "css", env!("CSS_HASH")))
}

/// Path of the fingerprinted script.
///
/// Usage in templates: `{{ ""|js_url }}`
#[askama::filter_fn]
pub fn js_url(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_url("/static/js", "app", "js", env!("JS_HASH")))
}

fn asset_url(dir: &str, stem: &str, ext: &str, hash: &str) -> String {
    if hash.is_empty() {
        format!("{dir}/{stem}.{ext}")
    } else {
        format!("{dir}/derived/{stem}.{hash}.{ext}")
    }
}
