pub mod codec;
pub mod import;

pub use codec::{decode_token, encode_bundle};
pub use import::ImportPreview;

use crate::model::Settings;

const PREVIEW_PAGE: &str = "preview.html";
const LEGACY_ROUTE: &str = "bundle/";

/// `<origin><base path>preview.html#/<token>`
pub fn share_link(settings: &Settings, token: &str) -> String {
    format!(
        "{}{}{PREVIEW_PAGE}#/{token}",
        settings.share_origin.trim_end_matches('/'),
        settings.share_base_path
    )
}

/// Pulls the token out of a bare token, a current preview link, or a legacy
/// `index.html#/bundle/<base64>` link.
pub fn extract_token(input: &str) -> &str {
    let input = input.trim();
    let fragment = match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None => return input,
    };
    let fragment = fragment.trim_start_matches('/');
    fragment.strip_prefix(LEGACY_ROUTE).unwrap_or(fragment)
}
