//! Public proxy-URL assembly.
//!
//! Proxy URLs indirect to object-store keys, decoupling public links from
//! the storage provider. Keys keep their `/` separators; everything else
//! that is not URL-safe (including non-ASCII translated titles) is
//! percent-encoded.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters percent-encoded inside key path segments. Non-ASCII bytes are
/// always encoded.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'{')
    .add(b'}');

/// Path-safe rendering of a storage key (slashes preserved).
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

/// Stable proxy URL for a stored object, e.g.
/// `https://host/video/videos/2025/08/ab_t/Title_video_ko.mp4`.
pub fn proxy_url(public_base_url: &str, category: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        public_base_url.trim_end_matches('/'),
        category,
        encode_key(key)
    )
}
