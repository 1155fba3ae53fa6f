//! Emoji to Twemoji asset resolution.
//!
//! Twemoji names each SVG after the hyphen-joined lowercase hex code points of
//! the emoji sequence. The emoji presentation selector (U+FE0F) is left out of
//! the file name unless the sequence also contains a zero-width joiner or a
//! keycap mark, in which case upstream keeps it.

/// Base path of the locally mirrored Twemoji assets.
pub const TWEMOJI_LOCAL_PATH: &str = "/twemoji";

const VARIATION_SELECTOR_16: char = '\u{FE0F}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';

/// Return the Twemoji code-point key for `emoji`.
///
/// `"😀"` gives `"1f600"`, `"☁️"` gives `"2601"` and `"1️⃣"` gives
/// `"31-fe0f-20e3"`. An empty input gives an empty key; callers treat that as
/// "no glyph available". Non-emoji text is encoded the same way, so `"abc"`
/// gives `"61-62-63"`.
pub fn emoji_to_code_point(emoji: &str) -> String {
    let keep_selector = emoji
        .chars()
        .any(|c| c == ZERO_WIDTH_JOINER || c == KEYCAP);

    emoji
        .chars()
        .filter(|&c| keep_selector || c != VARIATION_SELECTOR_16)
        .map(|c| format!("{:x}", u32::from(c)))
        .collect::<Vec<_>>()
        .join("-")
}

/// Asset path for `emoji` under [`TWEMOJI_LOCAL_PATH`].
pub fn twemoji_src(emoji: &str) -> String {
    twemoji_src_with_base(emoji, TWEMOJI_LOCAL_PATH)
}

/// Asset path for `emoji` under `base_path`, or an empty string when the emoji
/// does not resolve to a key.
pub fn twemoji_src_with_base(emoji: &str, base_path: &str) -> String {
    let code_point = emoji_to_code_point(emoji);
    if code_point.is_empty() {
        return String::new();
    }
    format!("{}/{}.svg", base_path.trim_end_matches('/'), code_point)
}
