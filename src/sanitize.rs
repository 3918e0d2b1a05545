/*
 *  sanitize.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Strip markup payloads from display text
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static JS_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").unwrap());
static EVENT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").unwrap());

/// Strip script blocks, `javascript:` schemes and inline `onX=` handlers
/// from text headed for a render slot.
pub fn sanitize(text: &str) -> String {
    let out = SCRIPT_BLOCK.replace_all(text, "");
    let out = JS_SCHEME.replace_all(&out, "");
    let out = EVENT_ATTR.replace_all(&out, "");
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes() {
        assert_eq!(sanitize("  Switched to Ocean theme "), "Switched to Ocean theme");
        assert_eq!(sanitize("Partly Cloudy"), "Partly Cloudy");
    }

    #[test]
    fn strips_markup_payloads() {
        assert_eq!(sanitize("Rain<script>alert(1)</script>"), "Rain");
        assert_eq!(sanitize("<SCRIPT type=x>\nx()\n</SCRIPT >Fog"), "Fog");
        assert_eq!(sanitize("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize("<img onerror = boom>"), "<img  boom>");
    }

    #[test]
    fn words_starting_with_on_survive() {
        assert_eq!(sanitize("Ontario online"), "Ontario online");
    }
}
