//! SVG placeholder images.

use axum::{
    extract::{Path, Query},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

const MAX_DIMENSION: u32 = 2000;
const DEFAULT_DIMENSION: u32 = 300;
const DEFAULT_BG: &str = "#e5e7eb";
const DEFAULT_FG: &str = "#6b7280";

/// `?text&bg&fg` of the placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceholderQuery {
    pub text: Option<String>,
    pub bg: Option<String>,
    pub fg: Option<String>,
}

fn dimension(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .unwrap_or(DEFAULT_DIMENSION)
        .clamp(1, MAX_DIMENSION)
}

/// Accepts `#rgb`-style hex colors and plain color names only.
fn color<'a>(raw: Option<&'a str>, default: &'a str) -> &'a str {
    match raw.map(str::trim) {
        Some(c) if c.starts_with('#')
            && (4..=9).contains(&c.len())
            && c[1..].chars().all(|ch| ch.is_ascii_hexdigit()) => c,
        Some(c) if !c.is_empty() && c.len() <= 20 && c.chars().all(|ch| ch.is_ascii_alphabetic()) => c,
        _ => default,
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the placeholder SVG.
pub fn placeholder_svg(width: u32, height: u32, text: &str, bg: &str, fg: &str) -> String {
    let font_size = (width / 10).clamp(12, 24);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <rect width="100%" height="100%" fill="{bg}"/>
  <g fill="{fg}" font-family="Arial, Helvetica, sans-serif" font-size="{font_size}" text-anchor="middle">
    <text x="50%" y="50%" dominant-baseline="middle">{text}</text>
  </g>
</svg>"#,
        w = width,
        h = height,
        bg = bg,
        fg = fg,
        font_size = font_size,
        text = xml_escape(text),
    )
}

/// GET /api/placeholder/:width/:height - SVG placeholder image.
pub async fn placeholder(
    Path((width, height)): Path<(String, String)>,
    Query(query): Query<PlaceholderQuery>,
) -> impl IntoResponse {
    let text = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("No Image");
    let svg = placeholder_svg(
        dimension(&width),
        dimension(&height),
        text,
        color(query.bg.as_deref(), DEFAULT_BG),
        color(query.fg.as_deref(), DEFAULT_FG),
    );
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_clamped() {
        assert_eq!(dimension("0"), 1);
        assert_eq!(dimension("5000"), 2000);
        assert_eq!(dimension("abc"), 300);
        assert_eq!(dimension("640"), 640);
    }

    #[test]
    fn test_color_validation() {
        assert_eq!(color(Some("#fff"), DEFAULT_BG), "#fff");
        assert_eq!(color(Some("red"), DEFAULT_BG), "red");
        assert_eq!(color(Some("\"/><script>"), DEFAULT_BG), DEFAULT_BG);
        assert_eq!(color(None, DEFAULT_FG), DEFAULT_FG);
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = placeholder_svg(100, 100, "<b>&", DEFAULT_BG, DEFAULT_FG);
        assert!(svg.contains("&lt;b&gt;&amp;"));
        assert!(svg.contains(r#"font-size="12""#));
    }
}
