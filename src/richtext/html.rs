//! Structured text to HTML
//!
//! The output is trusted markup: the CMS is the only author of these blocks
//! and nothing here sanitizes them beyond escaping the raw text.

use super::{BlockKind, RichTextBlock, Span, SpanKind};
use crate::helpers::html_escape;

/// Serialize a block list to HTML.
///
/// Consecutive list items are grouped into a single `<ul>` or `<ol>`.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OListItem => Some("ol"),
            _ => None,
        };

        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        html.push_str(&render_block(block));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn render_block(block: &RichTextBlock) -> String {
    let inline = || render_inline(block.text.as_deref().unwrap_or(""), &block.spans);

    match block.kind {
        BlockKind::Heading1 => format!("<h1>{}</h1>", inline()),
        BlockKind::Heading2 => format!("<h2>{}</h2>", inline()),
        BlockKind::Heading3 => format!("<h3>{}</h3>", inline()),
        BlockKind::Heading4 => format!("<h4>{}</h4>", inline()),
        BlockKind::Heading5 => format!("<h5>{}</h5>", inline()),
        BlockKind::Heading6 => format!("<h6>{}</h6>", inline()),
        BlockKind::Paragraph => format!("<p>{}</p>", inline()),
        BlockKind::Preformatted => format!("<pre>{}</pre>", inline()),
        BlockKind::ListItem | BlockKind::OListItem => format!("<li>{}</li>", inline()),
        BlockKind::Image => format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            html_escape(block.url.as_deref().unwrap_or("")),
            html_escape(block.alt.as_deref().unwrap_or(""))
        ),
        BlockKind::Embed => match &block.oembed {
            Some(embed) => format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                html_escape(embed.embed_url.as_deref().unwrap_or("")),
                html_escape(embed.kind.as_deref().unwrap_or("")),
                html_escape(embed.provider_name.as_deref().unwrap_or("")),
                embed.html.as_deref().unwrap_or("")
            ),
            None => String::new(),
        },
        BlockKind::Unknown => {
            tracing::debug!("Skipping unsupported rich text block");
            String::new()
        }
    }
}

/// Render text with its spans. Overlapping spans that cross each other are
/// closed and re-opened at every boundary so the markup stays well nested.
fn render_inline(text: &str, spans: &[Span]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    // outermost first
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut bounds = vec![0, len];
    for span in &spans {
        bounds.push(span.start);
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::new();
    let mut stack: Vec<usize> = Vec::new();

    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<usize> = (0..spans.len())
            .filter(|&i| spans[i].start <= from && spans[i].end.min(len) >= to)
            .collect();

        let keep = stack
            .iter()
            .zip(&active)
            .take_while(|(open, wanted)| open == wanted)
            .count();
        for i in stack.drain(keep..).rev() {
            out.push_str(close_tag(spans[i]));
        }
        for &i in &active[keep..] {
            out.push_str(&open_tag(spans[i]));
            stack.push(i);
        }

        out.push_str(&escape_text(&String::from_utf16_lossy(&units[from..to])));
    }

    for i in stack.drain(..).rev() {
        out.push_str(close_tag(spans[i]));
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let href = span.data.as_ref().map(link_href).unwrap_or_default();
            let blank = span
                .data
                .as_ref()
                .and_then(|d| d.get("target"))
                .and_then(|t| t.as_str())
                == Some("_blank");
            if blank {
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener">"#,
                    html_escape(&href)
                )
            } else {
                format!(r#"<a href="{}">"#, html_escape(&href))
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|l| l.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}

/// Resolve a hyperlink span target. Links to other documents point at
/// their post page.
fn link_href(data: &serde_json::Value) -> String {
    if let Some(url) = data.get("url").and_then(|u| u.as_str()) {
        return url.to_string();
    }
    match data.get("uid").and_then(|u| u.as_str()) {
        Some(uid) => crate::helpers::post_path(uid),
        None => String::new(),
    }
}

fn escape_text(text: &str) -> String {
    html_escape(text).replace('\n', "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span {
            start,
            end,
            kind,
            data: None,
        }
    }

    fn block(kind: BlockKind, text: &str) -> RichTextBlock {
        RichTextBlock {
            kind,
            ..RichTextBlock::paragraph(text)
        }
    }

    #[test]
    fn test_paragraph_and_heading() {
        let blocks = vec![
            block(BlockKind::Heading2, "Title"),
            RichTextBlock::paragraph("Body text"),
        ];
        assert_eq!(as_html(&blocks), "<h2>Title</h2><p>Body text</p>");
    }

    #[test]
    fn test_text_is_escaped_and_newlines_break() {
        let blocks = vec![RichTextBlock::paragraph("a < b\nc & d")];
        assert_eq!(as_html(&blocks), "<p>a &lt; b<br />c &amp; d</p>");
    }

    #[test]
    fn test_list_grouping() {
        let blocks = vec![
            block(BlockKind::ListItem, "a"),
            block(BlockKind::ListItem, "b"),
            block(BlockKind::OListItem, "c"),
            RichTextBlock::paragraph("d"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_nested_spans() {
        let mut b = RichTextBlock::paragraph("bold and italic");
        b.spans = vec![span(0, 15, SpanKind::Strong), span(9, 15, SpanKind::Em)];
        assert_eq!(
            as_html(&[b]),
            "<p><strong>bold and <em>italic</em></strong></p>"
        );
    }

    #[test]
    fn test_crossing_spans_stay_well_nested() {
        let mut b = RichTextBlock::paragraph("abcdef");
        b.spans = vec![span(0, 4, SpanKind::Strong), span(2, 6, SpanKind::Em)];
        assert_eq!(
            as_html(&[b]),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_hyperlink_span() {
        let mut b = RichTextBlock::paragraph("see docs");
        b.spans = vec![Span {
            start: 4,
            end: 8,
            kind: SpanKind::Hyperlink,
            data: Some(json!({"link_type": "Web", "url": "https://example.com", "target": "_blank"})),
        }];
        assert_eq!(
            as_html(&[b]),
            r#"<p>see <a href="https://example.com" target="_blank" rel="noopener">docs</a></p>"#
        );
    }

    #[test]
    fn test_document_link_resolves_to_post() {
        let mut b = RichTextBlock::paragraph("next");
        b.spans = vec![Span {
            start: 0,
            end: 4,
            kind: SpanKind::Hyperlink,
            data: Some(json!({"link_type": "Document", "uid": "other-post"})),
        }];
        assert_eq!(
            as_html(&[b]),
            r#"<p><a href="/post/other-post/">next</a></p>"#
        );
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        // the emoji takes two UTF-16 units
        let mut b = RichTextBlock::paragraph("🚀 go");
        b.spans = vec![span(3, 5, SpanKind::Em)];
        assert_eq!(as_html(&[b]), "<p>🚀 <em>go</em></p>");
    }

    #[test]
    fn test_out_of_range_spans_are_clamped() {
        let mut b = RichTextBlock::paragraph("abc");
        b.spans = vec![span(1, 10, SpanKind::Strong), span(5, 8, SpanKind::Em)];
        assert_eq!(as_html(&[b]), "<p>a<strong>bc</strong></p>");
    }

    #[test]
    fn test_image_and_unknown_blocks() {
        let image = RichTextBlock {
            kind: BlockKind::Image,
            text: None,
            spans: Vec::new(),
            url: Some("https://images.example.com/a.png".to_string()),
            alt: Some("A \"quoted\" alt".to_string()),
            oembed: None,
        };
        let unknown = block(BlockKind::Unknown, "ignored");
        assert_eq!(
            as_html(&[image, unknown]),
            r#"<p class="block-img"><img src="https://images.example.com/a.png" alt="A &quot;quoted&quot; alt" /></p>"#
        );
    }

    #[test]
    fn test_embed_html_is_trusted() {
        let embed = RichTextBlock {
            kind: BlockKind::Embed,
            text: None,
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: Some(crate::richtext::Embed {
                kind: Some("video".to_string()),
                embed_url: Some("https://youtu.be/x".to_string()),
                provider_name: Some("YouTube".to_string()),
                html: Some("<iframe src=\"https://youtube.com/embed/x\"></iframe>".to_string()),
            }),
        };
        assert_eq!(
            as_html(&[embed]),
            r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube"><iframe src="https://youtube.com/embed/x"></iframe></div>"#
        );
    }
}
