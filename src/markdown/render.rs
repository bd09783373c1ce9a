use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Shown when a recipe image fails to load
pub const PLACEHOLDER_IMAGE: &str = "/recipe-placeholder.jpg";

const DEFAULT_ALT: &str = "Recipe image";

/// Render recipe markdown to HTML.
///
/// Images are wrapped in a block span and carry a placeholder fallback,
/// links open in a new tab, and raw HTML coming from the backend is shown as
/// text rather than injected.
pub fn render_markdown_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = rewrite_events(Parser::new_ext(markdown, options));
    let mut html_buf = String::new();
    html::push_html(&mut html_buf, events.into_iter());
    html_buf
}

/// An image being collected: destination plus the alt text seen so far
struct PendingImage {
    src: String,
    alt: String,
}

fn rewrite_events<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut image: Option<PendingImage> = None;

    for event in parser {
        if let Some(pending) = image.as_mut() {
            match event {
                Event::End(TagEnd::Image) => {
                    if let Some(done) = image.take() {
                        if !done.src.is_empty() {
                            events.push(Event::Html(CowStr::from(image_html(&done))));
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => pending.alt.push_str(&text),
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                image = Some(PendingImage {
                    src: dest_url.into_string(),
                    alt: String::new(),
                });
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) => {
                events.push(Event::Html(CowStr::from(link_open_html(&dest_url, &title))));
            }
            Event::End(TagEnd::Link) => events.push(Event::Html(CowStr::Borrowed("</a>"))),
            Event::Start(Tag::List(None)) => {
                events.push(Event::Html(CowStr::Borrowed("<ul class=\"recipe-list\">\n")))
            }
            Event::End(TagEnd::List(false)) => {
                events.push(Event::Html(CowStr::Borrowed("</ul>\n")))
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    events
}

fn image_html(image: &PendingImage) -> String {
    let alt = if image.alt.trim().is_empty() {
        DEFAULT_ALT
    } else {
        image.alt.trim()
    };
    format!(
        "<span class=\"recipe-image\"><img src=\"{}\" alt=\"{}\" data-fallback=\"{}\" loading=\"lazy\" /></span>",
        encode_double_quoted_attribute(&image.src),
        encode_double_quoted_attribute(alt),
        PLACEHOLDER_IMAGE,
    )
}

fn link_open_html(dest_url: &str, title: &str) -> String {
    let href = if dest_url.is_empty() { "#" } else { dest_url };
    let mut tag = format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"",
        encode_double_quoted_attribute(href)
    );
    if !title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
    }
    tag.push('>');
    tag
}

/// Escape plain text for HTML bodies
pub(crate) fn escape_text(text: &str) -> String {
    encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_gets_wrapper_and_fallback() {
        let html = render_markdown_html("![成品](https://example.com/a.jpg)");
        assert!(html.contains("<span class=\"recipe-image\">"));
        assert!(html.contains("src=\"https://example.com/a.jpg\""));
        assert!(html.contains("alt=\"成品\""));
        assert!(html.contains("data-fallback=\"/recipe-placeholder.jpg\""));
    }

    #[test]
    fn test_image_without_alt_gets_default() {
        let html = render_markdown_html("![](https://example.com/a.jpg)");
        assert!(html.contains("alt=\"Recipe image\""));
    }

    #[test]
    fn test_links_open_in_new_tab() {
        let html = render_markdown_html("参考 [原文](https://github.com/Anduin2017/HowToCook)");
        assert!(html.contains(
            "<a href=\"https://github.com/Anduin2017/HowToCook\" target=\"_blank\" rel=\"noopener noreferrer\">原文</a>"
        ));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown_html("注意 <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_bullet_list_class() {
        let html = render_markdown_html("- 乌梅\n- 山楂");
        assert!(html.contains("<ul class=\"recipe-list\">"));
        assert!(html.contains("<li>乌梅</li>"));
    }

    #[test]
    fn test_empty_markdown() {
        assert_eq!(render_markdown_html(""), "");
    }
}
