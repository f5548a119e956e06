use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};

/// CSS class given to images embedded in a post body.
pub const POST_IMAGE_CLASS: &str = "post-image";

fn escape_byte(byte: u8) -> Option<&'static str> {
    match byte {
        b'>' => Some("&gt;"),
        b'<' => Some("&lt;"),
        b'&' => Some("&amp;"),
        b'\'' => Some("&#39;"),
        b'"' => Some("&quot;"),
        _ => None,
    }
}

fn escape(string: &mut String) {
    let mut i = 0;
    while let Some(byte) = string.as_bytes().get(i).copied() {
        if let Some(replacement) = escape_byte(byte) {
            string.replace_range(i..=i, replacement);
            i += replacement.len();
        } else {
            i += 1;
        }
    }
}

pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Turns raw HTML into text, so it is escaped when rendered.
fn escape_raw_html<'e, I>(iter: I) -> impl Iterator<Item = Event<'e>>
where
    I: Iterator<Item = Event<'e>>,
{
    iter.map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        event => event,
    })
}

fn custom_render_images<'e, I>(iter: I, class: &'e str) -> impl Iterator<Item = Event<'e>>
where
    I: Iterator<Item = Event<'e>>,
{
    struct ImageBlock<'a> {
        dest_url: CowStr<'a>,
        alt_text: String,
    }

    fn image_tag_html(
        class: &str,
        ImageBlock {
            dest_url,
            mut alt_text,
        }: ImageBlock,
    ) -> String {
        let mut dest_url = dest_url.into_string();
        escape(&mut dest_url);
        escape(&mut alt_text);

        format!(r#"<img class="{class}" src="{dest_url}" alt="{alt_text}">"#)
    }

    let mut current_image_block = None;

    iter.filter_map(move |event| match (event, &mut current_image_block) {
        (
            Event::Start(Tag::Image {
                link_type: _,
                dest_url,
                title: _,
                id: _,
            }),
            None,
        ) => {
            current_image_block = Some(ImageBlock {
                dest_url,
                alt_text: String::new(),
            });
            None
        }
        (Event::Text(text) | Event::Code(text), Some(ImageBlock { alt_text, .. })) => {
            alt_text.push_str(&text);
            None
        }
        (Event::End(TagEnd::Image), Some(_)) => current_image_block
            .take()
            .map(|image_block| Event::Html(image_tag_html(class, image_block).into())),
        (_, Some(_)) => None,
        (event, None) => Some(event),
    })
}

pub fn render_md_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let events = custom_render_images(escape_raw_html(parser), POST_IMAGE_CLASS);

    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events);

    html
}

#[cfg(test)]
mod test {
    use super::{escape, render_md_to_html};

    #[test]
    fn test_escape() {
        let mut actual = r#"abc<>'"&123"#.to_string();
        escape(&mut actual);
        assert_eq!(actual, "abc&lt;&gt;&#39;&quot;&amp;123");
    }

    #[test]
    fn test_paragraphs_and_emphasis() {
        let html = render_md_to_html("Hi **bold** _italic_\n\nSecond paragraph");
        assert_eq!(
            html,
            "<p>Hi <strong>bold</strong> <em>italic</em></p>\n<p>Second paragraph</p>\n"
        );
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_md_to_html("before <script>alert(1)</script> after");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_images_get_class() {
        let html = render_md_to_html("![Tom & Jerry](/media/cat.png)");
        assert_eq!(
            html,
            "<p><img class=\"post-image\" src=\"/media/cat.png\" alt=\"Tom &amp; Jerry\"></p>\n"
        );
    }

    #[test]
    fn test_tables() {
        let html = render_md_to_html("| a | b |\n| - | - |\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }
}
