//! HTML rendering for babelwiki pages.
//!
//! Expands the generator's `[[wiki style link]]` tokens into navigable
//! anchors, converts markdown to HTML, and wraps everything in the fixed
//! page shell. The double-bracket convention is part of the contract with
//! the generation prompts — keep them in sync.

use std::sync::LazyLock;

use pulldown_cmark::{Parser, html};
use regex::{Captures, Regex};

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid wiki link regex"));

/// Convert a keyword to its URL path (`Grand Library` → `/Grand_Library`).
pub fn keyword_to_href(keyword: &str) -> String {
    format!("/{}", keyword.replace(' ', "_"))
}

/// Replace `[[Page Name]]` tokens with HTML anchors.
pub fn expand_wiki_links(markdown: &str) -> String {
    WIKI_LINK_RE
        .replace_all(markdown, |caps: &Captures<'_>| {
            let page_name = &caps[1];
            format!(
                r#"<a href="{}">{}</a>"#,
                keyword_to_href(page_name),
                escape_html(page_name)
            )
        })
        .into_owned()
}

/// Convert article markdown (with wiki links) to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let linked = expand_wiki_links(markdown);
    let parser = Parser::new(&linked);
    let mut out = String::with_capacity(linked.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Render a complete article page.
pub fn render_page(title: &str, markdown: &str) -> String {
    page_shell(title, &markdown_to_html(markdown))
}

/// Render the index page: a markdown listing of stored keywords as wiki
/// links, through the same renderer as articles.
pub fn render_index(keywords: &[String]) -> String {
    let mut body = String::from(
        "# The infinite library\n\n\
         You can go anywhere and we will auto-generate a new page for every keyword.\n\n\
         ## Stored pages:\n",
    );
    for keyword in keywords {
        body.push_str(&format!("- [[{keyword}]]\n"));
    }
    render_page("The infinite library", &body)
}

/// Render a minimal error page.
pub fn render_error(title: &str, message: &str) -> String {
    page_shell(
        title,
        &format!("<h1>{}</h1><p>{}</p>", escape_html(title), escape_html(message)),
    )
}

/// The fixed HTML shell shared by every page.
fn page_shell(title: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>{title} - The Infinite Library</title>
        <style>
            body {{
                max-width: 800px;
                margin: 0 auto;
                padding: 20px;
                font-family: system-ui, -apple-system, sans-serif;
                line-height: 1.6;
            }}
        </style>
    </head>
    <body>
        {body_html}

        <hr>
        <i><a href="/random">Random page</a></i>
    </body>
</html>
"#,
        title = escape_html(title),
    )
}

/// Minimal HTML escaping for text interpolated into markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
