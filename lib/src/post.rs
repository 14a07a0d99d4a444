use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::RenderOptions;
use crate::error::{Chainable, Result};
use crate::markdown::{FrontMatter, Markdown};
use crate::toc::{extract_toc, TableOfContents};

/// A post as stored: its slug, metadata and raw markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub summary: String,
    pub content: String,
}

/// A [`Document`] without its body, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub summary: String,
}

/// A post body rendered to HTML and its outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPost {
    pub html: String,
    pub toc: TableOfContents,
}

impl Document {
    /// Splits `source` into front matter and body.
    pub fn parse(slug: impl Into<String>, source: &str) -> Result<Document> {
        let slug = slug.into();
        let (meta, body) = FrontMatter::split(source).chain_with(|| error! {
            "malformed front matter",
            "slug" => &slug,
        })?;

        Ok(Document {
            title: meta.get("title").to_string(),
            date: meta.get("date").to_string(),
            summary: meta.get("summary").to_string(),
            content: body.to_string(),
            slug,
        })
    }

    /// Whether the post has the metadata listings require: a title and a date.
    pub fn is_listed(&self) -> bool {
        !self.title.trim().is_empty() && !self.date.trim().is_empty()
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            date: self.date.clone(),
            summary: self.summary.clone(),
        }
    }

    /// The post date formatted with `format`, in UTC.
    pub fn published(&self, format: &str) -> Option<String> {
        crate::date::format(&self.date, format)
    }
}

impl PostSummary {
    pub fn published(&self, format: &str) -> Option<String> {
        crate::date::format(&self.date, format)
    }
}

/// Renders the body of `document` and extracts its outline.
pub fn render_post(document: &Document, options: &RenderOptions) -> Result<RenderedPost> {
    let html = Markdown::new(options).render(&document.content).chain_with(|| error! {
        "failed to render post",
        "slug" => &document.slug,
    })?;

    let toc = extract_toc(&html);
    tracing::debug!(slug = %document.slug, headings = toc.iter().count(), "rendered post");
    Ok(RenderedPost { html, toc })
}

/// Renders every document in parallel. Results are in the order of
/// `documents`.
pub fn render_all<'d>(
    documents: &'d [Document],
    options: &RenderOptions,
) -> Vec<(&'d Document, Result<RenderedPost>)> {
    documents.par_iter()
        .map(|document| (document, render_post(document, options)))
        .collect()
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Document: Send, Sync);
    assert_impl_all!(PostSummary: Send, Sync);
    assert_impl_all!(RenderedPost: Send, Sync);

    const POST: &str = "---\ntitle: Hello\ndate: 2024-03-01\nsummary: First post\n---\n# Hello\n\n## Why\n\nBody with $x$.\n";

    #[test]
    fn parses_front_matter_and_body() {
        let document = Document::parse("hello", POST).unwrap();
        assert_eq!(document.slug, "hello");
        assert_eq!(document.title, "Hello");
        assert_eq!(document.date, "2024-03-01");
        assert_eq!(document.summary, "First post");
        assert!(document.content.starts_with("# Hello"));
        assert!(document.is_listed());
        assert_eq!(document.published("%Y/%m/%d").as_deref(), Some("2024/03/01"));
    }

    #[test]
    fn missing_metadata_is_not_an_error() {
        let document = Document::parse("bare", "Just a body.\n").unwrap();
        assert_eq!(document.title, "");
        assert_eq!(document.content, "Just a body.\n");
        assert!(!document.is_listed());

        let document = Document::parse("blank", "---\ntitle: '  '\ndate: 2024-01-01\n---\n").unwrap();
        assert!(!document.is_listed());
    }

    #[test]
    fn renders_html_and_outline() {
        let document = Document::parse("hello", POST).unwrap();
        let post = render_post(&document, &RenderOptions::default()).unwrap();
        assert!(post.html.contains(r#"<h1 id="hello">Hello</h1>"#));
        assert!(post.html.contains("<math"));
        assert_eq!(post.toc.items.len(), 1);
        assert_eq!(post.toc.items[0].items[0].url, "#why");
    }

    #[test]
    fn renders_in_parallel_in_order() {
        let documents: Vec<_> = (0..8)
            .map(|i| Document::parse(format!("p{i}"), &format!("# Post {i}\n")).unwrap())
            .collect();

        let rendered = render_all(&documents, &RenderOptions::default());
        for (i, (document, post)) in rendered.into_iter().enumerate() {
            assert_eq!(document.slug, format!("p{i}"));
            assert_eq!(post.unwrap().toc.items[0].url, format!("#post-{i}"));
        }
    }
}
