use pulldown_cmark::{Options, Parser};

use crate::config::RenderOptions;
use crate::error::{Chainable, Result};
use crate::markdown::*;

/// Parser extensions every post is rendered with: GFM tables, strikethrough,
/// task lists and footnotes, `{#id}` heading attributes, plus `$`/`$$` math.
pub fn default_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_MATH
}

/// Renders a post body to HTML.
///
/// The body flows through a fixed sequence of stages, each one remapping the
/// event stream produced by the previous:
///
/// 1. parsing, with the table, strikethrough and math extensions enabled,
///    which marks `$…$` and `$$…$$` as math events;
/// 2. [`RawHtml`]: the embedded HTML policy;
/// 3. [`AutoHeading`]: unique heading ids;
/// 4. [`MathTypeset`]: math to MathML, falling back to source text;
/// 5. [`SyntaxHighlight`]: classed code blocks;
/// 6. [`Renderer`]: serialization.
///
/// Rendering is deterministic: the same body always yields the same HTML.
#[derive(Debug, Clone)]
pub struct Markdown {
    options: Options,
    render: RenderOptions,
}

impl Default for Markdown {
    fn default() -> Self {
        Markdown::new(&RenderOptions::default())
    }
}

impl Markdown {
    pub fn new(render: &RenderOptions) -> Self {
        Markdown { options: default_options(), render: render.clone() }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn render(&self, input: &str) -> Result<String> {
        let mut raw_html = RawHtml::new(self.render.allow_raw_html);
        let mut headings = AutoHeading::default();
        let mut math = MathTypeset::new(&self.render.math);
        let mut highlight = SyntaxHighlight::new(&self.render.highlight);
        let mut renderer = Renderer::new();

        let events = Parser::new_ext(input, self.options);
        let events = raw_html.remap(events);
        let events = headings.remap(events);
        let events = math.remap(events);
        let events = highlight.remap(events);
        let events = renderer.remap(events);

        // Run the iterator.
        events.for_each(|_| {});

        finalize(&mut raw_html)?;
        finalize(&mut headings)?;
        finalize(&mut math)?;
        finalize(&mut highlight)?;
        finalize(&mut renderer)?;

        let html = renderer.into_html();
        tracing::trace!(input = input.len(), output = html.len(), "rendered markdown");
        Ok(html)
    }
}

fn finalize<P: Plugin>(plugin: &mut P) -> Result<()> {
    plugin.finalize().chain_with(|| error! {
        "markdown stage failed",
        "stage" => P::NAME,
    })
}

#[cfg(test)]
mod tests {
    use crate::config::MathOptions;
    use crate::toc::extract_toc;

    use super::*;

    fn render(input: &str) -> String {
        Markdown::new(&RenderOptions::default()).render(input).unwrap()
    }

    #[test]
    fn gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render("This is <mark>important</mark>.\n");
        assert!(html.contains("<mark>important</mark>"));
    }

    #[test]
    fn raw_html_can_be_escaped() {
        let options = RenderOptions { allow_raw_html: false, ..Default::default() };
        let html = Markdown::new(&options).render("<mark>x</mark> and $y$\n").unwrap();
        assert!(html.contains("&lt;mark&gt;x&lt;/mark&gt;"));
        // Typeset math is produced after the policy runs and survives it.
        assert!(html.contains("<math"));
    }

    #[test]
    fn math_is_typeset() {
        let html = render("Inline $x^2$ and display:\n\n$$\\sum_{i=0}^n i$$\n");
        assert!(html.contains(r#"<span class="math math-inline"><math"#));
        assert!(html.contains(r#"<span class="math math-display"><math"#));
    }

    #[test]
    fn malformed_math_does_not_break_the_page() {
        for source in [r"\frac{1}", "x^", r"\unknowncmd"] {
            let html = render(&format!("# Title\n\nBroken: ${source}$ but the rest renders.\n"));
            assert!(html.contains(r#"<span class="math math-inline math-error">"#), "{html}");
            assert!(html.contains(&format!("math-error\">{source}</span>")), "{html}");
            assert!(!html.contains("PARSE ERROR"));
            assert!(html.contains("the rest renders"));
            assert!(html.contains(r#"<h1 id="title">"#));
        }
    }

    #[test]
    fn strict_math_fails_the_render() {
        let options = RenderOptions {
            math: MathOptions { throw_on_error: true },
            ..Default::default()
        };

        let markdown = Markdown::new(&options);
        let error = markdown.render("Broken $\\unknowncmd$ here.\n").unwrap_err();
        assert_eq!(error.message(), "markdown stage failed");
        assert!(error.iter().any(|e| e.context().iter().any(|(_, v)| v == r"\unknowncmd")));

        let html = markdown.render("$a + b$\n").unwrap();
        assert!(html.contains("<math"));
        assert!(!html.contains("math-error"));
    }

    #[test]
    fn explicit_heading_ids_are_kept_and_reserved() {
        let html = render("# Intro {#custom}\n\n# Custom\n");
        assert!(html.contains(r#"<h1 id="custom">Intro</h1>"#), "{html}");
        assert!(html.contains(r#"<h1 id="custom-1">Custom</h1>"#), "{html}");
    }

    #[test]
    fn default_matches_default_options() {
        let html = Markdown::default().render("~~gone~~ $x$\n").unwrap();
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<math"));
    }

    #[test]
    fn code_is_highlighted() {
        let html = render("```rust\nlet x = 1;\n```\n");
        assert!(html.contains(r#"data-language="rust""#));
        assert!(html.contains("<span class=\""));
    }

    #[test]
    fn duplicate_headings_stay_unique() {
        let html = render("# Overview\n\ntext\n\n# Overview\n");
        assert!(html.contains(r#"id="overview""#));
        assert!(html.contains(r#"id="overview-1""#));

        let toc = extract_toc(&html);
        assert_eq!(toc.items.len(), 2);
        assert_ne!(toc.items[0].url, toc.items[1].url);
    }

    #[test]
    fn rendering_is_idempotent() {
        let body = "# A\n\n## B\n\n$e^{i\\pi}$\n\n```python\nprint('hi')\n```\n\n# A\n";
        let markdown = Markdown::new(&RenderOptions::default());
        assert_eq!(markdown.render(body).unwrap(), markdown.render(body).unwrap());
    }

    #[test]
    fn empty_body() {
        assert_eq!(render(""), "");
    }
}
