use std::fmt::Write;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Tag, CodeBlockKind, TagEnd};
use syntect::html::{ClassedHTMLGenerator, ClassStyle};
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxSet, SyntaxReference};
use syntect::util::LinesWithEndings;

use crate::config::HighlightOptions;
use crate::error::{Error, Result};
use crate::markdown::Plugin;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

/// Highlights fenced code blocks with CSS classes.
///
/// No colors are inlined: the page pairs the output with [`stylesheet()`],
/// which carries both a light and a dark theme and leaves the background to
/// the page.
#[derive(Debug, Default)]
pub struct SyntaxHighlight {
    line_numbers: bool,
    failure: Option<Error>,
}

impl SyntaxHighlight {
    pub fn new(options: &HighlightOptions) -> Self {
        SyntaxHighlight { line_numbers: options.line_numbers, failure: None }
    }

    /// Loads the syntax and theme sets on the rayon pool so that the first
    /// render doesn't pay for it.
    #[inline]
    pub fn warm_up() {
        rayon::spawn(|| { Lazy::force(&SYNTAX_SET); });
        rayon::spawn(|| { Lazy::force(&THEME_SET); });
    }
}

struct CodeBlock {
    syntax: &'static SyntaxReference,
    language: String,
    code: String,
}

struct Highlighter<'a, I> {
    block: Option<CodeBlock>,
    line_numbers: bool,
    failure: &'a mut Option<Error>,
    inner: I,
}

impl Plugin for SyntaxHighlight {
    const NAME: &'static str = "syntax highlighting";

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        self.failure = None;
        Highlighter {
            block: None,
            line_numbers: self.line_numbers,
            failure: &mut self.failure,
            inner: events,
        }
    }

    fn finalize(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn find_syntax(label: &str) -> (&'static SyntaxReference, String) {
    let language = label.split([',', ' ', '{'])
        .next()
        .unwrap_or_default()
        .trim();

    let syntax = SYNTAX_SET.find_syntax_by_token(language)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    (syntax, language.to_string())
}

/// Highlights `code`, returning the classed HTML and the number of lines.
pub fn highlight(code: &str, syntax: &SyntaxReference) -> Result<(String, usize)> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &*SYNTAX_SET, CLASS_STYLE);

    let mut lines = 0;
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)
            .map_err(|e| error! {
                "failed to highlight code block",
                "syntax" => &syntax.name,
                "line" => lines + 1,
                "reason" => e,
            })?;

        lines += 1;
    }

    Ok((generator.finalize(), lines))
}

fn code_div(language: &str, lines: usize, code: &str, line_numbers: bool) -> String {
    let mut div = String::new();
    let language = crate::util::escape_html(language);
    let _ = write!(&mut div, r#"<div class="code" data-language="{language}" data-lines="{lines}">"#);

    if line_numbers {
        let _ = write!(&mut div, r#"<pre class="line-nums" aria-hidden="true">"#);
        for i in 1..=lines {
            if i < lines { let _ = writeln!(&mut div, "{i}"); }
            else { let _ = write!(&mut div, "{i}"); }
        }

        let _ = write!(&mut div, "</pre>");
    }

    let _ = write!(&mut div, r#"<pre class="code"><code>{code}</code></pre>"#);
    let _ = write!(&mut div, "</div>");
    div
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Highlighter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(label))) => {
                    let (syntax, language) = find_syntax(&label);
                    self.block = Some(CodeBlock { syntax, language, code: String::new() });
                }
                Event::Text(text) if self.block.is_some() => {
                    if let Some(block) = self.block.as_mut() {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if self.block.is_some() => {
                    let block = self.block.take()?;
                    let html = match highlight(&block.code, block.syntax) {
                        Ok((html, lines)) => code_div(&block.language, lines, &html, self.line_numbers),
                        Err(e) => {
                            if self.failure.is_none() {
                                *self.failure = Some(e);
                            }

                            String::new()
                        }
                    };

                    return Some(Event::Html(html.into()));
                },
                ev => return Some(ev),
            }
        }
    }
}

/// CSS for the highlighted output: the light theme at the top level and the
/// dark theme scoped under `dark_selector`. Background colors are dropped.
pub fn stylesheet(options: &HighlightOptions) -> Result<String> {
    let mut css = String::new();
    let _ = writeln!(&mut css, "div.code {{ display: grid; grid-template-columns: auto 1fr; }}");
    let _ = writeln!(&mut css, "pre.line-nums {{ text-align: right; user-select: none; opacity: 0.5; }}");

    css.push_str(&theme_css(&options.light_theme, None)?);
    css.push_str(&theme_css(&options.dark_theme, Some(&options.dark_selector))?);
    Ok(css)
}

fn theme_css(name: &str, scope: Option<&str>) -> Result<String> {
    let theme = THEME_SET.themes.get(name).ok_or_else(|| error! {
        "unknown highlighting theme",
        "theme" => name,
        "available" => THEME_SET.themes.keys().cloned().collect::<Vec<_>>().join(", "),
    })?;

    let css = syntect::html::css_for_theme_with_class_style(theme, CLASS_STYLE)
        .map_err(|e| error!("failed to generate theme css", "theme" => name, "reason" => e))?;

    let Some(scope) = scope else {
        return Ok(without_backgrounds(&css));
    };

    // Prefix every top-level selector with `scope`. Selector lists may span
    // several lines, so they're buffered until their block opens.
    let mut output = String::with_capacity(css.len());
    let mut pending = String::new();
    let mut depth = 0usize;
    for line in without_backgrounds(&css).lines() {
        let trimmed = line.trim();
        let is_comment = trimmed.starts_with("/*") || trimmed.starts_with('*');
        if depth > 0 || trimmed.is_empty() || is_comment {
            let _ = writeln!(&mut output, "{line}");
            depth += line.matches('{').count();
            depth = depth.saturating_sub(line.matches('}').count());
            continue;
        }

        pending.push_str(trimmed);
        pending.push(' ');
        let rule = match pending.split_once('{') {
            Some((selectors, rest)) => {
                depth += 1 + rest.matches('{').count();
                depth = depth.saturating_sub(rest.matches('}').count());
                format!("{} {{{}", scope_selectors(selectors, scope), rest.trim_end())
            }
            None => continue,
        };

        let _ = writeln!(&mut output, "{rule}");
        pending.clear();
    }

    Ok(output)
}

fn without_backgrounds(css: &str) -> String {
    css.lines()
        .filter(|line| !line.trim_start().starts_with("background-color"))
        .fold(String::with_capacity(css.len()), |mut css, line| {
            css.push_str(line);
            css.push('\n');
            css
        })
}

fn scope_selectors(selectors: &str, scope: &str) -> String {
    selectors.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("{scope} {s}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use pulldown_cmark::{html, Parser};

    use super::*;

    fn render(input: &str, options: &HighlightOptions) -> String {
        let mut plugin = SyntaxHighlight::new(options);
        let mut output = String::new();
        html::push_html(&mut output, plugin.remap(Parser::new(input)));
        plugin.finalize().unwrap();
        output
    }

    #[test]
    fn highlights_fenced_blocks() {
        let output = render("```rust\nfn main() {\n    let x = 1;\n}\n```\n", &HighlightOptions::default());
        assert!(output.contains(r#"<div class="code" data-language="rust" data-lines="3">"#));
        assert!(output.contains("<pre class=\"line-nums\" aria-hidden=\"true\">1\n2\n3</pre>"));
        assert!(output.contains("<span class=\""));
        assert!(!output.contains("style="));
        assert!(!output.contains("background"));
    }

    #[test]
    fn line_numbers_can_be_disabled() {
        let options = HighlightOptions { line_numbers: false, ..Default::default() };
        let output = render("```\nplain\n```\n", &options);
        assert!(!output.contains("line-nums"));
        assert!(output.contains(r#"data-language="""#));
        assert!(output.contains("plain"));
    }

    #[test]
    fn unknown_languages_are_plain_text() {
        let output = render("```not-a-language\na < b\n```\n", &HighlightOptions::default());
        assert!(output.contains(r#"data-language="not-a-language""#));
        assert!(output.contains("a &lt; b"));
    }

    #[test]
    fn indented_code_is_left_alone() {
        let output = render("    indented\n", &HighlightOptions::default());
        assert!(output.contains("<pre><code>indented\n</code></pre>"));
    }

    #[test]
    fn stylesheet_has_both_themes_without_backgrounds() {
        let css = stylesheet(&HighlightOptions::default()).unwrap();
        assert!(css.contains(".dark "));
        assert!(!css.contains("background-color"));
        assert!(css.contains("grid-template-columns"));
    }

    #[test]
    fn scoping_handles_multiline_selectors() {
        assert_eq!(scope_selectors(".a, .b ", ".dark"), ".dark .a, .dark .b");
        assert_eq!(without_backgrounds(".a {\n background-color: #fff;\n color: red;\n}"), ".a {\n color: red;\n}\n");
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let options = HighlightOptions { dark_theme: "nope".into(), ..Default::default() };
        assert!(stylesheet(&options).is_err());
    }
}
