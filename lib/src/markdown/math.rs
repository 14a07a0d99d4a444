use std::collections::VecDeque;

use latex2mathml::{latex_to_mathml, DisplayStyle};
use pulldown_cmark::{CowStr, Event};

use crate::config::MathOptions;
use crate::error::{Error, Result};
use crate::markdown::Plugin;

/// Typesets `$inline$` and `$$display$$` math as MathML.
///
/// A formula that fails to typeset is replaced by its source text, marked
/// with a `math-error` class, unless `throw_on_error` is set, in which case
/// the first failure is reported by `finalize`.
#[derive(Debug, Default)]
pub struct MathTypeset {
    throw_on_error: bool,
    failure: Option<Error>,
}

impl MathTypeset {
    pub fn new(options: &MathOptions) -> Self {
        MathTypeset { throw_on_error: options.throw_on_error, failure: None }
    }
}

const PARSE_ERROR: &str = "[PARSE ERROR";

/// Converts a LaTeX formula to MathML.
pub fn typeset(source: &str, display: bool) -> Result<String> {
    check_braces(source)?;

    let style = if display { DisplayStyle::Block } else { DisplayStyle::Inline };
    let mathml = latex_to_mathml(source, style).map_err(|e| error! {
        "malformed math expression",
        "source" => source,
        "reason" => e,
    })?;

    // Parse failures are reported inline as `<mtext>[PARSE ERROR: ..]</mtext>`.
    if let Some(start) = mathml.find(PARSE_ERROR) {
        let reason = &mathml[start..];
        let reason = reason.split_once(']').map_or(reason, |(reason, _)| reason);
        return err! {
            "malformed math expression",
            "source" => source,
            "reason" => reason.trim_start_matches('['),
        };
    }

    Ok(mathml)
}

fn check_braces(source: &str) -> Result<()> {
    let mut depth = 0usize;
    let mut escaped = false;
    for ch in source.chars() {
        match ch {
            '\\' => escaped = !escaped,
            '{' if !escaped => depth += 1,
            '}' if !escaped => {
                depth = depth.checked_sub(1).ok_or_else(|| error! {
                    "unexpected closing brace in math expression",
                    "source" => source,
                })?;
            }
            _ => escaped = false,
        }

        if ch != '\\' {
            escaped = false;
        }
    }

    if depth != 0 {
        return err! {
            "unclosed brace in math expression",
            "source" => source,
            "unclosed" => depth,
        };
    }

    Ok(())
}

struct MathIterator<'a, I: Iterator<Item = Event<'a>>> {
    stack: VecDeque<Event<'a>>,
    throw_on_error: bool,
    failure: &'a mut Option<Error>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> MathIterator<'a, I> {
    fn typeset(&mut self, source: CowStr<'a>, display: bool) -> Event<'a> {
        let class = if display { "math math-display" } else { "math math-inline" };
        match typeset(&source, display) {
            Ok(mathml) => Event::InlineHtml(format!(r#"<span class="{class}">{mathml}</span>"#).into()),
            Err(e) => {
                tracing::warn!(source = &*source, "math fallback: {}", e.message());
                if self.throw_on_error && self.failure.is_none() {
                    *self.failure = Some(e);
                }

                self.stack.push_back(Event::Text(source));
                self.stack.push_back(Event::InlineHtml("</span>".into()));
                Event::InlineHtml(format!(r#"<span class="{class} math-error">"#).into())
            }
        }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for MathIterator<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::InlineMath(source) => Some(self.typeset(source, false)),
            Event::DisplayMath(source) => Some(self.typeset(source, true)),
            event => Some(event),
        }
    }
}

impl Plugin for MathTypeset {
    const NAME: &'static str = "math";

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        self.failure = None;
        MathIterator {
            stack: VecDeque::with_capacity(2),
            throw_on_error: self.throw_on_error,
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
