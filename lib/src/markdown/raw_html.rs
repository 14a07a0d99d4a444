use pulldown_cmark::Event;

use crate::markdown::Plugin;

/// Decides what happens to HTML embedded in a post: passed through verbatim
/// or demoted to text, which the serializer then escapes.
#[derive(Debug, Clone, Copy)]
pub struct RawHtml {
    allow: bool,
}

impl RawHtml {
    pub fn new(allow: bool) -> Self {
        RawHtml { allow }
    }
}

impl Plugin for RawHtml {
    const NAME: &'static str = "raw html";

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        let allow = self.allow;
        events.map(move |event| match event {
            Event::Html(html) | Event::InlineHtml(html) if !allow => Event::Text(html),
            event => event,
        })
    }
}
