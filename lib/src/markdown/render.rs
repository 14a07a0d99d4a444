use pulldown_cmark::{html, Event};

use crate::markdown::Plugin;

/// The final stage: serializes the event stream to HTML.
///
/// Raw HTML events, whatever the earlier stages left of them, are written
/// verbatim.
#[derive(Default, Clone)]
pub struct Renderer {
    rendered: String,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer::default()
    }

    pub fn into_html(self) -> String {
        self.rendered
    }
}

impl Plugin for Renderer {
    const NAME: &'static str = "serialization";

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        self.rendered.clear();
        html::push_html(&mut self.rendered, events);
        std::iter::empty()
    }
}
