use std::collections::VecDeque;

use pulldown_cmark::{Event, Tag, TagEnd};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::markdown::Plugin;

/// Fallback id for headings whose text slugifies to nothing.
const EMPTY_SLUG: &str = "section";

/// Gives every heading without an id one derived from its text.
///
/// Ids are unique within a document: the first heading with a given slug gets
/// the bare slug, later ones get `-1`, `-2`, ... skipping any id that has
/// already been handed out.
#[derive(Default, Debug, Clone)]
pub struct AutoHeading {
    ids: HeadingIds,
}

#[derive(Default, Debug, Clone)]
struct HeadingIds {
    issued: FxHashSet<String>,
    counters: FxHashMap<String, usize>,
}

impl HeadingIds {
    fn unique(&mut self, slug: String) -> String {
        let slug = if slug.is_empty() { EMPTY_SLUG.to_string() } else { slug };
        let mut id = slug.clone();
        while self.issued.contains(&id) {
            let counter = self.counters.entry(slug.clone()).or_insert(0);
            *counter += 1;
            id = format!("{slug}-{counter}");
        }

        self.issued.insert(id.clone());
        id
    }

    fn reserve(&mut self, id: &str) {
        self.issued.insert(id.to_string());
    }
}

struct HeadingIterator<'a, I: Iterator<Item = Event<'a>>> {
    stack: VecDeque<Event<'a>>,
    ids: &'a mut HeadingIds,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for HeadingIterator<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    match event {
                        Event::Text(ref s) | Event::Code(ref s) | Event::InlineMath(ref s) => {
                            text.push_str(s);
                        }
                        Event::SoftBreak | Event::HardBreak => text.push(' '),
                        Event::End(TagEnd::Heading(..)) => break,
                        _ => {}
                    }

                    self.stack.push_back(event);
                }

                let id = self.ids.unique(crate::util::slugify(&text));
                let tag = Tag::Heading { level, id: Some(id.into()), classes, attrs };
                self.stack.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(tag))
            },
            Event::Start(Tag::Heading { level, id: Some(id), classes, attrs }) => {
                self.ids.reserve(&id);
                Some(Event::Start(Tag::Heading { level, id: Some(id), classes, attrs }))
            }
            event => Some(event)
        }
    }
}

impl Plugin for AutoHeading {
    const NAME: &'static str = "heading ids";

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        self.ids = HeadingIds::default();
        HeadingIterator {
            ids: &mut self.ids,
            inner: events,
            stack: VecDeque::with_capacity(4),
        }
    }
}
