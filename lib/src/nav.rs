//! The reading-position aid shown next to a post: the outline as nested
//! links, with the heading currently being read highlighted.

use std::fmt::Write;

use crate::config::NavOptions;
use crate::toc::{TableOfContents, TocItem};
use crate::util::escape_html;

/// Renders `toc` as nested lists of links using the default depth.
pub fn render(toc: &TableOfContents, active: Option<&str>) -> String {
    render_with(toc, active, &NavOptions::default())
}

/// Renders `toc` as nested `<ul>` lists of links, at most `max_depth` levels
/// deep. The link to `active`, if any, carries the `active` class. An empty
/// outline renders to nothing.
pub fn render_with(toc: &TableOfContents, active: Option<&str>, options: &NavOptions) -> String {
    let mut html = String::new();
    list(&mut html, &toc.items, 1, active, options.max_depth);
    html
}

fn list(html: &mut String, items: &[TocItem], level: usize, active: Option<&str>, max: usize) {
    if items.is_empty() || level > max {
        return;
    }

    let _ = write!(html, r#"<ul class="toc toc-{level}">"#);
    for item in items {
        let class = match active == Some(item.id()) {
            true => r#" class="active""#,
            false => "",
        };

        let url = escape_html(&item.url);
        let title = escape_html(&item.title);
        let _ = write!(html, r#"<li><a href="{url}"{class}>{title}</a>"#);
        list(html, &item.items, level + 1, active, max);
        html.push_str("</li>");
    }

    html.push_str("</ul>");
}

/// The ids of the headings the navigation displays with the default depth:
/// the top-level items and their direct children.
pub fn observed_ids(toc: &TableOfContents) -> Vec<String> {
    observed_ids_with(toc, &NavOptions::default())
}

pub fn observed_ids_with(toc: &TableOfContents, options: &NavOptions) -> Vec<String> {
    toc.iter()
        .filter(|(depth, _)| *depth < options.max_depth)
        .map(|(_, item)| item.id().to_string())
        .collect()
}

/// Something that reports when headings enter the reading band, typically
/// the top fifth of the viewport.
pub trait Viewport {
    /// Starts watching the element with `id`. Returns `false` when there is
    /// no such element.
    fn observe(&mut self, id: &str) -> bool;

    fn unobserve(&mut self, id: &str);
}

impl<V: Viewport + ?Sized> Viewport for &mut V {
    fn observe(&mut self, id: &str) -> bool {
        (**self).observe(id)
    }

    fn unobserve(&mut self, id: &str) {
        (**self).unobserve(id)
    }
}

/// Tracks which heading is being read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActiveHeading {
    ids: Vec<String>,
    active: Option<String>,
}

/// A live registration with a [`Viewport`]. Every id registered by
/// [`ActiveHeading::attach()`] is unobserved when this is dropped.
#[derive(Debug)]
pub struct Subscription<V: Viewport> {
    viewport: V,
    heading: ActiveHeading,
}

impl ActiveHeading {
    pub fn attach<V: Viewport>(viewport: V, toc: &TableOfContents) -> Subscription<V> {
        Self::attach_with(viewport, toc, &NavOptions::default())
    }

    pub fn attach_with<V: Viewport>(
        mut viewport: V,
        toc: &TableOfContents,
        options: &NavOptions,
    ) -> Subscription<V> {
        let ids = observed_ids_with(toc, options)
            .into_iter()
            .filter(|id| viewport.observe(id))
            .collect();

        Subscription { viewport, heading: ActiveHeading { ids, active: None } }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

impl<V: Viewport> Subscription<V> {
    /// Called by the viewport when the heading `id` enters or leaves the
    /// reading band. A heading entering the band becomes the active one;
    /// leaving it changes nothing. Returns whether the active heading changed.
    pub fn notify(&mut self, id: &str, intersecting: bool) -> bool {
        if !intersecting || self.heading.active() == Some(id) {
            return false;
        }

        if !self.heading.ids.iter().any(|observed| observed == id) {
            tracing::trace!(id, "ignoring unobserved heading");
            return false;
        }

        self.heading.active = Some(id.to_string());
        true
    }

    pub fn active(&self) -> Option<&str> {
        self.heading.active()
    }

    /// The ids currently registered with the viewport.
    pub fn observed(&self) -> &[String] {
        &self.heading.ids
    }
}

impl<V: Viewport> Drop for Subscription<V> {
    fn drop(&mut self) {
        for id in &self.heading.ids {
            self.viewport.unobserve(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::toc::extract_toc;
    use super::*;

    const HTML: &str = r#"
        <h1 id="intro">Intro &amp; Setup</h1>
        <h2 id="install">Install</h2>
        <h3 id="linux">Linux</h3>
        <h1 id="usage">Usage</h1>
    "#;

    #[derive(Default)]
    struct Recorder {
        present: BTreeSet<&'static str>,
        observed: BTreeSet<String>,
        unobserved: Vec<String>,
    }

    impl Viewport for Recorder {
        fn observe(&mut self, id: &str) -> bool {
            let present = self.present.is_empty() || self.present.contains(id);
            if present {
                self.observed.insert(id.to_string());
            }

            present
        }

        fn unobserve(&mut self, id: &str) {
            self.observed.remove(id);
            self.unobserved.push(id.to_string());
        }
    }

    #[test]
    fn renders_two_levels() {
        let html = render(&extract_toc(HTML), Some("install"));
        assert_eq!(html, concat!(
            r#"<ul class="toc toc-1">"#,
            r##"<li><a href="#intro">Intro &amp; Setup</a>"##,
            r#"<ul class="toc toc-2">"#,
            r##"<li><a href="#install" class="active">Install</a></li>"##,
            "</ul></li>",
            r##"<li><a href="#usage">Usage</a></li>"##,
            "</ul>",
        ));
    }

    #[test]
    fn depth_is_configurable() {
        let toc = extract_toc(HTML);
        let deep = render_with(&toc, None, &NavOptions { max_depth: 3 });
        assert!(deep.contains("#linux"));

        let shallow = render_with(&toc, None, &NavOptions { max_depth: 1 });
        assert!(!shallow.contains("#install"));
        assert!(shallow.contains("#usage"));
    }

    #[test]
    fn empty_outline_renders_nothing() {
        assert_eq!(render(&TableOfContents::default(), None), "");
    }

    #[test]
    fn observes_displayed_headings() {
        assert_eq!(observed_ids(&extract_toc(HTML)), ["intro", "install", "usage"]);
    }

    #[test]
    fn tracks_the_active_heading() {
        let toc = extract_toc(HTML);
        let mut viewport = Recorder::default();
        let mut subscription = ActiveHeading::attach(&mut viewport, &toc);
        assert_eq!(subscription.active(), None);

        assert!(subscription.notify("install", true));
        assert_eq!(subscription.active(), Some("install"));

        // Leaving the band keeps the last heading active.
        assert!(!subscription.notify("install", false));
        assert_eq!(subscription.active(), Some("install"));

        // Undisplayed headings are never observed.
        assert!(!subscription.notify("linux", true));
        assert!(subscription.notify("usage", true));
        assert_eq!(subscription.active(), Some("usage"));
    }

    #[test]
    fn dropping_unobserves_everything() {
        let toc = extract_toc(HTML);
        let mut viewport = Recorder::default();
        {
            let subscription = ActiveHeading::attach(&mut viewport, &toc);
            assert_eq!(subscription.observed().len(), 3);
        }

        assert!(viewport.observed.is_empty());
        assert_eq!(viewport.unobserved, ["intro", "install", "usage"]);
    }

    #[test]
    fn missing_elements_are_skipped() {
        let toc = extract_toc(HTML);
        let mut viewport = Recorder { present: ["usage"].into(), ..Default::default() };
        drop(ActiveHeading::attach(&mut viewport, &toc));
        assert_eq!(viewport.unobserved, ["usage"]);
    }
}
