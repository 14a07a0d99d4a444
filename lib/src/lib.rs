//! The content pipeline behind a personal blog.
//!
//! # Overview
//!
//! Posts are markdown files with a front matter preamble, kept one per file
//! in a content directory. Folio turns them into three things:
//!
//!   * **Listings**: the [`Store`] discovers posts and reads their metadata
//!     (title, date, summary) for index pages, newest first. Rendering isn't
//!     involved.
//!
//!   * **HTML**: [`markdown::Markdown`] renders a post body through a fixed
//!     sequence of [`markdown::Plugin`] stages over the `pulldown-cmark`
//!     event stream: tables and strikethrough, embedded HTML, heading ids,
//!     math typeset as MathML, and class-based syntax highlighting.
//!
//!   * **Outlines**: [`toc::extract_toc()`] recovers the nested table of
//!     contents from the rendered HTML, and [`nav`] displays it next to the
//!     post, highlighting the heading being read.
//!
//! ## Rendering
//!
//! A post is typically rendered as follows:
//!
//! 1. The post is looked up by slug with [`Store::get_by_slug()`].
//! 2. [`render_post()`] renders its body and extracts the outline.
//! 3. The page embeds [`RenderedPost::html`], the stylesheet from
//!    [`markdown::highlight::stylesheet()`] and the navigation from
//!    [`nav::render()`].
//!
//! Every stage is synchronous and independent per post, so whole sites are
//! rendered in parallel with [`post::render_all()`].

#[macro_use]
pub mod error;
pub mod util;
pub mod config;
pub mod date;
pub mod markdown;
pub mod toc;
pub mod nav;
pub mod post;
pub mod store;

pub use config::Config;
pub use post::{render_post, Document, PostSummary, RenderedPost};
pub use store::Store;
pub use toc::{extract_toc, TableOfContents, TocItem};

pub use rayon;
