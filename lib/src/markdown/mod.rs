mod markdown;
mod plugin;
mod raw_html;
mod auto_heading;
mod math;
mod render;

pub mod frontmatter;
pub mod highlight;

pub use markdown::*;
pub use plugin::*;
pub use raw_html::*;
pub use auto_heading::*;
pub use math::*;
pub use render::*;
pub use highlight::SyntaxHighlight;
pub use frontmatter::FrontMatter;
