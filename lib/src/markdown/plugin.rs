use pulldown_cmark::Event;

use crate::error::Result;

/// A single stage of the markdown pipeline.
///
/// A stage sees the document as the event stream produced by the stages
/// before it and yields the stream for the stages after it. Failures that
/// can't be expressed as events are recorded and reported by `finalize`,
/// which runs once the whole stream has been consumed.
pub trait Plugin {
    /// Human readable stage name, used in errors and logs.
    const NAME: &'static str;

    #[inline(always)]
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        events
    }

    #[inline(always)]
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
