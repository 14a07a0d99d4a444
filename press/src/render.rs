use std::path::Path;

use folio::error::{Chainable, Result};
use folio::error;
use folio::markdown::highlight;
use folio::post::{render_all, PostSummary};

use crate::discover::Press;

#[derive(Debug, Default, Clone, Copy)]
pub struct Report {
    pub rendered: usize,
    pub failed: usize,
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    std::fs::write(path, contents).chain_with(|| error! {
        "failed to write output file",
        "path" => path.display(),
    })
}

impl Press {
    /// Writes `<slug>.html` and `<slug>.toc.json` for every listed post, the
    /// listing as `index.json` and the highlighting stylesheet as
    /// `highlight.css`. A post that fails to render is reported and left out
    /// of the output and the listing.
    pub fn render_site(&self) -> Result<Report> {
        std::fs::create_dir_all(&self.output).chain_with(|| error! {
            "failed to create output directory",
            "path" => self.output.display(),
        })?;

        let css = highlight::stylesheet(&self.config.render.highlight)?;
        write(&self.output.join("highlight.css"), css)?;

        let documents = self.store.documents();
        tracing::info!(posts = documents.len(), root = %self.store.root().display(), "rendering");

        let mut report = Report::default();
        let mut index: Vec<PostSummary> = Vec::with_capacity(documents.len());
        for (document, result) in render_all(&documents, &self.config.render) {
            let post = match result {
                Ok(post) => post,
                Err(e) => {
                    tracing::error!(slug = %document.slug, "post omitted:\n{e}");
                    report.failed += 1;
                    continue;
                }
            };

            write(&self.output.join(format!("{}.html", document.slug)), &post.html)?;
            write(&self.output.join(format!("{}.toc.json", document.slug)), post.toc.to_json()?)?;
            index.push(document.summary());
            report.rendered += 1;
        }

        let json = serde_json::to_string_pretty(&index)?;
        write(&self.output.join("index.json"), json)?;
        Ok(report)
    }
}
