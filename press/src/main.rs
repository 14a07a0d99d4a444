use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::discover::Press;

mod discover;
mod render;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Renders every post of a folio site into an output directory.
        cmd press {
            /// Directory the rendered posts are written to.
            required output: PathBuf
            /// Site root holding `folio.toml` and the content directory.
            optional -r, --root root: PathBuf
            /// Configuration file to use instead of `<root>/folio.toml`.
            optional -c, --config config: PathBuf
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn main() -> ExitCode {
    let flags = flags::Press::from_env_or_exit();
    init_tracing();

    let start = std::time::Instant::now();
    folio::markdown::SyntaxHighlight::warm_up();
    let result = Press::new(flags.root, flags.config, flags.output)
        .and_then(|press| press.render_site());

    match result {
        Ok(report) => {
            tracing::info!(
                rendered = report.rendered,
                failed = report.failed,
                "done in {}ms", start.elapsed().as_millis()
            );

            match report.failed {
                0 => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
