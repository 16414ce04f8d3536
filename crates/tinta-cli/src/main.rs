//! `tinta-cli` — grade photos with the built-in filters from a shell.
//!
//! ```text
//! tinta-cli apply <source> <filter> [intensity] [--config <file>] [--strict]
//! tinta-cli presets <dir>
//! tinta-cli filters [--config <file>]
//! ```
//!
//! `apply` prints the URI to upload: the graded JPEG, or the source when the
//! filter could not be applied. `--strict` turns that fallback into an error.

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tinta::{FilterId, LutPipeline, LutSlot, LutSource, PipelineConfig};
use tinta_core::presets;

const USAGE: &str = "usage:
  tinta-cli apply <source> <filter> [intensity] [--config <file>] [--strict]
  tinta-cli presets <dir>
  tinta-cli filters [--config <file>]";

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    positional: Vec<String>,
    config: Option<PathBuf>,
    strict: bool,
    debug: bool,
}

impl Args {
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = Self::default();
        let mut raw = raw.into_iter();
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--config" => {
                    let path = raw.next().context("--config needs a path")?;
                    args.config = Some(PathBuf::from(path));
                }
                "--strict" => args.strict = true,
                "--debug" => args.debug = true,
                "-h" | "--help" => args.command = Some("help".to_string()),
                _ if args.command.is_none() => args.command = Some(arg),
                _ => args.positional.push(arg),
            }
        }
        Ok(args)
    }

    fn config(&self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(PipelineConfig::default()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    logging::init_tracing(args.debug);

    match args.command.as_deref() {
        Some("apply") => apply(&args).await,
        Some("presets") => {
            let dir = args.positional.first().context(USAGE)?;
            write_presets(Path::new(dir))
        }
        Some("filters") => list_filters(&args),
        Some("help") | None => {
            println!("{USAGE}");
            Ok(())
        }
        Some(other) => bail!("unknown command `{other}`\n{USAGE}"),
    }
}

async fn apply(args: &Args) -> Result<()> {
    let [source, filter, rest @ ..] = args.positional.as_slice() else {
        bail!(USAGE);
    };
    let filter: FilterId = filter.parse()?;
    let pipeline = LutPipeline::new(args.config()?)?;
    let intensity = match rest.first() {
        Some(v) => v
            .parse::<f32>()
            .with_context(|| format!("invalid intensity `{v}`"))?,
        None => pipeline.config().default_intensity,
    };

    let uri = if args.strict {
        match pipeline.try_apply(source, filter, intensity).await? {
            Some(path) => tinta::uri::from_path(&path, source),
            None => source.clone(),
        }
    } else {
        pipeline.apply_lut(source, filter, intensity).await
    };
    println!("{uri}");
    Ok(())
}

fn write_presets(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for filter in FilterId::all().iter().filter(|f| !f.is_none()) {
        let Some(lut) = presets::bake_preset(*filter) else {
            continue;
        };
        let path = dir.join(format!("{}.png", filter.tag()));
        lut.image()
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Wrote {} LUT to {}", filter.label(), path.display());
    }
    Ok(())
}

fn list_filters(args: &Args) -> Result<()> {
    let registry = args.config()?.registry()?;
    for filter in FilterId::all() {
        let slot = match registry.resolve(*filter) {
            LutSlot::Disabled => "no transform".to_string(),
            LutSlot::Unbound => "unbound".to_string(),
            LutSlot::Bound(LutSource::Preset(_)) => "built-in preset".to_string(),
            LutSlot::Bound(LutSource::File(path)) => path.display().to_string(),
            LutSlot::Bound(LutSource::Encoded(bytes)) => format!("{} bytes in memory", bytes.len()),
        };
        println!("{:<6} {:<10} {slot}", filter.tag(), filter.label());
    }
    Ok(())
}
