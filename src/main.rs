use bannercut::Config;
use bannercut::media::Toolkit;
use bannercut::pipeline::{BannerPipeline, Command, CommandOutcome, RegionReport};
use bannercut::session::SessionId;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Owner identity for sessions opened by the CLI itself.
const CLI_OWNER: &str = "cli";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "bannercut")]
#[command(about = "Crop images into fixed-size banners")]
#[command(long_about = "\
Crop images into fixed-size banners

Opens a crop session over the input, applies a scripted sequence of
move/zoom commands, and either renders the preview or confirms into the
final banner. Animated GIFs keep their frames and timing; PNG and JPEG
stay in their own encoding family.

Commands (comma-separated, applied in order):

  up, down, left, right    move the crop rectangle by the configured step
  in, out                  zoom the viewport in or out by the configured step

A source smaller than the banner is upscaled on submission, so every
command always operates inside valid bounds.

Example:

  bannercut crop header.gif --commands left,left,up,in -o banner.gif")]
#[command(version = version_string())]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print format, dimensions and the initial crop region
    Inspect { image: PathBuf },
    /// Render the crop preview after applying commands
    Preview {
        image: PathBuf,
        /// Comma-separated move/zoom commands
        #[arg(long, default_value = "")]
        commands: String,
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },
    /// Apply commands and produce the final banner
    Crop {
        image: PathBuf,
        /// Comma-separated move/zoom commands
        #[arg(long, default_value = "")]
        commands: String,
        /// Output path; defaults to the suggested file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let pipeline = BannerPipeline::with_default_backend(config);

    match cli.command {
        Cmd::Inspect { image } => {
            let id = submit(&pipeline, &image)?;
            let (format, size) = pipeline.store().with(&id, |s| (s.format, s.size))?;
            let (_, report) = pipeline.preview(&id, CLI_OWNER)?;
            println!("Format:  {format}");
            println!("Size:    {}x{}", size.width, size.height);
            println!("Region:  {}", describe(&report));
            pipeline.command(&id, CLI_OWNER, Command::Cancel)?;
        }
        Cmd::Preview { image, commands, output } => {
            let id = submit(&pipeline, &image)?;
            apply(&pipeline, &id, &parse_commands(&commands)?)?;
            let (bytes, report) = pipeline.preview(&id, CLI_OWNER)?;
            std::fs::write(&output, bytes)?;
            println!("==> Preview written: {} ({})", output.display(), describe(&report));
            pipeline.command(&id, CLI_OWNER, Command::Cancel)?;
        }
        Cmd::Crop { image, commands, output } => {
            let id = submit(&pipeline, &image)?;
            apply(&pipeline, &id, &parse_commands(&commands)?)?;
            match pipeline.command(&id, CLI_OWNER, Command::Confirm)? {
                CommandOutcome::Finished(artifact) => {
                    let path = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
                    std::fs::write(&path, &artifact.bytes)?;
                    println!("==> Banner written: {}", path.display());
                }
                _ => return Err("session ended before confirm".into()),
            }
        }
    }

    Ok(())
}

fn submit(
    pipeline: &BannerPipeline<Toolkit>,
    image: &Path,
) -> Result<SessionId, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(image)?;
    let declared_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(pipeline.submit(CLI_OWNER, bytes, &declared_name)?)
}

fn apply(
    pipeline: &BannerPipeline<Toolkit>,
    id: &SessionId,
    commands: &[Command],
) -> Result<(), Box<dyn std::error::Error>> {
    for &command in commands {
        if let CommandOutcome::Updated { report, .. } = pipeline.command(id, CLI_OWNER, command)? {
            println!("  {}", describe(&report));
        }
    }
    Ok(())
}

/// Parse the `--commands` script. Confirm/cancel are driven by the
/// subcommand itself and are rejected here.
fn parse_commands(spec: &str) -> Result<Vec<Command>, Box<dyn std::error::Error>> {
    let commands: Vec<Command> = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()?;
    if commands
        .iter()
        .any(|c| matches!(c, Command::Confirm | Command::Cancel))
    {
        return Err("confirm and cancel are applied by the subcommand itself".into());
    }
    Ok(commands)
}

fn describe(report: &RegionReport) -> String {
    format!(
        "{},{} {}x{} @ {}%",
        report.x, report.y, report.width, report.height, report.zoom_percent
    )
}
