use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ringspin", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a numbered PNG sequence.
    Frames(FramesArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Scene JSON. When omitted, the default scene for the viewport is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Timed command JSON applied while the animation runs.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Label font (TTF/OTF). Falls back to $RINGSPIN_FONT; labels are skipped without one.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Host viewport width used to pick the default scene.
    #[arg(long, default_value_t = 1350)]
    width: u32,

    /// Host viewport height used to pick the default scene.
    #[arg(long, default_value_t = 900)]
    height: u32,

    /// Force a default layout instead of deriving it from the viewport.
    #[arg(long, value_enum)]
    profile: Option<ProfileChoice>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Ticks to advance before capturing.
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Seconds of animation to capture.
    #[arg(long, default_value_t = 3)]
    seconds: u32,

    /// Captured frames per second.
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Seconds of animation to record.
    #[arg(long, default_value_t = 5)]
    seconds: u32,

    /// Output frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileChoice {
    Desktop,
    Mobile,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_session(args: &SceneArgs) -> anyhow::Result<ringspin::Session> {
    let cfg = match &args.config {
        Some(path) => ringspin::SceneConfig::load(path)?,
        None => {
            let (derived, canvas) = ringspin::LayoutProfile::for_viewport(args.width, args.height);
            let profile = match args.profile {
                Some(ProfileChoice::Desktop) => ringspin::LayoutProfile::Desktop,
                Some(ProfileChoice::Mobile) => ringspin::LayoutProfile::Mobile,
                None => derived,
            };
            profile.scene(canvas)
        }
    };
    let canvas = cfg.canvas;
    let scene = ringspin::Scene::new(cfg)?;

    let font = args
        .font
        .clone()
        .or_else(|| std::env::var_os("RINGSPIN_FONT").map(PathBuf::from));
    let surface = match font {
        Some(path) => ringspin::CpuSurface::with_font_file(canvas, &path)?,
        None => ringspin::CpuSurface::new(canvas)?,
    };

    let mut session = ringspin::Session::new(scene, surface);
    if let Some(path) = &args.script {
        session = session.with_script(read_script(path)?);
    }
    Ok(session)
}

fn read_script(path: &Path) -> anyhow::Result<Vec<ringspin::TimedCommand>> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("open command script '{}'", path.display()))?;
    let script = ringspin::parse_script(&s).with_context(|| "parse command script JSON")?;
    Ok(script)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut session = load_session(&args.scene)?;
    session.advance(args.ticks);
    ringspin::export_png(&mut session, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let mut session = load_session(&args.scene)?;
    let written = ringspin::export_png_sequence(
        &mut session,
        ringspin::CaptureOpts::for_duration(args.fps, args.seconds),
        &args.out_dir,
    )?;
    eprintln!(
        "wrote {} frames to {}",
        written.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut session = load_session(&args.scene)?;
    ringspin::export_mp4(
        &mut session,
        ringspin::CaptureOpts::for_duration(args.fps, args.seconds),
        &args.out,
    )
    .with_context(|| format!("render '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
