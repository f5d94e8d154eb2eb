use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use pixelflow::effects::{
    Arithmetic, ArithmeticOp, Checker, ColorSplit, Expression, GradientMap, LinearRamp, Noise,
    RadialRamp,
};
use pixelflow::{
    CalculationListener, Color, EffectContainer, EffectId, EffectKind, Engine, EngineConfig,
    Gradient, GradientStop, Picture, PictureRequest, PixelflowError, Value,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pixelflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a built-in effect graph as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Built-in graph to render.
    #[arg(long, value_enum, default_value_t = Preset::Sunset)]
    preset: Preset,

    #[arg(long, default_value_t = 512)]
    width: usize,

    #[arg(long, default_value_t = 512)]
    height: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the preview next to the output as `<name>.preview.png`.
    #[arg(long)]
    preview: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// Vertical gradient mapped through a warm palette.
    Sunset,
    /// Checkerboard darkened toward the corners.
    Checker,
    /// Fractal noise clouds.
    Clouds,
    /// Concentric rings written as a formula.
    Rings,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

/// Prints progress in whole percent steps.
#[derive(Default)]
struct ConsoleListener {
    last_percent: AtomicU64,
}

impl CalculationListener for ConsoleListener {
    fn on_progress(&self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u64;
        if self.last_percent.fetch_max(percent, Ordering::Relaxed) < percent {
            eprint!("\rrendering {percent:>3}%");
        }
    }

    fn on_preview_ready(&self, _picture: usize, preview: &Picture) {
        tracing::info!(
            width = preview.width(),
            height = preview.height(),
            "preview ready"
        );
    }

    fn on_error(&self, summary: &str, description: &str, _cause: &PixelflowError) {
        eprintln!("\n{summary}\n{description}");
    }

    fn on_ready(&self, _pictures: &[Option<Picture>]) {
        eprintln!("\rrendering 100%");
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config)?;
    let container = build_preset(args.preset).context("build preset graph")?;

    let request =
        PictureRequest::new(&container, args.width, args.height).with_preview(args.preview);
    let calculation =
        engine.start_with_listener(vec![request], Arc::new(ConsoleListener::default()))?;
    let output = calculation.wait()?;

    let picture = output
        .pictures
        .into_iter()
        .next()
        .flatten()
        .context("picture was not rendered")?;
    write_png(&picture, &args.out)?;
    eprintln!("wrote {}", args.out.display());

    if args.preview {
        match output.previews.into_iter().next().flatten() {
            Some(preview) => {
                let path = args.out.with_extension("preview.png");
                write_png(&preview, &path)?;
                eprintln!("wrote {}", path.display());
            }
            None => eprintln!("picture is too small for a preview"),
        }
    }
    Ok(())
}

fn write_png(picture: &Picture, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    picture
        .to_rgba8()
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))
}

fn build_preset(preset: Preset) -> anyhow::Result<EffectContainer> {
    let name = format!("{preset:?}").to_lowercase();
    let mut c = EffectContainer::with_channels(name, ["r", "g", "b", "a"])?;
    match preset {
        Preset::Sunset => {
            let ramp = c.push_effect(EffectKind::leaf(LinearRamp));
            c.bind_to_constant(input(&c, ramp, "angle")?, Value::Float(90.0))?;
            let palette = Gradient::new([
                (0.0, Color::rgba(0.10, 0.05, 0.30, 1.0)),
                (0.55, Color::rgba(0.95, 0.35, 0.20, 1.0)),
                (1.0, Color::rgba(1.0, 0.85, 0.40, 1.0)),
            ]
            .map(|(position, color)| GradientStop { position, color }));
            color_from(&mut c, ramp, palette)?;
        }
        Preset::Checker => {
            let checker = c.push_effect(EffectKind::leaf(Checker));
            c.bind_to_constant(input(&c, checker, "size")?, Value::Float(32.0))?;
            let radial = c.push_effect(EffectKind::leaf(RadialRamp));
            c.bind_to_constant(input(&c, radial, "radius")?, Value::Float(0.8))?;
            let shade = c.push_effect(EffectKind::leaf(Arithmetic::new(ArithmeticOp::Mix)));
            let a = output(&c, checker, "value")?;
            c.bind_to_variable(input(&c, shade, "a")?, a)?;
            c.bind_to_constant(input(&c, shade, "b")?, Value::Float(0.0))?;
            let t = output(&c, radial, "value")?;
            c.bind_to_variable(input(&c, shade, "t")?, t)?;
            color_from(&mut c, shade, Gradient::linear(Color::BLACK, Color::WHITE))?;
        }
        Preset::Clouds => {
            let noise = c.push_effect(EffectKind::leaf(Noise));
            c.bind_to_constant(input(&c, noise, "octaves")?, Value::Int(6))?;
            color_from(
                &mut c,
                noise,
                Gradient::linear(
                    Color::rgba(0.25, 0.45, 0.85, 1.0),
                    Color::rgba(0.95, 0.97, 1.0, 1.0),
                ),
            )?;
        }
        Preset::Rings => {
            let rings = c.push_effect(EffectKind::leaf(Expression::new(
                "0.5 + 0.5 * sin(a * sqrt(pow(x_norm - 0.5, 2.0) + pow(y_norm - 0.5, 2.0)))",
            )));
            c.bind_to_constant(input(&c, rings, "a")?, Value::Float(60.0))?;
            color_from(
                &mut c,
                rings,
                Gradient::linear(Color::rgba(0.05, 0.1, 0.1, 1.0), Color::rgba(0.3, 1.0, 0.8, 1.0)),
            )?;
        }
    }
    Ok(c)
}

/// Map the `value` output of `source` through `palette` into the four color channels.
fn color_from(
    c: &mut EffectContainer,
    source: EffectId,
    palette: Gradient,
) -> anyhow::Result<()> {
    let map = c.push_effect(EffectKind::leaf(GradientMap));
    c.bind_to_constant(input(c, map, "gradient")?, Value::Gradient(palette))?;
    let t = output(c, source, "value")?;
    c.bind_to_variable(input(c, map, "t")?, t)?;
    let split = c.push_effect(EffectKind::leaf(ColorSplit));
    let color = output(c, map, "color")?;
    c.bind_to_variable(input(c, split, "color")?, color)?;
    for channel in ["r", "g", "b", "a"] {
        let out = output(c, split, channel)?;
        c.bind_channel(channel, Some(out))?;
    }
    Ok(())
}

fn input(c: &EffectContainer, effect: EffectId, name: &str) -> anyhow::Result<pixelflow::InputId> {
    c.effect_input(effect, name)
        .with_context(|| format!("effect has no input '{name}'"))
}

fn output(
    c: &EffectContainer,
    effect: EffectId,
    name: &str,
) -> anyhow::Result<pixelflow::OutputId> {
    c.effect_output(effect, name)
        .with_context(|| format!("effect has no output '{name}'"))
}
