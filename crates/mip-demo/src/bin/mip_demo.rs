use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::ExtendedColorType;
use log::info;
use mipchain::{Bitmap, MipChain, MipConfig, OddEdge};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "mip_demo")]
#[command(about = "Generate a mipmap chain and write every level as a BMP file")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a sine-wave interference pattern and mip it
    #[command(name = "sine")]
    Sine(SineArgs),
    /// Mip an image file
    #[command(name = "file")]
    File(FileArgs),
}

#[derive(Args, Debug, Clone)]
struct ChainArgs {
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long, value_enum, default_value_t = OddEdgeArg::Drop)]
    odd_edge: OddEdgeArg,
    /// Upper bound on the bytes all levels may occupy
    #[arg(long)]
    memory_limit: Option<usize>,
    /// Skip the copy of the source at level 0
    #[arg(long, default_value_t = false)]
    no_base: bool,
}

#[derive(Args, Debug, Clone)]
struct SineArgs {
    #[command(flatten)]
    chain: ChainArgs,
    #[arg(long, default_value_t = 451)]
    width: usize,
    #[arg(long, default_value_t = 244)]
    height: usize,
    #[arg(long, default_value_t = 3)]
    bytes_per_pixel: usize,
    #[arg(long, default_value_t = 0.067)]
    frequency: f32,
    #[arg(long, default_value = "sine")]
    prefix: String,
}

#[derive(Args, Debug, Clone)]
struct FileArgs {
    #[command(flatten)]
    chain: ChainArgs,
    #[arg(long, required = true)]
    input: PathBuf,
    /// Output file prefix, defaults to the input file stem
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OddEdgeArg {
    Drop,
    Fold,
}

impl From<OddEdgeArg> for OddEdge {
    fn from(arg: OddEdgeArg) -> Self {
        match arg {
            OddEdgeArg::Drop => OddEdge::Drop,
            OddEdgeArg::Fold => OddEdge::Fold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct LevelDto {
    index: usize,
    width: usize,
    height: usize,
    bytes: usize,
    file: String,
}

#[derive(Debug, Clone, Serialize)]
struct MetaChain {
    source: String,
    source_size: [usize; 2],
    bytes_per_pixel: usize,
    odd_edge: &'static str,
    includes_base: bool,
    total_bytes: usize,
    levels: Vec<LevelDto>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Sine(args) => run_sine(args),
        Command::File(args) => run_file(args),
    }
}

fn run_sine(args: SineArgs) -> Result<()> {
    let pixels = draw_sine_waves(
        args.width,
        args.height,
        args.bytes_per_pixel,
        args.frequency,
    );
    let src = Bitmap::from_vec(args.width, args.height, args.bytes_per_pixel, pixels)
        .context("building sine bitmap")?;

    let source = format!("sine(frequency={})", args.frequency);
    write_chain(&src, &args.chain, &args.prefix, source)
}

fn run_file(args: FileArgs) -> Result<()> {
    ensure_file_exists(&args.input)?;
    let src = load_input(&args.input)?;

    let prefix = match args.prefix {
        Some(prefix) => prefix,
        None => args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "level".to_owned()),
    };
    let source = args.input.display().to_string();
    write_chain(&src, &args.chain, &prefix, source)
}

fn write_chain(src: &Bitmap, args: &ChainArgs, prefix: &str, source: String) -> Result<()> {
    let color = color_type(src.bytes_per_pixel())?;
    let cfg = MipConfig {
        odd_edge: args.odd_edge.into(),
        memory_limit: args.memory_limit,
    };

    let chain = if args.no_base {
        MipChain::generate_no_base_with_config(src, &cfg)
    } else {
        MipChain::generate_with_config(src, &cfg)
    }
    .with_context(|| {
        format!(
            "generating mip chain for {}x{} source",
            src.width(),
            src.height()
        )
    })?;
    info!(
        "built {} levels ({} bytes) from {}x{} source",
        chain.len(),
        chain.total_bytes(),
        src.width(),
        src.height()
    );

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    // Level numbering always counts from the source resolution.
    let first_index = usize::from(args.no_base);
    let mut levels = Vec::with_capacity(chain.len());
    for (i, level) in chain.iter().enumerate() {
        let index = first_index + i;
        let name = level_file_name(prefix, index);
        let path = args.out.join(&name);
        save_level(&path, level, color)?;
        info!(
            "wrote {} ({}x{})",
            path.display(),
            level.width(),
            level.height()
        );
        levels.push(LevelDto {
            index,
            width: level.width(),
            height: level.height(),
            bytes: level.pixels().len(),
            file: name,
        });
    }

    write_json(
        args.out.join(format!("{prefix}_meta.json")),
        &MetaChain {
            source,
            source_size: [src.width(), src.height()],
            bytes_per_pixel: src.bytes_per_pixel(),
            odd_edge: match cfg.odd_edge {
                OddEdge::Drop => "drop",
                OddEdge::Fold => "fold",
            },
            includes_base: !args.no_base,
            total_bytes: chain.total_bytes(),
            levels,
        },
    )?;

    chain.free();
    Ok(())
}

/// Interference of two sine waves, folded into a repeating sawtooth ramp.
fn draw_sine_waves(width: usize, height: usize, bytes_per_pixel: usize, frequency: f32) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * bytes_per_pixel];
    if bytes_per_pixel == 0 {
        return pixels;
    }

    for (y, row) in pixels
        .chunks_exact_mut((width * bytes_per_pixel).max(1))
        .enumerate()
    {
        let phase_y = (frequency * y as f32).sin();
        for (x, px) in row.chunks_exact_mut(bytes_per_pixel).enumerate() {
            let phase = phase_y + (frequency * x as f32).sin();
            let r = (phase % 0.4) * 2.5;
            px.fill((255.0 * r) as u8);
        }
    }
    pixels
}

fn level_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:02}.bmp")
}

fn color_type(bytes_per_pixel: usize) -> Result<ExtendedColorType> {
    Ok(match bytes_per_pixel {
        1 => ExtendedColorType::L8,
        2 => ExtendedColorType::La8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        other => bail!("BMP output supports 1 to 4 bytes per pixel, got {other}"),
    })
}

fn load_input(path: &Path) -> Result<Bitmap> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let (w, h) = (dyn_img.width() as usize, dyn_img.height() as usize);

    let (bpp, data) = match dyn_img.color().channel_count() {
        1 => (1, dyn_img.into_luma8().into_raw()),
        2 => (2, dyn_img.into_luma_alpha8().into_raw()),
        3 => (3, dyn_img.into_rgb8().into_raw()),
        _ => (4, dyn_img.into_rgba8().into_raw()),
    };

    Bitmap::from_vec(w, h, bpp, data)
        .with_context(|| format!("constructing bitmap from {}", path.display()))
}

fn save_level(path: &Path, level: &Bitmap, color: ExtendedColorType) -> Result<()> {
    image::save_buffer(
        path,
        level.pixels(),
        level.width() as u32,
        level.height() as u32,
        color,
    )
    .with_context(|| format!("writing level image {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("input file does not exist: {}", path.display());
    }
    if !path.is_file() {
        bail!("input path is not a file: {}", path.display());
    }
    Ok(())
}
