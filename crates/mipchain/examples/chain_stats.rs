//! Example: build a mipmap chain from an image file and print per-level stats.
//!
//! The image is decoded as RGBA8 so every level carries 4 bytes per pixel.
//! For each level the example prints its size, buffer length and the mean of
//! every channel, which should stay close to the source means all the way
//! down to the 1x1 level.
//!
//! Run from the workspace root:
//!   cargo run -p mipchain --example chain_stats -- --help
//!   cargo run -p mipchain --example chain_stats -- --input photo.png --fold

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use mipchain::{Bitmap, MipChain, MipConfig, OddEdge};

#[derive(Parser, Debug)]
#[command(about = "Print per-level statistics of a mipmap chain")]
struct Args {
    /// Input image, any format the `image` crate decodes
    #[arg(long)]
    input: String,

    /// Merge odd trailing rows/columns into the last pixel instead of dropping them
    #[arg(long, default_value_t = false)]
    fold: bool,
}

fn channel_means(level: &Bitmap) -> Vec<f64> {
    let bpp = level.bytes_per_pixel();
    let mut sums = vec![0u64; bpp];
    for px in level.pixels().chunks_exact(bpp) {
        for (sum, &v) in sums.iter_mut().zip(px) {
            *sum += v as u64;
        }
    }
    let n = (level.width() * level.height()) as f64;
    sums.into_iter().map(|s| s as f64 / n).collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let rgba = ImageReader::open(&args.input)
        .with_context(|| format!("opening {}", args.input))?
        .decode()
        .with_context(|| format!("decoding {}", args.input))?
        .into_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    let src = Bitmap::from_vec(width, height, 4, rgba.into_raw()).context("building bitmap")?;

    let cfg = MipConfig {
        odd_edge: if args.fold { OddEdge::Fold } else { OddEdge::Drop },
        ..MipConfig::default()
    };

    let t0 = Instant::now();
    let chain = MipChain::generate_with_config(&src, &cfg).context("generating mip chain")?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    println!(
        "{}: {width}x{height}, {} levels, {} bytes total ({elapsed_ms:.2} ms)",
        args.input,
        chain.len(),
        chain.total_bytes()
    );
    for (i, level) in chain.iter().enumerate() {
        let means: Vec<String> = channel_means(level)
            .iter()
            .map(|m| format!("{m:6.2}"))
            .collect();
        println!(
            "  level {i:2}: {:5}x{:<5} {:9} bytes  mean [{}]",
            level.width(),
            level.height(),
            level.pixels().len(),
            means.join(", ")
        );
    }

    chain.free();
    Ok(())
}
