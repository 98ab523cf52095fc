use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lenslet_core::config::{ConfigMap, ConvertConfig};
use lenslet_core::geometry::Arrange;
use lenslet_core::io::image_io::save_gray_png;
use lenslet_core::io::{Plane, YuvPlanarFrame, YuvReader, YuvWriter};
use lenslet_core::manager::Manager;

#[derive(Parser)]
#[command(name = "lenslet", about = "Plenoptic camera to multi-view video converter")]
#[command(version)]
struct Cli {
    /// Path of the `calib.cfg` calibration file
    calib_file: PathBuf,

    /// Input yuv420p file
    #[arg(short = 'i', long = "src")]
    src: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "dst")]
    dst: PathBuf,

    /// Index of the first frame, starting from zero
    #[arg(short = 'b', long = "begin", default_value_t = 0)]
    begin: usize,

    /// Index of the end frame (exclusive)
    #[arg(short = 'e', long = "end", default_value_t = 1)]
    end: usize,

    /// Viewpoint number (V in the VxV output grid)
    #[arg(long, default_value_t = 1)]
    views: usize,

    /// The input image will be upsampled by this scale
    #[arg(long, default_value_t = 1)]
    upsample: usize,

    /// Lower bound on the patchsize, as a fraction of the MI diameter
    #[arg(long = "minPsize", default_value_t = 0.2)]
    min_psize: f32,

    /// The extracted patch will be inflated by this scale
    #[arg(long = "psizeInflate", default_value_t = 2.15)]
    psize_inflate: f32,

    /// Reserve `viewShiftRange * diameter` for view shifting
    #[arg(long = "viewShiftRange", default_value_t = 0.1)]
    view_shift_range: f32,

    /// Maximum dhash Hamming distance for temporal patchsize reuse
    #[arg(long = "psizeShortcutThreshold", default_value_t = 4)]
    psize_shortcut_threshold: u32,

    /// Save a PNG of the first rendered center view next to the outputs
    #[arg(long)]
    preview: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.end <= cli.begin {
        bail!("frame range [{}, {}) is empty", cli.begin, cli.end);
    }

    let cfg_map = ConfigMap::from_path(&cli.calib_file)
        .with_context(|| format!("reading {}", cli.calib_file.display()))?;
    let mut arrange = Arrange::from_cfg_map(&cfg_map).context("parsing calibration")?;
    arrange.upsample(cli.upsample);

    let convert = ConvertConfig {
        views: cli.views,
        upsample: cli.upsample,
        psize_inflate: cli.psize_inflate,
        view_shift_range: cli.view_shift_range,
        min_psize: cli.min_psize,
        psize_shortcut_threshold: cli.psize_shortcut_threshold,
        ..ConvertConfig::default()
    };

    let mut manager = Manager::new(arrange, &convert).context("initializing the pipeline")?;
    let src_extent = manager.src_extent()?;
    let mut reader = YuvReader::open(&cli.src, src_extent)
        .with_context(|| format!("opening {}", cli.src.display()))?;

    let available = reader.frame_count();
    if cli.end > available {
        bail!(
            "frame range [{}, {}) exceeds the {available} frames in {}",
            cli.begin,
            cli.end,
            cli.src.display()
        );
    }

    let (out_w, out_h) = manager.output_size();
    info!(out_w, out_h, views = cli.views, "pipeline ready");

    std::fs::create_dir_all(&cli.dst)
        .with_context(|| format!("creating {}", cli.dst.display()))?;

    let total_views = cli.views * cli.views;
    let mut writers = Vec::with_capacity(total_views);
    for view in 0..total_views {
        let path = cli.dst.join(format!("v{view:03}-{out_w}x{out_h}.yuv"));
        writers.push(YuvWriter::create(&path).with_context(|| format!("creating {}", path.display()))?);
    }

    reader.skip(cli.begin);

    let mut src_frame = YuvPlanarFrame::create(src_extent)?;
    let mut mv_frame = YuvPlanarFrame::create(manager.output_extent()?)?;

    let frames = cli.end - cli.begin;
    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Converting [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let center = cli.views / 2;
    for fid in cli.begin..cli.end {
        reader
            .read_into(&mut src_frame)
            .with_context(|| format!("reading frame {fid}"))?;
        manager
            .update(&src_frame)
            .with_context(|| format!("processing frame {fid}"))?;

        let mut view = 0;
        for view_row in 0..cli.views {
            for view_col in 0..cli.views {
                manager
                    .render_into(&mut mv_frame, view_row, view_col)
                    .with_context(|| format!("rendering view ({view_row}, {view_col})"))?;
                writers[view].write(&mv_frame)?;

                if cli.preview && fid == cli.begin && view_row == center && view_col == center {
                    let path = cli.dst.join("preview.png");
                    save_gray_png(mv_frame.plane(Plane::Y), &path)?;
                    info!(path = %path.display(), "saved preview");
                }
                view += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish();

    for writer in writers {
        writer.finalize()?;
    }

    println!(
        "Wrote {total_views} view streams ({out_w}x{out_h}, {frames} frames) to {}",
        cli.dst.display()
    );
    Ok(())
}
