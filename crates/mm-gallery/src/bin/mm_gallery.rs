use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::{GrayImage, RgbImage};
use morphometry::{
    ChannelFilter, Connectivity, DilationDistance, DistanceConfig, FluorescenceConfig, Image,
    Lut256, PseudoColor, Termination, dilate_binary_u8, fluorescence_composite,
    highlight_mask_border, resize_mask_nearest,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mm_gallery")]
#[command(about = "Run morphometry operations on PNG fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dilate one mask until it touches another and report the round count.
    #[command(name = "distance")]
    Distance(DistanceArgs),
    #[command(name = "dilate")]
    Dilate(DilateArgs),
    #[command(name = "border")]
    Border(InputArgs),
    #[command(name = "resize")]
    Resize(ResizeArgs),
    #[command(name = "gamma")]
    Gamma(GammaArgs),
    #[command(name = "stretch")]
    Stretch(StretchArgs),
    #[command(name = "fluor")]
    Fluor(FluorArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    C4,
    C8,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(value: ConnectivityArg) -> Self {
        match value {
            ConnectivityArg::C4 => Connectivity::C4,
            ConnectivityArg::C8 => Connectivity::C8,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct OutArgs {
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[command(flatten)]
    out: OutArgs,
}

#[derive(Args, Debug, Clone)]
struct DistanceArgs {
    /// Mask that grows; nonzero pixels are labels.
    #[arg(long, required = true)]
    growing: PathBuf,
    /// Mask that stops the growth.
    #[arg(long, required = true)]
    target: PathBuf,
    #[arg(long, value_enum, default_value_t = ConnectivityArg::C8)]
    connectivity: ConnectivityArg,
    #[arg(long)]
    max_rounds: Option<usize>,
    #[command(flatten)]
    out: OutArgs,
}

#[derive(Args, Debug, Clone)]
struct DilateArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, value_enum, default_value_t = ConnectivityArg::C8)]
    connectivity: ConnectivityArg,
}

#[derive(Args, Debug, Clone)]
struct ResizeArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, required = true)]
    width: usize,
    #[arg(long, required = true)]
    height: usize,
}

#[derive(Args, Debug, Clone)]
struct GammaArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, required = true)]
    gamma: f64,
    #[arg(long, default_value_t = 1.0)]
    gain: f64,
}

#[derive(Args, Debug, Clone)]
struct StretchArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, required = true)]
    low: u8,
    #[arg(long, required = true)]
    high: u8,
}

#[derive(Args, Debug, Clone)]
struct FluorArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, default_value_t = 100)]
    red_amp: u32,
    #[arg(long, default_value = "0xFF0000", value_parser = parse_color)]
    red_color: u32,
    #[arg(long, default_value_t = 100)]
    green_amp: u32,
    #[arg(long, default_value = "0x00FF00", value_parser = parse_color)]
    green_color: u32,
    #[arg(long, default_value_t = 100)]
    blue_amp: u32,
    #[arg(long, default_value = "0x0000FF", value_parser = parse_color)]
    blue_color: u32,
}

#[derive(Debug, Clone, Serialize)]
struct DistanceResult {
    distance: usize,
    termination: &'static str,
    total_grown: usize,
    last_round_growth: usize,
    grown_area: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaDistance {
    connectivity: &'static str,
    max_rounds: Option<usize>,
    width: usize,
    height: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaDilate {
    connectivity: &'static str,
    pixel_rule: &'static str,
    area_before: usize,
    area_after: usize,
}

#[derive(Debug, Clone, Serialize)]
struct BorderResult {
    area: usize,
    border_len: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaResize {
    src_size: [usize; 2],
    dst_size: [usize; 2],
    ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
struct MetaLut {
    operation: &'static str,
    params: serde_json::Value,
    table: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaFluor {
    identity: bool,
    channels: Vec<FilterDto>,
}

#[derive(Debug, Clone, Serialize)]
struct FilterDto {
    source: &'static str,
    amplification: u32,
    color: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Distance(args) => run_distance(args),
        Command::Dilate(args) => run_dilate(args),
        Command::Border(args) => run_border(args),
        Command::Resize(args) => run_resize(args),
        Command::Gamma(args) => run_gamma(args),
        Command::Stretch(args) => run_stretch(args),
        Command::Fluor(args) => run_fluor(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_distance(args: DistanceArgs) -> Result<()> {
    let case_dir = prepare_case(&args.out, "distance")?;
    let mut growing = load_mask(&args.growing)?;
    let target = load_mask(&args.target)?;

    let cfg = DistanceConfig {
        connectivity: args.connectivity.into(),
        max_rounds: args.max_rounds,
    };
    let report = DilationDistance::new()
        .measure(&mut growing.as_view_mut(), &target.as_view(), &cfg)
        .with_context(|| {
            format!(
                "measuring distance from {} to {}",
                args.growing.display(),
                args.target.display()
            )
        })?;

    info!(
        distance = report.distance,
        termination = termination_name(report.termination),
        "distance measured"
    );

    save_mask(case_dir.join("grown.png"), &growing)?;
    write_json(
        case_dir.join("result.json"),
        &DistanceResult {
            distance: report.distance,
            termination: termination_name(report.termination),
            total_grown: report.total_grown,
            last_round_growth: report.last_round_growth,
            grown_area: growing.as_view().count_nonzero(),
        },
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaDistance {
            connectivity: connectivity_name(cfg.connectivity),
            max_rounds: cfg.max_rounds,
            width: growing.width(),
            height: growing.height(),
        },
    )?;

    Ok(())
}

fn run_dilate(args: DilateArgs) -> Result<()> {
    let case_dir = prepare_case(&args.input.out, "dilate")?;
    let mask = load_mask(&args.input.input)?;
    let connectivity: Connectivity = args.connectivity.into();

    let dilated = dilate_binary_u8(&mask.as_view(), connectivity);
    save_mask(case_dir.join("dilated.png"), &dilated)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaDilate {
            connectivity: connectivity_name(connectivity),
            pixel_rule: "binary pixel set iff value > 0",
            area_before: mask.as_view().count_nonzero(),
            area_after: dilated.as_view().count_nonzero(),
        },
    )?;

    Ok(())
}

fn run_border(args: InputArgs) -> Result<()> {
    let case_dir = prepare_case(&args.out, "border")?;
    let mut mask = load_mask(&args.input)?;

    let stats = highlight_mask_border(&mut mask.as_view_mut());
    info!(area = stats.area, border_len = stats.border_len, "border traced");

    save_mask(case_dir.join("border.png"), &mask)?;
    write_json(
        case_dir.join("result.json"),
        &BorderResult {
            area: stats.area,
            border_len: stats.border_len,
        },
    )?;

    Ok(())
}

fn run_resize(args: ResizeArgs) -> Result<()> {
    let case_dir = prepare_case(&args.input.out, "resize")?;
    let mask = load_mask(&args.input.input)?;

    let resized = resize_mask_nearest(&mask.as_view(), args.width, args.height)
        .with_context(|| format!("resizing mask to {}x{}", args.width, args.height))?;
    save_mask(case_dir.join("resized.png"), &resized)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaResize {
            src_size: [mask.width(), mask.height()],
            dst_size: [resized.width(), resized.height()],
            ratio: mask.width() as f64 / args.width as f64,
        },
    )?;

    Ok(())
}

fn run_gamma(args: GammaArgs) -> Result<()> {
    let case_dir = prepare_case(&args.input.out, "gamma")?;
    let mut img = load_rgb(&args.input.input)?;

    let lut = Lut256::gamma(args.gamma, args.gain).context("building gamma table")?;
    lut.apply_rgb(&mut img.as_view_mut());
    save_rgb(case_dir.join("gamma.png"), img)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaLut {
            operation: "gamma",
            params: serde_json::json!({ "gamma": args.gamma, "gain": args.gain }),
            table: lut.table().to_vec(),
        },
    )?;

    Ok(())
}

fn run_stretch(args: StretchArgs) -> Result<()> {
    let case_dir = prepare_case(&args.input.out, "stretch")?;
    let mut img = load_rgb(&args.input.input)?;

    let lut = Lut256::contrast_stretch(args.low, args.high)
        .context("building contrast stretch table")?;
    lut.apply_rgb(&mut img.as_view_mut());
    save_rgb(case_dir.join("stretch.png"), img)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaLut {
            operation: "contrast_stretch",
            params: serde_json::json!({ "low": args.low, "high": args.high }),
            table: lut.table().to_vec(),
        },
    )?;

    Ok(())
}

fn run_fluor(args: FluorArgs) -> Result<()> {
    let case_dir = prepare_case(&args.input.out, "fluor")?;
    let mut img = load_rgb(&args.input.input)?;

    let cfg = FluorescenceConfig {
        red: ChannelFilter {
            amplification: args.red_amp,
            color: PseudoColor(args.red_color),
        },
        green: ChannelFilter {
            amplification: args.green_amp,
            color: PseudoColor(args.green_color),
        },
        blue: ChannelFilter {
            amplification: args.blue_amp,
            color: PseudoColor(args.blue_color),
        },
    };

    let changed = fluorescence_composite(&mut img.as_view_mut(), &cfg);
    if !changed {
        info!("identity fluorescence settings, image copied unchanged");
    }
    save_rgb(case_dir.join("fluor.png"), img)?;

    let channels = [("red", cfg.red), ("green", cfg.green), ("blue", cfg.blue)]
        .into_iter()
        .map(|(source, f)| FilterDto {
            source,
            amplification: f.amplification,
            color: format!("0x{:06X}", f.color.0),
        })
        .collect();
    write_json(
        case_dir.join("meta.json"),
        &MetaFluor {
            identity: cfg.is_identity(),
            channels,
        },
    )?;

    Ok(())
}

fn prepare_case(out: &OutArgs, case_name: &str) -> Result<PathBuf> {
    let case_dir = out.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;
    info!(case = case_name, dir = %case_dir.display(), "running case");
    Ok(case_dir)
}

fn load_mask(path: &Path) -> Result<Image<u8>> {
    ensure_file_exists(path, "mask")?;
    let dyn_img =
        image::open(path).with_context(|| format!("opening mask image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();

    Image::from_vec(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("constructing mask from {}", path.display()))
}

fn load_rgb(path: &Path) -> Result<Image<[u8; 3]>> {
    ensure_file_exists(path, "input")?;
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let rgb = dyn_img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let pixels: Vec<[u8; 3]> = rgb.pixels().map(|p| p.0).collect();

    Image::from_vec(w as usize, h as usize, pixels)
        .with_context(|| format!("constructing rgb image from {}", path.display()))
}

fn save_mask(path: PathBuf, img: &Image<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_rgb(path: PathBuf, img: Image<[u8; 3]>) -> Result<()> {
    let (w, h) = img.dims();
    let raw = img.into_vec().into_iter().flatten().collect();
    let rgb = RgbImage::from_raw(w as u32, h as u32, raw)
        .context("constructing RgbImage from raw bytes")?;
    rgb.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('#'))
        .unwrap_or(s);
    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color '{s}': {e}"))?;
    if value > 0xFF_FFFF {
        return Err(format!("color '{s}' does not fit 0xRRGGBB"));
    }
    Ok(value)
}

fn termination_name(t: Termination) -> &'static str {
    match t {
        Termination::AlreadyTouching => "AlreadyTouching",
        Termination::Touched => "Touched",
        Termination::Stalled => "Stalled",
        Termination::RoundLimit => "RoundLimit",
    }
}

fn connectivity_name(c: Connectivity) -> &'static str {
    match c {
        Connectivity::C4 => "C4",
        Connectivity::C8 => "C8",
    }
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
