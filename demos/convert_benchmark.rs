use std::hint::black_box;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use surface_convert::{
    ConversionOptions, DepthUpload, DepthWritePolicy, ImageLayout, ImageUpload, LoggingConfig,
    MemorySurface, NativeFormat, Rect, SourceImageFormat, SurfaceExtent, SurfaceTarget,
    convert::{self, DEPTH_SAMPLE_BYTES},
    init_logging, upload_depth, upload_image,
};

const DEFAULT_WARMUP_ITERS: usize = 8;
const DEFAULT_MEASURE_ITERS: usize = 60;

#[derive(Clone, Copy, Debug)]
enum Payload {
    Color(SourceImageFormat),
    Depth(DepthWritePolicy),
}

#[derive(Clone, Copy, Debug)]
struct Scenario {
    name: &'static str,
    payload: Payload,
    surface_format: NativeFormat,
    width: u32,
    height: u32,
    row_pitch_align: usize,
    fast_path: bool,
}

#[derive(Clone, Debug)]
struct BenchResult {
    scenario: &'static str,
    avg_ms: f64,
    p50_ms: f64,
    p95_ms: f64,
    min_ms: f64,
    max_ms: f64,
    mpix_per_s: f64,
}

#[derive(Clone, Debug)]
struct Config {
    warmup_iters: usize,
    measure_iters: usize,
    scenario_filter: Option<String>,
}

fn parse_usize_arg(flag: &str, value: Option<&str>) -> Result<usize> {
    let Some(raw) = value else {
        bail!("{flag} requires a value");
    };
    raw.parse::<usize>()
        .with_context(|| format!("failed to parse {flag} value: {raw}"))
}

fn parse_args() -> Result<Config> {
    let mut config = Config {
        warmup_iters: DEFAULT_WARMUP_ITERS,
        measure_iters: DEFAULT_MEASURE_ITERS,
        scenario_filter: None,
    };

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--warmup" => {
                config.warmup_iters =
                    parse_usize_arg("--warmup", args.get(i + 1).map(String::as_str))?;
                i += 2;
            }
            "--iters" => {
                config.measure_iters =
                    parse_usize_arg("--iters", args.get(i + 1).map(String::as_str))?;
                i += 2;
            }
            "--scenario" => {
                let Some(raw) = args.get(i + 1) else {
                    bail!("--scenario requires a value (scenario name or `all`)");
                };
                let trimmed = raw.trim();
                if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("all") {
                    config.scenario_filter = Some(trimmed.to_ascii_lowercase());
                }
                i += 2;
            }
            other => bail!("unknown argument `{other}` (use --warmup, --iters, --scenario)"),
        }
    }

    if config.measure_iters == 0 {
        bail!("--iters must be greater than zero");
    }
    Ok(config)
}

fn scenario_catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "bgra_to_argb8888_fast",
            payload: Payload::Color(SourceImageFormat::Bgra8),
            surface_format: NativeFormat::A8R8G8B8,
            width: 2048,
            height: 2048,
            row_pitch_align: 256,
            fast_path: true,
        },
        Scenario {
            name: "bgra_to_argb8888_generic",
            payload: Payload::Color(SourceImageFormat::Bgra8),
            surface_format: NativeFormat::A8R8G8B8,
            width: 2048,
            height: 2048,
            row_pitch_align: 256,
            fast_path: false,
        },
        Scenario {
            name: "rgba_to_r5g6b5",
            payload: Payload::Color(SourceImageFormat::Rgba8),
            surface_format: NativeFormat::R5G6B5,
            width: 1919,
            height: 1079,
            row_pitch_align: 64,
            fast_path: true,
        },
        Scenario {
            name: "rgb_to_argb4444",
            payload: Payload::Color(SourceImageFormat::Rgb8),
            surface_format: NativeFormat::A4R4G4B4,
            width: 1024,
            height: 1024,
            row_pitch_align: 4,
            fast_path: true,
        },
        Scenario {
            name: "depth_d24s8_compare_less",
            payload: Payload::Depth(DepthWritePolicy::CompareLess),
            surface_format: NativeFormat::D24S8,
            width: 1920,
            height: 1080,
            row_pitch_align: 256,
            fast_path: true,
        },
    ]
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let idx = ((n - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
    sorted[idx]
}

fn make_surface(scenario: &Scenario) -> Result<MemorySurface> {
    let bytes_per_pixel = if scenario.surface_format.is_depth() {
        surface_convert::depth_descriptor_for(scenario.surface_format)?.bytes_per_pixel()
    } else {
        surface_convert::color_descriptor_for(scenario.surface_format).bytes_per_pixel()
    };
    let row_pitch = align_up(
        scenario.width as usize * bytes_per_pixel,
        scenario.row_pitch_align,
    );
    MemorySurface::with_row_pitch(
        scenario.surface_format,
        SurfaceExtent::plane(scenario.width, scenario.height),
        row_pitch,
    )
    .with_context(|| format!("failed to allocate surface for {}", scenario.name))
}

fn run_scenario(scenario: Scenario, warmup_iters: usize, measure_iters: usize) -> Result<BenchResult> {
    let mut surface = make_surface(&scenario)?;
    let options = ConversionOptions {
        fast_path: scenario.fast_path,
        ..ConversionOptions::default()
    };
    let rect = Rect::full(scenario.width, scenario.height);
    let bytes_per_pixel = match scenario.payload {
        Payload::Color(format) => format.bytes_per_pixel(),
        Payload::Depth(_) => DEPTH_SAMPLE_BYTES,
    };
    let layout = ImageLayout::packed(scenario.width, scenario.height, bytes_per_pixel);
    let pixels: Vec<u8> = (0..layout.byte_len())
        .map(|i| (i.wrapping_mul(31) >> 3) as u8)
        .collect();

    let run_once = |surface: &mut MemorySurface| -> Result<()> {
        let pixels = black_box(pixels.as_slice());
        match scenario.payload {
            Payload::Color(format) => upload_image(
                surface,
                ImageUpload {
                    pixels,
                    format,
                    layout,
                    rect,
                    target: SurfaceTarget::Plain,
                },
                &options,
            )?,
            Payload::Depth(write_policy) => upload_depth(
                surface,
                DepthUpload {
                    samples: pixels,
                    layout,
                    rect,
                    target: SurfaceTarget::Plain,
                    write_policy,
                    normalize_float: false,
                    stencil_value: 0,
                },
                &options,
            )?,
        }
        black_box(surface.bytes());
        Ok(())
    };

    for _ in 0..warmup_iters {
        run_once(&mut surface)?;
    }

    let mut samples_ms = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let t0 = Instant::now();
        run_once(&mut surface)?;
        samples_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
    }

    let mut sorted = samples_ms.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let avg_ms = samples_ms.iter().sum::<f64>() / samples_ms.len() as f64;
    let pixels_per_iter = f64::from(scenario.width) * f64::from(scenario.height);

    Ok(BenchResult {
        scenario: scenario.name,
        avg_ms,
        p50_ms: percentile(&sorted, 0.50),
        p95_ms: percentile(&sorted, 0.95),
        min_ms: sorted.first().copied().unwrap_or_default(),
        max_ms: sorted.last().copied().unwrap_or_default(),
        mpix_per_s: if avg_ms > 0.0 {
            pixels_per_iter / avg_ms / 1000.0
        } else {
            0.0
        },
    })
}

fn print_results(results: &[BenchResult]) {
    println!(
        "{:<28} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "scenario", "avg_ms", "p50_ms", "p95_ms", "min_ms", "max_ms", "Mpix/s"
    );
    for result in results {
        println!(
            "{:<28} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.1}",
            result.scenario,
            result.avg_ms,
            result.p50_ms,
            result.p95_ms,
            result.min_ms,
            result.max_ms,
            result.mpix_per_s,
        );
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let config = parse_args()?;

    let scenarios: Vec<Scenario> = scenario_catalog()
        .into_iter()
        .filter(|scenario| {
            config
                .scenario_filter
                .as_ref()
                .is_none_or(|needle| scenario.name.eq_ignore_ascii_case(needle))
        })
        .collect();
    if scenarios.is_empty() {
        bail!("no scenarios matched the requested filter");
    }

    convert::warmup();
    println!(
        "Running conversion benchmark: warmup={} iters={}",
        config.warmup_iters, config.measure_iters
    );

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        println!("Benchmarking {}...", scenario.name);
        results.push(run_scenario(
            scenario,
            config.warmup_iters,
            config.measure_iters,
        )?);
    }

    print_results(&results);
    Ok(())
}
