// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{crate_version, App, Arg, ArgMatches};
use failure::format_err;
use log::info;
use nebulabrot::{
    ChannelLimits, ChannelMapping, Dimensions, NebulaRenderer, PlaneWindow, PngSink, RenderConfig,
};
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

fn validate_limit(s: &str) -> Result<(), String> {
    validate_range(
        s,
        1,
        usize::max_value(),
        "Could not parse iteration limit",
        "Iteration limit must be at least 1",
    )
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const XMIN: &str = "xmin";
const XMAX: &str = "xmax";
const YMIN: &str = "ymin";
const YMAX: &str = "ymax";
const RED: &str = "red";
const GREEN: &str = "green";
const BLUE: &str = "blue";
const POINTS: &str = "points";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const QUEUE_DEPTH: &str = "queue-depth";
const DIRECT: &str = "direct-channels";
const VERBOSE: &str = "verbose";

fn bound(name: &'static str, default: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value(default)
        .validator(|s| validate_float(&s, "Could not parse plane bound"))
        .help(help)
}

fn limit(
    name: &'static str,
    short: &'static str,
    default: &'static str,
    help: &'static str,
) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .long(name)
        .short(short)
        .takes_value(true)
        .default_value(default)
        .validator(|s| validate_limit(&s))
        .help(help)
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("buddha")
        .version(crate_version!())
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Three-channel Buddhabrot (Nebulabrot) renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("out.png")
                .help("Output file (PNG)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("512x512")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(bound(XMIN, "-2", "Left edge of the plane"))
        .arg(bound(XMAX, "1", "Right edge of the plane"))
        .arg(bound(YMIN, "-1.5", "Bottom edge of the plane"))
        .arg(bound(YMAX, "1.5", "Top edge of the plane"))
        .arg(limit(RED, "r", "250", "Iteration limit for the red channel"))
        .arg(limit(GREEN, "g", "100", "Iteration limit for the green channel"))
        .arg(limit(BLUE, "b", "500", "Iteration limit for the blue channel"))
        .arg(
            Arg::with_name(POINTS)
                .long(POINTS)
                .short("p")
                .takes_value(true)
                .default_value("2560000")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        u64::max_value(),
                        "Could not parse point count",
                        "Point count out of range",
                    )
                })
                .help("Number of random points to try"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse thread count",
                        "Thread count must be at least 1",
                    )
                })
                .help("Number of sampling threads [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        u64::max_value(),
                        "Could not parse seed",
                        "Seed out of range",
                    )
                })
                .help("Seed the random generators for a reproducible render"),
        )
        .arg(
            Arg::with_name(QUEUE_DEPTH)
                .long(QUEUE_DEPTH)
                .takes_value(true)
                .default_value("4096")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        usize::max_value(),
                        "Could not parse queue depth",
                        "Queue depth out of range",
                    )
                })
                .help("Points buffered for the counter; 0 hands off directly"),
        )
        .arg(
            Arg::with_name(DIRECT)
                .long(DIRECT)
                .help("Gate each channel by its own iteration limit"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .multiple(true)
                .help("Log progress; repeat for more detail"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| format_err!("Missing value for --{}", name))?;
    T::from_str(raw).map_err(|_| format_err!("Could not parse --{} value {:?}", name, raw))
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, failure::Error> {
    let size = matches.value_of(SIZE).unwrap_or_default();
    let (width, height) = parse_pair::<usize>(size, 'x')
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;

    let dimensions = Dimensions::new(width, height)?;
    let window = PlaneWindow::new(
        value(matches, XMIN)?,
        value(matches, XMAX)?,
        value(matches, YMIN)?,
        value(matches, YMAX)?,
    )?;
    let limits = ChannelLimits::new(
        value(matches, RED)?,
        value(matches, GREEN)?,
        value(matches, BLUE)?,
    )?;
    let threads = match matches.value_of(THREADS) {
        Some(_) => value(matches, THREADS)?,
        None => num_cpus::get(),
    };
    let seed = match matches.value_of(SEED) {
        Some(_) => Some(value(matches, SEED)?),
        None => None,
    };
    let mapping = if matches.is_present(DIRECT) {
        ChannelMapping::Direct
    } else {
        ChannelMapping::Reference
    };

    Ok(RenderConfig::new(dimensions, window, limits)
        .with_points(value(matches, POINTS)?)
        .with_workers(threads)?
        .with_mapping(mapping)
        .with_seed(seed)
        .with_queue_depth(value(matches, QUEUE_DEPTH)?))
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).init();
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let config = config(matches)?;
    let mut sink = PngSink::new(matches.value_of(OUTPUT).unwrap_or("out.png"));
    let renderer = NebulaRenderer::new(config);
    let dimensions = renderer.config().dimensions();
    info!(
        "rendering {}x{} into {}",
        dimensions.width(),
        dimensions.height(),
        sink.path().display()
    );
    renderer.render_to(&mut sink)?;
    info!("wrote {}", sink.path().display());
    Ok(())
}

fn main() {
    let matches = args();
    init_logging(matches.occurrences_of(VERBOSE));

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
