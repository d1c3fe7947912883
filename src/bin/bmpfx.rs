use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::{Level, error, info};

use bmpfx::transform::{self, BrightnessContrast, Sepia};
use bmpfx::{BmpImage, Kernel, Limits, PoolConfig, WorkerPool};

type CliResult = Result<(), Box<dyn Error>>;

fn kernel_arg() -> Arg {
    Arg::new("kernel")
        .long("kernel")
        .help("Transform implementation to run")
        .value_parser(["scalar", "wide"])
        .default_value("scalar")
}

fn path_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .help(help)
        .value_parser(value_parser!(PathBuf))
        .required(true)
}

fn logging_flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .action(ArgAction::SetTrue)
        .global(true)
        .help_heading("LOGGING")
        .help(help)
}

#[rustfmt::skip]
fn create_cmd_args() -> Command {
    Command::new("bmpfx")
        .about("Apply pixel transforms to 24- and 32-bit BMP files")
        .subcommand_required(true)
        .subcommand(Command::new("sepia")
            .about("Sepia tone, split across a worker pool")
            .arg(path_arg("src", "Source image"))
            .arg(path_arg("dst", "Destination image"))
            .arg(Arg::new("threads")
                .long("threads")
                .short('t')
                .help("Worker threads [default: BMPFX_NUM_THREADS or the CPU count]")
                .value_parser(value_parser!(usize)))
            .arg(kernel_arg()))
        .subcommand(Command::new("brightness")
            .about("Brightness and contrast adjustment on one thread")
            .arg(Arg::new("brightness")
                .help("Added to every colour channel")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32))
                .required(true))
            .arg(Arg::new("contrast")
                .help("Every colour channel is multiplied by this")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32))
                .required(true))
            .arg(path_arg("src", "Source image"))
            .arg(path_arg("dst", "Destination image"))
            .arg(kernel_arg()))
        .subcommand(Command::new("info")
            .about("Print header fields")
            .arg(path_arg("src", "Source image")))
        .arg(logging_flag("debug", "Display debug information and higher"))
        .arg(logging_flag("trace", "Display very verbose information"))
        .arg(logging_flag("warn", "Display warnings and errors"))
        .arg(logging_flag("info", "Display information about the decoding options"))
}

fn setup_logger(options: &ArgMatches) {
    let log_level = if options.get_flag("debug") {
        Level::Debug
    } else if options.get_flag("trace") {
        Level::Trace
    } else if options.get_flag("warn") {
        Level::Warn
    } else if options.get_flag("info") {
        Level::Info
    } else {
        Level::Warn
    };

    if let Err(e) = simple_logger::init_with_level(log_level) {
        eprintln!("could not initialize logger: {e}");
        return;
    }
    info!("Log level: {log_level}");
}

fn path<'a>(options: &'a ArgMatches, id: &str) -> Result<&'a PathBuf, Box<dyn Error>> {
    options
        .get_one::<PathBuf>(id)
        .ok_or_else(|| format!("missing <{id}>").into())
}

fn kernel(options: &ArgMatches) -> Kernel {
    options
        .get_one::<String>("kernel")
        .and_then(|name| Kernel::from_name(name))
        .unwrap_or_default()
}

fn load(src: &Path) -> Result<BmpImage, Box<dyn Error>> {
    let start = Instant::now();
    let image = BmpImage::open(src, &Limits::default())
        .map_err(|e| format!("failed to read '{}': {e}", src.display()))?;
    info!(
        "Read {}x{} {:?} from '{}' in {:?}",
        image.width(),
        image.height(),
        image.layout(),
        src.display(),
        start.elapsed()
    );
    Ok(image)
}

fn store(image: &mut BmpImage, dst: &Path) -> CliResult {
    image
        .save(dst)
        .map_err(|e| format!("failed to write '{}': {e}", dst.display()))?;
    info!("Wrote '{}'", dst.display());
    Ok(())
}

fn run_sepia(options: &ArgMatches) -> CliResult {
    let mut image = load(path(options, "src")?)?;

    let mut config = PoolConfig::default();
    if let Some(&threads) = options.get_one::<usize>("threads") {
        config.threads = threads;
    }
    let pool = WorkerPool::with_config(&config)?;

    let start = Instant::now();
    let sepia = Arc::new(Sepia::new(kernel(options)));
    transform::apply_parallel(&pool, &mut image, sepia)?;
    info!(
        "sepia ({}) on {} threads took {:?}",
        kernel(options).as_str(),
        pool.size(),
        start.elapsed()
    );
    pool.shutdown()?;

    store(&mut image, path(options, "dst")?)
}

fn run_brightness(options: &ArgMatches) -> CliResult {
    let brightness = options.get_one::<f32>("brightness").copied().unwrap_or(0.0);
    let contrast = options.get_one::<f32>("contrast").copied().unwrap_or(1.0);
    let mut image = load(path(options, "src")?)?;

    let start = Instant::now();
    let adjust = BrightnessContrast::new(brightness, contrast, kernel(options));
    transform::apply(&mut image, &adjust);
    info!(
        "brightness {brightness} contrast {contrast} ({}) took {:?}",
        kernel(options).as_str(),
        start.elapsed()
    );

    store(&mut image, path(options, "dst")?)
}

fn run_info(options: &ArgMatches) -> CliResult {
    let src = path(options, "src")?;
    let image = load(src)?;
    let file = image.file_header();
    let dib = image.info_header();

    println!("{}", src.display());
    println!("  file size:       {}", file.file_size);
    println!("  pixel offset:    {}", file.pixel_array_offset);
    println!("  header size:     {}", dib.header_size);
    println!(
        "  dimensions:      {}x{} ({})",
        image.width(),
        image.height(),
        if image.is_top_down() { "top-down" } else { "bottom-up" }
    );
    println!("  bits per pixel:  {}", dib.bits_per_pixel);
    println!("  compression:     {}", dib.compression);
    println!("  row padding:     {}", image.row_padding());
    println!("  image size:      {}", image.image_size());
    println!(
        "  resolution:      {}x{} px/m",
        dib.x_pixels_per_meter, dib.y_pixels_per_meter
    );
    println!("  extra header:    {} bytes", image.extra_header().len());
    Ok(())
}

fn main() {
    let options = create_cmd_args().get_matches();
    setup_logger(&options);

    let result = match options.subcommand() {
        Some(("sepia", sub)) => run_sepia(sub),
        Some(("brightness", sub)) => run_brightness(sub),
        Some(("info", sub)) => run_info(sub),
        _ => Err("unknown subcommand".into()),
    };

    if let Err(e) = result {
        error!("{e}");
        exit(1);
    }
}
