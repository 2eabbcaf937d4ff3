use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;
use clap_verbosity::Verbosity;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma};
use ptouch::{
    raster, Bitmap, ColorSpace, FileBackend, ImageSource, Mode, PrintJob, Session, SessionConfig,
    TapeWidth,
};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
struct Cli {
    /// Serial number of the printer to use.
    #[arg(short, long)]
    printer: Option<String>,

    /// Path to a printer device file, instead of looking for USB printers.
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Timeout for a single transfer, in seconds.
    #[arg(short, long, default_value_t = 15)]
    timeout: u64,

    /// How many empty status reads to wait for the print to finish.
    #[arg(long, default_value_t = 20)]
    poll_attempts: u32,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported printers.
    Discover,

    /// Show the loaded tape and the printer's errors.
    Info,

    /// Print an image.
    Print(PrintArgs),
}

#[derive(clap::Args)]
struct PrintArgs {
    /// Path to the image to be printed.
    #[arg(short, long)]
    file: PathBuf,

    /// Rotate the image counter-clockwise by this many degrees.
    #[arg(short, long, value_enum, default_value_t = Rotation::Auto)]
    rotate: Rotation,

    /// Cut margin in dots.
    #[arg(short, long, default_value_t = 0, value_parser = maybe_hex::<u16>)]
    margin: u16,

    /// Invert the printed image.
    #[arg(short, long)]
    invert: bool,

    /// Don't cut the tape after printing the label.
    #[arg(short, long)]
    no_cut: bool,

    /// Print mirrored.
    #[arg(long)]
    mirror: bool,

    /// Tape width in mm, instead of asking the printer. Useful with `--show`.
    #[arg(short = 'T', long)]
    tape: Option<u8>,

    /// Show the label instead of printing.
    #[arg(short, long)]
    show: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Rotation {
    /// Rotate by 90 degrees, if that is the only way to fit the tape.
    Auto,
    #[value(name = "0")]
    R0,
    #[value(name = "90")]
    R90,
    #[value(name = "180")]
    R180,
    #[value(name = "270")]
    R270,
}

/// A decoded image file.
struct Picture(DynamicImage);

impl ImageSource for Picture {
    fn width(&self) -> u32 {
        self.0.width()
    }

    fn height(&self) -> u32 {
        self.0.height()
    }

    fn color_space(&self) -> ColorSpace {
        match &self.0 {
            DynamicImage::ImageLuma8(_) => ColorSpace::Gray,
            DynamicImage::ImageRgb8(_) => ColorSpace::Rgb,
            DynamicImage::ImageRgba8(_) => ColorSpace::Rgba,
            img => ColorSpace::Other(format!("{:?}", img.color())),
        }
    }

    fn pixel(&self, x: u32, y: u32) -> &[u8] {
        match &self.0 {
            DynamicImage::ImageLuma8(img) => img.get_pixel(x, y).0.as_slice(),
            DynamicImage::ImageRgb8(img) => img.get_pixel(x, y).0.as_slice(),
            DynamicImage::ImageRgba8(img) => img.get_pixel(x, y).0.as_slice(),
            _ => &[],
        }
    }
}

fn rotate(img: DynamicImage, rotation: Rotation) -> DynamicImage {
    // `image` rotates clockwise
    match rotation {
        Rotation::Auto | Rotation::R0 => img,
        Rotation::R90 => img.rotate270(),
        Rotation::R180 => img.rotate180(),
        Rotation::R270 => img.rotate90(),
    }
}

fn label(args: &PrintArgs, tape: TapeWidth) -> Result<Bitmap> {
    log::trace!("parsing...");
    let img = ImageReader::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("cannot decode {}", args.file.display()))?;

    log::trace!("rotating...");
    let picture = Picture(rotate(img, args.rotate));

    log::trace!("reducing...");
    let mut bitmap = raster::reduce(&picture)?;
    if args.invert {
        bitmap.invert();
    }

    if args.rotate == Rotation::Auto {
        let (width, height) = (bitmap.width(), bitmap.height());
        bitmap = raster::fit(bitmap, tape).with_context(|| {
            format!(
                "Could not auto-rotate image, at least one dimension needs to match the tape width ({width}, {height}) vs {}",
                tape.printable_pins()
            )
        })?;
    } else if bitmap.height() != tape.printable_pins() {
        bail!(
            "Height of output image does not match tape-width ({}, {}) vs {}",
            bitmap.width(),
            bitmap.height(),
            tape.printable_pins()
        );
    }

    Ok(bitmap)
}

fn preview(bitmap: &Bitmap) -> Result<()> {
    let img = GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| match bitmap.get(x, y) {
        Some(true) => Luma([0x00]),
        _ => Luma([0xff]),
    });

    let temppath = std::env::temp_dir().join("ptouch-preview.png");
    img.save_with_format(&temppath, ImageFormat::Png)?;
    open::that(&temppath)?;
    Ok(())
}

fn connect(cli: &Cli) -> Result<Session> {
    let config = SessionConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_poll_attempts(cli.poll_attempts);

    if let Some(dev) = &cli.device {
        let backend = FileBackend::open(dev)
            .with_context(|| format!("cannot open {}", dev.display()))?;
        return Ok(Session::new(backend, config));
    }

    log::trace!("searching for printer...");
    let printers = ptouch::discover(cli.printer.as_deref()).context("cannot get list of usb devices")?;
    let Some(identity) = printers.first() else {
        bail!("No supported printers found, make sure the device is switched on");
    };

    Session::open(identity, config).with_context(|| format!("cannot open {identity}"))
}

fn discover(cli: &Cli) -> Result<()> {
    let printers = ptouch::discover(cli.printer.as_deref()).context("cannot get list of usb devices")?;
    if printers.is_empty() {
        bail!("No supported printers found, make sure the device is switched on");
    }

    println!("Discovered printers ...");
    println!("      Vendor\tModel\t\tSerial");
    for (i, printer) in printers.iter().enumerate() {
        let model = printer.model.to_string();
        println!(
            " ({:2}) {}\t{}\t{}",
            i + 1,
            printer.manufacturer.as_deref().unwrap_or("Brother"),
            printer.product.as_deref().unwrap_or(&model),
            printer.serial_number,
        );
    }

    Ok(())
}

fn info(cli: &Cli) -> Result<()> {
    let mut session = connect(cli)?;
    let status = session.status().context("cannot query printer status")?;

    match (session.identity(), &cli.device) {
        (Some(identity), _) => println!("{identity}:"),
        (None, Some(dev)) => println!("{}:", dev.display()),
        (None, None) => {}
    }
    println!("{status}");
    Ok(())
}

fn print(cli: &Cli, args: &PrintArgs) -> Result<()> {
    let mut session = None;
    let tape = match args.tape {
        Some(mm) => TapeWidth::try_from(mm)?,
        None => {
            let s = session.insert(connect(cli)?);
            let status = s.status().context("cannot query printer status")?;
            status
                .tape_width()
                .with_context(|| format!("cannot print on the loaded tape:\n{status}"))?
        }
    };
    log::debug!("printing on {tape} tape");

    let bitmap = label(args, tape)?;

    if args.show {
        return preview(&bitmap);
    }

    let mut mode = Mode::empty();
    mode.set(Mode::AUTO_CUT, !args.no_cut);
    mode.set(Mode::MIRROR_PRINTING, args.mirror);

    let lines = raster::encode(&bitmap, tape)?;
    let job = PrintJob::new(lines, tape, args.margin).with_mode(mode);

    let mut session = match session {
        Some(session) => session,
        None => connect(cli)?,
    };
    session.print(job).context("printing failed")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match &cli.command {
        Command::Discover => discover(&cli),
        Command::Info => info(&cli),
        Command::Print(args) => print(&cli, args),
    }
}
