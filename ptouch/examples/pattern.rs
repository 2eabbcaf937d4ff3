use ptouch::{Bitmap, PrintJob, Session, SessionConfig};

fn main() {
    let printers = ptouch::discover(None).expect("cannot list usb devices");
    let identity = printers.first().expect("no printer found");
    let mut session = Session::open(identity, SessionConfig::default()).expect("cannot open printer");

    let status = session.status().expect("cannot query status");
    let tape = status.tape_width().expect("unsupported tape");

    // stripes of 8 dots, alternating every 8 columns
    let bitmap = Bitmap::from_fn(256, tape.printable_pins(), |x, y| (x / 8 + y / 8) % 2 == 0);

    let job = PrintJob::from_image(&bitmap, tape, 0).expect("cannot rasterize pattern");
    session.print(job).expect("failed to print pattern");
}
