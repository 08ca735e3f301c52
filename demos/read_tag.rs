//! Connect to a reader, set transmit power and read one tag.
//!
//! Usage: `cargo run --example read_tag --features serial -- /dev/ttyUSB0 [baud] [dBm]`
//! Set `RUST_LOG=debug` to see the bytes on the wire.

use std::time::Duration;
use uhflib::{DEFAULT_BAUD_RATE, PortSettings, ReaderSession, SerialTransport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("missing serial port path")?;
    let baud_rate = match args.next() {
        Some(baud) => baud.parse()?,
        None => DEFAULT_BAUD_RATE,
    };
    let power = match args.next() {
        Some(dbm) => dbm.parse()?,
        None => 20,
    };

    let mut reader = ReaderSession::<SerialTransport>::new();
    reader.connect(&port, baud_rate, PortSettings::default())?;

    let ack = reader.set_power_level(power, Duration::from_secs(1))?;
    println!("SET_PWR {}: {}", power, ack);

    let timeout = reader.config().default_timeout;
    match reader.read_tag(timeout) {
        Ok(tag) => println!("Tag Data: {}", tag),
        Err(e) => eprintln!("Read failed: {}", e),
    }

    reader.disconnect();
    Ok(())
}
