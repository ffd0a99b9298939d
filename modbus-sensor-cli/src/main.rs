//! Command-line client for the Modbus RTU temperature sensor

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use modbus_sensor::*;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    BadRange(#[from] InvalidRange),
    #[error("{0}")]
    Request(#[from] RequestError),
}

#[derive(Parser)]
#[command(name = "modbus-sensor-cli")]
#[command(about = "A command line program for reading a Modbus RTU temperature sensor")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "/dev/ttyUSB0", help = "The serial device the RS-485 adapter is on")]
    port: String,

    #[arg(short = 'b', long, default_value_t = constants::serial::BAUD_RATE, help = "Baud rate of the bus")]
    baud: u32,

    #[arg(short = 'i', long, default_value = "1", help = "The unit id of the sensor")]
    id: u8,

    #[arg(short = 't', long, default_value = "2000", help = "Receive timeout of a single request in milliseconds")]
    timeout_ms: u64,

    #[arg(long, default_value = "100", help = "Line silence in milliseconds that completes a response")]
    inter_byte_ms: u64,

    #[arg(short = 'p', long, help = "Optional polling period in milliseconds")]
    period: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "read", about = "read the temperature")]
    Read(ReadArgs),

    #[command(name = "read-raw", about = "read input registers and print them")]
    ReadRaw(ReadRawArgs),

    #[command(name = "scan", about = "locate the sensor on the bus")]
    Scan(ScanArgs),
}

#[derive(Args)]
struct ReadArgs {
    #[arg(long, help = "issue a single request and keep an all-zero reading")]
    first_attempt_only: bool,
}

#[derive(Args)]
struct ReadRawArgs {
    #[arg(short = 's', long, default_value_t = constants::sensor::TEMPERATURE_REGISTER, help = "the starting address")]
    start: u16,

    #[arg(short = 'q', long, default_value_t = constants::sensor::REGISTER_COUNT, help = "quantity of registers")]
    quantity: u16,
}

#[derive(Args)]
struct ScanArgs {
    #[arg(long, default_value_t = constants::scan::SLAVE_MIN.value, help = "first slave address to probe")]
    min: u8,

    #[arg(long, default_value_t = constants::scan::SLAVE_MAX.value, help = "last slave address to probe")]
    max: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    if let Err(ref e) = run() {
        println!("error: {e}");
    }

    Ok(())
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let sensor = SensorSettings {
        unit_id: UnitId::new(cli.id),
        ..Default::default()
    };

    let mut session = SessionBuilder::new()
        .baud_rate(cli.baud)
        .rx_timeout(Duration::from_millis(cli.timeout_ms))
        .inter_byte_timeout(Duration::from_millis(cli.inter_byte_ms))
        .sensor_settings(sensor)
        .decode_level(AppDecodeLevel::DataValues.into())
        .init(NativePort::new(&cli.port), SystemClock::new())?;

    match cli.period {
        None => run_command(&cli.command, &mut session),
        Some(period_ms) => {
            let period = Duration::from_millis(period_ms);
            loop {
                match run_command(&cli.command, &mut session) {
                    Ok(()) => {}
                    // a missed poll is reported and the next one attempted
                    Err(Error::Request(err)) if err.is_io_failure() => tracing::warn!("{err}"),
                    Err(err) => return Err(err),
                }
                std::thread::sleep(period);
            }
        }
    }
}

fn run_command<P, C>(command: &Command, session: &mut Session<P, C>) -> Result<(), Error>
where
    P: SerialPort,
    C: Clock,
{
    match command {
        Command::Read(args) => {
            let temperature = if args.first_attempt_only {
                session.read_first_attempt_only()?
            } else {
                session.request_receive_temperature()?
            };
            println!("temperature: {temperature}");
        }
        Command::ReadRaw(args) => {
            let range = AddressRange::try_from(args.start, args.quantity)?;
            let unit = session.sensor_settings().unit_id;
            let response = session.client()?.read_input_registers(unit, range)?;
            for (offset, word) in response.as_bytes().chunks_exact(2).enumerate() {
                let value = u16::from_be_bytes([word[0], word[1]]);
                println!("index: {} value: {}", usize::from(range.start) + offset, value);
            }
        }
        Command::Scan(args) => {
            let range = ScanRange::new(UnitId::new(args.min), UnitId::new(args.max));
            let found = session.scan_for_temperature_sensor(range)?;
            println!(
                "found sensor on slave {} reading {}",
                found.unit_id, found.temperature
            );
        }
    }
    Ok(())
}
