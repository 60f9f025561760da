use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use aligned_joy::adc::Mcp3008;
use aligned_joy::button::Button;
use aligned_joy::telemetry::{self, AxisReport, SharedReport};
use aligned_joy::{
    restore_or_calibrate, Axis, AxisCalibrator, JoystickConfig, JsonFileStore, MonotonicClock,
};

const BUTTON_WINDOW: Duration = Duration::from_millis(1500);
const BUTTON_POLL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "aligned-joy")]
#[command(about = "Calibrated, axis-aligned joystick reader for an MCP3008 on a Raspberry Pi")]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "joystick.json")]
    config: PathBuf,

    /// Ignore stored calibration points and calibrate again
    #[arg(long)]
    recalibrate: bool,

    /// Do not start the WebSocket server
    #[arg(long)]
    no_telemetry: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Loading config from {:?}", cli.config);
    let config = JoystickConfig::load(&cli.config)?;

    let force = cli.recalibrate || recalibration_button_held(config.button_pin);

    let adc = Mcp3008::new()?;
    let mut joystick = AxisCalibrator::new(
        adc,
        MonotonicClock::new(),
        config.x_channel,
        config.y_channel,
    )
    .with_travel_threshold(config.travel_threshold);

    let mut store = JsonFileStore::new(&config.points_path);
    let startup = restore_or_calibrate(&mut joystick, &mut store, &config, force)?;
    info!("Joystick ready ({:?})", startup);

    let shared: SharedReport = Arc::new(Mutex::new(None));
    match config.websocket_addr.clone() {
        Some(addr) if !cli.no_telemetry => {
            let shared = Arc::clone(&shared);
            let period = config.period();
            thread::spawn(move || telemetry::telemetry_thread(&addr, shared, period));
        }
        _ => info!("Telemetry disabled"),
    }

    loop {
        let x = joystick.read_mapped(Axis::X, config.output_min, config.output_max)?;
        let y = joystick.read_mapped(Axis::Y, config.output_min, config.output_max)?;
        debug!("X={} Y={}", x, y);

        telemetry::publish(&shared, AxisReport::now(x, y, joystick.is_calibrated()));

        thread::sleep(config.period());
    }
}

fn recalibration_button_held(pin: Option<u8>) -> bool {
    let Some(pin) = pin else {
        return false;
    };
    match Button::new(pin) {
        Ok(mut button) => {
            let held = button.held_for_long_press(BUTTON_WINDOW, BUTTON_POLL);
            if held {
                info!("Button on GPIO {} held, forcing recalibration", pin);
            }
            held
        }
        Err(e) => {
            warn!("Cannot read recalibration button on GPIO {}: {}", pin, e);
            false
        }
    }
}
