use std::path::PathBuf;

use clap::Parser;

use ipts_touch::config::{self, Config, Paths};
use ipts_touch::contact::Contact;
use ipts_touch::control::Control;
use ipts_touch::daemon::{Daemon, DetectError};
use ipts_touch::device::DeviceProfile;
use ipts_touch::input::{create_touch_device, UinputSink};
use ipts_touch::touch::TouchDevice;

/// Forward Intel Precise Touch contacts to a uinput touchscreen.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding the numbered IPTS buffer nodes
    #[arg(long)]
    device_dir: Option<PathBuf>,

    /// Main configuration file
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,

    /// Directory with drop-in configuration snippets
    #[arg(long, default_value = config::CONFIG_DIR)]
    config_dir: PathBuf,

    /// Directory with per-device presets
    #[arg(long, default_value = config::PRESET_DIR)]
    preset_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Stand-in until a contact detector is linked in: frames are acknowledged
/// and the screen reports no contacts.
fn no_contacts(_frame: &[u8], _contacts: &mut Vec<Contact>) -> Result<(), DetectError> {
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let profile = DeviceProfile::current();
    let device_dir = cli
        .device_dir
        .unwrap_or_else(|| PathBuf::from(profile.device_dir));

    let control: Control = Control::open(&device_dir)?;

    let paths = Paths {
        config_file: cli.config,
        config_dir: cli.config_dir,
        preset_dir: cli.preset_dir,
    };
    let config = Config::load(&paths, control.info())?;
    log::debug!("Loaded config: {:?}", config);

    log::info!("[touch] creating uinput device…");
    let device = create_touch_device(profile, &config, control.info())?;
    let touch = TouchDevice::new(UinputSink::new(device), config, *profile);

    log::warn!("No contact detector linked, frames will produce no touch input");
    let mut daemon = Daemon::new(control, touch, no_contacts);
    daemon.run()?;

    Ok(())
}
