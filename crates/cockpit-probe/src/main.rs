//! cockpit-probe: inspect and exercise cockpit HID panels
//!
//! ```text
//! cockpit-probe list
//! cockpit-probe watch [--simulate]
//! cockpit-probe led <product-id-hex> <led> <brightness>
//! cockpit-probe identify
//! ```
//!
//! Set RUST_LOG=debug (or trace for frame dumps) for verbose output.

use anyhow::{bail, Context};
use cockpit_hid::{
    default_config_path, device_name, find_known_device, load_config, ButtonPhase, DeviceEvent,
    DeviceId, DeviceRegistry, HidBackend, HidConfig, MockBackend, MockDevice, VENDOR_ID,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tick interval of the registry loop
const TICK: Duration = Duration::from_millis(20);

/// How long `identify` keeps ticking so the whole sequence goes out
const IDENTIFY_RUNTIME: Duration = Duration::from_secs(3);

fn usage() -> ! {
    eprintln!("usage: cockpit-probe <list | watch [--simulate] | led <product-id-hex> <led> <brightness> | identify>");
    std::process::exit(2);
}

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
fn native_backend() -> anyhow::Result<Arc<dyn HidBackend>> {
    Ok(Arc::new(cockpit_hid::HidApiBackend::new()))
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn native_backend() -> anyhow::Result<Arc<dyn HidBackend>> {
    bail!("no HID backend for this platform, use --simulate")
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = load_config(&default_config_path());

    match args.get(1).map(String::as_str) {
        Some("list") => list(),
        Some("watch") => {
            let simulate = args.iter().any(|arg| arg == "--simulate");
            watch(config, simulate)
        }
        Some("led") => {
            if args.len() != 5 {
                usage();
            }
            let product_id = u16::from_str_radix(args[2].trim_start_matches("0x"), 16)
                .with_context(|| format!("Invalid product id: {}", args[2]))?;
            let led: u16 = args[3].parse().with_context(|| format!("Invalid LED address: {}", args[3]))?;
            let brightness: i32 = args[4].parse().with_context(|| format!("Invalid brightness: {}", args[4]))?;
            set_led(config, product_id, led, brightness)
        }
        Some("identify") => identify(config),
        _ => usage(),
    }
}

fn list() -> anyhow::Result<()> {
    let backend = native_backend()?;
    let devices = backend.enumerate(VENDOR_ID).context("HID enumeration failed")?;

    if devices.is_empty() {
        println!("No devices with vendor id {:04x}", VENDOR_ID);
        return Ok(());
    }

    for device in devices {
        let kind = device_name(device.product_id).unwrap_or("unsupported");
        println!(
            "{:04x}:{:04x}  {:<28} {:<24} {}",
            device.vendor_id, device.product_id, kind, device.product_name, device.path
        );
    }
    Ok(())
}

/// Simulated panels: a PDC whose first button toggles every second
struct Simulation {
    pdc: Arc<MockDevice>,
    pressed: bool,
    last_toggle: Instant,
}

impl Simulation {
    fn new(backend: &MockBackend) -> Self {
        backend.plug(0xBB10, "sim/fcu");
        backend.plug(0xBF0F, "sim/mcp");
        Self {
            pdc: backend.plug(0xBB61, "sim/pdc"),
            pressed: false,
            last_toggle: Instant::now(),
        }
    }

    fn step(&mut self) {
        let mut report = [0u8; 13];
        report[0] = 1;
        if self.last_toggle.elapsed() >= Duration::from_secs(1) {
            self.pressed = !self.pressed;
            self.last_toggle = Instant::now();
        }
        report[1] = self.pressed as u8;
        self.pdc.push_report(&report);
    }
}

fn watch(config: HidConfig, simulate: bool) -> anyhow::Result<()> {
    let mut simulation = None;
    let backend: Arc<dyn HidBackend> = if simulate {
        let mock = Arc::new(MockBackend::new());
        simulation = Some(Simulation::new(&mock));
        mock
    } else {
        native_backend()?
    };

    let mut registry = DeviceRegistry::new(backend, config);
    let connected = registry.enumerate().context("HID enumeration failed")?;
    log::info!("watch: {} device(s) connected", connected);
    registry.start_hotplug()?;

    let (mut event_tx, event_rx) = flume::bounded::<DeviceEvent>(256);

    loop {
        let tick_start = Instant::now();

        if let Some(simulation) = simulation.as_mut() {
            simulation.step();
        }

        registry.update(&mut event_tx);

        for event in event_rx.try_iter() {
            match event {
                DeviceEvent::Button { device, button, phase: ButtonPhase::Continue } => {
                    log::trace!("{} button {} held", device, button);
                }
                DeviceEvent::Button { device, button, phase } => {
                    log::info!("{} button {} {:?}", device, button, phase);
                }
                DeviceEvent::Encoder { device, encoder, delta } => {
                    log::info!("{} encoder {} {:+}", device, encoder, delta);
                }
            }
        }

        std::thread::sleep(TICK.saturating_sub(tick_start.elapsed()));
    }
}

/// Write one LED frame without the connect or shutdown sequences, so the
/// LED stays as set after exit
fn set_led(config: HidConfig, product_id: u16, led: u16, brightness: i32) -> anyhow::Result<()> {
    let Some(known) = find_known_device(product_id) else {
        bail!("Unsupported product id {:04x}", product_id);
    };

    let backend = native_backend()?;
    let identity = backend
        .enumerate(VENDOR_ID)
        .context("HID enumeration failed")?
        .into_iter()
        .find(|d| d.product_id == product_id)
        .with_context(|| format!("{} is not connected", known.name))?;

    let mut device = known.create(DeviceId(0), &config);
    let frame = device.set_led(led, brightness)?;

    let handle = backend.open(&identity)?;
    let written = handle.write_report(&frame);
    handle.close();

    if !written {
        bail!("Write to {} failed", known.name);
    }
    log::info!("led: {} LED {} set to {}", known.name, led, brightness);
    Ok(())
}

fn identify(config: HidConfig) -> anyhow::Result<()> {
    let mut registry = DeviceRegistry::new(native_backend()?, config);
    registry.enumerate().context("HID enumeration failed")?;

    for device in registry.devices() {
        log::info!("identify: {} ({})", device.name, device.identity.path);
        registry.identify(device.id)?;
    }

    let mut events = Vec::new();
    let start = Instant::now();
    while start.elapsed() < IDENTIFY_RUNTIME {
        registry.update(&mut events);
        std::thread::sleep(TICK);
    }
    Ok(())
}
