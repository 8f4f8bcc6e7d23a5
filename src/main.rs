//! LinkedBench controller, main entry point.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                      │
//! │                                                                 │
//! │  SeatSensors     BenchOutputs        LogEventSink  StoreSink    │
//! │  (SensorPort)    (Indicator/Display/ (EventSink)   RelaySink    │
//! │                   Chime)                                        │
//! │  ──────────────── Port Trait Boundary ───────────────────       │
//! │                                                                 │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │           BenchController (pure bench logic)            │    │
//! │  │   BenchState · occupancy policy · transitions           │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │                                                                 │
//! │  poll thread · drain thread · health thread · console thread    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use linkedbench::adapters::console;
use linkedbench::adapters::event_store::{SqliteEventLog, StoreSink};
use linkedbench::adapters::hardware::{BenchOutputs, DetachedBus, SeatSensors, TextDisplay, seat_name};
use linkedbench::adapters::log_sink::LogEventSink;
use linkedbench::adapters::mqtt_relay::{MqttRelay, RelaySink};
use linkedbench::adapters::sim_gpio::SimPin;
use linkedbench::adapters::time::MonotonicClock;
use linkedbench::app::control::ControlSurface;
use linkedbench::app::ports::{ChimePort, DisplayPort, EventLog, EventSink, IndicatorPort, SensorPort};
use linkedbench::app::service::BenchController;
use linkedbench::config::{MqttConfig, SystemConfig};
use linkedbench::diagnostics::HealthMonitor;
use linkedbench::drivers::buzzer::Buzzer;
use linkedbench::drivers::debounce::DebouncedInput;
use linkedbench::drivers::lcd::Lcd;
use linkedbench::drivers::pattern::PatternActuator;
use linkedbench::drivers::task::{DEFAULT_STACK_KB, WORKER_STACK_KB, spawn_named};
use linkedbench::events::{Dispatcher, DrainWorker, event_queue};
use linkedbench::fsm::OccupancyPolicy;

/// Cleared by SIGINT / SIGTERM.
static RUNNING: AtomicBool = AtomicBool::new(true);

// ── CLI ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HardwareBackend {
    /// Linux sysfs GPIO and i2c-dev
    Gpio,
    /// In-memory pins, display to the log
    Sim,
}

#[derive(Debug, Parser)]
#[command(name = "linkedbench", version, about = "LinkedBench smart-bench controller")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "LINKEDBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Bench identifier
    #[arg(long, env = "LINKEDBENCH_BENCH_ID")]
    bench_id: Option<String>,

    /// Occupancy policy (binary | seat_count)
    #[arg(long, env = "LINKEDBENCH_POLICY")]
    policy: Option<OccupancyPolicy>,

    /// Hardware backend
    #[arg(long, value_enum, env = "LINKEDBENCH_HARDWARE", default_value = "gpio")]
    hardware: HardwareBackend,

    /// SQLite event log path
    #[arg(long, env = "LINKEDBENCH_DB")]
    db: Option<PathBuf>,

    /// MQTT broker host (enables the relay)
    #[arg(long, env = "LINKEDBENCH_MQTT_HOST")]
    mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "LINKEDBENCH_MQTT_PORT")]
    mqtt_port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Defaults, then the config file, then flags.
    fn resolve_config(&self) -> Result<SystemConfig> {
        let mut config = match &self.config {
            Some(path) => SystemConfig::load_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SystemConfig::default(),
        };
        if let Some(id) = &self.bench_id {
            config.bench_id.clone_from(id);
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(db) = &self.db {
            config.database_path.clone_from(db);
        }
        if self.mqtt_host.is_some() || self.mqtt_port.is_some() {
            let mqtt = config.mqtt.get_or_insert_with(MqttConfig::default);
            if let Some(host) = &self.mqtt_host {
                mqtt.host.clone_from(host);
            }
            if let Some(port) = self.mqtt_port {
                mqtt.port = port;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

// ── Signals ───────────────────────────────────────────────────

extern "C" fn on_terminate(_signal: nix::libc::c_int) {
    RUNNING.store(false, Ordering::Release);
}

fn install_signal_handlers() -> Result<()> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let action = SigAction::new(
        SigHandler::Handler(on_terminate),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is
        // async-signal-safe.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("installing {signal} handler"))?;
    }
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("LinkedBench v{}", env!("CARGO_PKG_VERSION"));

    let config = args.resolve_config()?;
    install_signal_handlers()?;

    match args.hardware {
        HardwareBackend::Sim => {
            info!("Hardware: simulated pins");
            let (sensors, outputs) = build_sim(&config)?;
            run(&config, sensors, outputs)
        }
        HardwareBackend::Gpio => run_gpio(&config),
    }
}

#[cfg(target_os = "linux")]
fn run_gpio(config: &SystemConfig) -> Result<()> {
    use linkedbench::adapters::linux_i2c::LinuxI2c;
    use linkedbench::adapters::sysfs_gpio::SysfsPin;

    info!("Hardware: sysfs GPIO");
    let pins = &config.pins;
    let debounce = Duration::from_millis(config.debounce_ms);

    let mut seats = Vec::with_capacity(pins.seats.len());
    for (i, seat) in pins.seats.iter().enumerate() {
        let led = seat.feedback_led.map(SysfsPin::output).transpose()?;
        seats.push(DebouncedInput::with_feedback(
            seat_name(i),
            SysfsPin::input(seat.input)?,
            pins.seat_active_low,
            debounce,
            led,
        ));
    }
    let button = DebouncedInput::new(
        "mode_button",
        SysfsPin::input(pins.mode_button)?,
        pins.mode_button_active_low,
        debounce,
    );
    let sensors = SeatSensors::new(seats, button);

    let indicator = PatternActuator::new("indicator", SysfsPin::output(pins.indicator)?)?;
    let buzzer = Buzzer::spawn(SysfsPin::output(pins.buzzer)?)?;
    let outputs = if config.display.enabled {
        let bus = LinuxI2c::open(config.display.i2c_bus)?;
        let display = TextDisplay::probe(Lcd::new(bus, config.display.address));
        BenchOutputs::new(indicator, display, Some(buzzer))
    } else {
        BenchOutputs::new(indicator, TextDisplay::<LinuxI2c>::Log, Some(buzzer))
    };

    run(config, sensors, outputs)
}

#[cfg(not(target_os = "linux"))]
fn run_gpio(_config: &SystemConfig) -> Result<()> {
    anyhow::bail!("GPIO backend requires Linux; use --hardware sim")
}

type SimOutputs = BenchOutputs<SimPin, DetachedBus>;

/// Simulated bench: seats released, button idle, display to the log.
fn build_sim(config: &SystemConfig) -> Result<(SeatSensors<SimPin, SimPin>, SimOutputs)> {
    let pins = &config.pins;
    let debounce = Duration::from_millis(config.debounce_ms);
    let released = |active_low: bool| {
        let pin = SimPin::new();
        pin.set_level(active_low);
        pin
    };

    let seats = (0..pins.seats.len())
        .map(|i| {
            DebouncedInput::with_feedback(
                seat_name(i),
                released(pins.seat_active_low),
                pins.seat_active_low,
                debounce,
                Some(SimPin::new()),
            )
        })
        .collect();
    let button = DebouncedInput::new(
        "mode_button",
        released(pins.mode_button_active_low),
        pins.mode_button_active_low,
        debounce,
    );

    let indicator = PatternActuator::new("indicator", SimPin::new())?;
    let buzzer = Buzzer::spawn(SimPin::new())?;
    let outputs = BenchOutputs::new(indicator, TextDisplay::Log, Some(buzzer));
    Ok((SeatSensors::new(seats, button), outputs))
}

// ── Runtime ───────────────────────────────────────────────────

fn run<I, F, P, D>(
    config: &SystemConfig,
    sensors: SeatSensors<I, F>,
    outputs: BenchOutputs<P, D>,
) -> Result<()>
where
    I: InputPin + Send + 'static,
    F: OutputPin + Send + 'static,
    P: OutputPin + Send + 'static,
    D: I2c + Send + 'static,
{
    // ── Event log ─────────────────────────────────────────────
    let store = Arc::new(
        SqliteEventLog::open(&config.database_path)
            .with_context(|| format!("opening {}", config.database_path.display()))?,
    );
    info!("Event log: {}", config.database_path.display());
    if let Err(e) = store.prune(config.retention_days) {
        warn!("Event pruning failed: {}", e);
    }

    // ── Relay (best-effort) ───────────────────────────────────
    let relay = match &config.mqtt {
        Some(mqtt) => match MqttRelay::connect(mqtt, &config.bench_id) {
            Ok(relay) => Some(Arc::new(relay)),
            Err(e) => {
                warn!("MQTT relay unavailable: {}", e);
                None
            }
        },
        None => {
            info!("MQTT relay disabled");
            None
        }
    };

    // ── Pipeline ──────────────────────────────────────────────
    let (producer, consumer) = event_queue();
    let mut sinks: Vec<Box<dyn EventSink>> = vec![
        Box::new(LogEventSink::new()),
        Box::new(StoreSink::new(Arc::clone(&store))),
    ];
    if let Some(relay) = &relay {
        sinks.push(Box::new(RelaySink::new(Arc::clone(relay))));
    }
    let dispatcher = Dispatcher::new(sinks);

    let controller = Arc::new(BenchController::from_config(config, outputs, producer));
    controller.start();

    let clock = MonotonicClock::new();

    // ── Threads ───────────────────────────────────────────────
    let poll = {
        let controller = Arc::clone(&controller);
        let interval = Duration::from_millis(config.poll_interval_ms);
        let backoff = Duration::from_millis(config.sensor_fault_backoff_ms);
        let mut sensors = sensors;
        spawn_named("poll", DEFAULT_STACK_KB, move || {
            poll_loop(&controller, &mut sensors, clock, interval, backoff);
        })?
    };

    // Own stop flag: stopped only after the poll loop has exited, so its
    // last cycle's events are still flushed.
    let drain = DrainWorker::spawn(consumer, dispatcher, Duration::from_millis(config.queue_wait_ms))?;

    let health = match &relay {
        Some(relay) => {
            let monitor = HealthMonitor::new(
                config.bench_id.clone(),
                Duration::from_secs(config.health_interval_secs),
                Arc::clone(relay),
            );
            let controller = Arc::clone(&controller);
            Some(spawn_named("health", WORKER_STACK_KB, move || {
                monitor.run(&RUNNING, || (controller.status().occupied, clock.uptime_secs()));
            })?)
        }
        None => None,
    };

    // Blocked on stdin most of the time, so it is not joined.
    {
        let log: Arc<dyn EventLog> = store;
        let surface = ControlSurface::new(Arc::clone(&controller)).with_event_log(log);
        spawn_named("console", WORKER_STACK_KB, move || {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            if let Err(e) = console::serve(&surface, stdin.lock(), stdout.lock(), &RUNNING) {
                warn!("Control console failed: {}", e);
            }
        })?;
    }

    info!("Bench '{}' running", config.bench_id);

    // ── Shutdown ──────────────────────────────────────────────
    for (name, handle) in [("poll", Some(poll)), ("health", health)] {
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("{} thread panicked", name);
            }
        }
    }
    let stats = drain.finish();
    info!(
        "Drain stopped: {} event(s), {} sink failure(s)",
        stats.events, stats.sink_failures
    );
    info!("Shutting down");
    controller.shutdown();
    if let Some(relay) = relay {
        relay.close();
    }
    info!("Bench '{}' stopped", config.bench_id);
    Ok(())
}

fn poll_loop<S, H>(
    controller: &BenchController<H>,
    sensors: &mut S,
    clock: MonotonicClock,
    interval: Duration,
    backoff: Duration,
) where
    S: SensorPort,
    H: IndicatorPort + DisplayPort + ChimePort,
{
    while RUNNING.load(Ordering::Acquire) {
        let started = Instant::now();
        if let Err(e) = controller.poll_cycle(sensors, clock.now()) {
            error!("Sensor read failed: {}", e);
            std::thread::sleep(backoff);
            continue;
        }
        std::thread::sleep(interval.saturating_sub(started.elapsed()));
    }
    info!("Poll loop stopped");
}
