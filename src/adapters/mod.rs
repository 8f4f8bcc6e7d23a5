//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                     | Connects to               |
//! |---------------|--------------------------------|---------------------------|
//! | `hardware`    | SensorPort                     | debounced seat/button pins|
//! |               | IndicatorPort, DisplayPort,    | indicator LED, LCD,       |
//! |               | ChimePort                      | buzzer                    |
//! | `sysfs_gpio`  | embedded-hal digital pins      | `/sys/class/gpio`         |
//! | `linux_i2c`   | embedded-hal I2c               | `/dev/i2c-N`              |
//! | `sim_gpio`    | embedded-hal digital pins      | in-memory lines           |
//! | `log_sink`    | EventSink                      | process log               |
//! | `event_store` | EventLog, EventSink            | SQLite file               |
//! | `mqtt_relay`  | EventRelay, EventSink          | MQTT broker               |
//! | `console`     | (drives ControlSurface)        | stdin / stdout JSON lines |
//! | `time`        | monotonic clock                | `std::time::Instant`      |

pub mod console;
pub mod event_store;
pub mod hardware;
#[cfg(target_os = "linux")]
pub mod linux_i2c;
pub mod log_sink;
pub mod mqtt_relay;
pub mod sim_gpio;
pub mod sysfs_gpio;
pub mod time;
