//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                        |
//! |------------|-----------------|------------------------------------|
//! | `hardware` | SensorPort      | MAX31865 (SPI), HX711 (GPIO)       |
//! |            | ActuatorPort    | Heater SSR, pump relay (GPIO)      |
//! |            | WatchdogPort    | ESP-IDF task watchdog              |
//! |            | Clock           | via `time`                         |
//! | `log_sink` | EventSink       | Serial log output                  |
//! | `time`     | Clock           | ESP32 system timer                 |

pub mod hardware;
pub mod log_sink;
pub mod time;
