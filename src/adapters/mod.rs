//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements     | Connects to                  |
//! |------------------|----------------|------------------------------|
//! | `attribute_sink` | ReportSink     | REPORT_CHANNEL → Zigbee stack|
//! | `console`        | (input)        | UART line commands           |
//! | `log_sink`       | ReportSink     | Serial log output            |
//! | `nvs`            | PositionStore  | NVS / in-memory store        |
//! | `time`           | Clock          | ESP32 system timer           |

pub mod attribute_sink;
pub mod console;
pub mod log_sink;
pub mod nvs;
pub mod time;
