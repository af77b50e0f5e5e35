pub mod clock;
pub mod reconstructor;
pub mod telemetry;
pub mod threshold;
pub mod timezone;
pub mod usage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use reconstructor::UsageReconstructor;
pub use telemetry::TelemetryService;
pub use threshold::{PowerState, PowerThreshold};
pub use timezone::{DayWindow, OperatingZone};
pub use usage::UsageService;
