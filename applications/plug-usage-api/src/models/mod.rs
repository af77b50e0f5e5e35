pub mod dashboard;
pub mod report;
pub mod sample;
pub mod usage;

pub use dashboard::{
    DashboardSummary, DeviceEvent, DeviceFilter, DeviceStatus, LimitParams, PowerPoint, SensorPoint,
    UsageQueryParams,
};
pub use report::{UsageEventResponse, UsageReportResponse};
pub use sample::{IngestReading, NewSample, Sample};
pub use usage::{UsageEvent, UsageEventKind, UsageReport};
