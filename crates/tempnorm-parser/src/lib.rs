pub mod calendar;
pub mod errors;
pub mod formats;
pub mod model;
mod registry;
pub mod table;

pub use calendar::{date_from_parts, MonthLabel};
pub use errors::AdapterError;
pub use formats::{
    MultiLocationAdapter, MultiLocationColumns, NumericSetting, StationLogAdapter,
    StationLogColumns, WideMonthAdapter,
};
pub use model::{CanonicalSeries, Conversion, ConversionCounters, Reading};
pub use registry::{convert_table, AdapterConfig, TemperatureAdapter};
pub use table::RawTable;

#[cfg(test)]
mod tests;
