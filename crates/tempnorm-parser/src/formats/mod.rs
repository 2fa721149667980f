mod common;
mod multi_location;
mod station_log;
mod wide_month;

pub use common::{fahrenheit_to_celsius, NumericSetting};
pub use multi_location::{MultiLocationAdapter, MultiLocationColumns};
pub use station_log::{StationLogAdapter, StationLogColumns};
pub use wide_month::WideMonthAdapter;

pub(crate) use common::{
    deserialize_optional_setting, line_index, parse_optional_i64, parse_required_i64,
    serialize_optional_setting, temperature_cell,
};
