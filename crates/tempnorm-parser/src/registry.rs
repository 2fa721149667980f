use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AdapterError;
use crate::formats::{MultiLocationAdapter, StationLogAdapter, WideMonthAdapter};
use crate::model::Conversion;
use crate::table::RawTable;

pub trait TemperatureAdapter {
    fn name(&self) -> &'static str;
    fn convert(&self, table: &RawTable) -> Result<Conversion, AdapterError>;

    /// Whether the adapter emits readings for more than one location.
    fn multi_location(&self) -> bool {
        false
    }
}

/// Adapter selection as written in pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    WideMonth(WideMonthAdapter),
    StationLog(StationLogAdapter),
    MultiLocation(MultiLocationAdapter),
}

impl AdapterConfig {
    pub fn adapter(&self) -> &dyn TemperatureAdapter {
        match self {
            AdapterConfig::WideMonth(adapter) => adapter,
            AdapterConfig::StationLog(adapter) => adapter,
            AdapterConfig::MultiLocation(adapter) => adapter,
        }
    }
}

pub fn convert_table(
    table: &RawTable,
    adapter: &dyn TemperatureAdapter,
) -> Result<Conversion, AdapterError> {
    let conversion = adapter.convert(table)?;
    debug!(
        adapter = adapter.name(),
        source = %table.source_id,
        rows = table.height(),
        readings = conversion.series.len(),
        malformed = conversion.counters.malformed_values,
        invalid_dates = conversion.counters.invalid_dates,
        out_of_scope = conversion.counters.out_of_scope,
        duplicates = conversion.counters.duplicates,
        "converted raw table"
    );
    Ok(conversion)
}
