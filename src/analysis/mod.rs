/// Data analysis for the reservoir monitoring service.
///
/// Submodules:
/// - `report` - history summary (extremes, latest, trend) and the text brief.

pub mod report;
