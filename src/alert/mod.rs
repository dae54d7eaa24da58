/// Alerting for the reservoir monitoring service.
///
/// Submodules:
/// - `thresholds` - flood-limit breach evaluation, alert messages, marker styling.

pub mod thresholds;
