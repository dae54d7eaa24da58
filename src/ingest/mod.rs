/// External data sources.
///
/// - `open_meteo` - Open-Meteo forecast API: current weather per coordinate
/// - `fixtures` (test only) - representative API response payloads

pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;
