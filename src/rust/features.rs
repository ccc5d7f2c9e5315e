//! Feature-vector assembly.
//!
//! The trained model expects one row whose columns are a mix of user metrics,
//! a fixed headshot default and zeroed playstyle indicators, in the exact order
//! the model was trained with. [`FeatureAssembler`] resolves every column of a
//! model [`Schema`] to one of those sources up front, so a retrained model with
//! an unfamiliar column fails loudly instead of receiving a guessed value.

use std::fmt;

use log::debug;

use crate::classifier::Schema;
use crate::error::{RecommendError, Result};

/// Headshot percentage assumed for every player; the form does not collect it.
pub const HEADSHOT_PCT_DEFAULT: f32 = 0.25;

/// Column name of the headshot percentage field.
pub const HEADSHOT_PCT_FIELD: &str = "headshot_pct";

/// Prefix of the one-hot playstyle indicator columns.
pub const PLAYSTYLE_PREFIX: &str = "playstyle_";

/// Playstyle indicator columns of the trained column set, as carried by the
/// bundled `models/role_model.json` fixture. Any `playstyle_*` column is
/// accepted; these are listed for reference and tests.
pub const PLAYSTYLE_FIELDS: [&str; 3] = [
    "playstyle_Aim-Focused Duelists",
    "playstyle_Low-Impact / Learning Players",
    "playstyle_Utility & Clutch Specialists",
];

/// One of the seven metrics a player enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    KillsPerMatch,
    DeathsPerMatch,
    AssistsPerMatch,
    Acs,
    UtilityUsage,
    ClutchSuccessRate,
    WinRate,
}

/// Range and default of a metric as offered by the input form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl MetricBounds {
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::KillsPerMatch,
        Metric::DeathsPerMatch,
        Metric::AssistsPerMatch,
        Metric::Acs,
        Metric::UtilityUsage,
        Metric::ClutchSuccessRate,
        Metric::WinRate,
    ];

    /// Column name the model was trained with.
    pub fn field_name(self) -> &'static str {
        match self {
            Metric::KillsPerMatch => "kills_per_match",
            Metric::DeathsPerMatch => "deaths_per_match",
            Metric::AssistsPerMatch => "assists_per_match",
            Metric::Acs => "acs",
            Metric::UtilityUsage => "utility_usage",
            Metric::ClutchSuccessRate => "clutch_success_rate",
            Metric::WinRate => "win_rate",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.field_name() == name)
    }

    pub fn bounds(self) -> MetricBounds {
        let (min, max, default) = match self {
            Metric::KillsPerMatch => (0.0, 45.0, 18.0),
            Metric::DeathsPerMatch => (0.0, 30.0, 14.0),
            Metric::AssistsPerMatch => (0.0, 20.0, 6.0),
            Metric::Acs => (50.0, 350.0, 200.0),
            Metric::UtilityUsage => (0.0, 1.0, 0.5),
            Metric::ClutchSuccessRate => (0.0, 1.0, 0.3),
            Metric::WinRate => (0.0, 1.0, 0.5),
        };
        MetricBounds { min, max, default }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// The seven per-match metrics collected from the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMetrics {
    pub kills_per_match: f32,
    pub deaths_per_match: f32,
    pub assists_per_match: f32,
    pub acs: f32,
    pub utility_usage: f32,
    pub clutch_success_rate: f32,
    pub win_rate: f32,
}

impl PlayerMetrics {
    fn from_fn(f: impl Fn(MetricBounds) -> f32) -> Self {
        Self {
            kills_per_match: f(Metric::KillsPerMatch.bounds()),
            deaths_per_match: f(Metric::DeathsPerMatch.bounds()),
            assists_per_match: f(Metric::AssistsPerMatch.bounds()),
            acs: f(Metric::Acs.bounds()),
            utility_usage: f(Metric::UtilityUsage.bounds()),
            clutch_success_rate: f(Metric::ClutchSuccessRate.bounds()),
            win_rate: f(Metric::WinRate.bounds()),
        }
    }

    /// Every metric at the bottom of its range.
    pub fn minimum() -> Self {
        Self::from_fn(|b| b.min)
    }

    /// Every metric at the top of its range.
    pub fn maximum() -> Self {
        Self::from_fn(|b| b.max)
    }

    pub fn get(&self, metric: Metric) -> f32 {
        match metric {
            Metric::KillsPerMatch => self.kills_per_match,
            Metric::DeathsPerMatch => self.deaths_per_match,
            Metric::AssistsPerMatch => self.assists_per_match,
            Metric::Acs => self.acs,
            Metric::UtilityUsage => self.utility_usage,
            Metric::ClutchSuccessRate => self.clutch_success_rate,
            Metric::WinRate => self.win_rate,
        }
    }
}

impl Default for PlayerMetrics {
    fn default() -> Self {
        Self::from_fn(|b| b.default)
    }
}

/// A single named, ordered row of model input.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f32>,
}

impl FeatureVector {
    /// Builds a vector from explicit `(name, value)` columns.
    ///
    /// Prefer [`FeatureAssembler::assemble`]; this exists for callers that
    /// already hold a row in model order.
    pub fn from_columns<N: Into<String>>(columns: impl IntoIterator<Item = (N, f32)>) -> Self {
        let (names, values) = columns.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldSource {
    Metric(Metric),
    HeadshotDefault,
    Indicator,
}

impl FieldSource {
    fn value(self, metrics: &PlayerMetrics) -> f32 {
        match self {
            FieldSource::Metric(metric) => metrics.get(metric),
            FieldSource::HeadshotDefault => HEADSHOT_PCT_DEFAULT,
            FieldSource::Indicator => 0.0,
        }
    }
}

/// A schema whose every column has been resolved to a source.
///
/// Resolving once and reusing the plan keeps per-request assembly to a
/// straight copy.
#[derive(Debug, Clone)]
pub struct FeaturePlan {
    names: Vec<String>,
    sources: Vec<FieldSource>,
}

impl FeaturePlan {
    pub fn fill(&self, metrics: &PlayerMetrics) -> FeatureVector {
        FeatureVector {
            names: self.names.clone(),
            values: self.sources.iter().map(|s| s.value(metrics)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builds model input rows from [`PlayerMetrics`].
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    indicator_prefix: String,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAssembler {
    pub fn new() -> Self {
        Self {
            indicator_prefix: PLAYSTYLE_PREFIX.to_string(),
        }
    }

    /// Treats columns starting with `prefix` as zeroed one-hot indicators.
    pub fn with_indicator_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.indicator_prefix = prefix.into();
        self
    }

    fn resolve(&self, field: &str) -> Option<FieldSource> {
        if let Some(metric) = Metric::from_field_name(field) {
            return Some(FieldSource::Metric(metric));
        }
        if field == HEADSHOT_PCT_FIELD {
            return Some(FieldSource::HeadshotDefault);
        }
        if !self.indicator_prefix.is_empty()
            && field.len() > self.indicator_prefix.len()
            && field.starts_with(&self.indicator_prefix)
        {
            return Some(FieldSource::Indicator);
        }
        None
    }

    /// Resolves every schema column, failing on the first one we cannot produce.
    pub fn plan(&self, schema: &Schema) -> Result<FeaturePlan> {
        let sources = schema
            .iter()
            .map(|field| {
                self.resolve(field)
                    .ok_or_else(|| RecommendError::MissingFeature(field.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let indicators = sources.iter().filter(|s| **s == FieldSource::Indicator).count();
        debug!(
            "Resolved {} schema fields ({} zeroed indicator fields)",
            sources.len(),
            indicators
        );

        Ok(FeaturePlan {
            names: schema.fields().to_vec(),
            sources,
        })
    }

    pub fn assemble(&self, metrics: &PlayerMetrics, schema: &Schema) -> Result<FeatureVector> {
        Ok(self.plan(schema)?.fill(metrics))
    }
}

/// Assembles `metrics` into a row ordered by `schema` with the default assembler.
pub fn assemble(metrics: &PlayerMetrics, schema: &Schema) -> Result<FeatureVector> {
    FeatureAssembler::default().assemble(metrics, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: &[&str]) -> Schema {
        Schema::new(fields.iter().map(|f| f.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_defaults_match_form() {
        let metrics = PlayerMetrics::default();
        assert_eq!(metrics.kills_per_match, 18.0);
        assert_eq!(metrics.deaths_per_match, 14.0);
        assert_eq!(metrics.assists_per_match, 6.0);
        assert_eq!(metrics.acs, 200.0);
        assert_eq!(metrics.utility_usage, 0.5);
        assert_eq!(metrics.clutch_success_rate, 0.3);
        assert_eq!(metrics.win_rate, 0.5);
    }

    #[test]
    fn test_follows_schema_order() {
        let schema = schema(&["win_rate", "playstyle_Aim-Focused Duelists", "headshot_pct", "kills_per_match"]);
        let vector = assemble(&PlayerMetrics::default(), &schema).unwrap();

        assert_eq!(vector.names(), schema.fields());
        assert_eq!(vector.values(), [0.5, 0.0, HEADSHOT_PCT_DEFAULT, 18.0]);
    }

    #[test]
    fn test_unknown_field_is_missing_feature() {
        let schema = schema(&["kills_per_match", "first_blood_rate"]);
        let err = assemble(&PlayerMetrics::default(), &schema).unwrap_err();
        assert!(matches!(err, RecommendError::MissingFeature(ref f) if f == "first_blood_rate"));
    }

    #[test]
    fn test_bare_prefix_is_not_an_indicator() {
        let schema = schema(&["playstyle_"]);
        assert!(matches!(
            assemble(&PlayerMetrics::default(), &schema),
            Err(RecommendError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_custom_indicator_prefix() {
        let assembler = FeatureAssembler::new().with_indicator_prefix("rank_");
        let schema = schema(&["acs", "rank_Radiant"]);
        let vector = assembler.assemble(&PlayerMetrics::default(), &schema).unwrap();
        assert_eq!(vector.get("rank_Radiant"), Some(0.0));

        let schema = self::schema(&["acs", "playstyle_Aim-Focused Duelists"]);
        assert!(assembler.assemble(&PlayerMetrics::default(), &schema).is_err());
    }

    #[test]
    fn test_bounds() {
        let bounds = Metric::Acs.bounds();
        assert!(bounds.contains(50.0));
        assert!(bounds.contains(350.0));
        assert!(!bounds.contains(49.9));
        assert!(!bounds.contains(f32::NAN));
        assert_eq!(PlayerMetrics::minimum().acs, 50.0);
        assert_eq!(PlayerMetrics::maximum().kills_per_match, 45.0);
    }
}
