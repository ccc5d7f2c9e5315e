use std::path::PathBuf;
use std::sync::Arc;

use agent_recommender::features::{HEADSHOT_PCT_FIELD, PLAYSTYLE_FIELDS};
use agent_recommender::{
    assemble, load, recommend, FeatureVector, Metric, PlayerMetrics, RecommendError, Recommender, Role, RoleCatalog,
    RoleClassifier, Schema,
};

/// Always predicts the same role, after checking the row like a real model.
struct FixedRole {
    schema: Schema,
    role: Role,
}

impl FixedRole {
    fn new(fields: &[&str], role: &str) -> Self {
        Self {
            schema: Schema::new(fields.iter().map(|f| f.to_string()).collect()).unwrap(),
            role: Role::from(role),
        }
    }
}

impl RoleClassifier for FixedRole {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> agent_recommender::Result<Role> {
        self.schema.check(features)?;
        Ok(self.role.clone())
    }
}

/// Column order of the shipped model: metrics with the headshot default
/// slotted in after `acs`, then the playstyle indicators.
fn trained_fields() -> Vec<&'static str> {
    let mut fields = vec![
        Metric::KillsPerMatch.field_name(),
        Metric::DeathsPerMatch.field_name(),
        Metric::AssistsPerMatch.field_name(),
        Metric::Acs.field_name(),
        HEADSHOT_PCT_FIELD,
        Metric::UtilityUsage.field_name(),
        Metric::ClutchSuccessRate.field_name(),
        Metric::WinRate.field_name(),
    ];
    fields.extend(PLAYSTYLE_FIELDS);
    fields
}

fn shipped_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/role_model.json")
}

#[test]
fn test_default_metrics_happy_path() -> Result<(), Box<dyn std::error::Error>> {
    let model = load(shipped_model_path())?;
    let recommender = Recommender::new(model, RoleCatalog::builtin())?;

    let recommendation = recommender.recommend(&PlayerMetrics::default())?;
    let catalog = RoleCatalog::builtin();
    let agents = catalog.agents_for(&recommendation.role).expect("role comes from the catalog");
    assert_eq!(recommendation.agents.len(), 3);
    assert_eq!(recommendation.agents, agents[..3]);
    Ok(())
}

#[test]
fn test_boundary_metrics_assemble_against_shipped_schema() -> Result<(), Box<dyn std::error::Error>> {
    let model = load(shipped_model_path())?;
    assert_eq!(model.schema().fields(), trained_fields());

    for metrics in [PlayerMetrics::minimum(), PlayerMetrics::maximum()] {
        let features = assemble(&metrics, model.schema())?;
        assert_eq!(features.names(), model.schema().fields());
        assert_eq!(features.get("headshot_pct"), Some(0.25));
        model.predict(&features)?;
    }
    Ok(())
}

#[test]
fn test_all_minimum_and_maximum_values() {
    let model = FixedRole::new(&trained_fields(), "Duelist");

    let min = assemble(&PlayerMetrics::minimum(), model.schema()).unwrap();
    assert_eq!(min.get("acs"), Some(50.0));
    assert_eq!(min.get("kills_per_match"), Some(0.0));

    let max = assemble(&PlayerMetrics::maximum(), model.schema()).unwrap();
    assert_eq!(max.get("kills_per_match"), Some(45.0));
    assert_eq!(max.get("deaths_per_match"), Some(30.0));
    assert_eq!(max.get("assists_per_match"), Some(20.0));
    assert_eq!(max.get("acs"), Some(350.0));
    assert_eq!(max.get("win_rate"), Some(1.0));

    for indicator in &PLAYSTYLE_FIELDS {
        assert_eq!(max.get(indicator), Some(0.0));
    }
}

#[test]
fn test_recommend_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let model = load(shipped_model_path())?;
    let catalog = RoleCatalog::builtin();
    let metrics = PlayerMetrics {
        assists_per_match: 14.0,
        utility_usage: 0.9,
        ..PlayerMetrics::default()
    };

    let first = recommend(&metrics, model.as_ref(), &catalog)?;
    let second = recommend(&metrics, model.as_ref(), &catalog)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_truncation_law() {
    let catalog = RoleCatalog::from_entries(vec![
        ("Duelist", vec!["Jett", "Reyna", "Raze", "Phoenix"]),
        ("Controller", vec!["Omen", "Viper"]),
        ("Sentinel", vec!["Sage", "Cypher", "Killjoy"]),
    ])
    .unwrap();

    for (role, expected) in [
        ("Duelist", vec!["Jett", "Reyna", "Raze"]),
        ("Controller", vec!["Omen", "Viper"]),
        ("Sentinel", vec!["Sage", "Cypher", "Killjoy"]),
    ] {
        let model = FixedRole::new(&trained_fields(), role);
        let recommendation = recommend(&PlayerMetrics::default(), &model, &catalog).unwrap();
        assert_eq!(recommendation.role, Role::from(role));
        assert_eq!(recommendation.agents, expected);
    }
}

#[test]
fn test_unknown_role_is_surfaced() {
    let model = FixedRole::new(&trained_fields(), "Support");
    let err = recommend(&PlayerMetrics::default(), &model, &RoleCatalog::builtin()).unwrap_err();
    assert!(matches!(err, RecommendError::UnknownRole(ref role) if role == "Support"));

    let recommender = Recommender::new(Arc::new(model), RoleCatalog::builtin()).unwrap();
    assert!(matches!(
        recommender.recommend(&PlayerMetrics::default()),
        Err(RecommendError::UnknownRole(_))
    ));
}

#[test]
fn test_unrecognised_schema_field() {
    let model = FixedRole::new(&["kills_per_match", "first_bloods_per_match", "acs"], "Duelist");

    let err = recommend(&PlayerMetrics::default(), &model, &RoleCatalog::builtin()).unwrap_err();
    assert!(matches!(err, RecommendError::MissingFeature(ref f) if f == "first_bloods_per_match"));

    let result = Recommender::new(Arc::new(model), RoleCatalog::builtin());
    assert!(matches!(result, Err(RecommendError::MissingFeature(_))));
}

#[test]
fn test_shared_across_threads() {
    let model = FixedRole::new(&trained_fields(), "Initiator");
    let recommender = Arc::new(Recommender::new(Arc::new(model), RoleCatalog::builtin()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let recommender = Arc::clone(&recommender);
            std::thread::spawn(move || {
                let metrics = PlayerMetrics {
                    kills_per_match: i as f32,
                    ..PlayerMetrics::default()
                };
                recommender.recommend(&metrics).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let recommendation = handle.join().unwrap();
        assert_eq!(recommendation.agents, ["Sova", "Breach", "Skye"]);
    }
}
