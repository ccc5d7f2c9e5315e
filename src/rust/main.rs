use agent_recommender::{Metric, PlayerMetrics, Recommendation, RecommenderConfig, Schema};
use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Recommend agents for a player from their per-match performance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kills per match
    #[arg(long, default_value_t = Metric::KillsPerMatch.bounds().default, value_parser = metric_parser(Metric::KillsPerMatch))]
    kills: f32,

    /// Deaths per match
    #[arg(long, default_value_t = Metric::DeathsPerMatch.bounds().default, value_parser = metric_parser(Metric::DeathsPerMatch))]
    deaths: f32,

    /// Assists per match
    #[arg(long, default_value_t = Metric::AssistsPerMatch.bounds().default, value_parser = metric_parser(Metric::AssistsPerMatch))]
    assists: f32,

    /// Average combat score
    #[arg(long, default_value_t = Metric::Acs.bounds().default, value_parser = metric_parser(Metric::Acs))]
    acs: f32,

    /// Utility usage rate
    #[arg(long, default_value_t = Metric::UtilityUsage.bounds().default, value_parser = metric_parser(Metric::UtilityUsage))]
    utility: f32,

    /// Clutch success rate
    #[arg(long, default_value_t = Metric::ClutchSuccessRate.bounds().default, value_parser = metric_parser(Metric::ClutchSuccessRate))]
    clutch: f32,

    /// Win rate
    #[arg(long, default_value_t = Metric::WinRate.bounds().default, value_parser = metric_parser(Metric::WinRate))]
    win_rate: f32,

    /// JSON config file; the flags below override its entries
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact (.onnx or .json); defaults to $AGENT_RECOMMENDER_MODEL or models/role_model.json
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// JSON role catalog replacing the built-in roster
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Expected SHA-256 of the model artifact
    #[arg(long)]
    model_sha256: Option<String>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long)]
    threads: Option<usize>,

    /// Print the recommendation as JSON
    #[arg(long)]
    json: bool,

    /// Print the model's input schema and exit
    #[arg(long)]
    schema: bool,
}

fn metric_parser(metric: Metric) -> impl Fn(&str) -> Result<f32, String> + Clone + Send + Sync + 'static {
    move |raw| {
        let bounds = metric.bounds();
        let value: f32 = raw.parse().map_err(|e| format!("{}: {}", raw, e))?;
        if !bounds.contains(value) {
            return Err(format!("{} must be within [{}, {}]", metric, bounds.min, bounds.max));
        }
        Ok(value)
    }
}

impl Args {
    fn metrics(&self) -> PlayerMetrics {
        PlayerMetrics {
            kills_per_match: self.kills,
            deaths_per_match: self.deaths,
            assists_per_match: self.assists,
            acs: self.acs,
            utility_usage: self.utility,
            clutch_success_rate: self.clutch,
            win_rate: self.win_rate,
        }
    }

    fn config(&self) -> agent_recommender::Result<RecommenderConfig> {
        let mut config = match &self.config {
            Some(path) => RecommenderConfig::from_file(path)?,
            None => RecommenderConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(catalog) = &self.catalog {
            config.catalog_path = Some(catalog.clone());
        }
        if let Some(sha256) = &self.model_sha256 {
            config.model_sha256 = Some(sha256.clone());
        }
        if let Some(threads) = self.threads {
            config.runtime.intra_threads = threads;
        }
        Ok(config)
    }
}

fn render(recommendation: &Recommendation, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recommendation)?);
        return Ok(());
    }

    println!("Predicted role: {}", recommendation.role);
    println!("Recommended agents:");
    for agent in &recommendation.agents {
        println!("  • {}", agent);
    }
    Ok(())
}

fn print_schema(schema: &Schema) {
    for (i, field) in schema.iter().enumerate() {
        println!("{:>3}  {}", i, field);
    }
}

fn main() -> anyhow::Result<()> {
    agent_recommender::init_logger();
    let args = Args::parse();
    let config = args.config().context("failed to load configuration")?;

    let start_time = Instant::now();
    let model = config
        .load_model()
        .with_context(|| format!("failed to load model {}", config.model_path.display()))?;
    info!("Model loaded in {:.2?}", start_time.elapsed());

    // Printed before the assembler plans the columns, so a model with
    // columns it cannot fill can still be inspected.
    if args.schema {
        print_schema(model.schema());
        return Ok(());
    }

    let recommender = config
        .build_with(model)
        .with_context(|| format!("model {} cannot be served", config.model_path.display()))?;

    let metrics = args.metrics();
    info!("Recommending for {:?}", metrics);
    let recommendation = recommender
        .recommend(&metrics)
        .context("could not recommend agents")?;
    render(&recommendation, args.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flags: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("agent-recommender").chain(flags.iter().copied()))
    }

    #[test]
    fn test_metric_parser_enforces_bounds() {
        let acs = metric_parser(Metric::Acs);
        assert_eq!(acs("50"), Ok(50.0));
        assert_eq!(acs("350"), Ok(350.0));
        assert_eq!(acs("400"), Err("acs must be within [50, 350]".to_string()));
        assert!(acs("49.9").is_err());
        assert!(acs("NaN").is_err());
        assert!(acs("inf").is_err());
        assert!(acs("high").is_err());
    }

    #[test]
    fn test_out_of_range_flags_are_rejected() {
        assert!(parse(&["--win-rate", "1.5"]).is_err());
        assert!(parse(&["--kills", "-1"]).is_err());
        assert!(parse(&["--deaths", "31"]).is_err());

        let args = parse(&["--win-rate", "1", "--kills", "0"]).unwrap();
        assert_eq!(args.metrics().win_rate, 1.0);
        assert_eq!(args.metrics().kills_per_match, 0.0);
        assert_eq!(args.metrics().acs, Metric::Acs.bounds().default);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recommender.json");
        std::fs::write(
            &path,
            r#"{"model_path": "from_file.onnx", "catalog_path": "roles.json", "runtime": {"intra_threads": 4}}"#,
        )
        .unwrap();
        let config_flag = path.to_str().unwrap();

        let config = parse(&["--config", config_flag]).unwrap().config().unwrap();
        assert_eq!(config.model_path, PathBuf::from("from_file.onnx"));
        assert_eq!(config.runtime.intra_threads, 4);

        let config = parse(&["--config", config_flag, "--model", "flag.json", "--threads", "1"])
            .unwrap()
            .config()
            .unwrap();
        assert_eq!(config.model_path, PathBuf::from("flag.json"));
        assert_eq!(config.catalog_path, Some(PathBuf::from("roles.json")));
        assert_eq!(config.runtime.intra_threads, 1);
    }
}
