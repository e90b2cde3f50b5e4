use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueHint};
use drawensemble::config::{AppConfig, ConfigManager};
use drawensemble::data::{CsvConnector, DrawHistory, JsonWeightStore};
use drawensemble::engines::ensemble::EnsemblePredictor;
use drawensemble::engines::evaluation::Backtester;
use drawensemble::engines::scoring::EngineRegistry;
use drawensemble::engines::tuning::{CancellationToken, ConsoleProgressCallback, WeightOptimizer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Ensemble scoring and weight tuning for 6-of-45 draw histories"
)]
struct Cli {
    /// TOML or JSON configuration file layered over the defaults
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Draw history CSV, overriding `data.history_path`
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score the history and print recommended sets as JSON
    Predict(PredictArgs),

    /// Tune engine weights and persist the best record
    Optimize(OptimizeArgs),

    /// Replay the most recent rounds and report hit counts
    Backtest(BacktestArgs),
}

#[derive(Args)]
struct PredictArgs {
    /// Number of sets to recommend
    #[arg(long)]
    sets: Option<usize>,
}

#[derive(Args)]
struct OptimizeArgs {
    /// Generations to run
    #[arg(long)]
    generations: Option<usize>,
}

#[derive(Args)]
struct BacktestArgs {
    /// Number of trailing rounds to replay
    #[arg(long)]
    rounds: Option<usize>,

    /// Sets recommended per replayed round
    #[arg(long)]
    sets: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let manager = ConfigManager::new();
    if let Some(path) = &cli.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }
    if let Some(path) = &cli.history {
        manager.update(|c| c.data.history_path = path.clone())?;
    }

    let store = JsonWeightStore::new(&manager.get().optimizer.weights_path);
    let prior = store.load().context("reading tuned weights")?;

    match cli.command {
        Command::Predict(args) => {
            if let Some(sets) = args.sets {
                manager.update(|c| c.selection.sets = sets)?;
            }
            if let Some(tuned) = &prior {
                manager.apply_tuned_weights(tuned)?;
                log::info!("Using tuned weights (fitness {:.4})", tuned.best_fitness);
            }
            let config = manager.get();
            let history = load_history(&config)?;
            let predictor = EnsemblePredictor::new(
                &EngineRegistry::builtin(),
                &history,
                &config.ensemble,
                &config.selection,
            )?;
            let report = predictor.report(config.selection.sets)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Optimize(args) => {
            if let Some(generations) = args.generations {
                manager.update(|c| c.optimizer.generations = generations)?;
            }
            let config = manager.get();
            let history = load_history(&config)?;
            let mut store = store;
            let mut optimizer = WeightOptimizer::new(config.optimizer.clone());
            let outcome = optimizer.optimize(
                &EngineRegistry::builtin(),
                &history,
                &config.ensemble.default_weights,
                prior.as_ref(),
                &CancellationToken::new(),
                &mut ConsoleProgressCallback,
                &mut store,
            )?;
            log::info!(
                "Finished {} generations: seed fitness {:.4}, best {:.4}",
                outcome.generations_completed,
                outcome.seed_fitness,
                outcome.best.best_fitness
            );
            println!("{}", serde_json::to_string_pretty(&outcome.best)?);
        }
        Command::Backtest(args) => {
            if let Some(sets) = args.sets {
                manager.update(|c| c.selection.sets = sets)?;
            }
            if let Some(tuned) = &prior {
                manager.apply_tuned_weights(tuned)?;
            }
            let config = manager.get();
            let history = load_history(&config)?;
            let rounds = args.rounds.unwrap_or(config.optimizer.test_window);
            let backtester = Backtester::new(
                EngineRegistry::builtin(),
                config.ensemble.clone(),
                config.selection.clone(),
                config.data.min_rounds,
            );
            let report = backtester.run(&history, rounds, config.selection.sets)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_history(config: &AppConfig) -> anyhow::Result<DrawHistory> {
    let path = &config.data.history_path;
    CsvConnector::load_history(path, config.data.min_rounds)
        .with_context(|| format!("loading draw history from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "drawensemble",
            "backtest",
            "--rounds",
            "12",
            "--config",
            "settings.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("settings.toml")));
        match cli.command {
            Command::Backtest(args) => {
                assert_eq!(args.rounds, Some(12));
                assert_eq!(args.sets, None);
            }
            _ => panic!("expected backtest"),
        }
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["drawensemble", "train"]).is_err());
        assert!(Cli::try_parse_from(["drawensemble"]).is_err());
    }
}
