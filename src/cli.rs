use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use gridcase_sim::plan::Role;

#[derive(Parser, Debug)]
#[command(name = "gridcase-sim", version)]
#[command(about = "Regional grid resilience simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a plan under a scenario and print the metrics
    Run(RunArgs),
    /// List the zones, nodes, projects, and scenarios of a catalog
    Catalog(SourceArgs),
}

/// Where the catalog comes from. Defaults to the `austin` preset.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Load the catalog from a TOML file
    #[arg(long, conflicts_with = "preset")]
    pub catalog: Option<PathBuf>,

    /// Use a built-in catalog preset (austin)
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Scenario id from the catalog
    #[arg(long, default_value = "sc-freeze")]
    pub scenario: String,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u32,

    /// Load the plan from a TOML file
    #[arg(long, conflicts_with_all = ["role", "project", "all_projects"])]
    pub plan: Option<PathBuf>,

    /// Role whose preset assumptions seed an inline plan
    #[arg(long, value_parser = parse_role)]
    pub role: Option<Role>,

    /// Catalog project to include; repeatable
    #[arg(long = "project", value_name = "ID")]
    pub project: Vec<String>,

    /// Include every catalog project, ignoring the budget cap
    #[arg(long, conflicts_with = "project")]
    pub all_projects: bool,

    /// Also run the empty plan and print the comparison against it
    #[arg(long)]
    pub compare_baseline: bool,

    /// Write a JSON filing snapshot
    #[arg(long, value_name = "PATH")]
    pub snapshot_out: Option<PathBuf>,

    /// Write the hourly node status history as CSV
    #[arg(long, value_name = "PATH")]
    pub history_out: Option<PathBuf>,

    /// Write the per-zone outage table as CSV
    #[arg(long, value_name = "PATH")]
    pub outage_out: Option<PathBuf>,

    /// Print the event log
    #[arg(long)]
    pub events: bool,

    /// Start the REST API server after the run
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gridcase-sim").chain(args.iter().copied()))
    }

    #[test]
    fn run_defaults() {
        let cli = parse(&["run"]).expect("parse should succeed");
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenario, "sc-freeze");
        assert_eq!(args.seed, 42);
        assert!(args.source.catalog.is_none());
        assert!(args.source.preset.is_none());
        assert!(args.project.is_empty());
    }

    #[test]
    fn repeated_projects_and_role() {
        let cli = parse(&[
            "run",
            "--role",
            "regulator",
            "--project",
            "p-a",
            "--project",
            "p-b",
        ])
        .expect("parse should succeed");
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.role, Some(Role::Regulator));
        assert_eq!(args.project, vec!["p-a", "p-b"]);
    }

    #[test]
    fn catalog_and_preset_are_mutually_exclusive() {
        assert!(parse(&["catalog", "--catalog", "c.toml", "--preset", "austin"]).is_err());
    }

    #[test]
    fn plan_file_excludes_inline_projects() {
        assert!(parse(&["run", "--plan", "p.toml", "--project", "p-a"]).is_err());
    }

    #[test]
    fn seed_must_fit_u32() {
        assert!(parse(&["run", "--seed", "4294967296"]).is_err());
        assert!(parse(&["run", "--seed", "4294967295"]).is_ok());
    }
}
