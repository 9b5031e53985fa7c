//! Grid resilience simulator entry point: CLI wiring and catalog loading.

mod cli;

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, RunArgs, SourceArgs};
use gridcase_sim::config::{CatalogConfig, ConfigError, Dataset, PlanConfig};
use gridcase_sim::history::RunHistory;
use gridcase_sim::io::export::{export_history_csv, export_outage_csv};
use gridcase_sim::io::export_snapshot;
use gridcase_sim::plan::{Assumptions, Plan};

fn init_logging() {
    let filter = EnvFilter::try_from_env("GRIDCASE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints every validation error and exits when there are any.
fn exit_on_errors(errors: &[ConfigError]) {
    if !errors.is_empty() {
        for e in errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
}

/// Loads the catalog: `--catalog` takes priority, then `--preset`, then austin.
fn load_dataset(source: &SourceArgs) -> anyhow::Result<Dataset> {
    let cfg = if let Some(path) = &source.catalog {
        CatalogConfig::from_toml_file(path)?
    } else if let Some(name) = &source.preset {
        CatalogConfig::from_preset(name)?
    } else {
        CatalogConfig::austin()?
    };
    exit_on_errors(&cfg.validate());
    Ok(cfg.build()?)
}

/// Builds the plan from `--plan`, or inline from `--role` and `--project`.
fn load_plan(args: &RunArgs, dataset: &Dataset) -> anyhow::Result<Plan> {
    if let Some(path) = &args.plan {
        let cfg = PlanConfig::from_toml_file(path)?;
        exit_on_errors(&cfg.validate(dataset));
        return Ok(cfg.build(dataset)?);
    }

    let role = args.role.unwrap_or_default();
    let mut assumptions = Assumptions::for_role(role);
    let projects = if args.all_projects {
        let all = dataset.projects.clone();
        let capex: f64 = all.iter().map(|p| p.capex_usd).sum();
        assumptions.budget_cap_usd = assumptions.budget_cap_usd.max(capex);
        all
    } else {
        dataset.resolve_projects(&args.project)?
    };
    Ok(Plan::from_parts(
        format!("plan_{role}"),
        format!("{} plan", role.label()),
        role,
        projects,
        assumptions,
    )?)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.source)?;
    let scenario = dataset.require_scenario(&args.scenario)?;
    let plan = load_plan(&args, &dataset)?;
    if plan.over_budget() {
        warn!(
            plan = plan.id(),
            capex = plan.total_capex_usd(),
            cap = plan.assumptions().budget_cap_usd,
            "plan exceeds its budget cap"
        );
    }

    let mut history = RunHistory::new();
    if args.compare_baseline {
        let empty = Plan::new(
            format!("{}_empty", plan.id()),
            "Empty plan",
            plan.role(),
            *plan.assumptions(),
        );
        history.run(&dataset.catalog, &empty, scenario, args.seed)?;
        history.lock_baseline();
    }
    let result = history
        .run(&dataset.catalog, &plan, scenario, args.seed)?
        .clone();

    println!(
        "Run {}  plan {} ({} projects)  scenario {}  seed {}",
        result.id,
        plan.id(),
        plan.projects().len(),
        scenario.id,
        result.seed
    );
    println!("\n{}", result.metrics);
    println!("--- Outage hours by zone ---");
    for (zone, hours) in &result.outage_by_zone {
        println!("{zone:<22} {hours:>6}");
    }

    if args.events {
        println!("\n--- Event log ({} entries) ---", result.event_log.len());
        for e in &result.event_log {
            println!("{e}");
        }
    }

    let delta = history.compare_to_baseline();
    if let Some(d) = &delta {
        println!("\n{d}");
    }

    if let Some(path) = &args.history_out {
        export_history_csv(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "history written");
    }
    if let Some(path) = &args.outage_out {
        export_outage_csv(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "outage table written");
    }
    if let Some(path) = &args.snapshot_out {
        let snapshot = export_snapshot(&plan, scenario, &result, delta.as_ref());
        snapshot
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), snapshot = %snapshot.snapshot_id, "snapshot written");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(gridcase_sim::api::AppState {
            plan,
            scenario: scenario.clone(),
            result,
            delta,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(gridcase_sim::api::serve(state, addr))?;
    }

    Ok(())
}

fn list_catalog(source: &SourceArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(source)?;
    let catalog = &dataset.catalog;

    println!("Zones ({})", catalog.zones().len());
    for z in catalog.zones() {
        println!(
            "  {:<20} {:<18} pop {:>7}  income ${:>7.0}  vuln {:.2}",
            z.id, z.name, z.population, z.median_income, z.vulnerability
        );
    }
    println!("Nodes ({})", catalog.nodes().len());
    for n in catalog.nodes() {
        let critical = if n.critical { "  critical" } else { "" };
        println!(
            "  {:<22} {:<18} {:>6.1} MW{critical}",
            n.id, n.zone_id, n.capacity_mw
        );
    }
    println!("Edges ({})", catalog.edges().len());
    println!("Projects ({})", dataset.projects.len());
    for p in &dataset.projects {
        println!(
            "  {:<22} {:<22} {:<16} ${:>6.1}M",
            p.id,
            p.project_type.as_str(),
            p.zone_id,
            p.capex_usd / 1e6
        );
    }
    println!("Scenarios ({})", dataset.scenarios.len());
    for s in &dataset.scenarios {
        println!(
            "  {:<14} {:<20} {:<14} {} h",
            s.id,
            s.name,
            s.hazard.to_string(),
            s.duration_hours
        );
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Run(args) => run(args),
        Command::Catalog(source) => list_catalog(&source),
    };
    if let Err(e) = outcome {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn dataset() -> Dataset {
        CatalogConfig::austin()
            .expect("austin parses")
            .build()
            .expect("austin builds")
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(
            ["gridcase-sim", "run"].into_iter().chain(extra.iter().copied()),
        )
        .expect("parse");
        match cli.command {
            Command::Run(args) => args,
            Command::Catalog(_) => panic!("expected run"),
        }
    }

    #[test]
    fn inline_plan_uses_role_preset() {
        let data = dataset();
        let plan = load_plan(
            &run_args(&["--role", "advocate", "--project", "p-mont-battery"]),
            &data,
        )
        .expect("plan");
        assert_eq!(plan.id(), "plan_advocate");
        assert_eq!(plan.projects().len(), 1);
        assert_eq!(plan.assumptions().budget_cap_usd, 250_000_000.0);
    }

    #[test]
    fn all_projects_raises_budget_to_fit() {
        let data = dataset();
        let plan = load_plan(&run_args(&["--all-projects"]), &data).expect("plan");
        assert_eq!(plan.projects().len(), data.projects.len());
        assert!(!plan.over_budget());
    }

    #[test]
    fn unknown_project_is_an_error() {
        let data = dataset();
        assert!(load_plan(&run_args(&["--project", "p-nope"]), &data).is_err());
    }

    #[test]
    fn plan_file_path_is_read() {
        let data = dataset();
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/missing-plan.toml");
        let args = run_args(&["--plan", path.to_str().expect("utf8 path")]);
        assert!(load_plan(&args, &data).is_err());
    }
}
