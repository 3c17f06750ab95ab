//! Podplan CLI - validate, check and plan pod-task workflows

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use podplan::ast::Workflow;
use podplan::{
    ExecutionPlan, ExecutionPlanner, FixSuggestion, HazardAnalyzer, PlannerConfig, PodplanError,
    Result,
};

#[derive(Parser)]
#[command(name = "podplan")]
#[command(about = "Podplan - execution planning for pod-task DAGs")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config_dir>/podplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a workflow, build and finalize its graph
    Validate {
        /// Path to workflow YAML file
        file: PathBuf,
    },

    /// Report shared-volume hazards (exit 1 if any)
    Check {
        /// Path to workflow YAML file
        file: PathBuf,

        /// Only analyze declared resource handles
        #[arg(long)]
        no_derive_mounts: bool,
    },

    /// Print the execution plan
    Plan {
        /// Path to workflow YAML file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Only analyze declared resource handles
        #[arg(long)]
        no_derive_mounts: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

fn main() {
    // Logs go to stderr so plan output stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Validate { file } => validate_workflow(&file, &config),
        Commands::Check {
            file,
            no_derive_mounts,
        } => check_workflow(&file, &config, no_derive_mounts),
        Commands::Plan {
            file,
            format,
            no_derive_mounts,
        } => plan_workflow(&file, &config, format, no_derive_mounts),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let config = match path {
        Some(path) => PlannerConfig::load_from(path)?,
        None => PlannerConfig::load()?,
    };
    Ok(config.with_env())
}

fn analyzer(config: &PlannerConfig, no_derive_mounts: bool) -> HazardAnalyzer {
    let analyzer = HazardAnalyzer::from_config(config);
    if no_derive_mounts {
        analyzer.with_mount_derivation(false)
    } else {
        analyzer
    }
}

fn validate_workflow(file: &Path, config: &PlannerConfig) -> Result<()> {
    let workflow = Workflow::load(file)?;
    let graph = workflow.build_graph(config)?;
    let order = graph.require_finalized("validate")?;

    println!("{} Workflow '{}' is valid", "✓".green(), file.display());
    if let Some(id) = &workflow.id {
        println!("  DAG: {}", id);
    }
    println!("  Templates: {}", workflow.templates.len());
    println!("  Tasks: {}", graph.len());
    println!("  Flows: {}", graph.edge_count());
    println!(
        "  Order: {}",
        order.iter().map(|id| &**id).collect::<Vec<_>>().join(" → ")
    );

    Ok(())
}

fn check_workflow(file: &Path, config: &PlannerConfig, no_derive_mounts: bool) -> Result<()> {
    let workflow = Workflow::load(file)?;
    let graph = workflow.build_graph(config)?;
    let specs = workflow.catalog().resolve(&graph)?;

    let hazards = analyzer(config, no_derive_mounts).analyze(&graph, &specs)?;
    if hazards.is_empty() {
        println!(
            "{} No hazards in '{}' ({} tasks)",
            "✓".green(),
            file.display(),
            graph.len()
        );
        return Ok(());
    }

    for hazard in &hazards {
        println!("{} {}", "✗".red(), hazard);
    }
    Err(PodplanError::PlanInvalid { hazards })
}

fn plan_workflow(
    file: &Path,
    config: &PlannerConfig,
    format: Format,
    no_derive_mounts: bool,
) -> Result<()> {
    let workflow = Workflow::load(file)?;
    let graph = workflow.build_graph(config)?;
    let planner = ExecutionPlanner::with_analyzer(analyzer(config, no_derive_mounts));
    let plan = planner.build(&graph, &workflow.catalog())?;

    match format {
        Format::Text => print_plan(&plan),
        Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(&plan)?),
    }

    Ok(())
}

fn print_plan(plan: &ExecutionPlan) {
    println!("{} Execution plan ({} tasks)", "→".cyan(), plan.len());
    for step in plan {
        let deps = if step.dependencies.is_empty() {
            "-".to_string()
        } else {
            step.dependencies
                .iter()
                .map(|d| &**d)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "  {}. {}  (after: {}, timeout: {}s)",
            step.position + 1,
            step.id().bold(),
            deps,
            step.task.timeout.as_secs()
        );
        for container in &step.spec.containers {
            println!(
                "       {} {}",
                container.name,
                container.image.as_deref().unwrap_or("(no image)").dimmed()
            );
        }
    }
}
