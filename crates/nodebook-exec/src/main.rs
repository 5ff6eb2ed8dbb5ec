use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use nodebook_core::{Notebook, NodebookConfig};
use nodebook_exec::{identity_rows, plan_notebook};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn notebook_arg() -> Arg {
    Arg::new("notebook")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help("Path to an .ipynb file")
}

fn load_notebook(path: &Path) -> anyhow::Result<Notebook> {
    Notebook::load(path).with_context(|| format!("loading {}", path.display()))
}

async fn plan(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<PathBuf>("notebook")
        .context("missing notebook path")?;
    let config = match args.get_one::<PathBuf>("config") {
        Some(file) => NodebookConfig::load(file)
            .with_context(|| format!("loading config {}", file.display()))?,
        None => NodebookConfig::new(),
    };

    let plan = plan_notebook(load_notebook(path)?, config).await;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&plan.records)?);
    } else {
        for record in &plan.records {
            println!("--- cell {} (node {})", record.cell, record.node);
            println!("{}", record.code);
        }
        println!();
        println!("{} cells dispatched", plan.records.len());
    }

    if let Some(out) = args.get_one::<PathBuf>("save") {
        plan.notebook
            .save(out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Saved identities to {}", out.display());
    }
    Ok(())
}

fn ids(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<PathBuf>("notebook")
        .context("missing notebook path")?;

    for row in identity_rows(load_notebook(path)?) {
        println!(
            "{:>4}  {}  {}",
            row.position,
            row.node,
            if row.participates { "participating" } else { "-" }
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("nodebook")
        .version(nodebook_exec::VERSION)
        .about("Lineage-aware notebook cell execution")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("plan")
                .about("Dry-run every code cell and print the dispatched payloads")
                .arg(notebook_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("save")
                        .long("save")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Write the notebook with persisted identities"),
                ),
        )
        .subcommand(
            Command::new("ids")
                .about("Show node identities after load")
                .arg(notebook_arg()),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("plan", args)) => plan(args).await,
        Some(("ids", args)) => ids(args),
        _ => Ok(()),
    }
}
