mod eval;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use beacon_agents::{CrisisCoordinator, DEFAULT_COUNTRY};
use beacon_classifier::CrisisClassifier;
use beacon_observability::{init_tracing, AppMetrics};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "beacon")]
#[command(about = "Beacon crisis triage CLI")]
struct Cli {
    #[arg(long, default_value = "data", env = "BEACON_DATA_ROOT")]
    data_root: PathBuf,

    #[arg(long, default_value = "cases.json", env = "BEACON_CASES_FILE")]
    cases_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive triage session: one report per line.
    Report {
        #[arg(long, default_value = DEFAULT_COUNTRY)]
        country: String,
    },
    /// Walk through a fixed set of sample scenarios.
    Demo,
    Cases {
        #[command(subcommand)]
        command: CasesCommand,
    },
    /// Catalog and case-store counters.
    Stats,
    /// Score classification and retrieval against the gold dataset.
    Eval,
}

#[derive(Debug, Subcommand)]
enum CasesCommand {
    List,
    Show { case_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("beacon_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Report { country } => {
            let agent = build_agent(&cli.data_root, &cli.cases_file)?;
            run_report_loop(agent, &country).await?;
        }
        Command::Demo => {
            let agent = build_agent(&cli.data_root, &cli.cases_file)?;
            run_demo(agent).await;
        }
        Command::Cases { command } => {
            let agent = build_agent(&cli.data_root, &cli.cases_file)?;
            match command {
                CasesCommand::List => {
                    println!("{}", serde_json::to_string_pretty(&agent.list_cases())?);
                }
                CasesCommand::Show { case_id } => match agent.get_case(&case_id) {
                    Some(case) => println!("{}", serde_json::to_string_pretty(&case)?),
                    None => println!("Case {case_id} not found"),
                },
            }
        }
        Command::Stats => {
            let agent = build_agent(&cli.data_root, &cli.cases_file)?;
            print_stats(&agent);
        }
        Command::Eval => {
            // Evaluation scores the deterministic keyword path against a
            // scratch case file, so runs are reproducible and never touch
            // the operator's case history.
            let scratch = std::env::temp_dir().join("beacon-eval-cases.json");
            let _ = std::fs::remove_file(&scratch);
            let agent = CrisisCoordinator::bootstrap(
                &cli.data_root,
                &scratch,
                CrisisClassifier::disabled(),
                AppMetrics::shared(),
            )?;
            eval::run(&agent).await;
        }
    }

    Ok(())
}

fn build_agent(data_root: &PathBuf, cases_file: &PathBuf) -> Result<CrisisCoordinator> {
    let metrics = AppMetrics::shared();
    let classifier = CrisisClassifier::from_env();
    CrisisCoordinator::bootstrap(data_root, cases_file, classifier, metrics)
}

async fn run_report_loop(agent: CrisisCoordinator, country: &str) -> Result<()> {
    println!("Beacon triage session. Describe the crisis, or type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }
        if text.is_empty() {
            continue;
        }

        let outcome = agent.handle_report(text, country).await;
        println!("\n{}\n", outcome.response_text);
    }

    println!("Session ended. For life-threatening situations always call emergency services.");
    Ok(())
}

async fn run_demo(agent: CrisisCoordinator) {
    let scenarios = [
        (
            "Medical emergency: cardiac event",
            "My father is having severe chest pain and difficulty breathing",
        ),
        (
            "Mental health: panic attack",
            "I'm having a panic attack and can't calm down",
        ),
        (
            "Disaster: earthquake",
            "Earthquake just hit our area, building is shaking",
        ),
        (
            "Mental health: suicidal crisis",
            "I feel hopeless and don't want to live anymore",
        ),
    ];

    for (index, (title, input)) in scenarios.iter().enumerate() {
        println!("\n{}", "=".repeat(70));
        println!("SCENARIO {}: {title}", index + 1);
        println!("{}\n", "=".repeat(70));
        println!("INPUT: \"{input}\"\n");

        let outcome = agent.handle_report(input, DEFAULT_COUNTRY).await;
        println!("{}", outcome.response_text);
    }

    println!("\nDemo complete: {} cases recorded.", agent.list_cases().len());
}

fn print_stats(agent: &CrisisCoordinator) {
    let stats = agent.protocol_catalog().stats();
    let health = agent.health();

    println!("Protocols loaded: {}", stats.total);
    println!("  medical:       {}", stats.medical);
    println!("  mental health: {}", stats.mental_health);
    println!("  disaster:      {}", stats.disaster);
    println!(
        "Countries supported: {}",
        agent.helpline_directory().countries_supported()
    );
    println!("Active cases: {}", health.active_cases);
    println!(
        "Classification backend: {}",
        if health.backend_configured {
            "configured"
        } else {
            "keyword fallback only"
        }
    );
}
