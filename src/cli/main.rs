use clap::{Parser, Subcommand};
use emergency_ai_service::config::ModelsConfig;
use emergency_ai_service::ml::ModelBundle;
use reqwest::Client;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emergency-ai-cli")]
#[command(about = "Emergency AI Service CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Predict the severity of a report
    Severity {
        #[arg(short, long)]
        text: String,
    },

    /// Predict the departments that should respond to a report
    Department {
        #[arg(short, long)]
        text: String,
    },

    /// Load model artifacts locally and print what they contain
    Inspect {
        /// Directory holding the artifact files
        #[arg(short, long, env = "EMERGENCY_AI_MODELS__DIR", default_value = ".")]
        model_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Severity { text } => {
            let body = classify(&client, &cli.endpoint, "severity", &text).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Department { text } => {
            let body = classify(&client, &cli.endpoint, "department", &text).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Inspect { model_dir } => {
            let bundle = ModelBundle::load(&ModelsConfig::in_dir(model_dir))?;
            println!("{}", serde_json::to_string_pretty(&bundle.summary())?);
        }
    }

    Ok(())
}

async fn classify(
    client: &Client,
    endpoint: &str,
    route: &str,
    text: &str,
) -> anyhow::Result<serde_json::Value> {
    let response = client
        .post(format!("{}/{}", endpoint, route))
        .json(&json!({ "text": text }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!("{} request failed ({}): {}", route, status, body);
    }
    Ok(body)
}
