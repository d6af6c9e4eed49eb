use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use api_dispatch::config::load_config;
use api_dispatch::endpoint::EndpointDescriptor;

#[derive(Parser)]
#[command(name = "api-cli")]
#[command(about = "Tooling for api-dispatch configs and endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum HttpMethod {
    Get,
    Post,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and list its endpoints
    Check {
        /// Path to the TOML configuration file
        config: PathBuf,
    },
    /// Call an endpoint and print the response
    Call {
        /// Endpoint URL, e.g. http://localhost:8080/api/ping
        url: String,

        #[arg(short = 'X', long, value_enum, default_value = "get")]
        method: HttpMethod,

        /// Value of the Auth-Token header
        #[arg(short, long)]
        token: Option<String>,

        /// JSON request body (POST only)
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Call {
            url,
            method,
            token,
            data,
        } => call(&url, method, token, data).await,
    }
}

fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    println!("{}: OK ({} endpoints)", path.display(), config.endpoints.len());
    for endpoint in &config.endpoints {
        let descriptor = EndpointDescriptor::from_options(&endpoint.options)?;
        println!(
            "  {:<6} {:<30} handler={} request={} response={} auth={} quota={}",
            descriptor.method(),
            endpoint.path,
            endpoint.handler,
            descriptor.request_type(),
            descriptor.response_type(),
            descriptor.requires_auth(),
            descriptor.requires_quota(),
        );
    }
    Ok(())
}

async fn call(
    url: &str,
    method: HttpMethod,
    token: Option<String>,
    data: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let mut request = match method {
        HttpMethod::Get => client.get(url),
        HttpMethod::Post => client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(data.unwrap_or_else(|| "{}".to_string())),
    };
    if let Some(token) = token {
        request = request.header("Auth-Token", token);
    }

    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
