use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, ORIGIN};
use reqwest::Method;

const CORS_HEADERS: [&str; 6] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-allow-credentials",
    "access-control-max-age",
    "vary",
];

#[derive(Parser)]
#[command(name = "policy-cli")]
#[command(about = "Probe the CORS and content negotiation policy of a running service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a CORS preflight and print the policy headers
    Preflight {
        #[arg(short, long)]
        origin: String,
        #[arg(short, long, default_value = "/")]
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Comma-separated request headers to ask for
        #[arg(long)]
        headers: Option<String>,
    },
    /// Fetch the game catalogue in a given representation
    Games {
        #[arg(short, long, default_value = "json")]
        media_type: String,
    },
    /// Check service status
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Preflight {
            origin,
            path,
            method,
            headers,
        } => {
            let mut request = client
                .request(Method::OPTIONS, format!("{}{}", cli.url, path))
                .header(ORIGIN, origin)
                .header("access-control-request-method", method);
            if let Some(headers) = headers {
                request = request.header("access-control-request-headers", headers);
            }
            let res = request.send().await?;
            println!("Status: {}", res.status());
            print_cors_headers(res.headers());
        }
        Commands::Games { media_type } => {
            let res = client
                .get(format!("{}/api/game/v2", cli.url))
                .query(&[("mediaType", media_type)])
                .send()
                .await?;
            print_body(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_body(res).await?;
        }
    }

    Ok(())
}

fn print_cors_headers(headers: &HeaderMap) {
    for name in CORS_HEADERS {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            println!("{name}: <absent>");
        } else {
            println!("{name}: {}", values.join(", "));
        }
    }
}

async fn print_body(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<none>")
        .to_string();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    println!("Content-Type: {content_type}");
    println!("{text}");
    Ok(())
}
