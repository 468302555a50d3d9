use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use product_api::http::client::cli_client_builder;

#[derive(Parser)]
#[command(name = "product-cli")]
#[command(about = "Command-line client for the Product API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products, newest first
    List,
    /// Show one product
    Get { id: String },
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        image: String,
    },
    /// Change some fields of a product
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a product
    Delete { id: String },
    /// Check server and datastore health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = cli_client_builder().build()?;
    let products = format!("{}/api/products", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::List => client.get(&products),
        Commands::Get { id } => client.get(format!("{}/{}", products, id)),
        Commands::Create { name, price, image } => client
            .post(&products)
            .json(&json!({ "name": name, "price": price, "image": image })),
        Commands::Update { id, name, price, image } => {
            let mut body = Map::new();
            for (key, value) in [("name", name), ("price", price), ("image", image)] {
                if let Some(value) = value {
                    body.insert(key.to_string(), Value::String(value));
                }
            }
            client.put(format!("{}/{}", products, id)).json(&body)
        }
        Commands::Delete { id } => client.delete(format!("{}/{}", products, id)),
        Commands::Health => client.get(format!("{}/health", cli.url.trim_end_matches('/'))),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
