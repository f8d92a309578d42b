use clap::Parser;
use log::{error, info};
use reddit_relay::cli::{Cli, Commands};
use reddit_relay::client::RedditClient;
use reddit_relay::config::AppConfig;
use reddit_relay::models::SourceKind;
use reddit_relay::operations::submissions::{SubmissionsOperation, SubmissionsOptions};
use reddit_relay::server;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let loaded = match &cli.env_file {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            process::exit(1);
        }
    };

    let client = match RedditClient::from_config(&config) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to create Reddit client: {}", err);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.api_host = host;
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            if let Err(err) = server::serve(config, client).await {
                error!("{}", err);
                process::exit(1);
            }
        }
        Commands::Fetch {
            subreddit,
            user,
            count,
            sort,
            time,
            filter,
            random,
        } => {
            let (source, name) = match (user, subreddit) {
                (Some(user), _) => (SourceKind::User, user),
                (None, Some(subreddit)) => (SourceKind::Subreddit, subreddit),
                (None, None) => (SourceKind::Subreddit, config.default_subreddit.clone()),
            };
            let options = SubmissionsOptions {
                source,
                name,
                load_count: count.unwrap_or(config.default_load_count),
                sort,
                time,
                filter,
            };
            let operation = SubmissionsOperation::new(options, &client, &config.media_url_suffixes);

            let printed = if random {
                operation
                    .random()
                    .await
                    .map(|found| found.map(|submission| serde_json::to_string_pretty(&submission)))
            } else {
                operation
                    .list()
                    .await
                    .map(|found| found.map(|list| serde_json::to_string_pretty(&list)))
            };

            match printed {
                Ok(Some(Ok(json))) => println!("{}", json),
                Ok(Some(Err(err))) => {
                    error!("Failed to serialize submissions: {}", err);
                    process::exit(1);
                }
                Ok(None) => {
                    info!("No entries found for {}", operation.options().name);
                    process::exit(2);
                }
                Err(err) => {
                    error!("Error fetching submissions: {}", err);
                    process::exit(1);
                }
            }
        }
    }
}
