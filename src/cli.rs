use crate::models::{SortTime, SortType};
use crate::operations::submissions::SubmissionFilter;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "reddit-relay",
    version,
    about = "Simplified JSON API over Reddit subreddit and user listings."
)]
pub struct Cli {
    /// Read environment variables from this file instead of ./.env
    #[arg(long, global = true, help = "Path to a .env file")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API.
    Serve {
        /// Address to bind, overrides API_HOST.
        #[arg(long, help = "Host to bind")]
        host: Option<String>,

        /// Port to bind, overrides API_PORT.
        #[arg(long, short, help = "Port to bind")]
        port: Option<u16>,
    },

    /// Fetch submissions once and print the JSON response.
    Fetch {
        /// Subreddit to load from. Defaults to DEFAULT_SUBREDDIT when no user is given.
        #[arg(long, short, conflicts_with = "user", help = "Subreddit name")]
        subreddit: Option<String>,

        /// Reddit user whose submissions are loaded.
        #[arg(long, short, help = "Reddit username")]
        user: Option<String>,

        /// How many submissions to load before filtering.
        #[arg(
            long,
            short,
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Number of submissions to load"
        )]
        count: Option<u32>,

        #[arg(long, help = "hot, new, top, controversial or rising")]
        sort: Option<SortType>,

        #[arg(long, short, help = "hour, day, week, month, year or all")]
        time: Option<SortTime>,

        #[arg(long, short, default_value_t = SubmissionFilter::All, help = "all, media or text")]
        filter: SubmissionFilter,

        /// Print a single random submission instead of the list.
        #[arg(long, short, help = "Pick one random submission")]
        random: bool,
    },
}
