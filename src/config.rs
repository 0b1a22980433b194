use anyhow::{Context, Result};
use clap::Parser;
use std::{env, net::SocketAddr};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db";

/// Server configuration, CLI flags layered over environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Blog articles and authors API")]
pub struct Args {
    /// Host to bind to (overrides BLOG_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BLOG_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parses the process arguments and environment. Returns the config and
    /// the migrate-only flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key).ok())?;
        Ok((cfg, migrate))
    }

    fn merge(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_port = match lookup("BLOG_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BLOG_PORT value `{}`", value))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("BLOG_HOST"))
                .unwrap_or_else(|| DEFAULT_HOST.into()),
            port: args.port.unwrap_or(env_port),
            database_url: args
                .database_url
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("`{}` is not a socket address", addr))
    }
}
