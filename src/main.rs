mod config;
mod git;
mod llm;
mod pipeline;
mod pr;
mod report;
mod request;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use crate::git::SystemGit;
use crate::pipeline::{Endpoints, Pipeline};
use crate::request::DraftRequest;

/// PR Drafter — collects recent git history, has an LLM fill in a pull
/// request template, and opens the pull request on GitHub.
#[derive(Parser, Debug)]
#[command(name = "pr-drafter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /create-pr
    Serve {
        /// Address to bind (default 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (default 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Repository working tree to collect history from
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Draft a pull request once from the command line
    Draft(DraftArgs),
}

/// Overrides for a single draft. Credentials are only read from
/// .pr-drafter.toml or the environment.
#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(long)]
    owner: Option<String>,

    #[arg(long)]
    repository: Option<String>,

    /// Source branch (e.g., feature/login or origin/feature/login)
    #[arg(long)]
    branch: Option<String>,

    #[arg(long)]
    base_branch: Option<String>,

    /// Size of the commit window ahead of the base branch
    #[arg(long)]
    n_commits: Option<u32>,

    /// gemini or gpt
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// File holding the PR body template
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Repository working tree to collect history from
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Generate the draft but do not open the pull request
    #[arg(long)]
    dry_run: bool,

    /// Optional output file path for a markdown copy of the draft
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load()?;

    match cli.command {
        Command::Serve { host, port, repo } => {
            if host.is_some() {
                config.server.host = host;
            }
            if port.is_some() {
                config.server.port = port;
            }
            if repo.is_some() {
                config.git.repo_path = repo;
            }

            let pipeline = build_pipeline(&config)?;
            let addr = config.listen_addr()?;
            let state = Arc::new(server::AppState {
                defaults: config,
                pipeline,
            });
            server::serve(addr, state).await?;
        }
        Command::Draft(args) => {
            if args.repo.is_some() {
                config.git.repo_path = args.repo.clone();
            }
            let pipeline = build_pipeline(&config)?;

            let pr_template = match &args.template_file {
                Some(path) => Some(std::fs::read_to_string(path)?),
                None => None,
            };
            let request = DraftRequest {
                owner: args.owner,
                repository: args.repository,
                token: None,
                branch: args.branch,
                base_branch: args.base_branch,
                n_commits: args.n_commits,
                pr_template,
                llm_provider: args.provider,
                llm_api_key: None,
                llm_model: args.model,
            }
            .resolve(&config)?;

            let _main_span = info_span!("draft", branch = %request.branch, base = %request.base_branch).entered();
            debug!(?request, "resolved request");

            let built_report = if args.dry_run {
                info!("dry run, drafting without publishing");
                let (context, draft) = pipeline.draft(&request).await?;
                report::build(&request, context, draft, None)
            } else {
                let published = pipeline.run(&request).await?;
                report::build(
                    &request,
                    published.context,
                    published.draft,
                    Some(published.pull_request),
                )
            };
            report::output(&built_report, args.output.as_deref())?;
            info!("done");
        }
    }

    Ok(())
}

fn build_pipeline(config: &config::Config) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let repo = config.repo_path();
    warn_if_not_repository(&repo);

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()?;
    Ok(Pipeline::new(
        Arc::new(SystemGit::new(repo)),
        client,
        Endpoints::from_config(config),
    ))
}

fn warn_if_not_repository(repo: &Path) {
    if !repo.join(".git").exists() {
        warn!(repo = %repo.display(), ".git directory not found; run inside a git repository or pass --repo");
    }
}
