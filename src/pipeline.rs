use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::git::{self, ChangeContext, GitError, GitRunner};
use crate::llm::{self, prompt, Draft, DraftGenerator, GenerateError, Provider};
use crate::pr::{GitHubPublisher, NewPullRequest, PublishError, Publisher, PullRequestResult};
use crate::request::{RequestConfig, RequestError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Git worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Base URLs of the outbound HTTP services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai_url: String,
    pub gemini_url: String,
    pub github_api_url: String,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            openai_url: config.openai_url(),
            gemini_url: config.gemini_url(),
            github_api_url: config.github_api_url(),
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct Published {
    pub context: ChangeContext,
    pub draft: Draft,
    pub pull_request: PullRequestResult,
}

/// Collect → generate → publish, one request at a time per checkout.
pub struct Pipeline {
    git: Arc<dyn GitRunner>,
    client: Client,
    endpoints: Endpoints,
    checkout: Arc<Mutex<()>>,
}

impl Pipeline {
    pub fn new(git: Arc<dyn GitRunner>, client: Client, endpoints: Endpoints) -> Self {
        Self {
            git,
            client,
            endpoints,
            checkout: Arc::new(Mutex::new(())),
        }
    }

    /// Gather the change context on a blocking thread. The checkout lock
    /// moves into the blocking task and is released only when git is done,
    /// even if this future is dropped first.
    #[instrument(skip(self, request), fields(branch = %request.branch, base = %request.base_branch, n = request.n_commits))]
    pub async fn collect(&self, request: &RequestConfig) -> Result<ChangeContext, PipelineError> {
        let checkout = Arc::clone(&self.checkout).lock_owned().await;
        let git = Arc::clone(&self.git);
        let n_commits = request.n_commits;
        let base = request.base_branch.clone();
        let branch = request.branch.clone();

        let context = tokio::task::spawn_blocking(move || {
            let _checkout = checkout;
            git::collect(git.as_ref(), n_commits, &base, &branch)
        })
        .await??;
        info!(
            anchor = %context.anchor,
            files = context.files.len(),
            additions = context.additions(),
            deletions = context.deletions(),
            truncated = context.diff_truncated,
            "collected change context"
        );
        Ok(context)
    }

    /// The generator for the request's provider, pointed at the configured endpoint.
    pub fn generator(&self, request: &RequestConfig) -> Box<dyn DraftGenerator> {
        let base_url = match request.llm_provider {
            Provider::Gpt => self.endpoints.openai_url.clone(),
            Provider::Gemini => self.endpoints.gemini_url.clone(),
        };
        llm::create_generator(
            request.llm_provider,
            self.client.clone(),
            base_url,
            request.llm_api_key.clone(),
            request.llm_model.clone(),
        )
    }

    pub fn publisher(&self, request: &RequestConfig) -> GitHubPublisher {
        GitHubPublisher::new(
            self.client.clone(),
            self.endpoints.github_api_url.clone(),
            request.owner.clone(),
            request.repository.clone(),
            request.token.clone(),
        )
    }

    /// Collect and generate, without publishing.
    pub async fn draft(&self, request: &RequestConfig) -> Result<(ChangeContext, Draft), PipelineError> {
        let generator = self.generator(request);
        let context = self.collect(request).await?;
        let draft = generate(generator.as_ref(), request, &context).await?;
        Ok((context, draft))
    }

    /// Full run against the configured provider and GitHub.
    pub async fn run(&self, request: &RequestConfig) -> Result<Published, PipelineError> {
        let generator = self.generator(request);
        let publisher = self.publisher(request);
        self.execute(request, generator.as_ref(), &publisher).await
    }

    /// Full run against explicit backends.
    #[instrument(skip_all, fields(provider = %generator.provider(), branch = %request.branch))]
    pub async fn execute(
        &self,
        request: &RequestConfig,
        generator: &dyn DraftGenerator,
        publisher: &dyn Publisher,
    ) -> Result<Published, PipelineError> {
        let context = self.collect(request).await?;
        let draft = generate(generator, request, &context).await?;

        info!("publishing pull request");
        let pull_request = publisher
            .create_pull_request(&NewPullRequest {
                title: draft.title.clone(),
                body: draft.body.clone(),
                head: request.branch.clone(),
                base: request.base_branch.clone(),
            })
            .await?;
        info!(number = pull_request.number, url = %pull_request.html_url, "pull request created");

        Ok(Published {
            context,
            draft,
            pull_request,
        })
    }
}

async fn generate(
    generator: &dyn DraftGenerator,
    request: &RequestConfig,
    context: &ChangeContext,
) -> Result<Draft, GenerateError> {
    let prompt = prompt::build(&request.pr_template, &context.render());
    debug!(prompt_chars = prompt.user.len(), "prompt built");
    info!(provider = %generator.provider(), model = %request.llm_model, "generating draft");
    generator.generate(&prompt).await
}
