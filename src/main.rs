use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use diffchunk::models::{Chunk, ChunkReview, ChunkReviewReport, ChunkSource, ChunkSummary, OrchestratedResult};
use diffchunk::{
    ChunkingConfig, ClaudeProvider, Config, ContinuationPolicy, DiffChunker, GenerationTask,
    GitClient, OrchestratorConfig, RequestOrchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "diffchunk")]
#[command(version = "0.1.0")]
#[command(about = "Split large git diffs into prioritized chunks and analyze them with an LLM")]
struct Args {
    /// Repository directory
    #[arg(long, global = true, default_value = ".")]
    repo: String,

    /// Override the token budget per request
    #[arg(long, global = true)]
    budget: Option<usize>,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how the diff would be chunked
    Chunks {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List recent commits
    Commits {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Generate a commit message
    CommitMessage {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Review the changes
    Review {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Describe a branch for a pull request
    PrSummary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

/// Where the diff comes from. Staged changes when nothing is given.
#[derive(ClapArgs, Debug)]
struct SourceArgs {
    /// Staged changes (the default)
    #[arg(long, conflicts_with_all = ["commit", "base", "files", "stdin"])]
    staged: bool,

    /// Diff of a single commit
    #[arg(long, conflicts_with_all = ["base", "files", "stdin"])]
    commit: Option<String>,

    /// Base branch to compare against
    #[arg(long, conflicts_with_all = ["files", "stdin"])]
    base: Option<String>,

    /// Branch to compare (defaults to the current branch)
    #[arg(long, requires = "base")]
    branch: Option<String>,

    /// Unstaged changes of these files
    #[arg(long, num_args = 1.., conflicts_with = "stdin")]
    files: Vec<String>,

    /// Read the diff from stdin
    #[arg(long)]
    stdin: bool,
}

impl SourceArgs {
    fn is_staged(&self) -> bool {
        self.staged
            || (self.commit.is_none() && self.base.is_none() && self.files.is_empty() && !self.stdin)
    }
}

#[derive(ClapArgs, Debug)]
struct AnalysisArgs {
    /// Generate content and a review of the top chunk concurrently
    #[arg(long)]
    preview: bool,

    /// Also analyze the chunks left over after the first result
    #[arg(long, conflicts_with = "preview")]
    review_remaining: bool,

    /// Stop the remaining-chunk review at the first failure
    #[arg(long, requires = "review_remaining")]
    stop_on_error: bool,

    /// Maximum fallback attempts after an overflow
    #[arg(long)]
    fallback_depth: Option<usize>,
}

#[derive(Serialize)]
struct ChunksReport<'a> {
    summary: &'a ChunkSummary,
    chunks: &'a [Chunk],
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    task: GenerationTask,
    summary: ChunkSummary,
    result: &'a OrchestratedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    review: Option<&'a OrchestratedResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    remaining: Vec<ChunkReviewReport>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so generated text on stdout can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("diffchunk=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let git = GitClient::new(&args.repo);

    match &args.command {
        Command::Chunks { source } => {
            let chunker = DiffChunker::new(chunking_config(&args)?);
            let diff = load_diff(&git, source).await?;
            let chunks = chunker.chunk(&diff);
            if chunks.is_empty() {
                println!("No changes to analyze.");
                return Ok(());
            }
            output_chunks(&chunker.summarize(&chunks), &chunks, &args)?;
        }
        Command::Commits { limit } => {
            for (sha, subject) in git.recent_commits(*limit).await? {
                println!("{}  {}", sha, subject);
            }
        }
        Command::CommitMessage { source, analysis } => {
            run_analysis(&args, &git, GenerationTask::CommitMessage, source, analysis).await?;
        }
        Command::Review { source, analysis } => {
            run_analysis(&args, &git, GenerationTask::CodeReview, source, analysis).await?;
        }
        Command::PrSummary { source, analysis } => {
            run_analysis(&args, &git, GenerationTask::PullRequestSummary, source, analysis).await?;
        }
    }

    Ok(())
}

fn chunking_config(args: &Args) -> anyhow::Result<ChunkingConfig> {
    let config = ChunkingConfig::from_env()?;
    Ok(match args.budget {
        Some(budget) => config.with_token_budget(budget)?,
        None => config,
    })
}

async fn run_analysis(
    args: &Args,
    git: &GitClient,
    task: GenerationTask,
    source: &SourceArgs,
    analysis: &AnalysisArgs,
) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let chunking = match args.budget {
        Some(budget) => config.chunking.with_token_budget(budget)?,
        None => config.chunking,
    };
    let mut orchestrator_config = OrchestratorConfig::from(&config);
    if let Some(depth) = analysis.fallback_depth {
        orchestrator_config.fallback_depth = depth;
    }

    let diff = load_diff(git, source).await?;
    let chunker = DiffChunker::new(chunking);
    let chunks = chunker.chunk(&diff);
    let summary = chunker.summarize(&chunks);
    if !chunks.is_empty() {
        tracing::info!("Chunked diff: {}", summary);
    }

    let llm = ClaudeProvider::new(
        config.anthropic_api_key.clone(),
        config.model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let orchestrator = RequestOrchestrator::new(llm, orchestrator_config);

    let pb = start_spinner(&format!("Generating {}...", task))?;

    if analysis.preview {
        let outcome = orchestrator.preview(task, &chunks).await;
        pb.finish_and_clear();
        let preview = match outcome {
            Err(e) if e.is_empty_input() => {
                println!("No changes to analyze.");
                return Ok(());
            }
            other => other?,
        };
        let report = AnalysisReport {
            task,
            summary,
            result: &preview.content,
            review: Some(&preview.review),
            remaining: Vec::new(),
        };
        return output_analysis(&report, &args.format);
    }

    let outcome = orchestrator.run(task, &chunks).await;
    pb.finish_and_clear();
    let result = match outcome {
        Err(e) if e.is_empty_input() => {
            println!("No changes to analyze.");
            return Ok(());
        }
        other => other?,
    };

    let mut remaining: Vec<ChunkReview> = Vec::new();
    if analysis.review_remaining && result.remaining_chunks > 0 {
        let policy = if analysis.stop_on_error {
            ContinuationPolicy::StopOnError
        } else {
            ContinuationPolicy::ContinueOnError
        };
        let pb = start_spinner("Analyzing remaining chunks...")?;
        remaining = orchestrator.review_remaining(task, &chunks, &result, policy).await;
        pb.finish_and_clear();
    }

    let report = AnalysisReport {
        task,
        summary,
        result: &result,
        review: None,
        remaining: remaining.iter().map(ChunkReviewReport::from).collect(),
    };
    output_analysis(&report, &args.format)
}

async fn load_diff(git: &GitClient, source: &SourceArgs) -> anyhow::Result<String> {
    if source.is_staged() {
        return staged_diff(git).await;
    }
    if source.stdin {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        return Ok(input);
    }
    if let Some(rev) = &source.commit {
        return Ok(git.commit_diff(rev).await?);
    }
    if let Some(base) = &source.base {
        let branch = match &source.branch {
            Some(branch) => branch.clone(),
            None => git.current_branch().await?,
        };
        return Ok(git.branch_diff(base, &branch).await?);
    }
    Ok(git.files_diff(&source.files).await?)
}

async fn staged_diff(git: &GitClient) -> anyhow::Result<String> {
    let diff = git.staged_diff().await?;
    if diff.trim().is_empty() {
        let unstaged = git
            .file_statuses()
            .await?
            .into_iter()
            .filter(|s| s.is_unstaged())
            .count();
        if unstaged > 0 {
            tracing::info!(
                "Nothing staged; {} file(s) have unstaged changes (pass them with --files)",
                unstaged
            );
        }
    }
    Ok(diff)
}

fn start_spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn output_chunks(summary: &ChunkSummary, chunks: &[Chunk], args: &Args) -> anyhow::Result<()> {
    if args.format == "json" {
        let report = ChunksReport { summary, chunks };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}\n", summary);
    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{:>3}. [{:<6}] {} ({} chars)",
            i + 1,
            chunk.priority,
            chunk.label,
            chunk.char_count()
        );
    }
    Ok(())
}

fn output_analysis(report: &AnalysisReport<'_>, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let mut output = String::new();
    output.push_str(&format!("=== {} ({}) ===\n", report.task, report.result.chunk_label));
    if let ChunkSource::Fallback {
        original_label,
        original_priority,
    } = &report.result.source
    {
        output.push_str(&format!(
            "Note: '{}' ({} priority) was too large; this result comes from a smaller chunk.\n",
            original_label, original_priority
        ));
    }
    output.push('\n');
    output.push_str(&report.result.text);
    output.push('\n');

    if let Some(review) = report.review {
        output.push_str(&format!("\n=== code review ({}) ===\n\n", review.chunk_label));
        output.push_str(&review.text);
        output.push('\n');
    }

    for item in &report.remaining {
        output.push_str(&format!("\n=== {} [{}] ===\n\n", item.label, item.priority));
        match (&item.text, &item.error) {
            (Some(text), _) => output.push_str(text),
            (None, Some(error)) => output.push_str(&format!("Analysis failed: {}", error)),
            (None, None) => {}
        }
        output.push('\n');
    }

    if report.result.remaining_chunks > 0 {
        output.push_str(&format!(
            "\n{} of {} chunk(s) were not analyzed.\n",
            report.result.remaining_chunks.saturating_sub(report.remaining.len()),
            report.summary.total_chunks
        ));
    }

    print!("{}", output);
    Ok(())
}
