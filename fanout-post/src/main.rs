//! fanout-post - Compose a post once and publish it to several platforms

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use libfanout::api::Tone;
use libfanout::error::{SubmitError, ValidationError};
use libfanout::logging::LoggingConfig;
use libfanout::media;
use libfanout::service::enrichment::{GenerateOptions, Suggestion};
use libfanout::service::publish::SubmitOutcome;
use libfanout::types::ScheduleMode;
use libfanout::{
    scheduling, AccountId, Config, Draft, DraftAction, FanoutError, FanoutService, PlatformId,
    Schedule,
};
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "fanout-post")]
#[command(version)]
#[command(about = "Compose once and publish to multiple social platforms")]
#[command(long_about = r#"Compose once and publish to multiple social platforms.

EXAMPLES:
    # Publish now to one account
    fanout-post "Launch day!" --platform twitter --account twitter:main --media hero.png

    # Several platforms, content from stdin
    echo "New release" | fanout-post --platform twitter,instagram \
        --account twitter:main --account instagram:brand --media cover.jpg

    # Schedule
    fanout-post "Tomorrow's news" --platform twitter --account twitter:main \
        --media img.png --at "tomorrow 9am"
    fanout-post "..." --date 2030-05-01 --time 09:30 ...

    # Save remotely as a draft
    fanout-post "Half an idea" --draft

    # Let the generator write it
    fanout-post --generate "product launch" --platform instagram --tone casual
    fanout-post --generate "product launch" --platform instagram --apply instagram ...

    # Publish a post that was created but not published
    fanout-post --retry-publish post-123

CONFIGURATION:
    Configuration file: ~/.config/fanout/config.toml (or $FANOUT_CONFIG)
    API token: [api] token, or the variable named by [api] token_env
               (default FANOUT_API_TOKEN)

EXIT CODES:
    0 - Success
    1 - Network, upload or server error
    2 - Authentication error
    3 - Invalid input or validation failure (nothing was sent)
    4 - Post was created but not published (see --retry-publish)
"#)]
struct Cli {
    /// Content to post (reads from stdin if not provided)
    content: Option<String>,

    /// Target platform(s), comma-separated or repeated
    #[arg(short, long, value_delimiter = ',', value_name = "PLATFORM")]
    platform: Vec<String>,

    /// Target account as PLATFORM:ID (repeatable)
    #[arg(short, long, value_name = "PLATFORM:ID")]
    account: Vec<String>,

    /// Image or video to attach (repeatable, uploaded as one batch)
    #[arg(short, long, value_name = "PATH")]
    media: Vec<PathBuf>,

    /// Hashtags as free text, e.g. "#launch #rust"
    #[arg(long, value_name = "TAGS")]
    hashtags: Option<String>,

    /// Mentions as free text, e.g. "@brand @partner"
    #[arg(long, value_name = "MENTIONS")]
    mentions: Option<String>,

    /// Post category
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// Schedule with a duration or natural language ("2h", "tomorrow 9am")
    #[arg(long, value_name = "WHEN", conflicts_with_all = ["date", "time"])]
    at: Option<String>,

    /// Scheduled date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Scheduled time (HH:MM, local time)
    #[arg(long, value_name = "TIME")]
    time: Option<String>,

    /// Save as a remote draft without publishing
    #[arg(short, long)]
    draft: bool,

    /// Generate content from a prompt
    #[arg(long, value_name = "PROMPT")]
    generate: Option<String>,

    /// Tone for --generate
    #[arg(long, default_value = "professional", value_name = "TONE")]
    tone: Tone,

    /// Use the generated suggestion for this platform as the post
    #[arg(long, value_name = "PLATFORM", requires = "generate")]
    apply: Option<String>,

    /// Append N suggested hashtags before submitting
    #[arg(long, value_name = "N")]
    suggest_hashtags: Option<usize>,

    /// List connected platforms and accounts, then exit
    #[arg(long)]
    list_accounts: bool,

    /// Publish an already created post by id
    #[arg(long, value_name = "POST_ID")]
    retry_publish: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        std::process::exit(report(&e));
    }
}

/// Print the error to stderr and pick the exit code
fn report(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<FanoutError>() {
        Some(FanoutError::Validation(errors)) => {
            eprintln!("Error: validation failed");
            for e in errors.iter() {
                eprintln!("  - {}", e);
            }
            3
        }
        Some(e @ FanoutError::Submit(SubmitError::CreatedNotPublished { post_id, .. })) => {
            eprintln!("Error: {}", e);
            eprintln!("Retry with: fanout-post --retry-publish {}", post_id);
            e.exit_code()
        }
        Some(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
        None => {
            eprintln!("Error: {:#}", error);
            1
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let content = read_content(&cli)?;
    let needs_content = cli.generate.is_none() && !cli.list_accounts && cli.retry_publish.is_none();
    if needs_content && content.trim().is_empty() {
        return Err(FanoutError::InvalidInput("Content cannot be empty".to_string()).into());
    }

    let config = Config::load()?;
    let service = FanoutService::from_config(config)?;

    if cli.list_accounts {
        return list_accounts(&service, &cli.format).await;
    }

    let mut draft = service.new_draft();

    if let Some(post_id) = &cli.retry_publish {
        let outcome = service
            .publisher()
            .retry_publish(&mut draft, post_id)
            .await?;
        return print_outcome(&outcome, &cli.format);
    }

    compose(&cli, &mut draft, content)?;

    if let Some(prompt) = &cli.generate {
        let suggestions = generate(&service, &cli, &draft, prompt).await?;
        match &cli.apply {
            Some(platform) => {
                let platform = PlatformId::new(platform);
                let suggestion = suggestions
                    .iter()
                    .find(|s| s.platform == platform)
                    .ok_or_else(|| {
                        FanoutError::InvalidInput(format!("No suggestion for {}", platform))
                    })?;
                service.enrichment().apply_suggestion(&mut draft, suggestion);
            }
            None => return print_suggestions(&suggestions, &cli.format),
        }
    }

    if let Some(count) = cli.suggest_hashtags {
        let Some(platform) = draft.platforms().iter().next().cloned() else {
            return Err(FanoutError::InvalidInput(
                "--suggest-hashtags needs a platform".to_string(),
            )
            .into());
        };
        let added = service
            .enrichment()
            .add_suggested_hashtags(&mut draft, &platform, count)
            .await
            .map_err(FanoutError::from)?;
        debug!("Added {} suggested hashtag(s)", added);
    }

    if cli.draft {
        attach_media(&service, &cli.media, &mut draft).await?;
        let post_id = service.publisher().save_draft(&mut draft).await?;
        return print_draft_saved(&post_id, &cli.format);
    }

    precheck(&service, &draft, !cli.media.is_empty())?;
    attach_media(&service, &cli.media, &mut draft).await?;

    let outcome = service.publisher().submit(&mut draft).await?;
    print_outcome(&outcome, &cli.format)
}

fn read_content(cli: &Cli) -> anyhow::Result<String> {
    if let Some(content) = &cli.content {
        return Ok(content.clone());
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read content from stdin")?;
    Ok(buffer.trim_end_matches('\n').to_string())
}

/// Apply the command line to a fresh draft
fn compose(cli: &Cli, draft: &mut Draft, content: String) -> anyhow::Result<()> {
    draft.apply(DraftAction::SetContent(content));

    if !cli.platform.is_empty() {
        draft.apply(DraftAction::SetPlatforms(
            cli.platform.iter().map(PlatformId::new).collect(),
        ));
    }
    select_accounts(&cli.account, draft)?;

    if let Some(tags) = &cli.hashtags {
        draft.apply(DraftAction::SetHashtagsText(tags.clone()));
    }
    if let Some(mentions) = &cli.mentions {
        draft.apply(DraftAction::SetMentionsText(mentions.clone()));
    }
    if let Some(category) = &cli.category {
        draft.apply(DraftAction::SetCategory(category.clone()));
    }

    if let Some(at) = &cli.at {
        draft.apply(DraftAction::SetSchedule(scheduling::parse_schedule(at)?));
    } else if cli.date.is_some() || cli.time.is_some() {
        let date = cli.date.as_deref().map(scheduling::parse_date).transpose()?;
        draft.apply(DraftAction::SetSchedule(Schedule {
            mode: ScheduleMode::Later,
            date,
            time: cli.time.clone(),
        }));
    }
    Ok(())
}

fn select_accounts(entries: &[String], draft: &mut Draft) -> anyhow::Result<()> {
    for entry in entries {
        let (platform, account) = parse_account(entry)?;
        if !draft.platforms().contains(&platform) {
            warn!("Ignoring account {} for unselected platform {}", account, platform);
            continue;
        }
        draft.apply(DraftAction::SelectAccount { platform, account });
    }
    Ok(())
}

fn parse_account(entry: &str) -> Result<(PlatformId, AccountId), FanoutError> {
    match entry.split_once(':') {
        Some((platform, account)) if !platform.trim().is_empty() && !account.trim().is_empty() => {
            Ok((PlatformId::new(platform), AccountId::new(account.trim())))
        }
        _ => Err(FanoutError::InvalidInput(format!(
            "Invalid account '{}': expected PLATFORM:ID",
            entry
        ))),
    }
}

/// Fail before uploading anything if the draft cannot be submitted anyway
fn precheck(service: &FanoutService, draft: &Draft, media_pending: bool) -> anyhow::Result<()> {
    if let Err(mut errors) = service.validator().validate_for_submit(draft) {
        if media_pending {
            errors.0.retain(|e| *e != ValidationError::MediaRequired);
        }
        if !errors.is_empty() {
            return Err(FanoutError::Validation(errors).into());
        }
    }
    Ok(())
}

async fn attach_media(
    service: &FanoutService,
    paths: &[PathBuf],
    draft: &mut Draft,
) -> anyhow::Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let files = media::load_files(paths)
        .await
        .map_err(|e| FanoutError::InvalidInput(format!("Failed to read media: {}", e)))?;
    let report = service
        .uploads()
        .upload(draft, files)
        .await
        .map_err(FanoutError::from)?;
    for rejection in &report.rejected {
        eprintln!("Skipped {}: {}", rejection.file_name, rejection.reason);
    }
    Ok(())
}

async fn generate(
    service: &FanoutService,
    cli: &Cli,
    draft: &Draft,
    prompt: &str,
) -> anyhow::Result<Vec<Suggestion>> {
    let platforms: Vec<PlatformId> = draft.platforms().iter().cloned().collect();
    if platforms.is_empty() {
        return Err(FanoutError::InvalidInput("--generate needs a platform".to_string()).into());
    }
    let options = GenerateOptions {
        tone: cli.tone,
        ..Default::default()
    };
    Ok(service
        .enrichment()
        .generate_content(prompt, &platforms, &options)
        .await
        .map_err(FanoutError::from)?)
}

async fn list_accounts(service: &FanoutService, format: &str) -> anyhow::Result<()> {
    let connected = service.connected_accounts().await?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&connected)?);
        return Ok(());
    }
    for platform in &connected {
        println!("{}", platform.platform);
        for account in &platform.accounts {
            match &account.username {
                Some(username) => println!("  {}:{}  {} (@{})", platform.platform, account.id, account.name, username),
                None => println!("  {}:{}  {}", platform.platform, account.id, account.name),
            }
        }
    }
    Ok(())
}

fn print_suggestions(suggestions: &[Suggestion], format: &str) -> anyhow::Result<()> {
    if format == "json" {
        let value: Vec<_> = suggestions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "platform": s.platform,
                    "content": s.content,
                    "hashtags": s.hashtags,
                    "characterCount": s.character_count,
                    "withinLimit": s.within_limit,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    for s in suggestions {
        let limit = if s.within_limit { "" } else { " (over limit)" };
        println!("[{}] {} chars{}", s.platform, s.character_count, limit);
        println!("{}", s.content);
        if !s.hashtags.is_empty() {
            println!("{}", s.hashtags.join(" "));
        }
        println!();
    }
    Ok(())
}

fn print_outcome(outcome: &SubmitOutcome, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match &outcome.scheduled_at {
        Some(at) => println!("Scheduled {} for {}", outcome.post_id, at),
        None => println!("Published {}", outcome.post_id),
    }
    Ok(())
}

fn print_draft_saved(post_id: &str, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!(
            "{}",
            serde_json::json!({ "post_id": post_id, "status": "draft" })
        );
    } else {
        println!("Saved draft {}", post_id);
    }
    Ok(())
}
