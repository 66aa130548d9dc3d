mod cli;

use tubedigest::{
    admin::{self, ChannelOptions},
    config, pipeline,
    providers::YoutubeClient,
    workers::WorkerKind,
};
use tubedigest_common::{format_duration, parse_duration, FeatureId};
use tubedigest_db::pool::{get_conn, init_pool, DbPool};
use tubedigest_db::queries::{channels, contents, features};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AddChannel, ChannelCommand, Cli, Commands, ContentCommand, FeatureCommand};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubedigest=trace,tubedigest_captions=debug,tubedigest_db=debug,reqwest=debug".to_string()
        } else {
            "tubedigest=info,tubedigest_captions=info,tubedigest_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Start => {
            let config = config::load_config_or_default(config_path)?;
            for warning in config::config_warnings(&config) {
                tracing::warn!("{warning}");
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(pipeline::run(config))
        }
        Commands::RunOnce { worker } => run_once(config_path, worker),
        Commands::Channel(cmd) => channel_command(config_path, cmd),
        Commands::Feature(cmd) => feature_command(config_path, cmd),
        Commands::Content(cmd) => content_command(config_path, cmd),
        Commands::Status => status(config_path),
        Commands::ParseDuration { text } => {
            let duration = parse_duration(&text)?;
            println!("{} ({} seconds)", format_duration(duration), duration.as_secs());
            Ok(())
        }
        Commands::CheckTools => check_tools(config_path),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubedigest {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_db(config_path: Option<&Path>) -> Result<DbPool> {
    let config = config::load_config_or_default(config_path)?;
    let path = config::database_path(&config);
    tracing::debug!("Opening database at {}", path);
    Ok(init_pool(&path, &config.database.pool_settings())?)
}

fn run_once(config_path: Option<&Path>, worker: WorkerKind) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(pipeline::run_once(config, worker))?;

    println!(
        "{:?}: selected {}, completed {}, skipped {}, failed {}",
        worker, report.selected, report.completed, report.skipped, report.failed
    );
    Ok(())
}

fn channel_command(config_path: Option<&Path>, cmd: ChannelCommand) -> Result<()> {
    match cmd {
        ChannelCommand::Add(args) => add_channel(config_path, args),
        ChannelCommand::List => {
            let db = open_db(config_path)?;
            let conn = get_conn(&db)?;
            let list = channels::list_channels(&conn)?;
            if list.is_empty() {
                println!("No channels registered.");
            }
            for ch in list {
                let watermark = ch
                    .last_published_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!("{}  {}", ch.id, ch.name);
                println!("    url: {}", ch.url);
                println!(
                    "    activity: {}  keywords: {}  last published: {}",
                    ch.activity_level,
                    ch.title_keywords.as_deref().unwrap_or("-"),
                    watermark
                );
            }
            Ok(())
        }
        ChannelCommand::Update {
            id,
            name,
            activity,
            keywords,
        } => {
            let db = open_db(config_path)?;
            let conn = get_conn(&db)?;
            let existing = channels::get_channel(&conn, &id)?
                .with_context(|| format!("Channel not found: {id}"))?;

            let name = name.unwrap_or(existing.name);
            let activity = activity.unwrap_or(existing.activity_level);
            let keywords = match keywords {
                Some(k) if k.trim().is_empty() => None,
                Some(k) => Some(k.trim().to_string()),
                None => existing.title_keywords,
            };

            channels::update_channel(&conn, &id, &name, activity, keywords.as_deref())?;
            println!("Updated channel {id}");
            Ok(())
        }
        ChannelCommand::Remove { id } => {
            let db = open_db(config_path)?;
            let conn = get_conn(&db)?;
            if !channels::delete_channel(&conn, &id)? {
                anyhow::bail!("Channel not found: {id}");
            }
            println!("Removed channel {id} and its content");
            Ok(())
        }
    }
}

fn add_channel(config_path: Option<&Path>, args: AddChannel) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let db = init_pool(&config::database_path(&config), &config.database.pool_settings())?;
    let youtube = YoutubeClient::from_config(&config.youtube)?;
    let options = ChannelOptions {
        activity_level: args.activity,
        title_keywords: args.keywords,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let channel = rt.block_on(async {
        match (&args.id, &args.suffix) {
            (Some(id), _) => admin::add_channel_by_id(&db, &youtube, id, options).await,
            (None, Some(suffix)) => {
                admin::add_channel_by_suffix(&db, &youtube, suffix, args.title.as_deref(), options)
                    .await
            }
            (None, None) => Err(tubedigest_common::Error::Validation(
                "either --id or --suffix is required".into(),
            )),
        }
    })?;

    println!("Added channel {} ({})", channel.name, channel.id);
    println!("    url: {}", channel.url);
    Ok(())
}

fn feature_command(config_path: Option<&Path>, cmd: FeatureCommand) -> Result<()> {
    let db = open_db(config_path)?;
    let conn = get_conn(&db)?;

    match cmd {
        FeatureCommand::Add {
            first_en,
            last_en,
            first_local,
            last_local,
        } => {
            let feature = features::create_feature(
                &conn,
                &first_en,
                &last_en,
                first_local.as_deref(),
                last_local.as_deref(),
            )?;
            println!("Added {} {} ({})", feature.first_name_en, feature.last_name_en, feature.id);
        }
        FeatureCommand::List => {
            for f in features::list_features(&conn)? {
                let local = match (&f.first_name_local, &f.last_name_local) {
                    (Some(first), Some(last)) => format!(" / {first} {last}"),
                    (Some(name), None) | (None, Some(name)) => format!(" / {name}"),
                    (None, None) => String::new(),
                };
                println!("{}  {} {}{}", f.id, f.first_name_en, f.last_name_en, local);
            }
        }
        FeatureCommand::Remove { id } => {
            let id: FeatureId = id.parse().context("Invalid feature id")?;
            if !features::delete_feature(&conn, id)? {
                anyhow::bail!("Feature not found: {id}");
            }
            println!("Removed feature {id}");
        }
    }
    Ok(())
}

fn content_command(config_path: Option<&Path>, cmd: ContentCommand) -> Result<()> {
    let db = open_db(config_path)?;
    let conn = get_conn(&db)?;

    match cmd {
        ContentCommand::List {
            stage,
            limit,
            offset,
            json,
        } => {
            let items = contents::list_contents(&conn, stage, offset, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }
            for item in items {
                let flag = if item.not_relevant { " [ignored]" } else { "" };
                println!(
                    "{}  {:<11} {}  {}{}",
                    item.video_id,
                    item.stage.as_str(),
                    item.published_at.format("%Y-%m-%d"),
                    item.title,
                    flag
                );
            }
        }
        ContentCommand::Ignore { video_id } => {
            if !contents::set_not_relevant(&conn, &video_id, true)? {
                anyhow::bail!("Content not found: {video_id}");
            }
            println!("{video_id} will be skipped by every stage");
        }
        ContentCommand::Unignore { video_id } => {
            if !contents::set_not_relevant(&conn, &video_id, false)? {
                anyhow::bail!("Content not found: {video_id}");
            }
            println!("{video_id} is back in the pipeline");
        }
    }
    Ok(())
}

fn status(config_path: Option<&Path>) -> Result<()> {
    let db = open_db(config_path)?;
    let conn = get_conn(&db)?;
    let counts = contents::count_by_stage(&conn)?;

    println!("Content by stage:");
    for stage in tubedigest_common::Stage::ALL {
        let n = counts
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        println!("  {:<12} {}", stage.as_str(), n);
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let program = config
        .captions
        .yt_dlp_path
        .clone()
        .unwrap_or_else(|| "yt-dlp".into());
    let tool = tubedigest_captions::check_tool(&program);

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" at {}", path.display());
    }
    println!();

    if !tool.available {
        println!("\nyt-dlp is required for transcription. Install it or set captions.yt_dlp_path.");
        anyhow::bail!("Required tool missing");
    }

    println!("\nAll required tools are available.");
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;
    println!("Configuration is valid.");

    let warnings = config::config_warnings(&config);
    if warnings.is_empty() {
        println!("No warnings.");
    } else {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    match config.require_credentials() {
        Ok(()) => println!("\nCredentials: complete"),
        Err(e) => println!("\nCredentials: {e}"),
    }

    println!("\nSchedule (seconds):");
    println!("  discovery:     {}", config.schedule.discovery_secs);
    println!("  transcription: {}", config.schedule.transcription_secs);
    println!("  summarization: {}", config.schedule.summarization_secs);
    println!("  translation:   {}", config.schedule.translation_secs);
    println!("  publication:   {}", config.schedule.publication_secs);
    Ok(())
}
