use anyhow::{bail, Context, Result};
use apkdash_lib::database::models::{
    BuildType, CommentSubject, FeedbackStatus, FeedbackType, Severity, TaskPriority, TaskStatus,
};
use apkdash_lib::database::{self, activity_repo, feedback_repo, task_repo};
use apkdash_lib::services::apk::{ApkExtractor, ToolInspector};
use apkdash_lib::services::builds::{
    delete_build, download_build, prune_rejected_builds, register_build, review_build,
    BuildDownload, BuildUpload, ReviewDecision, UploadSource,
};
use apkdash_lib::services::comments::{list_thread, post_comment};
use apkdash_lib::services::config::{ConfigService, DEFAULT_CONFIG_FILE};
use apkdash_lib::services::feedback::{self, FeedbackInput};
use apkdash_lib::services::notify::LogNotifier;
use apkdash_lib::services::sharing::{self, ShareOptions};
use apkdash_lib::services::storage::BlobStore;
use apkdash_lib::services::tasks::{self, TaskInput};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "apkdash")]
#[command(version, about = "APK build distribution backend")]
pub struct Cli {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the metadata of an APK without storing anything
    Inspect {
        apk: PathBuf,
        /// Write the extracted icon here
        #[arg(long)]
        icon_out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Store an APK as a new Pending build
    Upload {
        apk: PathBuf,
        #[arg(long, default_value = "Beta")]
        build_type: BuildType,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Approve or reject a Pending build
    Review {
        build_id: i64,
        decision: ReviewDecision,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Delete a build and its archive
    Delete {
        build_id: i64,
        #[arg(long)]
        by: Option<String>,
    },
    /// Remove archives of old rejected builds
    Prune {
        /// Overrides the configured retention
        #[arg(long)]
        days: Option<u32>,
    },
    /// Create a download link for a build
    Share {
        build_id: i64,
        #[arg(long)]
        hours: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Resolve a share token and copy the archive out
    Download {
        token: String,
        #[arg(long)]
        password: Option<String>,
        /// Directory to copy into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Copy the archive of a build out directly, without a share link
    Fetch {
        build_id: i64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long)]
        by: Option<String>,
    },
    /// Report a bug, feature request or improvement on a build
    Feedback {
        build_id: i64,
        #[arg(long = "type", default_value = "Bug")]
        kind: FeedbackType,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        severity: Option<Severity>,
        #[arg(long)]
        device: Option<String>,
        #[arg(long)]
        os: Option<String>,
        #[arg(long)]
        screen: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Move a feedback report to another status
    FeedbackStatus {
        feedback_id: i64,
        status: FeedbackStatus,
    },
    /// Open a task on a build
    Task {
        build_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, default_value = "Medium")]
        priority: TaskPriority,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Change the status, priority or assignee of a task
    TaskUpdate {
        task_id: i64,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Comment on a build, feedback report or task
    Comment {
        subject: CommentSubject,
        subject_id: i64,
        body: String,
        /// Reply to this comment
        #[arg(long)]
        reply_to: Option<i64>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Print the comment thread of a build, feedback report or task
    Thread {
        subject: CommentSubject,
        subject_id: i64,
    },
    /// Show recent activity
    Log {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = ConfigService::new(cli.config.clone());
    let settings = config.get_settings();
    let extractor = ApkExtractor::new(
        ToolInspector::from_config(&settings.extractor),
        settings.scratch_dir(),
    );

    // Inspection never touches storage or the database.
    if let Commands::Inspect {
        apk,
        icon_out,
        json,
    } = &cli.command
    {
        let result = extractor.extract(apk).await;
        if !result.success {
            bail!(
                "{}",
                result.error.unwrap_or_else(|| "Failed to analyze package".into())
            );
        }
        if *json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("Package:  {}", result.package_name);
            println!("Version:  {} ({})", result.version_name, result.version_code);
            println!("Name:     {}", result.app_name);
            println!(
                "Icon:     {}",
                result.icon_internal_path.as_deref().unwrap_or("none")
            );
        }
        if let (Some(out), Some(bytes)) = (icon_out, result.icon_bytes.as_deref()) {
            std::fs::write(out, bytes)
                .with_context(|| format!("Failed to write icon to {}", out.display()))?;
        }
        return Ok(());
    }

    let store = BlobStore::new(&settings.storage_root);
    store
        .ensure_layout()
        .with_context(|| format!("Failed to prepare {}", settings.storage_root.display()))?;
    let pool = database::connect(&settings.database_url)
        .await
        .with_context(|| format!("Failed to open {}", settings.database_url))?;

    match cli.command {
        Commands::Inspect { .. } => {}
        Commands::Upload {
            apk,
            build_type,
            notes,
            by,
        } => {
            let request = BuildUpload {
                source: UploadSource::Direct(apk),
                build_type,
                release_notes: notes,
                uploaded_by: by,
            };
            let registered = register_build(&pool, &store, &extractor, request).await?;
            println!(
                "Build {} registered for {} ({} v{}, {})",
                registered.build.id,
                registered.project.name,
                registered.build.build_type,
                registered.build.version_name,
                registered.build.file_size_human()
            );
        }
        Commands::Review {
            build_id,
            decision,
            remarks,
            by,
        } => {
            let build =
                review_build(&pool, build_id, decision, by.as_deref(), remarks.as_deref()).await?;
            println!("Build {} is now {}", build.id, build.status);
        }
        Commands::Delete { build_id, by } => {
            delete_build(&pool, &store, build_id, by.as_deref()).await?;
            println!("Build {build_id} deleted");
        }
        Commands::Prune { days } => {
            let days = days.unwrap_or(settings.retention.rejected_build_days);
            let report = prune_rejected_builds(&pool, &store, days).await?;
            println!(
                "Pruned {} archive(s), {} freed",
                report.pruned,
                database::models::human_size(i64::try_from(report.freed_bytes).unwrap_or(i64::MAX))
            );
            for failed in &report.failures {
                eprintln!("Could not remove {failed}");
            }
        }
        Commands::Share {
            build_id,
            hours,
            limit,
            password,
            by,
        } => {
            let options = ShareOptions {
                expires_in_hours: hours.or(settings.sharing.default_expiry_hours),
                download_limit: limit,
                password,
            };
            let link = sharing::create_share_link(&pool, build_id, by.as_deref(), &options).await?;
            println!("{}", link.token);
            if let Some(expires_at) = &link.expires_at {
                println!("Expires {expires_at} UTC");
            }
        }
        Commands::Download {
            token,
            password,
            out,
        } => {
            let download =
                sharing::resolve_download(&pool, &store, &token, password.as_deref(), None).await?;
            copy_out(&download, &out)?;
        }
        Commands::Fetch { build_id, out, by } => {
            let download = download_build(&pool, &store, build_id, by.as_deref()).await?;
            copy_out(&download, &out)?;
        }
        Commands::Feedback {
            build_id,
            kind,
            title,
            description,
            severity,
            device,
            os,
            screen,
            by,
        } => {
            let input = FeedbackInput {
                severity,
                device_model: device,
                os_version: os,
                screen_size: screen,
                ..FeedbackInput::new(kind, &title, &description)
            };
            let report =
                feedback::submit_feedback(&pool, &LogNotifier, build_id, by.as_deref(), &input)
                    .await?;
            println!("Feedback {} filed ({})", report.id, report.status);
        }
        Commands::FeedbackStatus { feedback_id, status } => {
            let current = feedback_repo::get_feedback(&pool, feedback_id)
                .await?
                .with_context(|| format!("Feedback {feedback_id} not found"))?;
            let input = FeedbackInput::from_row(&current)?;
            let report = feedback::update_feedback(&pool, feedback_id, &input, status).await?;
            println!("Feedback {} is now {}", report.id, report.status);
        }
        Commands::Task {
            build_id,
            title,
            description,
            assignee,
            priority,
            due,
            by,
        } => {
            let input = TaskInput {
                description,
                assignee,
                priority,
                due_date: due,
                ..TaskInput::new(&title)
            };
            let task =
                tasks::create_task(&pool, &LogNotifier, build_id, by.as_deref(), &input).await?;
            println!("Task {} created ({}, {})", task.id, task.priority, task.status);
        }
        Commands::TaskUpdate {
            task_id,
            status,
            priority,
            assignee,
            by,
        } => {
            let current = task_repo::get_task(&pool, task_id)
                .await?
                .with_context(|| format!("Task {task_id} not found"))?;
            let mut input = TaskInput::from_row(&current);
            if let Some(status) = status {
                input.status = status;
            }
            if let Some(priority) = priority {
                input.priority = priority;
            }
            if assignee.is_some() {
                input.assignee = assignee;
            }
            let task =
                tasks::update_task(&pool, &LogNotifier, task_id, by.as_deref(), &input).await?;
            println!(
                "Task {} is {} ({}, {})",
                task.id,
                task.status,
                task.priority,
                task.assignee.as_deref().unwrap_or("unassigned")
            );
        }
        Commands::Comment {
            subject,
            subject_id,
            body,
            reply_to,
            by,
        } => {
            let comment = post_comment(
                &pool,
                &LogNotifier,
                subject,
                subject_id,
                by.as_deref(),
                &body,
                reply_to,
            )
            .await?;
            println!("Comment {} added", comment.id);
        }
        Commands::Thread {
            subject,
            subject_id,
        } => {
            for comment in list_thread(&pool, subject, subject_id).await? {
                let indent = if comment.parent_id.is_some() { "  " } else { "" };
                println!(
                    "{indent}#{} {} {}: {}",
                    comment.id,
                    comment.created_at,
                    comment.author.as_deref().unwrap_or("-"),
                    comment.body
                );
            }
        }
        Commands::Log { limit } => {
            for entry in activity_repo::recent_activity(&pool, limit).await? {
                println!(
                    "{}  {:<20} {:<12} {}",
                    entry.created_at,
                    entry.action,
                    entry.actor.as_deref().unwrap_or("-"),
                    entry.description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

fn copy_out(download: &BuildDownload, out: &Path) -> Result<()> {
    let target = out.join(&download.file_name);
    std::fs::copy(&download.path, &target)
        .with_context(|| format!("Failed to copy to {}", target.display()))?;
    println!("{}", target.display());
    Ok(())
}
