use std::fmt;

use chrono::{DateTime, Utc};
use formation_core::model::{ChoiceDraft, ContentKind, ContentLocation, QuestionDraft, QuizDraft};
use storage::import::import_formation;
use storage::repository::{NewContentRecord, NewFormationRecord, NewModuleRecord, Storage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    from: Option<String>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("FORMATION_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut from = std::env::var("FORMATION_IMPORT_FILE").ok();
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--from" => {
                    let value = require_value(&mut args, "--from")?;
                    from = Some(value);
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, from, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --from <json_file>  Import a formation export instead of the built-in sample");
    eprintln!("  --now <rfc3339>     Fixed current time for deterministic seeding");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  FORMATION_DB_URL, FORMATION_IMPORT_FILE");
}

/// Seeds a small two-module formation with contents and a quiz.
async fn seed_sample(
    storage: &Storage,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let formation_id = storage
        .formations
        .insert_new_formation(NewFormationRecord {
            title: "Workplace Safety".into(),
            description: Some("Mandatory onboarding course".into()),
            kind: Some("interne".into()),
            duration_minutes: 120,
            created_at: now,
        })
        .await?;

    let basics = storage
        .modules
        .insert_new_module(NewModuleRecord {
            formation_id,
            title: "Basics".into(),
            description: None,
            created_at: now,
        })
        .await?;
    let advanced = storage
        .modules
        .insert_new_module(NewModuleRecord {
            formation_id,
            title: "Advanced".into(),
            description: Some("Unlocked after passing the basics quiz".into()),
            created_at: now,
        })
        .await?;

    let samples = [
        (basics, ContentKind::Pdf, "Safety handbook", 20, "https://media.example/handbook.pdf"),
        (basics, ContentKind::Video, "Evacuation routes", 8, "https://media.example/routes.mp4"),
        (advanced, ContentKind::Text, "Incident reporting", 10, "https://media.example/reporting"),
    ];
    for (module_id, kind, title, minutes, url) in samples {
        storage
            .modules
            .insert_new_content(NewContentRecord {
                module_id,
                kind,
                title: title.into(),
                duration_minutes: minutes,
                location: ContentLocation::from_url(url)?,
                created_at: now,
            })
            .await?;
    }

    let quiz = QuizDraft {
        module_id: basics,
        title: "Basics check".into(),
        description: None,
        pass_threshold: 70,
        questions: vec![
            QuestionDraft::new(
                "What is the first thing to do when the alarm sounds?",
                vec![
                    ChoiceDraft::new("Leave by the nearest marked route", true),
                    ChoiceDraft::new("Finish the current task", false),
                    ChoiceDraft::new("Take the elevator", false),
                ],
            ),
            QuestionDraft::new(
                "Who do you report a blocked exit to?",
                vec![
                    ChoiceDraft::new("Nobody, it resolves itself", false),
                    ChoiceDraft::new("The site safety officer", true),
                ],
            ),
        ],
    };
    storage.quizzes.insert_quiz(quiz.validate()?, now).await?;

    tracing::info!(formation = %formation_id, "seeded sample formation");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    match &args.from {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            let formation_id = import_formation(&storage, &json, now).await?;
            println!("Imported formation {} from {path} into {}", formation_id.value(), args.db_url);
        }
        None => {
            seed_sample(&storage, now).await?;
            println!("Seeded sample formation into {}", args.db_url);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "storage=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
