mod auth;
mod config;
mod dates;
mod db;
mod error;
mod filter;
mod models;
mod prompt;
mod report;
mod results;
mod session;
mod status;
mod tui;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use config::{Config, FormDefaults};
use db::Database;
use filter::{filter_by_recipient, FilterSummary};
use models::{Locale, NewSearch, SearchStatus};
use session::SessionState;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Candidate sourcing searches - submit, track, and review results")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output language (de, en)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Submit a new search
    New {
        /// Search keywords, e.g. "React Entwickler"
        keywords: String,

        #[command(flatten)]
        fields: SearchFields,

        /// Leave radius, target and resume age unconstrained when not given
        #[arg(long)]
        no_defaults: bool,
    },

    /// Submit a new search with the filters of an existing one (unset limits stay unset)
    Copy {
        /// Search ID to copy from
        id: i64,

        /// Name for the copy (defaults to "Kopie von <name>")
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List searches, newest first
    List {
        /// Only searches whose recipient email contains this text
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show search details and results
    Show {
        /// Search ID
        id: i64,

        /// Print the record and its derived results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse searches interactively
    Browse {
        /// Only searches whose recipient email contains this text
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Record progress reported by the sourcing process
    Mark {
        /// Search ID
        id: i64,

        /// New status (processing, completed, failed)
        status: String,

        /// JSON file with the results payload (for completed)
        #[arg(short, long)]
        results: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SearchFields {
    /// Display name for the search
    #[arg(short, long)]
    name: Option<String>,

    /// Location, e.g. "Berlin, Deutschland"
    #[arg(short, long)]
    location: Option<String>,

    /// Max. radius around the location in km
    #[arg(long)]
    radius: Option<u32>,

    /// Only resumes updated within this many days
    #[arg(long)]
    resume_days: Option<u32>,

    /// Number of candidates to look for
    #[arg(long)]
    target: Option<u32>,

    /// Where results are sent
    #[arg(short, long)]
    email: Option<String>,

    /// User prompt text
    #[arg(long, conflicts_with = "user_prompt_file")]
    user_prompt: Option<String>,

    /// Read the user prompt from a file
    #[arg(long)]
    user_prompt_file: Option<PathBuf>,

    /// System prompt text
    #[arg(long, conflicts_with = "system_prompt_file")]
    system_prompt: Option<String>,

    /// Read the system prompt from a file
    #[arg(long)]
    system_prompt_file: Option<PathBuf>,
}

fn read_prompt(text: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read prompt file: {}", path.display())),
        None => Ok(text),
    }
}

impl SearchFields {
    fn into_form(self, keywords: String) -> Result<NewSearch> {
        let user_prompt = read_prompt(self.user_prompt, self.user_prompt_file.as_deref())?;
        let system_prompt = read_prompt(self.system_prompt, self.system_prompt_file.as_deref())?;
        Ok(NewSearch {
            name: self.name,
            search_keywords: keywords,
            location: self.location,
            resume_last_updated_days: self.resume_days,
            target_candidates: self.target,
            max_radius: self.radius,
            recipient_email: self.email,
            user_prompt,
            system_prompt,
        })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SCOUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(cli_path: Option<&Path>, config: &Config) -> Result<Database> {
    match cli_path.or(config.database_path.as_deref()) {
        Some(path) => Database::open_at(path),
        None => Database::open(),
    }
}

fn create_search(db: &Database, form: NewSearch, defaults: Option<&FormDefaults>) -> Result<i64> {
    let mut form = form.validated()?;
    if let Some(defaults) = defaults {
        defaults.apply(&mut form);
    }
    db.create_search(&form)
}

fn list_searches(db: &Database, email: Option<&str>, locale: Locale) -> Result<()> {
    let searches = db.list_searches()?;
    if searches.is_empty() {
        println!("No searches found. Create one with 'scout new <keywords>'.");
        return Ok(());
    }

    let filtered = filter_by_recipient(&searches, email);
    if let Some(summary) = FilterSummary::new(filtered.len(), searches.len(), email) {
        println!(
            "Showing {} of {} searches for \"{}\"\n",
            summary.shown, summary.total, summary.filter
        );
    }
    if filtered.is_empty() {
        println!("No searches with a recipient email matching \"{}\".", email.unwrap_or_default());
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<6} {:<15} {:<30} {:<26} {:<24} {}",
        "ID", "STATUS", "NAME", "CREATED", "EMAIL", "RESULTS"
    );
    println!("{}", "-".repeat(120));
    for search in filtered {
        let (status, results) = match search.parsed_status() {
            Ok(parsed) => {
                let view = status::view_for(parsed, search.results.as_ref());
                (
                    parsed.label(locale).to_string(),
                    report::candidate_count_label(&view, locale).unwrap_or_default(),
                )
            }
            Err(e) => {
                eprintln!("Search #{}: {}", search.id, e);
                (format!("{}!", search.status), String::new())
            }
        };
        println!(
            "{:<6} {:<15} {:<30} {:<26} {:<24} {}",
            search.id,
            truncate(&status, 15),
            truncate(search.display_name(), 28),
            dates::format_relative(&search.created_at, &now, &Local, locale),
            truncate(search.recipient_email.as_deref().unwrap_or("-"), 22),
            results
        );
    }
    Ok(())
}

fn mark_search(db: &Database, id: i64, status: &str, results: Option<&Path>) -> Result<()> {
    let status: SearchStatus = status.parse()?;
    let payload = match results {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read results file: {}", path.display()))?;
            Some(
                serde_json::from_str::<serde_json::Value>(&raw)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?,
            )
        }
        None => None,
    };

    match (status, payload) {
        (SearchStatus::Processing, None) => db.mark_processing(id),
        (SearchStatus::Failed, None) => db.mark_failed(id),
        (SearchStatus::Completed, Some(payload)) => db.complete_with_results(id, &payload),
        (SearchStatus::Completed, None) => db.complete_with_results(id, &serde_json::json!({})),
        (SearchStatus::Pending, _) => Err(anyhow!("Searches cannot be moved back to pending")),
        (_, Some(_)) => Err(anyhow!("--results is only accepted with 'completed'")),
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load()?;
    let locale = match cli.locale.as_deref() {
        Some(l) => l.parse()?,
        None => config.locale,
    };
    let db = open_database(cli.db.as_deref(), &config)?;

    if !matches!(cli.command, Commands::Init) {
        db.ensure_initialized()?;
        auth::require_auth(&db)?;
    }

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::New {
            keywords,
            fields,
            no_defaults,
        } => {
            let form = fields.into_form(keywords)?;
            let defaults = (!no_defaults).then_some(&config.defaults);
            let id = create_search(&db, form, defaults)?;
            println!("Submitted search #{} (pending)", id);
        }

        Commands::Copy { id, name } => {
            let source = db
                .get_search(id)?
                .ok_or_else(|| anyhow!("Search #{} not found", id))?;
            let mut form = NewSearch::copy_from(&source);
            if name.is_some() {
                form.name = name;
            }
            let new_id = create_search(&db, form, None)?;
            println!("Submitted search #{} (copy of #{})", new_id, id);
        }

        Commands::List { email } => {
            list_searches(&db, email.as_deref(), locale)?;
        }

        Commands::Show { id, json } => match db.get_search(id)? {
            Some(search) if json => {
                let value = report::detail_json(&search)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Some(search) => {
                let text = report::render_detail(&search, &Utc::now(), &Local, locale)?;
                print!("{}", text);
            }
            None => {
                println!("Search #{} not found.", id);
            }
        },

        Commands::Browse { email } => {
            let session_path = SessionState::default_path();
            tui::run_browse(&db, email, locale, session_path.as_deref())?;
        }

        Commands::Mark {
            id,
            status,
            results,
        } => {
            mark_search(&db, id, &status, results.as_deref())?;
            println!("Search #{} is now {}.", id, status);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("scout.db")).unwrap();
        db.init().unwrap();
        (dir, db)
    }

    #[test]
    fn test_cli_parses_new() {
        let cli = Cli::try_parse_from([
            "scout", "new", "Rust Entwickler", "--name", "Q1", "--radius", "50", "-e", "hr@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::New {
                keywords,
                fields,
                no_defaults,
            } => {
                assert!(!no_defaults);
                let form = fields.into_form(keywords).unwrap();
                assert_eq!(form.search_keywords, "Rust Entwickler");
                assert_eq!(form.name.as_deref(), Some("Q1"));
                assert_eq!(form.max_radius, Some(50));
                assert_eq!(form.recipient_email.as_deref(), Some("hr@example.com"));
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_cli_rejects_prompt_and_prompt_file() {
        let result = Cli::try_parse_from([
            "scout", "new", "x", "--user-prompt", "a", "--user-prompt-file", "b.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_search_applies_defaults() {
        let (_dir, db) = test_db();
        let form = NewSearch {
            search_keywords: "Data Scientist".to_string(),
            max_radius: Some(5),
            ..Default::default()
        };
        let id = create_search(&db, form, Some(&FormDefaults::default())).unwrap();
        let search = db.get_search(id).unwrap().unwrap();
        assert_eq!(search.max_radius, Some(5));
        assert_eq!(search.target_candidates, Some(100));
        assert_eq!(search.resume_last_updated_days, Some(30));
    }

    #[test]
    fn test_no_defaults_leaves_limits_unset() {
        let (_dir, db) = test_db();
        let cli = Cli::try_parse_from(["scout", "new", "SRE", "--no-defaults", "--target", "10"]).unwrap();
        let Commands::New {
            keywords,
            fields,
            no_defaults,
        } = cli.command
        else {
            panic!("expected new");
        };
        assert!(no_defaults);
        let form = fields.into_form(keywords).unwrap();
        let id = create_search(&db, form, None).unwrap();
        let search = db.get_search(id).unwrap().unwrap();
        assert_eq!(search.max_radius, None);
        assert_eq!(search.resume_last_updated_days, None);
        assert_eq!(search.target_candidates, Some(10));
    }

    #[test]
    fn test_copy_keeps_unconstrained_limits() {
        let (_dir, db) = test_db();
        let form = NewSearch {
            search_keywords: "SRE".to_string(),
            ..Default::default()
        };
        let id = create_search(&db, form, None).unwrap();
        let source = db.get_search(id).unwrap().unwrap();
        let copy_id = create_search(&db, NewSearch::copy_from(&source), None).unwrap();
        let copy = db.get_search(copy_id).unwrap().unwrap();
        assert_eq!(copy.name.as_deref(), Some("Kopie"));
        assert_eq!(copy.max_radius, None);
        assert_eq!(copy.target_candidates, None);
    }

    #[test]
    fn test_create_search_requires_keywords() {
        let (_dir, db) = test_db();
        let form = NewSearch::default();
        assert!(create_search(&db, form, Some(&FormDefaults::default())).is_err());
        assert!(db.list_searches().unwrap().is_empty());
    }

    #[test]
    fn test_mark_search() {
        let (dir, db) = test_db();
        let id = create_search(
            &db,
            NewSearch {
                search_keywords: "SRE".to_string(),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        assert!(mark_search(&db, id, "pending", None).is_err());
        assert!(mark_search(&db, id, "done", None).is_err());
        mark_search(&db, id, "processing", None).unwrap();

        let path = dir.path().join("results.json");
        std::fs::write(&path, json!({"profile_urls": ["http://a"]}).to_string()).unwrap();
        assert!(mark_search(&db, id, "failed", Some(path.as_path())).is_err());
        mark_search(&db, id, "completed", Some(path.as_path())).unwrap();

        let search = db.get_search(id).unwrap().unwrap();
        let view = status::classify(&search).unwrap();
        assert_eq!(view.candidate_count(), Some(1));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("München Hauptbahnhof", 10), "München...");
    }
}
