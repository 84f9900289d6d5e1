//! Command-line front end for the catalog.
//!
//! # Responsibility
//! - Load configuration, start logging and open the database once per run.
//! - Translate typed workflow results into user-facing text. A successful
//!   mutation "returns to the list" by printing the listing.

mod render;

use catalog_core::db::{open_db, open_db_in_memory};
use catalog_core::{
    init_logging, ArticleId, CatalogConfig, CatalogService, CreateArticleRequest, DbLocation,
    DeleteOutcome, FsImageStore, RepoError, SqliteArticleRepository, UpdateArticleRequest,
    UpdateOutcome, UploadedImage, WorkflowError,
};
use clap::{Parser, Subcommand};
use log::{error, info};
use rusqlite::Connection;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_OK: u8 = 0;
/// Exit status for input rejected by validation.
const EXIT_REJECTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "catalog")]
#[command(about = "Manage catalog articles and their images", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every article
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create an article from a title, a price and an image file
    Create {
        #[arg(long)]
        title: String,
        /// Whole number, digits only
        #[arg(long)]
        price: String,
        /// Image to upload (png, jpg, jpeg, gif by default)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Show one article as it would appear in the edit form
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Update title and price, optionally replacing the image
    Update {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        price: String,
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Ask for confirmation, or delete with --yes
    Delete {
        id: i64,
        /// Skip the confirmation prompt and delete
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let conn = match open_connection(&config.db) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("cannot open catalog database: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut out = io::stdout().lock();
    match run(cli.command, &config, &conn, &mut out) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn open_connection(location: &DbLocation) -> catalog_core::db::DbResult<Connection> {
    match location {
        DbLocation::File(path) => open_db(path),
        DbLocation::Memory => open_db_in_memory(),
    }
}

#[derive(Debug)]
enum CliError {
    Schema(RepoError),
    Workflow(WorkflowError),
    ReadImage { path: PathBuf, source: io::Error },
    Output(io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "catalog database is not usable: {err}"),
            Self::Workflow(err) => write!(f, "{err}"),
            Self::ReadImage { path, source } => {
                write!(f, "cannot read image `{}`: {source}", path.display())
            }
            Self::Output(err) => write!(f, "cannot write output: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Workflow(err) => Some(err),
            Self::ReadImage { source, .. } => Some(source),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<WorkflowError> for CliError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

/// Runs one command and returns the process exit status.
fn run(
    command: Command,
    config: &CatalogConfig,
    conn: &Connection,
    out: &mut impl Write,
) -> Result<u8, CliError> {
    let repo = SqliteArticleRepository::try_new(conn).map_err(CliError::Schema)?;
    let mut service = CatalogService::new(
        repo,
        FsImageStore::new(&config.upload_dir),
        config.allowed_extensions.clone(),
        config.messages.confirm_delete.clone(),
    );
    match command {
        Command::List { json } => render::articles(out, &service.list()?, json)?,
        Command::Create {
            title,
            price,
            image,
        } => {
            let image = read_upload(image.as_deref())?
                .unwrap_or_else(|| UploadedImage::new("", Vec::new()));
            let request = CreateArticleRequest {
                title,
                price,
                image,
            };
            match service.create(&request) {
                Ok(id) => {
                    info!("event=cli_command module=cli status=ok command=create article_id={id}");
                    render::articles(out, &service.list()?, false)?;
                }
                Err(WorkflowError::Validation(err)) => {
                    let message = config
                        .messages
                        .for_validation(err, service.allowed_extensions());
                    render::line(out, &message)?;
                    return Ok(EXIT_REJECTED);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Show { id, json } => match service.update_view(ArticleId(id))? {
            Some(article) => render::article(out, &article, json)?,
            None => render::articles(out, &service.list()?, false)?,
        },
        Command::Update {
            id,
            title,
            price,
            image,
        } => {
            let request = UpdateArticleRequest {
                id: ArticleId(id),
                title,
                price,
                image: read_upload(image.as_deref())?,
            };
            if service.update_execute(&request)? == UpdateOutcome::NotFound {
                info!("event=cli_command module=cli status=not_found command=update article_id={id}");
            }
            render::articles(out, &service.list()?, false)?;
        }
        Command::Delete { id, yes: false } => match service.delete_prompt(ArticleId(id))? {
            Some(prompt) => render::delete_prompt(out, &prompt)?,
            None => render::articles(out, &service.list()?, false)?,
        },
        Command::Delete { id, yes: true } => {
            if service.delete_execute(ArticleId(id))? == DeleteOutcome::AlreadyAbsent {
                info!("event=cli_command module=cli status=noop command=delete article_id={id}");
            }
            render::articles(out, &service.list()?, false)?;
        }
    }

    Ok(EXIT_OK)
}

/// Reads an image from disk as if it had been uploaded under its file name.
fn read_upload(path: Option<&Path>) -> Result<Option<UploadedImage>, CliError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Some(UploadedImage::new(filename, bytes)))
}
