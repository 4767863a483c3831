//! services/client/src/bin/screening.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{FileTokenStore, HttpTransport, MemoryNavigator, RestClient, TracingNotifier, TracingTitle},
    config::Config,
    error::ClientError,
};
use screening_core::{
    auth::{validate_credentials, AuthStatus, AuthStore},
    domain::{Credentials, FieldError, JobOpening, Route, UploadFile},
    pages::{
        AddCandidatesPage, CreateOpeningError, CreateOpeningForm, OpeningDetailPage,
        OpeningListPage, Shell, DEFAULT_OPENING_TITLE,
    },
    ports::{Navigator, TokenStore},
    search::CANDIDATE_ID_PARAM,
    session::{SessionContext, UnauthorizedHandler},
    store::StoreStatus,
    upload::{format_file_size, PDF_MIME_TYPE},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "screening", about = "Manage job openings and screen candidate resumes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the signed-in user
    Whoami,
    #[command(subcommand)]
    Openings(OpeningsCommand),
    #[command(subcommand)]
    Candidates(CandidatesCommand),
    /// Upload PDF resumes to an opening
    Upload {
        jd_id: String,
        /// Resumes already attached to the opening, to respect the per-opening limit
        #[arg(long)]
        candidate_count: Option<u32>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum OpeningsCommand {
    List,
    Create {
        #[arg(long)]
        title: String,
        /// Job description PDF
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CandidatesCommand {
    List {
        jd_id: String,
        /// Filter by (part of) the candidate id
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        jd_id: String,
        candidate_id: String,
    },
}

struct App {
    rest: Arc<RestClient>,
    session: Arc<SessionContext>,
    navigator: Arc<MemoryNavigator>,
}

impl App {
    fn shell(&self) -> Shell {
        Shell {
            notifier: Arc::new(TracingNotifier),
            navigator: self.navigator.clone(),
            title: Arc::new(TracingTitle),
        }
    }

    fn auth(&self) -> AuthStore {
        AuthStore::new(self.rest.clone(), self.session.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(api_url = %config.api_url, "Configuration loaded");

    // --- 2. Session, Navigation & Transport ---
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_path));
    let session = Arc::new(SessionContext::new(tokens));
    let navigator = Arc::new(initial_location(&cli.command));

    let login_redirect = navigator.clone();
    let on_unauthorized: UnauthorizedHandler = Arc::new(move || {
        warn!("Session expired, sign in again with `screening login`");
        login_redirect.navigate(Route::Login, None);
    });
    let transport = HttpTransport::new(
        config.api_url.clone(),
        config.request_timeout,
        session.clone(),
        on_unauthorized,
    )?;
    let app = App {
        rest: Arc::new(RestClient::new(transport)),
        session,
        navigator,
    };

    // --- 3. Run the Command ---
    match cli.command {
        Command::Login { email, password } => login(&app, email, password).await,
        Command::Logout => {
            app.auth().logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => whoami(&app).await,
        Command::Openings(OpeningsCommand::List) => list_openings(&app).await,
        Command::Openings(OpeningsCommand::Create { title, file }) => {
            create_opening(&app, title, &file).await
        }
        Command::Candidates(CandidatesCommand::List { jd_id, .. }) => {
            list_candidates(&app, jd_id).await
        }
        Command::Candidates(CandidatesCommand::Show { jd_id, candidate_id }) => {
            show_candidate(&app, jd_id, &candidate_id).await
        }
        Command::Upload { jd_id, files, .. } => upload(&app, jd_id, &files).await,
    }
}

/// Where the command "is" in the app, with the location state a browser
/// would carry there.
fn initial_location(command: &Command) -> MemoryNavigator {
    match command {
        Command::Login { .. } | Command::Logout | Command::Whoami => {
            MemoryNavigator::new(Route::Login, None)
        }
        Command::Openings(_) => MemoryNavigator::new(Route::Openings, None),
        Command::Candidates(CandidatesCommand::List { jd_id, search }) => {
            let nav = MemoryNavigator::new(Route::OpeningDetail(jd_id.clone()), None);
            match search {
                Some(search) => nav.with_query(CANDIDATE_ID_PARAM, search),
                None => nav,
            }
        }
        Command::Candidates(CandidatesCommand::Show { jd_id, .. }) => {
            MemoryNavigator::new(Route::OpeningDetail(jd_id.clone()), None)
        }
        Command::Upload { jd_id, candidate_count, .. } => {
            let opening = candidate_count.map(|count| JobOpening {
                id: jd_id.clone(),
                title: DEFAULT_OPENING_TITLE.to_string(),
                candidate_count: count,
            });
            MemoryNavigator::new(Route::AddCandidates(jd_id.clone()), opening)
        }
    }
}

fn field_messages(fields: &[FieldError]) -> String {
    fields
        .iter()
        .flat_map(|f| f.messages.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The headline for a failed fetch, followed by the store's error when it
/// recorded one.
fn load_failure(headline: &str, cause: Option<String>) -> String {
    match cause {
        Some(cause) if !cause.is_empty() => format!("{}: {}", headline, cause),
        _ => headline.to_string(),
    }
}

async fn read_upload(path: &Path) -> Result<UploadFile, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let mime = if is_pdf { PDF_MIME_TYPE } else { "application/octet-stream" };
    Ok(UploadFile::new(name, mime, bytes))
}

async fn login(app: &App, email: String, password: String) -> Result<(), ClientError> {
    let credentials = Credentials { email, password };
    let problems = validate_credentials(&credentials);
    if !problems.is_empty() {
        return Err(ClientError::Invalid(field_messages(&problems)));
    }
    let user = app.auth().login(&credentials).await?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

async fn whoami(app: &App) -> Result<(), ClientError> {
    let auth = app.auth();
    auth.hydrate().await;
    let state = auth.state();
    match (state.status, state.user) {
        (AuthStatus::Authenticated, Some(user)) => {
            println!("{} <{}> ({})", user.name, user.email, user.id);
            Ok(())
        }
        _ => Err(ClientError::Invalid("Not signed in.".to_string())),
    }
}

async fn list_openings(app: &App) -> Result<(), ClientError> {
    let page = OpeningListPage::new(app.shell(), app.rest.clone());
    page.mount().await;
    if page.status() == StoreStatus::Error {
        let cause = page.store().snapshot().error;
        return Err(ClientError::Invalid(load_failure("Unable to load job openings", cause)));
    }
    if page.is_empty() {
        println!("No job openings yet.");
    }
    for opening in page.openings() {
        println!("{}\t{}\t{} resume(s)", opening.id, opening.title, opening.candidate_count);
    }
    Ok(())
}

async fn create_opening(app: &App, title: String, file: &Path) -> Result<(), ClientError> {
    let page = OpeningListPage::new(app.shell(), app.rest.clone());
    let form = CreateOpeningForm {
        title,
        description: Some(read_upload(file).await?),
    };
    match page.handle_create(form).await {
        Ok(created) => {
            println!("Created {}\t{}", created.id, created.title);
            Ok(())
        }
        Err(CreateOpeningError::Invalid(fields)) => {
            Err(ClientError::Invalid(field_messages(&fields)))
        }
        Err(CreateOpeningError::Failed(e)) => Err(e.into()),
    }
}

async fn list_candidates(app: &App, jd_id: String) -> Result<(), ClientError> {
    let mut page = OpeningDetailPage::new(app.shell(), app.rest.clone(), Some(jd_id));
    page.mount().await;
    let snapshot = page.store().snapshot();
    if snapshot.status == StoreStatus::Error {
        page.teardown();
        return Err(ClientError::Invalid(load_failure("Failed to load results", snapshot.error)));
    }
    if page.show_empty_state() {
        println!("No candidates yet.");
    }
    let candidates = page.filtered_candidates();
    if candidates.is_empty() && page.has_search_filter() {
        println!("No candidate matches that id.");
    }
    for candidate in candidates {
        let score = candidate
            .fit_score
            .map(|s| format!("{:.0}", s))
            .unwrap_or_else(|| "processing".to_string());
        println!(
            "{}\t{}\t{}\t{:?}",
            candidate.id,
            candidate.name.as_deref().unwrap_or("-"),
            score,
            candidate.fit_band()
        );
    }
    page.teardown();
    Ok(())
}

async fn show_candidate(app: &App, jd_id: String, candidate_id: &str) -> Result<(), ClientError> {
    let mut page = OpeningDetailPage::new(app.shell(), app.rest.clone(), Some(jd_id));
    page.handle_open_candidate(candidate_id).await;
    let view = page.view();
    page.teardown();
    let candidate = view
        .selected
        .ok_or_else(|| ClientError::Invalid("Could not load the candidate.".to_string()))?;

    println!("{} ({})", candidate.name.as_deref().unwrap_or("Unnamed candidate"), candidate.id);
    if let Some(email) = &candidate.email {
        println!("Email: {}", email);
    }
    match candidate.fit_score {
        Some(score) => println!("Fit score: {:.0} ({:?})", score, candidate.fit_band()),
        None => println!("Fit score: still processing"),
    }
    println!("\n{}", candidate.summary);
    for strength in &candidate.strengths {
        println!("+ {}", strength);
    }
    for weakness in &candidate.weaknesses {
        println!("- {}", weakness);
    }
    if !candidate.evidence.is_empty() {
        println!("\nEvidence: {}", candidate.evidence);
    }
    Ok(())
}

async fn upload(app: &App, jd_id: String, paths: &[PathBuf]) -> Result<(), ClientError> {
    let mut page = AddCandidatesPage::new(app.shell(), app.rest.clone(), Some(jd_id));
    page.mount();
    if page.is_limit_reached() {
        return Err(ClientError::Invalid(
            "This opening already reached the resume limit.".to_string(),
        ));
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_upload(path).await?);
    }
    page.handle_files_selected(files);
    for file in page.files() {
        info!(file = %file.name, size = %format_file_size(file.size_bytes), "Queued");
    }

    match page.handle_submit().await {
        Some(receipt) => {
            println!("{} resume(s) queued for {}", receipt.queued_count, receipt.jd_id);
            if let Some(batch) = receipt.batch_id {
                println!("Batch: {}", batch);
            }
            Ok(())
        }
        None => Err(ClientError::Invalid(page.queue().errors().join(" "))),
    }
}
