//! CLI commands

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use eventdesk_core::{Event, EventDraft, EventId, EventPatch, EventStatus, ValidationError};
use eventdesk_http::{ListQuery, PosterStore, SessionClient};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Settings;
use crate::cookies;

/// Everything a command needs to run
pub struct App {
    pub client: SessionClient,
    pub settings: Settings,
    pub data_dir: PathBuf,
}

impl App {
    fn cookie_path(&self) -> PathBuf {
        self.data_dir.join(cookies::FILE_NAME)
    }

    fn poster_store(&self) -> Result<PosterStore> {
        let storage = &self.settings.storage;
        let (Some(url), Some(api_key)) = (&storage.url, &storage.api_key) else {
            bail!("Poster storage is not configured; set storage.url and storage.api_key");
        };
        Ok(PosterStore::new(url, &storage.bucket, api_key)?)
    }
}

/// Drop the local session after the server refused to renew it: forget the
/// access token, delete the saved refresh cookie and tell the user.
pub async fn end_expired_session(app: &App) -> Result<()> {
    if let Err(e) = app.client.logout().await {
        warn!("Failed to clear session: {e}");
    }
    cookies::remove(&app.cookie_path())?;
    eprintln!("Session expired. Please log in again.");
    Ok(())
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "EVENTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a new admin account
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, env = "EVENTDESK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the session and API settings in use
    Status,

    /// Manage events
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Manage event posters
    Poster {
        #[command(subcommand)]
        command: PosterCommands,
    },
}

#[derive(Subcommand)]
pub enum EventCommands {
    /// List events one page at a time
    List {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "5")]
        limit: u32,

        /// Match against title and location
        #[arg(long)]
        search: Option<String>,

        /// Ongoing or Completed
        #[arg(long)]
        status: Option<EventStatus>,
    },

    /// Show one event
    Show { id: EventId },

    /// Create an event
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        location: String,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,

        #[arg(long)]
        status: Option<EventStatus>,

        /// Poster image to upload
        #[arg(long)]
        poster: Option<PathBuf>,
    },

    /// Change fields of an event
    Edit {
        id: EventId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        status: Option<EventStatus>,

        /// Replace the poster with this image
        #[arg(long)]
        poster: Option<PathBuf>,
    },

    /// Delete an event
    Delete {
        id: EventId,

        /// Admin password, required by the API to confirm
        #[arg(long, env = "EVENTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum PosterCommands {
    /// Upload an image and print its public URL
    Upload {
        file: PathBuf,

        /// Attach the poster to this event, replacing its current one
        #[arg(long)]
        event: Option<EventId>,
    },
}

impl Commands {
    pub async fn execute(self, app: &App) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                app.client.login(&email, &password).await?;
                println!("Logged in as {}", email.trim());
                Ok(())
            }
            Commands::Signup {
                email,
                name,
                password,
                confirm_password,
            } => {
                let confirm = confirm_password.as_deref().unwrap_or(&password);
                app.client.signup(&email, &name, &password, confirm).await?;
                println!("Account created for {}. Log in to continue.", email.trim());
                Ok(())
            }
            Commands::Logout => {
                app.client.logout().await?;
                cookies::remove(&app.cookie_path())?;
                println!("Logged out");
                Ok(())
            }
            Commands::Status => show_status(app).await,
            Commands::Events { command } => command.execute(app).await,
            Commands::Poster { command } => command.execute(app).await,
        }
    }
}

impl EventCommands {
    pub async fn execute(self, app: &App) -> Result<()> {
        match self {
            EventCommands::List {
                page,
                limit,
                search,
                status,
            } => {
                let query = ListQuery {
                    page,
                    limit,
                    search,
                    status,
                };
                let result = app.client.list_events(&query).await?;

                if result.data.is_empty() {
                    println!("No events found");
                    return Ok(());
                }
                for event in &result.data {
                    println!("{}", summary_line(event));
                }
                println!(
                    "Page {} of {} ({} events)",
                    query.page.max(1),
                    result.page_count(limit).max(1),
                    result.total
                );
                Ok(())
            }
            EventCommands::Show { id } => {
                let event = app.client.get_event(id).await?;
                print_event(&event);
                Ok(())
            }
            EventCommands::Create {
                title,
                location,
                start,
                end,
                status,
                poster,
            } => {
                let mut draft = EventDraft::new(title, location, start, end);
                if let Some(status) = status {
                    draft.status = status;
                }
                // Check the form before spending an upload on it
                draft.validate()?;

                if let Some(file) = poster {
                    let (name, bytes) = read_image(&file).await?;
                    let posters = app.poster_store()?;
                    draft.poster_url = Some(posters.replace(None, &name, bytes).await?);
                }

                let event = app.client.create_event(&draft).await?;
                info!(id = event.id, "Event created");
                println!("Created event {}", event.id);
                print_event(&event);
                Ok(())
            }
            EventCommands::Edit {
                id,
                title,
                location,
                start,
                end,
                status,
                poster,
            } => {
                let mut patch = EventPatch {
                    title,
                    location,
                    start_date: start,
                    end_date: end,
                    status,
                    poster_url: None,
                };

                // A new poster replaces the live one, so reject a bad form
                // before touching storage. A poster alone is a valid edit.
                match patch.validate() {
                    Err(ValidationError::EmptyUpdate) if poster.is_some() => {}
                    result => result?,
                }

                if let Some(file) = poster {
                    let current = app.client.get_event(id).await?;
                    patch.poster_url = Some(attach_poster(app, &current, &file).await?);
                }

                let event = app.client.update_event(id, &patch).await?;
                println!("Updated event {}", event.id);
                print_event(&event);
                Ok(())
            }
            EventCommands::Delete { id, password } => {
                app.client.delete_event(id, &password).await?;
                println!("Deleted event {id}");
                Ok(())
            }
        }
    }
}

impl PosterCommands {
    pub async fn execute(self, app: &App) -> Result<()> {
        match self {
            PosterCommands::Upload { file, event: None } => {
                let (name, bytes) = read_image(&file).await?;
                let posters = app.poster_store()?;
                let url = posters.replace(None, &name, bytes).await?;
                println!("{url}");
                Ok(())
            }
            PosterCommands::Upload {
                file,
                event: Some(id),
            } => {
                let current = app.client.get_event(id).await?;
                let url = attach_poster(app, &current, &file).await?;

                let patch = EventPatch {
                    poster_url: Some(url.clone()),
                    ..EventPatch::default()
                };
                app.client.update_event(id, &patch).await?;
                println!("Poster for event {id}: {url}");
                Ok(())
            }
        }
    }
}

async fn show_status(app: &App) -> Result<()> {
    let logged_in = app.client.access_token().await?.is_some();

    println!("API:       {}", app.client.base_url());
    println!("Data dir:  {}", app.data_dir.display());
    if logged_in {
        println!("Session:   logged in");
    } else {
        println!("Session:   not logged in");
    }
    match &app.settings.storage.url {
        Some(url) => println!("Storage:   {url} (bucket {})", app.settings.storage.bucket),
        None => println!("Storage:   not configured"),
    }
    Ok(())
}

/// Upload `file` in place of the event's current poster, returning the new URL
async fn attach_poster(app: &App, event: &Event, file: &Path) -> Result<String> {
    let (name, bytes) = read_image(file).await?;
    let posters = app.poster_store()?;
    let url = posters
        .replace(event.poster_url.as_deref(), &name, bytes)
        .await?;
    Ok(url)
}

async fn read_image(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} is not a file", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok((name, bytes))
}

fn summary_line(event: &Event) -> String {
    format!(
        "{:>5}  {:<32} {:<24} {} .. {}  {}",
        event.id,
        truncate(&event.title, 32),
        truncate(&event.location, 24),
        event.start_date,
        event.end_date,
        event.status
    )
}

fn print_event(event: &Event) {
    println!("Title:     {}", event.title);
    println!("Location:  {}", event.location);
    println!("Dates:     {} .. {}", event.start_date, event.end_date);
    println!("Status:    {}", event.status);
    if let Some(url) = &event.poster_url {
        println!("Poster:    {url}");
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, StorageSettings};
    use eventdesk_core::{FileSessionStore, MemorySessionStore, SessionStore};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(api: &MockServer, storage: &MockServer, data_dir: &Path) -> App {
        app_with_store(api, storage, data_dir, Arc::new(MemorySessionStore::with_token("tok")))
    }

    fn app_with_store(
        api: &MockServer,
        storage: &MockServer,
        data_dir: &Path,
        store: Arc<dyn SessionStore>,
    ) -> App {
        let client = SessionClient::builder()
            .base_url(api.uri())
            .session_store(store)
            .build()
            .unwrap();
        let settings = Settings {
            api: ApiSettings {
                base_url: api.uri(),
                refresh_path: "/auth/refresh-token".into(),
                timeout_secs: 0,
            },
            storage: StorageSettings {
                url: Some(storage.uri()),
                bucket: "posters".into(),
                api_key: Some("anon-key".into()),
            },
        };
        App {
            client,
            settings,
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn edit(id: EventId, title: Option<&str>, poster: Option<PathBuf>) -> EventCommands {
        EventCommands::Edit {
            id,
            title: title.map(str::to_string),
            location: None,
            start: None,
            end: None,
            status: None,
            poster,
        }
    }

    fn event() -> Event {
        Event {
            id: 42,
            title: "Harvest festival".into(),
            location: "Town square".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 21).unwrap(),
            status: EventStatus::Completed,
            poster_url: None,
        }
    }

    #[test]
    fn long_text_is_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long event title", 10), "a very ...");
    }

    #[test]
    fn summary_line_shows_dates_and_status() {
        let line = summary_line(&event());
        assert!(line.starts_with("   42  Harvest festival"));
        assert!(line.contains("2025-09-20 .. 2025-09-21"));
        assert!(line.ends_with("Completed"));
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        assert!(read_image(&path).await.is_err());
    }

    #[tokio::test]
    async fn image_name_comes_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flyer.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let (name, bytes) = read_image(&path).await.unwrap();
        assert_eq!(name, "flyer.png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rejected_edit_leaves_poster_alone() {
        let api = MockServer::start().await;
        let storage = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new.png");
        std::fs::write(&file, [1u8, 2, 3]).unwrap();

        let app = app(&api, &storage, dir.path());
        let result = edit(5, Some(""), Some(file)).execute(&app).await;

        assert!(result.is_err());
        assert!(storage.received_requests().await.unwrap().is_empty());
        assert!(api.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn poster_alone_is_a_valid_edit() {
        let api = MockServer::start().await;
        let storage = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new.png");
        std::fs::write(&file, [1u8, 2, 3]).unwrap();

        let app = app(&api, &storage, dir.path());
        let posters = app.poster_store().unwrap();
        let old_url = posters.public_url("posters/1_old.png");
        let mut current = event();
        current.id = 5;
        current.poster_url = Some(old_url);

        Mock::given(method("GET"))
            .and(path("/events/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&current))
            .expect(1)
            .mount(&api)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/events/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&current))
            .expect(1)
            .mount(&api)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/posters"))
            .and(body_json(json!({ "prefixes": ["posters/1_old.png"] })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&storage)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/posters/posters/\d+_new\.png$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&storage)
            .await;

        edit(5, None, Some(file)).execute(&app).await.unwrap();
    }

    #[tokio::test]
    async fn expired_session_clears_token_and_cookies() {
        let api = MockServer::start().await;
        let storage = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let store = FileSessionStore::in_dir(dir.path());
        store.set("stale").await.unwrap();
        let session_path = store.path().to_path_buf();
        let cookie_path = dir.path().join(cookies::FILE_NAME);
        std::fs::write(&cookie_path, "refreshToken=r1").unwrap();

        let app = app_with_store(&api, &storage, dir.path(), Arc::new(store));
        end_expired_session(&app).await.unwrap();

        assert!(!session_path.exists());
        assert!(!cookie_path.exists());
        assert_eq!(app.client.access_token().await.unwrap(), None);
    }
}
