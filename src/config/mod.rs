//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vetrina";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONTENT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_INSTAGRAM_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FEEDBACK_PATH: &str = "data/feedback.json";
const DEFAULT_CMS_DATASET: &str = "production";
const DEFAULT_CMS_API_VERSION: &str = "2024-01-01";
const DEFAULT_SITE_URL: &str = "http://localhost:3000";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Command-line arguments for the vetrina binary.
#[derive(Debug, Parser)]
#[command(name = "vetrina", version, about = "Vetrina content backend")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VETRINA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the vetrina HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the feedback store file path.
    #[arg(long = "feedback-path", value_name = "PATH")]
    pub feedback_path: Option<PathBuf>,

    /// Override the content cache TTL in seconds.
    #[arg(long = "content-cache-ttl-seconds", value_name = "SECONDS")]
    pub content_cache_ttl_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content: ContentSettings,
    pub smtp: SmtpSettings,
    pub contact: ContactSettings,
    pub instagram: InstagramSettings,
    pub feedback: FeedbackSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Headless-CMS connection and gating settings.
///
/// `project_id` absent means there is no reachable project; the gateway
/// still starts and every fetch degrades to fallback content. `api_token`
/// absent means draft preview silently reads through the public client.
#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub api_token: Option<String>,
    pub preview_secret: Option<String>,
    pub revalidate_secret: Option<String>,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub recipient: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct InstagramSettings {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FeedbackSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub public_url: String,
    /// Drives the `Secure` attribute on the preview cookie.
    pub production: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VETRINA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_env_aliases();

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content: RawContentSettings,
    smtp: RawSmtpSettings,
    contact: RawContactSettings,
    instagram: RawInstagramSettings,
    feedback: RawFeedbackSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.feedback_path.as_ref() {
            self.feedback.path = Some(path.clone());
        }
        if let Some(ttl) = overrides.content_cache_ttl_seconds {
            self.content.cache_ttl_seconds = Some(ttl);
        }
    }

    /// Recognize the deployment variable names the hosting environment
    /// already exports, as a layer below the `VETRINA__*` namespace.
    fn apply_env_aliases(&mut self) {
        alias_string(
            &mut self.content.project_id,
            "NEXT_PUBLIC_SANITY_PROJECT_ID",
        );
        alias_string(&mut self.content.dataset, "NEXT_PUBLIC_SANITY_DATASET");
        alias_string(
            &mut self.content.api_version,
            "NEXT_PUBLIC_SANITY_API_VERSION",
        );
        alias_string(&mut self.content.api_token, "SANITY_API_TOKEN");
        alias_string(&mut self.content.preview_secret, "SANITY_PREVIEW_SECRET");
        alias_string(
            &mut self.content.revalidate_secret,
            "SANITY_REVALIDATE_SECRET",
        );

        alias_string(&mut self.smtp.host, "SMTP_HOST");
        alias_parsed(&mut self.smtp.port, "SMTP_PORT");
        alias_bool(&mut self.smtp.secure, "SMTP_SECURE");
        alias_string(&mut self.smtp.user, "SMTP_USER");
        alias_string(&mut self.smtp.pass, "SMTP_PASS");

        alias_string(&mut self.contact.recipient, "ADMIN_EMAIL");
        alias_string(&mut self.contact.recipient, "COMPANY_EMAIL");

        alias_string(&mut self.instagram.access_token, "IG_ACCESS_TOKEN");
        alias_string(&mut self.instagram.user_id, "IG_USER_ID");

        alias_string(&mut self.site.public_url, "NEXT_PUBLIC_SITE_URL");
    }
}

fn alias_string(slot: &mut Option<String>, var: &str) {
    if slot.is_some() {
        return;
    }
    if let Ok(value) = std::env::var(var) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *slot = Some(trimmed.to_string());
        }
    }
}

fn alias_parsed<T: FromStr>(slot: &mut Option<T>, var: &str) {
    if slot.is_some() {
        return;
    }
    if let Ok(value) = std::env::var(var)
        && let Ok(parsed) = value.trim().parse()
    {
        *slot = Some(parsed);
    }
}

fn alias_bool(slot: &mut Option<bool>, var: &str) {
    if slot.is_some() {
        return;
    }
    if let Ok(value) = std::env::var(var) {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => *slot = Some(true),
            "0" | "false" | "no" => *slot = Some(false),
            _ => {}
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content,
            smtp,
            contact,
            instagram,
            feedback,
            site,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let content = build_content_settings(content)?;
        let smtp = build_smtp_settings(smtp)?;
        let contact = build_contact_settings(contact);
        let instagram = build_instagram_settings(instagram)?;
        let feedback = build_feedback_settings(feedback)?;
        let site = build_site_settings(site);

        Ok(Self {
            server,
            logging,
            content,
            smtp,
            contact,
            instagram,
            feedback,
            site,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;

    Ok(ServerSettings { public_addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let project_id = non_empty(content.project_id);
    let dataset = non_empty(content.dataset).unwrap_or_else(|| DEFAULT_CMS_DATASET.to_string());
    let api_version =
        non_empty(content.api_version).unwrap_or_else(|| DEFAULT_CMS_API_VERSION.to_string());

    let cache_ttl_secs = content
        .cache_ttl_seconds
        .unwrap_or(DEFAULT_CONTENT_CACHE_TTL_SECS);
    if cache_ttl_secs == 0 {
        return Err(LoadError::invalid(
            "content.cache_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let timeout_secs = content
        .upstream_timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "content.upstream_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ContentSettings {
        project_id,
        dataset,
        api_version,
        api_token: non_empty(content.api_token),
        preview_secret: non_empty(content.preview_secret),
        revalidate_secret: non_empty(content.revalidate_secret),
        cache_ttl: Duration::from_secs(cache_ttl_secs),
        upstream_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_smtp_settings(smtp: RawSmtpSettings) -> Result<SmtpSettings, LoadError> {
    let port = smtp.port.unwrap_or(DEFAULT_SMTP_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "smtp.port",
            "port must be greater than zero",
        ));
    }

    Ok(SmtpSettings {
        host: non_empty(smtp.host),
        port,
        secure: smtp.secure.unwrap_or(true),
        user: non_empty(smtp.user),
        pass: non_empty(smtp.pass),
    })
}

fn build_contact_settings(contact: RawContactSettings) -> ContactSettings {
    let recipient = non_empty(contact.recipient);
    let sender = non_empty(contact.sender)
        .or_else(|| recipient.clone())
        .unwrap_or_else(|| "noreply@localhost".to_string());

    ContactSettings { recipient, sender }
}

fn build_instagram_settings(
    instagram: RawInstagramSettings,
) -> Result<InstagramSettings, LoadError> {
    let cache_ttl_secs = instagram
        .cache_ttl_seconds
        .unwrap_or(DEFAULT_INSTAGRAM_CACHE_TTL_SECS);
    if cache_ttl_secs == 0 {
        return Err(LoadError::invalid(
            "instagram.cache_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let timeout_secs = instagram
        .upstream_timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "instagram.upstream_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(InstagramSettings {
        access_token: non_empty(instagram.access_token),
        user_id: non_empty(instagram.user_id),
        cache_ttl: Duration::from_secs(cache_ttl_secs),
        upstream_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_feedback_settings(feedback: RawFeedbackSettings) -> Result<FeedbackSettings, LoadError> {
    let path = feedback
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FEEDBACK_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid("feedback.path", "path must not be empty"));
    }

    Ok(FeedbackSettings { path })
}

fn build_site_settings(site: RawSiteSettings) -> SiteSettings {
    let public_url = non_empty(site.public_url).unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let production = site
        .production
        .unwrap_or_else(|| public_url.starts_with("https://"));

    SiteSettings {
        public_url,
        production,
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    api_token: Option<String>,
    preview_secret: Option<String>,
    revalidate_secret: Option<String>,
    cache_ttl_seconds: Option<u64>,
    upstream_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSmtpSettings {
    host: Option<String>,
    port: Option<u16>,
    secure: Option<bool>,
    user: Option<String>,
    pass: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContactSettings {
    recipient: Option<String>,
    sender: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawInstagramSettings {
    access_token: Option<String>,
    user_id: Option<String>,
    cache_ttl_seconds: Option<u64>,
    upstream_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedbackSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    public_url: Option<String>,
    production: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
