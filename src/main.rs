use std::{process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vetrina::{
    application::{
        contact::{ContactService, Mailer},
        content::ContentService,
        error::AppError,
        feedback::FeedbackService,
        instagram::{InstagramApi, InstagramService},
        preview::PreviewGate,
        revalidate::RevalidateService,
    },
    cache::TtlCache,
    config,
    domain::instagram::InstagramPost,
    infra::{
        cms::SanityClient,
        error::InfraError,
        http::{self, HttpState},
        instagram::GraphApiClient,
        smtp::SmtpMailer,
        store::FileFeedbackStore,
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_http_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let content_cache = Arc::new(TtlCache::new("content", settings.content.cache_ttl));
    let instagram_cache: Arc<TtlCache<Vec<InstagramPost>>> =
        Arc::new(TtlCache::new("instagram", settings.instagram.cache_ttl));

    let (public_client, privileged_client) = SanityClient::build_pair(&settings.content);
    let content = Arc::new(ContentService::new(
        content_cache.clone(),
        public_client,
        privileged_client,
    ));

    let preview = Arc::new(PreviewGate::new(
        settings.content.preview_secret.clone(),
        settings.site.production,
    ));

    let revalidate = Arc::new(RevalidateService::new(
        settings.content.revalidate_secret.clone(),
        content_cache,
    ));

    let feedback = Arc::new(FeedbackService::new(Arc::new(FileFeedbackStore::new(
        &settings.feedback,
    ))));

    let mailer = SmtpMailer::from_settings(&settings.smtp, &settings.contact)
        .map_err(AppError::from)?
        .map(|mailer| Arc::new(mailer) as Arc<dyn Mailer>);
    let contact = Arc::new(ContactService::new(
        mailer,
        settings.contact.recipient.clone(),
    ));

    let instagram_api = GraphApiClient::from_settings(&settings.instagram)
        .map(|client| Arc::new(client) as Arc<dyn InstagramApi>);
    let instagram = Arc::new(InstagramService::new(instagram_api, instagram_cache));

    Ok(HttpState {
        content,
        preview,
        revalidate,
        feedback,
        contact,
        instagram,
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "vetrina::server",
        addr = %settings.server.public_addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
