use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use crewtag::{
    application::{
        error::AppError,
        repos::TagsRepo,
        tags::{TagService, validate_colors},
    },
    config,
    domain::markup::{self, StyleDescriptor},
    infra::{
        discord::{DiscordClient, InteractionVerifier, commands},
        error::InfraError,
        http::{self, HttpState},
        store::JsonTagStore,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

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
        config::Command::Register(args) => run_register(settings, args).await,
        config::Command::Preview(args) => run_preview(args),
        config::Command::Export(args) => run_export(settings, args).await,
        config::Command::Rerender(args) => run_rerender(settings, args).await,
    }
}

fn tag_service(settings: &config::Settings) -> Result<TagService, AppError> {
    let store = JsonTagStore::new(settings.store.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let repo: Arc<dyn TagsRepo> = Arc::new(store);
    Ok(TagService::new(repo, settings.tags.clone()))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let tags = Arc::new(tag_service(&settings)?);

    let verifier = match settings.discord.public_key.as_deref() {
        Some(key) => Some(Arc::new(InteractionVerifier::from_hex(key).map_err(|err| {
            AppError::from(InfraError::configuration(err.to_string()))
        })?)),
        None => {
            warn!(
                target = "crewtag::serve",
                "no discord public key configured; interactions endpoint disabled"
            );
            None
        }
    };

    if settings.api.key.is_none() {
        warn!(
            target = "crewtag::serve",
            "no api key configured; tag feed is unauthenticated"
        );
    }

    let state = HttpState {
        tags,
        api_key: settings.api.key.as_deref().map(Arc::from),
        verifier,
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "crewtag::serve",
        addr = %settings.server.addr,
        store = %settings.store.directory.display(),
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(target = "crewtag::serve", error = %err, "failed to listen for ctrl-c");
            }
            info!(target = "crewtag::serve", "shutdown requested");
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::from(InfraError::server(err.to_string())))?;
        }
        _ = drain_deadline(signalled_rx, grace) => {
            warn!(
                target = "crewtag::serve",
                grace_secs = grace.as_secs(),
                "connections still open after grace period; exiting"
            );
        }
    }

    Ok(())
}

/// Resolves `grace` after the shutdown signal fires; never resolves otherwise.
async fn drain_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn run_register(
    settings: config::Settings,
    args: config::RegisterArgs,
) -> Result<(), AppError> {
    if args.print {
        let definitions = serde_json::to_string_pretty(&commands::definitions())
            .map_err(|err| AppError::unexpected(err.to_string()))?;
        println!("{definitions}");
        return Ok(());
    }

    let discord = &settings.discord;
    let token = discord
        .token
        .as_deref()
        .ok_or_else(|| AppError::validation("register requires a discord token (DISCORD_TOKEN)"))?;
    let application_id = discord.application_id.as_deref().ok_or_else(|| {
        AppError::validation("register requires a discord application id (CLIENT_ID)")
    })?;
    let guild_id = discord
        .guild_id
        .as_deref()
        .ok_or_else(|| AppError::validation("register requires a discord guild id (GUILD_ID)"))?;

    let client = DiscordClient::new(&discord.api_base, token)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    let count = client
        .register_guild_commands(application_id, guild_id)
        .await
        .map_err(|err| AppError::unexpected(format!("command registration failed: {err}")))?;

    println!("Registered {count} slash commands in guild {guild_id}.");
    Ok(())
}

fn run_preview(args: config::PreviewArgs) -> Result<(), AppError> {
    let (primary, secondary) = validate_colors(&args.color, args.color2.as_deref())?;
    let markup = markup::render(&StyleDescriptor {
        text: args.tag,
        primary,
        secondary,
        bold: args.bold,
        italic: args.italic,
        rainbow: args.rainbow,
    });
    println!("{markup}");
    Ok(())
}

async fn run_export(settings: config::Settings, args: config::KindArgs) -> Result<(), AppError> {
    let service = tag_service(&settings)?;
    let block = service.export(args.kind).await?;
    println!("{block}");
    Ok(())
}

async fn run_rerender(
    settings: config::Settings,
    args: config::KindArgs,
) -> Result<(), AppError> {
    let service = tag_service(&settings)?;
    let updated = service.rerender(args.kind).await?;
    println!("Re-rendered {updated} {} tags.", args.kind);
    Ok(())
}
