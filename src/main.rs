use clap::Parser;
use quizreel::{db::Db, generator::HttpQuizGenerator, storage::LocalObjectStore, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// libSQL server address, or `file:<path>` for a local database.
    #[clap(env)]
    url: String,

    /// libSQL authentication token.
    #[clap(env, default_value = "")]
    auth_token: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Base URL of the transcript and quiz generation service.
    #[arg(long, env, default_value = "http://127.0.0.1:5000")]
    generator_url: String,

    /// Directory uploaded videos and thumbnails are written to.
    #[arg(long, env, default_value = "uploads")]
    storage_dir: String,

    /// Public base URL stored files are linked under.
    #[arg(long, env, default_value = "http://127.0.0.1:1414")]
    public_url: String,

    /// Mark session cookies `Secure`.
    #[arg(long, env)]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,axum=debug,quizreel=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(args.url, args.auth_token).await?;
    let storage = LocalObjectStore::new(args.storage_dir, args.public_url).await?;
    let generator = HttpQuizGenerator::new(args.generator_url);
    let state = AppState::new(db, generator, storage, args.secure_cookies);

    let address = args.address.parse::<std::net::SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("quizreel {} listening on {address}", quizreel::utils::VERSION);
    axum::serve(listener, quizreel::router(state)).await?;

    Ok(())
}
