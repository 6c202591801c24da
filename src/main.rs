use anyhow::{bail, Context, Result};
use clap::Parser;
use kicktipp_betbot::betting::{place_bets, BetOptions};
use kicktipp_betbot::predictors::PredictorRegistry;
use kicktipp_betbot::scrapers::kicktipp::KicktippClient;
use kicktipp_betbot::utils::deadline::parse_duration;

/// Automated kicktipp.de bet placement.
///
/// Places bets on the upcoming matchday. Unless communities are given it
/// places bets on all prediction games of the account.
#[derive(Debug, Parser)]
#[command(name = "kicktippbot", version)]
struct Args {
    /// Names of the prediction game communities to place bets on;
    /// defaults to every community of the account
    communities: Vec<String>,

    /// Just log in and print the login token string for later use with
    /// --use-login-token
    #[arg(long)]
    get_login_token: bool,

    /// Perform bets without logging in again, using a stored login token
    #[arg(long, value_name = "TOKEN")]
    use_login_token: Option<String>,

    /// Override bets that were already placed
    #[arg(long)]
    override_bets: bool,

    /// Place bets only on matches starting within the given duration,
    /// e.g. 10m, 5h or 1d
    #[arg(long, value_name = "DURATION")]
    deadline: Option<String>,

    /// Display the predictors available for --predictor
    #[arg(long)]
    list_predictors: bool,

    /// Predictor to be used for the score calculation
    #[arg(long, value_name = "NAME")]
    predictor: Option<String>,

    /// Don't place any bets, just print out the predictions
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let registry = PredictorRegistry::new();

    if args.list_predictors {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Reject a malformed deadline before logging in or touching the site
    if let Some(deadline) = &args.deadline {
        if let Err(err) = parse_duration(deadline) {
            bail!("Invalid deadline value: {}", err);
        }
    }

    let client = KicktippClient::new();

    if args.get_login_token {
        let token = login_with_env_credentials(&client).await?;
        println!("{}", token);
        return Ok(());
    }

    // Use the login token passed by argument, or log in right here
    match &args.use_login_token {
        Some(token) => client.use_login_token(token),
        None => {
            login_with_env_credentials(&client).await?;
        }
    }

    // Which communities are considered, fail if none were found
    let communities = client
        .fetch_communities(&args.communities)
        .await
        .context("Failed to list the account's communities")?;
    if communities.is_empty() {
        bail!("No community found!?");
    }

    // Which prediction method is used
    let predictor_name = args
        .predictor
        .as_deref()
        .unwrap_or_else(|| registry.default_name());
    let predictor = registry.create(predictor_name)?;
    println!("Using predictor: {}", predictor_name);

    let options = BetOptions {
        override_bets: args.override_bets,
        deadline: args.deadline.clone(),
        dry_run: args.dry_run,
    };
    place_bets(&client, &communities, predictor.as_ref(), &options).await;

    Ok(())
}

async fn login_with_env_credentials(client: &KicktippClient) -> Result<String> {
    let username =
        std::env::var("KICKTIPP_USERNAME").context("KICKTIPP_USERNAME not set in .env file")?;
    let password =
        std::env::var("KICKTIPP_PASSWORD").context("KICKTIPP_PASSWORD not set in .env file")?;
    client.login(&username, &password).await
}
