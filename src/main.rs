use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use ivts_console::{
    Console,
    config::Config,
    error::ConsoleError,
    guard::{AuthState, Navigation, Screen},
    models::{PasswordReset, SessionQuery},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_STORE_FILE: &str = ".ivts-console-session.json";

const USAGE: &str = "usage: ivts-console <command>

commands:
  login <username> <password> [--remember]
  logout
  whoami
  enter <login|dashboard|users|sessions>
  users
  sessions [--name NAME] [--from YYYY-MM-DD] [--to YYYY-MM-DD]
  reset-password <id> <password>
  delete-user <id>";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if e.is_auth_terminal() {
                eprintln!("-> {}", Screen::Login);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), ConsoleError> {
    let Some((command, rest)) = args.split_first() else {
        return Err(usage());
    };

    let mut config = Config::from_env()?;
    if config.credential_store_path.is_none() {
        config.credential_store_path = Some(PathBuf::from(DEFAULT_STORE_FILE));
    }
    let console = Console::from_config(config)?;
    console.restore().await?;

    match command.as_str() {
        "login" => {
            let [username, password, flags @ ..] = rest else {
                return Err(usage());
            };
            let remember = flags.iter().any(|f| f == "--remember");
            let navigation = console.login(username, password, remember).await?;
            print_navigation(&navigation);
        }
        "logout" => print_navigation(&console.logout().await?),
        "whoami" => match console.guard.state() {
            AuthState::Authenticated { role } => println!("logged in as {}", role.label()),
            AuthState::Unauthenticated => match console.guard.login_prefill() {
                Some(username) => println!("not logged in (last user: {username})"),
                None => println!("not logged in"),
            },
        },
        "enter" => {
            let screen = match rest.first() {
                Some(raw) => raw.parse::<Screen>().map_err(ConsoleError::Validation)?,
                None => Screen::Dashboard,
            };
            print_navigation(&console.guard.enter(screen).await?);
        }
        "users" => {
            for user in console.users.list().await? {
                println!("{:>6}  {:<24} {:<32} {}", user.id, user.name, user.username, user.role.label());
            }
        }
        "sessions" => {
            let query = session_query(rest)?;
            for record in console.sessions.list(&query).await? {
                println!(
                    "{:>6}  {:<24} {}  {}  {}",
                    record.id.map(|id| id.to_string()).unwrap_or_default(),
                    record.name.as_deref().unwrap_or("-"),
                    record.login_time.format("%Y-%m-%d %H:%M"),
                    record
                        .logout_time
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "active".to_string()),
                    record.duration_label().unwrap_or_default(),
                );
            }
        }
        "reset-password" => {
            let [id, password] = rest else {
                return Err(usage());
            };
            let reset = PasswordReset::new(password.as_str(), password.as_str());
            console.users.reset_password(parse_id(id)?, &reset).await?;
            println!("password reset");
        }
        "delete-user" => {
            let [id] = rest else {
                return Err(usage());
            };
            console.users.delete(parse_id(id)?).await?;
            println!("user deleted");
        }
        _ => return Err(usage()),
    }
    Ok(())
}

fn print_navigation(navigation: &Navigation) {
    match navigation {
        Navigation::Render(screen) => println!("{screen}"),
        Navigation::Redirect(screen) => println!("-> {screen}"),
        Navigation::External(url) => println!("-> {url}"),
    }
}

fn session_query(args: &[String]) -> Result<SessionQuery, ConsoleError> {
    let mut query = SessionQuery::default();
    let mut args = args.iter();
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| ConsoleError::Validation(format!("{flag} needs a value")))?;
        match flag.as_str() {
            "--name" => query.name = Some(value.clone()),
            "--from" => query.from_date = Some(parse_date(value)?),
            "--to" => query.to_date = Some(parse_date(value)?),
            _ => return Err(usage()),
        }
    }
    Ok(query)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ConsoleError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ConsoleError::Validation(format!("invalid date {raw:?}")))
}

fn parse_id(raw: &str) -> Result<i64, ConsoleError> {
    raw.parse().map_err(|_| ConsoleError::Validation(format!("invalid user id {raw:?}")))
}

fn usage() -> ConsoleError {
    ConsoleError::Validation(USAGE.to_string())
}
