//! Add a user to the gateway's credentials file, or reset their password.
//!
//! Usage: `add_user <username> [credentials-file]`
//!
//! The password is read from the `DASHBOARD_PASSWORD` environment variable
//! when set, otherwise from the first line of standard input.

use solution_dashboard::config::ServerConfig;
use solution_dashboard::login::CredentialStore;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

const PASSWORD_ENV: &str = "DASHBOARD_PASSWORD";

fn read_password() -> io::Result<String> {
    if let Ok(password) = env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <username> [credentials-file]", args[0]);
        process::exit(2);
    }

    let username = &args[1];
    let path = match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => ServerConfig::load()?.credentials_path,
    };

    let password = read_password()?;
    let mut store = CredentialStore::load_or_empty(&path)?;
    let replaced = store.add_user(username, &password)?;
    store.save()?;

    if replaced {
        println!("Updated password for '{}' in {}", username, path.display());
    } else {
        println!("Added user '{}' to {}", username, path.display());
    }
    Ok(())
}
