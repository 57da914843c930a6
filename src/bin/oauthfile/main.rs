use anyhow::*;
use std::env;
use std::process;
use ytmusic_client::oauth::{Credentials, OAUTH_FILE_INSTRUCTIONS};

fn main() -> Result<(), anyhow::Error> {
    let args = env::args().collect::<Vec<String>>();

    if args.len() != 4 {
        print_help(&args[0]);
        process::exit(2);
    }

    let expires_in: i64 = args[3]
        .parse()
        .with_context(|| format!("parse EXPIRES_IN_SECS {:?}", args[3]))?;
    let creds = Credentials::new(&args[1], &args[2], expires_in);
    println!("{}", serde_json::to_string(&creds).context("json serialize")?);
    Ok(())
}

fn print_help(prog: &str) {
    eprint!("usage: {} <ACCESS_TOKEN> <REFRESH_TOKEN> <EXPIRES_IN_SECS>\n\n", prog);
    eprint!("To obtain the token values:\n");
    eprint!("{}\n", OAUTH_FILE_INSTRUCTIONS);
}
