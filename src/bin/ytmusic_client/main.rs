use anyhow::Error;
use log::*;
use logosaurus::{self, Logger, L_LEVEL, L_TIME};
use std::env;
use std::process;
use ytmusic_client::client::YtMusicClient;
use ytmusic_client::commands::{self, Outcome};
use ytmusic_client::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = env::args().skip(1).collect::<Vec<String>>();
    let mut config = Config::from_env();

    let inv = match commands::parse_options(&args) {
        Ok(inv) => inv,
        Err(usage) => exit_with(Ok(usage)),
    };
    if inv.verbose {
        config.log_level = LevelFilter::Debug;
    }

    let logger = Logger::builder(std::io::stderr())
        .set_prefix("ytmusic_client: ")
        .set_flags(L_LEVEL | L_TIME)
        .set_level(config.log_level)
        .build();
    logosaurus::init(logger).unwrap();

    debug!("using api base {}", config.api_base);
    let connect = |path: &str| YtMusicClient::connect(path, &config);
    exit_with(commands::dispatch(&inv.free, connect).await);
}

fn exit_with(outcome: Result<Outcome, Error>) -> ! {
    match outcome {
        Ok(o) => {
            println!("{}", o.json);
            process::exit(o.exit_code);
        }
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
