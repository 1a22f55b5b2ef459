use std::process::ExitCode;

use clap::Parser;
use palmistry::{args::Args, commands::run};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:?}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
