use anyhow::{anyhow, Result};
use env_logger::Env;

use sensorhub::{
    argsets::RunArgs,
    command,
    constants::{defaults, envvars},
    helpers,
    readers::serial_json::config::parse_baud_rate,
};

const CMD_RUN: &str = "run";
const CMD_SETTINGS: &str = "settings";
const CMD_CURRENT: &str = "current";

fn main() -> Result<()> {
    let dotenv_files = helpers::load_dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .init();
    for path in dotenv_files {
        log::debug!("Loaded {}", path.display());
    }

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_RUN) => {
            let run_args = RunArgs {
                port: args.opt_value_from_str("--port")?,
                baud: args.opt_value_from_fn("--baud", parse_baud_rate)?,
                listen: args.opt_value_from_str("--listen")?,
            };
            warn_unused(args);
            command::run(run_args)
        }
        Some(CMD_SETTINGS) => command::settings(),
        Some(CMD_CURRENT) => command::current(),
        _ => Err(anyhow!(
            "Subcommand must be one of 'run', 'settings', 'current'"
        )),
    }
}

fn warn_unused(args: pico_args::Arguments) {
    let rest = args.finish();
    if !rest.is_empty() {
        log::warn!("Ignoring unrecognized arguments: {:?}", rest);
    }
}
