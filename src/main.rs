extern crate anyhow;
extern crate chrono;
extern crate flexi_logger;
extern crate getopts;
extern crate reqwest;
extern crate signal_hook;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod arrivals;
mod config;
mod light;
mod poll;
mod resolve;
mod result;
mod scheduler;
mod state;

use anyhow::Context;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn init_logging(log_to_file: bool) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    let logger = flexi_logger::Logger::try_with_env_or_str("info")?
        .format(flexi_logger::detailed_format);

    if log_to_file {
        return logger
            .log_to_file(flexi_logger::FileSpec::default())
            .duplicate_to_stdout(flexi_logger::Duplicate::Info)
            .start();
    }
    return logger.log_to_stdout().start();
}

fn make_light(config: &config::Config, skip_light: bool) -> Box<dyn light::Light> {
    match config.hue {
        Some(ref hue) if !skip_light => {
            info!("Driving Hue lights {:?} on bridge {}", hue.lights, hue.bridge);
            return Box::new(light::HueLight::new(hue));
        },
        _ => {
            info!("No light configured, logging states only");
            return Box::new(light::ConsoleLight);
        },
    }
}

fn run(matches: &getopts::Matches) -> anyhow::Result<()> {
    let config_path = matches.opt_str("config")
        .unwrap_or(config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::Config::load(&config_path)
        .with_context(|| format!("while loading config from '{}'", config_path))?;
    info!("Watching stops {}", config.trimet.stops.join(","));

    let client = arrivals::ArrivalClient::new(&config.trimet);
    let light = make_light(&config, matches.opt_present("skip-light"));
    let mut buslight = poll::BusLight::new(client, light);

    if matches.opt_present("one-shot") {
        let outcome = buslight.run_cycle(&chrono::Utc::now())
            .context("while checking for the next bus")?;
        info!("One-shot cycle finished: {:?} (next check would be {})", outcome, outcome.next_check());
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in &[signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(*signal, Arc::clone(&shutdown))
            .with_context(|| format!("while registering handler for signal {}", signal))?;
    }

    buslight.start(&chrono::Utc::now());
    buslight.run_until(&shutdown)
        .context("while checking for the next bus")?;

    info!("Shut down cleanly");
    return Ok(());
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optopt("c", "config", "Path to the YAML config.", "FILENAME");
    opts.optflag("d", "skip-light", "log the light state instead of driving the Hue bridge");
    opts.optflag("o", "one-shot", "check for the next bus once and exit");
    opts.optflag("l", "log-to-file", "also write logs to files in the current directory");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}\n{}", err, opts.usage(&format!("Usage: {} [options]", args[0])));
            std::process::exit(2);
        },
    };

    if matches.opt_present("help") {
        print!("{}", opts.usage(&format!("Usage: {} [options]", args[0])));
        return;
    }

    let logger = match init_logging(matches.opt_present("log-to-file")) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Unable to start logging: {}", err);
            std::process::exit(1);
        },
    };

    let exit_code = match run(&matches) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        },
    };

    logger.flush();
    std::process::exit(exit_code);
}
