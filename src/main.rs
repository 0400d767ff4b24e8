use std::env;
use std::path::PathBuf;

mod app;
mod audio;
mod config;
mod delivery;
mod library;
mod logging;
mod runtime;
mod session;
mod ui;

const USAGE: &str = "\
usage:
  cadenza serve [MUSIC_DIR]   serve the tracks in MUSIC_DIR over HTTP
  cadenza [SERVER_URL]        browse and play a remote catalog";

enum Mode {
    Serve(Option<PathBuf>),
    Client(Option<String>),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Mode {
    match args.next().as_deref() {
        Some("serve") => Mode::Serve(args.next().map(PathBuf::from)),
        Some("-h") | Some("--help") | Some("help") => Mode::Help,
        Some(url) => Mode::Client(Some(url.to_string())),
        None => Mode::Client(None),
    }
}

fn main() -> anyhow::Result<()> {
    let mode = parse_args(env::args().skip(1));
    if let Mode::Help = mode {
        println!("{USAGE}");
        return Ok(());
    }

    let settings = config::load_or_default();
    match mode {
        Mode::Serve(dir) => runtime::run_server(settings, dir),
        Mode::Client(url) => runtime::run_client(settings, url),
        Mode::Help => Ok(()),
    }
}
