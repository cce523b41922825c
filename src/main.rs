//! The rawm binary: connect, take over the root window and run until
//! told to exit or restart.
use rawm::{
    config::{self, Config},
    util,
    x11rb::{X11rbConnection, X11rbDraw},
    Result, WindowManager,
};
use std::process::exit;
use tracing_subscriber::{self, EnvFilter};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => (),
        Some("-v") => {
            eprintln!("rawm-{}", env!("CARGO_PKG_VERSION"));
            exit(1);
        }
        Some(_) => {
            eprintln!("usage: rawm [-v]");
            exit(1);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => {
            // restart requested: replace ourselves with a fresh process
            if let Err(e) = util::exec_self(&args) {
                eprintln!("rawm: restart failed: {e}");
                exit(1);
            }
        }
        Ok(false) => (),
        Err(e) => {
            eprintln!("rawm: {e}");
            exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let config = Config::default();
    let draw = X11rbDraw::new(config.font, config.colors.clone())?;
    let conn = X11rbConnection::new()?;

    let wm = WindowManager::new(
        config,
        config::default_keys(),
        config::default_buttons(),
        Box::new(draw),
        conn,
    )?;

    wm.run()
}
