use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use env_logger::Env;

use crate::table::{config::Config, session::Control};

pub mod table;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = Config::from_args(std::env::args().skip(1))?;
    let mut session = table::open(&config);

    let mut input = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut line = String::new();
    loop {
        write!(stdout, "db > ")?;
        stdout.flush()?;

        line.clear();
        if input.read_line(&mut line).context("Error reading input")? == 0 {
            break;
        }
        if session.handle_line(&line, &mut stdout)? == Control::Exit {
            break;
        }
    }

    Ok(())
}
