mod categories;
mod cli;
mod client;
mod config;
mod database;
mod error;
mod mapper;
mod pager;
mod server;
mod update;
mod web;
mod words;

use cli::Cli;
use log::error;

fn main() {
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
