mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Audit, Get, Init, Migrate, Ping, Put, Version};

command_enum! {
    (Audit, Audit),
    (Get, Get),
    (Init, Init),
    (Migrate, Migrate),
    (Ping, Ping),
    (Put, Put),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guards = logging::init_logging(args.log_level, args.log_dir.as_deref());

    let ctx = op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            drop(guards);
            std::process::exit(1);
        }
    }
}
