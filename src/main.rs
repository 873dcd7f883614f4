use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use boxwatch::commands;
use boxwatch::web::DEFAULT_ADDR;

fn cli() -> Command {
    Command::new("boxwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches this server and pushes a notification when a rule fires")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Config file (default: <config dir>/boxwatch/config.json)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the monitor and the HTTP status endpoint until ctrl-c")
                .arg(
                    Arg::new("addr")
                        .short('a')
                        .long("addr")
                        .value_name("HOST:PORT")
                        .help("Listen address of the status endpoint")
                        .env("BOXWATCH_ADDR")
                        .default_value(DEFAULT_ADDR),
                )
                .arg(
                    Arg::new("crt")
                        .long("crt")
                        .value_name("FILE")
                        .help("PEM certificate chain, serves HTTPS together with --key")
                        .env("BOXWATCH_TLS_CRT")
                        .value_parser(clap::value_parser!(PathBuf))
                        .requires("key"),
                )
                .arg(
                    Arg::new("key")
                        .long("key")
                        .value_name("FILE")
                        .help("PEM private key for --crt")
                        .env("BOXWATCH_TLS_KEY")
                        .value_parser(clap::value_parser!(PathBuf))
                        .requires("crt"),
                ),
        )
        .subcommand(
            Command::new("conf")
                .about("Manage the config file (use 'boxwatch conf --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("init").about("Write the default config").arg(
                        Arg::new("force")
                            .short('f')
                            .long("force")
                            .help("Overwrite an existing config")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(
                    Command::new("check").about("Load, migrate and validate the config"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Sample twice and show the status and every rule's verdict")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print JSON instead of a table")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    boxwatch::init_logging();

    let matches = cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("serve", sub_matches)) => commands::serve(sub_matches)?,
        Some(("conf", sub_matches)) => commands::conf::handle(sub_matches)?,
        Some(("status", sub_matches)) => commands::status(sub_matches)?,
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Welcome to boxwatch!");
            println!("Use 'boxwatch --help' for more information.");
        }
    }

    Ok(())
}
