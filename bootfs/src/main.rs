use std::io;
use std::path::Path;

use clap::{crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg, SubCommand};
use log::LevelFilter;

use bootfs::{create, dump, extract, list, parse_input};

fn main() -> anyhow::Result<()> {
    let arg_image = Arg::with_name("image")
        .help("BootFS image")
        .required(true)
        .value_name("IMAGE");

    let matches = App::new(crate_name!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .help("Log every planned entry")
                .short("v")
                .long("verbose")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("create")
                .about("Create image")
                .arg(
                    Arg::with_name("output")
                        .help("Output image path")
                        .required(true)
                        .value_name("OUTPUT"),
                )
                .arg(
                    Arg::with_name("inputs")
                        .help("Input files in the format <path>:<name>")
                        .multiple(true)
                        .value_name("PATH:NAME"),
                )
                .arg(
                    Arg::with_name("dir")
                        .help("Directory to load all files from recursively, using relative paths as names")
                        .short("d")
                        .long("dir")
                        .takes_value(true)
                        .value_name("DIR")
                        .conflicts_with("inputs"),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List image entries")
                .arg(&arg_image),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Print header and hexdump every entry")
                .arg(&arg_image),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extract image")
                .arg(&arg_image)
                .arg(
                    Arg::with_name("basedir")
                        .help("Directory to unpack to (defaults to '.')")
                        .value_name("DIR")
                        .default_value("."),
                ),
        )
        .get_matches();

    let verbose = matches.is_present("verbose")
        || matches
            .subcommand()
            .1
            .map_or(false, |sub| sub.is_present("verbose"));
    env_logger::Builder::new()
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Some(matches) = matches.subcommand_matches("create") {
        let inputs = matches
            .values_of("inputs")
            .into_iter()
            .flatten()
            .map(parse_input)
            .collect::<Result<Vec<_>, _>>()?;
        create(
            matches.value_of("output").unwrap(),
            &inputs,
            matches.value_of("dir").map(Path::new),
        )?;
    } else if let Some(matches) = matches.subcommand_matches("list") {
        list(matches.value_of("image").unwrap(), &mut io::stdout().lock())?;
    } else if let Some(matches) = matches.subcommand_matches("dump") {
        dump(matches.value_of("image").unwrap(), &mut io::stdout().lock())?;
    } else if let Some(matches) = matches.subcommand_matches("extract") {
        extract(
            matches.value_of("image").unwrap(),
            matches.value_of("basedir").unwrap(),
        )?;
    }
    Ok(())
}
