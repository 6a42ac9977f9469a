use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command};
use docship::{vfs::OsFs, DeployConfig, DeployOptions, DocshipError};
use env_logger::Env;

// The CLI layer should only parse inputs and forward them to library code.
fn main() {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML file overriding the default asset layout and build command"),
        )
        .arg(
            Arg::new("skip-build")
                .long("skip-build")
                .help("Copy assets without running the release build")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the files that would be written, without building or copying")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(error) = run(&matches) {
        let code = error.exit_code();

        eprintln!("{:?}", miette::Report::new(error));

        std::process::exit(code);
    }
}

fn run(matches: &ArgMatches) -> Result<(), DocshipError> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => DeployConfig::from_file(path)?,
        None => DeployConfig::default(),
    };

    log::debug!("deploy config: {:?}", config);

    if matches.get_flag("dry-run") {
        return docship::preview(&config, &OsFs);
    }

    let options = DeployOptions {
        skip_build: matches.get_flag("skip-build"),
    };

    docship::deploy(&config, options)?;

    Ok(())
}
