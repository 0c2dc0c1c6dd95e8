use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use leaflet::build::{build_site, plan_site};
use leaflet::config::Config;
use leaflet::source::DirectorySource;
use std::error::Error;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let project_arg = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .help("The project directory (defaults to the current directory)");

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(project_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory (defaults to `_output` in the project)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("pages")
                .about("Prints the pages a build would write, without writing them")
                .arg(project_arg),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(m)) => build(m),
        ("pages", Some(m)) => pages(m),
        _ => unreachable!("clap requires a subcommand"),
    };

    if let Err(err) = result {
        log::error!("{}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            log::error!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn project_directory(matches: &ArgMatches) -> Result<PathBuf, Box<dyn Error>> {
    Ok(match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    })
}

fn load_config(matches: &ArgMatches, output: &Path) -> Result<Config, Box<dyn Error>> {
    Ok(Config::from_directory(&project_directory(matches)?, output)?)
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let output = match matches.value_of("output") {
        Some(dir) => PathBuf::from(dir),
        None => project_directory(matches)?.join("_output"),
    };
    let config = load_config(matches, &output)?;
    build_site(&config)?;
    log::info!("site written to `{}`", config.output_directory.display());
    Ok(())
}

fn pages(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(matches, Path::new("_output"))?;
    let source = DirectorySource::new(&config.posts_source_directory, &config.render_options);
    let (_, plan) = plan_site(&source, config.home_posts)?;
    for directive in plan.directives.iter() {
        println!("{}", directive);
    }
    Ok(())
}
