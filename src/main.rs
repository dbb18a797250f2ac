use clap::{Arg, ArgAction, Command};
use std::process::ExitCode;
use tldv6::config::{self, AddressFamily, AuditConfig, Transport};
use tldv6::error::ConfigError;
use tldv6::Audit;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("tldv6")
        .version(env!("CARGO_PKG_VERSION"))
        .about("List top-level domains without an IPv6-reachable name server")
        .arg(
            Arg::new("resolver")
                .short('r')
                .long("resolver")
                .value_name("ADDRESS[:PORT]")
                .help("Recursive resolver to use instead of /etc/resolv.conf (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-query timeout"),
        )
        .arg(
            Arg::new("tcp")
                .long("tcp")
                .help("Query resolvers over TCP only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("family")
                .long("family")
                .value_name("FAMILY")
                .help("Root server addresses to try for the zone transfer")
                .value_parser(["any", "ipv4", "ipv6"]),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(matches: &clap::ArgMatches) -> Result<AuditConfig, ConfigError> {
    let mut config = AuditConfig::from_env()?;

    if let Some(resolvers) = matches.get_many::<String>("resolver") {
        config.resolvers = resolvers
            .map(|s| config::parse_resolver(s))
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        config.query_timeout = config::parse_timeout(timeout)?;
    }
    if matches.get_flag("tcp") {
        config.transport = Transport::Tcp;
    }
    if let Some(family) = matches.get_one::<String>("family") {
        config.address_family = family.parse::<AddressFamily>()?;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Configuration: {:?}", config);

    let audit = Audit::new(config);
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    match audit.run(&mut stdout, &mut stderr).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
