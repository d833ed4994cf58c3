use anyhow::Result;
use verpraia_balneabilidade::maps::{nearest_beach_links, Platform, AGENCY_SITE_URL};
use verpraia_balneabilidade::{Coordinates, HttpOptions, Repository};
use verpraia_core::{AppError, Config};

const USAGE: &str = "\
Usage: verpraia <command>

Commands:
  municipios                    List monitored municipalities
  locais <codigo-municipio>     List bathing locations of a municipality
  pontos <codigo-local>         List collection points of a location
  anos                          List years with monitoring data
  praia-proxima [lat lng] [--ios]
                                Map links for beaches near a position";

enum Command {
    Municipalities,
    Locations(String),
    Points(i64),
    Years,
    NearestBeach {
        position: Option<Coordinates>,
        platform: Platform,
    },
}

fn parse_args(args: &[String]) -> Option<Command> {
    let (name, rest) = args.split_first()?;
    match (name.as_str(), rest) {
        ("municipios", []) => Some(Command::Municipalities),
        ("locais", [code]) => Some(Command::Locations(code.clone())),
        ("pontos", [code]) => code.parse().ok().map(Command::Points),
        ("anos", []) => Some(Command::Years),
        ("praia-proxima", rest) => {
            let platform = if rest.iter().any(|a| a == "--ios") {
                Platform::Ios
            } else {
                Platform::Android
            };
            let numbers: Vec<&String> = rest.iter().filter(|a| *a != "--ios").collect();
            let position = match numbers.as_slice() {
                [] => None,
                [lat, lng] => Some(Coordinates {
                    latitude: lat.parse().ok()?,
                    longitude: lng.parse().ok()?,
                }),
                _ => return None,
            };
            Some(Command::NearestBeach { position, platform })
        }
        _ => None,
    }
}

async fn run(repo: &Repository, command: Command) -> Result<(), AppError> {
    match command {
        Command::Municipalities => {
            for m in repo.fetch_municipalities().await? {
                println!("{}\t{}", m.code, m.description);
            }
        }
        Command::Locations(code) => {
            let locations = repo.fetch_locations_by_municipality(&code).await?;
            if locations.is_empty() {
                println!("Nenhum local.");
            }
            for l in locations {
                println!("{}\t{}\t{}, {}", l.code, l.name, l.latitude, l.longitude);
            }
        }
        Command::Points(code) => {
            let points = repo.fetch_points_by_location(code).await?;
            if points.is_empty() {
                println!("Nenhum ponto.");
            }
            for p in points {
                println!("{}\t{}", p.condition, p.location);
            }
        }
        Command::Years => {
            for year in repo.fetch_analyzed_years().await? {
                println!("{}", year);
            }
        }
        Command::NearestBeach { position, platform } => {
            for link in nearest_beach_links(platform, position) {
                println!("{}", link);
            }
            println!("Fonte dos dados: {}", AGENCY_SITE_URL);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    verpraia_core::init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let repo = match start() {
        Ok(repo) => repo,
        Err(e) => fail(&e),
    };

    if let Err(e) = run(&repo, command).await {
        fail(&e);
    }

    Ok(())
}

/// Resolve configuration once and build the shared repository.
fn start() -> Result<Repository, AppError> {
    let (config, _) = Config::resolve_validated().map_err(AppError::from_startup)?;
    let repo = Repository::from_options(HttpOptions::from(&config.api))?;

    tracing::info!(base_url = %config.api.base_url, "Ver Praia started");
    Ok(repo)
}

fn fail(err: &AppError) -> ! {
    tracing::error!("{}", err);
    eprintln!("Erro: {}", err.user_message());
    std::process::exit(1);
}
