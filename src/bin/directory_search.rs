

use std::str::FromStr;

use anyhow::{bail, Context};
use directory_search::search::PopulationType;
use directory_search::{
    DirectoryConfig, DirectorySearchService, InMemoryObjectStore, PwsClient, QuerySynchronizer,
    SearchDirectoryInput,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: directory-search [--population=employees|students|all] \
[--authenticated] [--include-test-identities] <name|department|email|phone|box> <value...>";

fn parse_args(args: &[String]) -> anyhow::Result<(SearchDirectoryInput, bool)> {
    let mut input = SearchDirectoryInput::default();
    let mut authenticated = false;
    let mut positional = Vec::new();

    for arg in args {
        if let Some(population) = arg.strip_prefix("--population=") {
            input.population = PopulationType::from_str(population)
                .with_context(|| format!("unknown population {population:?}"))?;
        } else if arg == "--authenticated" {
            authenticated = true;
        } else if arg == "--include-test-identities" {
            input.include_test_identities = true;
        } else if arg.starts_with("--") {
            bail!("unknown flag {arg}\n{USAGE}");
        } else {
            positional.push(arg.as_str());
        }
    }

    let Some((attribute, value)) = positional.split_first() else {
        bail!(USAGE);
    };
    let value = Some(value.join(" "));
    match *attribute {
        "name" => input.name = value,
        "department" => input.department = value,
        "email" => input.email = value,
        "phone" => input.phone = value,
        "box" => input.box_number = value,
        other => bail!("unknown attribute {other:?}\n{USAGE}"),
    }
    Ok((input, authenticated))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("warn".parse()?)
                .add_directive("directory_search=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, authenticated) = parse_args(&args)?;

    let config = DirectoryConfig::load().context("loading configuration")?;
    let client = PwsClient::new(&config)?;
    let synchronizer = QuerySynchronizer::new(
        InMemoryObjectStore::new(config.cache_capacity, &config.cache_namespace),
        config.cache.clone(),
    );
    let service = DirectorySearchService::new(client, &config).with_authentication(authenticated);

    let output = service.search_synchronized(input, &synchronizer).await?;
    debug!("Cache hit rate {:.2}", synchronizer.store().stats().hit_rate());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
