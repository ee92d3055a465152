// hbnb - command line inspection of the JSON store
//
//   hbnb stats               count per collection
//   hbnb list [Kind]         every entity, or one kind
//   hbnb show <Kind> <id>    one entity

use anyhow::{bail, Context, Result};
use hbnb::{Config, Entity, Kind, ObjectRegistry};
use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::load()?;
    let registry = ObjectRegistry::open_file(&config.file_path);

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["stats"] => print_json(&registry.stats())?,
        ["list"] => print_entities(registry.iter(None))?,
        ["list", kind] => {
            let kind: Kind = kind.parse()?;
            print_entities(registry.iter(Some(kind)))?
        }
        ["show", kind, id] => {
            let kind: Kind = kind.parse()?;
            let entity = registry
                .fetch(kind, id)
                .with_context(|| format!("in store {}", config.file_path.display()))?;
            print_json(&entity.to_public_json()?)?
        }
        _ => bail!("usage: hbnb stats | list [Kind] | show <Kind> <id>"),
    }

    Ok(())
}

fn print_entities<'a>(entities: impl Iterator<Item = &'a Entity>) -> Result<()> {
    let mut sorted: Vec<&Entity> = entities.collect();
    sorted.sort_by_key(|e| (e.kind(), e.created_at()));

    let rendered = sorted
        .into_iter()
        .map(Entity::to_public_json)
        .collect::<hbnb::Result<Vec<_>>>()?;
    print_json(&rendered)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
