//! people-db - bootstrap and walkthrough
//!
//! Opens the configured store and runs every repository operation once,
//! printing each result as JSON.

use clap::Parser;
use people_db::{Config, Database, NewPerson, PersonRepository};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "people-db")]
#[command(about = "Run the person repository walkthrough against a document store", long_about = None)]
struct Cli {
    /// File store directory (overrides PEOPLE_DATA_DIR; ignored with MONGO_URI)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Collection holding person documents (overrides PEOPLE_COLLECTION)
    #[arg(short, long)]
    collection: Option<String>,

    /// Food searched for by the chained query
    #[arg(long, default_value = "burrito")]
    food: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        if matches!(config.storage, people_db::StorageConfig::File { .. }) {
            config.storage = people_db::StorageConfig::File { root: dir };
        }
    }
    if let Some(collection) = cli.collection {
        config = config.with_collection(collection);
    }

    let db = Database::open(&config).await?;
    let people = db.people()?;

    walkthrough(&people, &cli.food).await
}

async fn walkthrough(people: &PersonRepository, food: &str) -> anyhow::Result<()> {
    let sarav = people
        .create_person(
            NewPerson::new("Sarav Austin")
                .age(27)
                .favorite_foods(["Pizza", "Burgers"]),
        )
        .await?;
    show("create_person", &sarav)?;

    let crowd = people
        .create_many_people(vec![
            NewPerson::new("Mary").age(31).favorite_foods(["burrito", "tacos"]),
            NewPerson::new("Ann").age(24).favorite_foods(["burrito"]),
            NewPerson::new("Mary").age(45).favorite_foods(["sushi"]),
            NewPerson::new("Zoe").favorite_foods(["burrito"]),
        ])
        .await?;
    show("create_many_people", &crowd)?;

    show(
        "find_people_by_name",
        &people.find_people_by_name("Sarav Austin").await?,
    )?;
    show("find_one_by_food", &people.find_one_by_food("Pizza").await?)?;
    show("find_person_by_id", &people.find_person_by_id(&sarav.id).await?)?;
    show("find_edit_then_save", &people.find_edit_then_save(&sarav.id).await?)?;
    show("find_and_update", &people.find_and_update("Ann").await?)?;
    show("query_chain", &people.query_chain(food).await?)?;
    show("remove_many_people", &people.remove_many_people().await?)?;

    for person in crowd.iter().chain(std::iter::once(&sarav)) {
        if let Some(removed) = people.remove_by_id(&person.id).await? {
            show("remove_by_id", &removed)?;
        }
    }

    Ok(())
}

fn show<T: Serialize>(step: &str, value: &T) -> anyhow::Result<()> {
    println!("--- {} ---", step);
    println!("{}", serde_json::to_string_pretty(value)?);
    println!();
    Ok(())
}
