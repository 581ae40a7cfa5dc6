use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use roulette::session::Session;
use roulette::sys::runtime;
use roulette::{audio, config};
use std::path::PathBuf;
use std::rc::Rc;
use wheelkit::{JsonFileStore, KeyValueStore};

#[derive(Parser)]
#[command(version, about = "Spin a weighted wheel of choices")]
struct Args {
    /// State file to use instead of the configured one
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Seed the spin generator for reproducible results
    #[arg(long)]
    seed: Option<u64>,

    /// Write the default config file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.write_config {
        let path = config::write_default_config()?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = config::load_or_default();

    let file = match args.store.or_else(|| config.storage.path.clone()) {
        Some(path) => JsonFileStore::open(path),
        None => JsonFileStore::open_default()?,
    };
    log::info!("Using state file {}", file.path().display());
    let store: Rc<dyn KeyValueStore> = Rc::new(file);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let session = Session::new(store, &config, Box::new(audio::backend_from_config), rng);

    runtime::run(session)
}
