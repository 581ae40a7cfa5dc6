use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::rc::Rc;
use wheelkit::entry::{DEFAULT_WEIGHT, Entry, Weight};
use wheelkit::selection;
use wheelkit::{EntryStore, JsonFileStore, KeyValueStore, TemplateStore};

#[derive(Parser, Debug)]
#[command(name = "wheelkit", version, about, long_about = None)]
struct Cli {
    /// State file to operate on (defaults to the shared roulette state)
    #[arg(short = 's', long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print the current wheel
    List,
    /// Append an entry
    Add {
        label: String,
        #[arg(short = 'w', long, default_value_t = DEFAULT_WEIGHT)]
        weight: f64,
    },
    /// Remove the entry at INDEX
    Remove { index: usize },
    /// Change the label at INDEX
    Rename { index: usize, label: String },
    /// Change the weight at INDEX
    Weight { index: usize, weight: f64 },
    /// Remove every entry
    Clear,
    /// Print each entry's angular segment
    Segments,
    /// Report which entry the pointer lands on for a rotation angle
    Pick {
        #[arg(short = 'a', long, allow_negative_numbers = true)]
        angle: f64,
    },
    /// Manage saved templates
    #[command(subcommand)]
    Template(TemplateCommands),
}

#[derive(Subcommand, Debug, Clone)]
enum TemplateCommands {
    /// Save the current wheel as a template
    Save { name: String },
    /// List saved templates
    List,
    /// Replace the current wheel with a template
    Apply { index: usize },
    /// Delete the template at INDEX
    Delete { index: usize },
    /// Append an entry to a saved template
    AddEntry {
        index: usize,
        label: String,
        #[arg(short = 'w', long, default_value_t = DEFAULT_WEIGHT)]
        weight: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store: Rc<dyn KeyValueStore> = match cli.store {
        Some(path) => Rc::new(JsonFileStore::open(path)),
        None => Rc::new(JsonFileStore::open_default()?),
    };

    match cli.command {
        Some(cmd) => run(cmd, store),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn run(cmd: Commands, store: Rc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let mut entries = EntryStore::load(store.clone());

    match cmd {
        Commands::List => print_wheel(&entries),
        Commands::Add { label, weight } => {
            let entry = entries.append(label, weight)?;
            println!("added '{}' ({})", entry.label, entry.weight);
        }
        Commands::Remove { index } => {
            let removed = entries.remove_at(index)?;
            println!("removed '{}'", removed.label);
        }
        Commands::Rename { index, label } => entries.update_label(index, label)?,
        Commands::Weight { index, weight } => entries.update_weight(index, weight)?,
        Commands::Clear => entries.clear_all(),
        Commands::Segments => {
            for s in selection::segments(entries.wheel().entries())? {
                println!("{:>3}  {:>7.2} .. {:>7.2}  {}", s.index, s.start, s.end, s.label);
            }
        }
        Commands::Pick { angle } => {
            let entry = selection::select(entries.wheel().entries(), angle)?;
            println!("{}", entry.label);
        }
        Commands::Template(cmd) => return run_template(cmd, store),
    }
    Ok(())
}

fn run_template(cmd: TemplateCommands, store: Rc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let mut templates = TemplateStore::load(store.clone());

    match cmd {
        TemplateCommands::Save { name } => {
            let entries = EntryStore::load(store);
            let saved = templates.save(&name, entries.wheel());
            println!("saved '{}' with {} entries", saved.name, saved.entries.len());
        }
        TemplateCommands::List => {
            for (i, t) in templates.list().iter().enumerate() {
                println!("{:>3}  {} ({} entries)", i, t.name, t.entries.len());
            }
        }
        TemplateCommands::Apply { index } => {
            let Some(wheel) = templates.apply(index) else {
                anyhow::bail!("no template at index {}", index);
            };
            let mut entries = EntryStore::load(store);
            entries.replace(wheel);
            print_wheel(&entries);
        }
        TemplateCommands::Delete { index } => {
            if templates.delete(index).is_none() {
                anyhow::bail!("no template at index {}", index);
            }
        }
        TemplateCommands::AddEntry {
            index,
            label,
            weight,
        } => {
            let entry = Entry::new(label, Weight::new(weight)?);
            if templates.append_entry(index, entry).is_none() {
                anyhow::bail!("no template at index {}", index);
            }
        }
    }
    Ok(())
}

fn print_wheel(entries: &EntryStore) {
    if entries.wheel().is_empty() {
        println!("(no entries)");
        return;
    }
    for (i, e) in entries.wheel().entries().iter().enumerate() {
        println!("{:>3}  {:<24} {}", i, e.label, e.weight);
    }
}
