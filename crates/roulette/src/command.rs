use crate::settings::SpinSpeed;
use std::str::FromStr;
use thiserror::Error;
use wheelkit::entry::DEFAULT_WEIGHT;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add { label: String, weight: f64 },
    Remove(usize),
    Keep(usize),
    Rename { index: usize, label: String },
    Reweight { index: usize, weight: f64 },
    Clear,
    List,
    Spin,
    SaveTemplate(String),
    ListTemplates,
    LoadTemplate(usize),
    DeleteTemplate(usize),
    Speed(SpinSpeed),
    Sound(bool),
    Settings,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unbalanced quotes")]
    Quoting,
    #[error("unknown command '{0}' (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a valid {1}")]
    Invalid(String, &'static str),
}

pub const HELP: &str = "\
commands:
  add <label> [weight]      append an entry (weight defaults to 1)
  rm <index>                mark an entry for removal; repeat to confirm
  keep <index>              unmark an entry
  rename <index> <label>    change an entry's label
  weight <index> <weight>   change an entry's weight
  clear                     remove every entry
  list                      show the wheel
  spin                      spin the wheel
  save [name]               save the wheel as a template
  templates                 list templates
  load <index>              replace the wheel with a template
  delete <index>            delete a template
  speed slow|normal|fast    choose the spin duration
  sound on|off              toggle sounds
  settings                  show preferences
  quit                      leave";

fn index(arg: Option<&String>, usage: &'static str) -> Result<usize, CommandError> {
    let raw = arg.ok_or(CommandError::Usage(usage))?;
    raw.parse()
        .map_err(|_| CommandError::Invalid(raw.clone(), "index"))
}

fn weight(raw: &str) -> Result<f64, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::Invalid(raw.to_string(), "weight"))
}

impl FromStr for Action {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words = shell_words::split(line).map_err(|_| CommandError::Quoting)?;
        let Some((cmd, args)) = words.split_first() else {
            return Err(CommandError::Usage("<command> [args...]"));
        };

        let action = match cmd.to_ascii_lowercase().as_str() {
            "add" => {
                const USAGE: &str = "add <label> [weight]";
                match args {
                    [label] => Action::Add {
                        label: label.clone(),
                        weight: DEFAULT_WEIGHT,
                    },
                    [label, w] => Action::Add {
                        label: label.clone(),
                        weight: weight(w)?,
                    },
                    _ => return Err(CommandError::Usage(USAGE)),
                }
            }
            "rm" | "remove" => Action::Remove(index(args.first(), "rm <index>")?),
            "keep" => Action::Keep(index(args.first(), "keep <index>")?),
            "rename" => {
                const USAGE: &str = "rename <index> <label>";
                let [i, label] = args else {
                    return Err(CommandError::Usage(USAGE));
                };
                Action::Rename {
                    index: index(Some(i), USAGE)?,
                    label: label.clone(),
                }
            }
            "weight" => {
                const USAGE: &str = "weight <index> <weight>";
                let [i, w] = args else {
                    return Err(CommandError::Usage(USAGE));
                };
                Action::Reweight {
                    index: index(Some(i), USAGE)?,
                    weight: weight(w)?,
                }
            }
            "clear" => Action::Clear,
            "list" | "ls" => Action::List,
            "spin" => Action::Spin,
            "save" => Action::SaveTemplate(args.join(" ")),
            "templates" => Action::ListTemplates,
            "load" => Action::LoadTemplate(index(args.first(), "load <index>")?),
            "delete" => Action::DeleteTemplate(index(args.first(), "delete <index>")?),
            "speed" => {
                let raw = args.first().ok_or(CommandError::Usage("speed slow|normal|fast"))?;
                let speed = raw
                    .parse()
                    .map_err(|_| CommandError::Invalid(raw.clone(), "speed"))?;
                Action::Speed(speed)
            }
            "sound" => match args.first().map(String::as_str) {
                Some("on") => Action::Sound(true),
                Some("off") => Action::Sound(false),
                _ => return Err(CommandError::Usage("sound on|off")),
            },
            "settings" => Action::Settings,
            "help" | "?" => Action::Help,
            "quit" | "exit" | "q" => Action::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(action)
    }
}
