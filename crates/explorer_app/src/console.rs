use std::io::BufRead;
use std::thread;

use engine_logging::{engine_debug, engine_warn};
use explorer_core::{CriteriaSet, Facet, Msg};
use tokio::sync::mpsc::UnboundedSender;

pub const HELP: &str = "\
Commands:
  set <facet> <option>[, <option>...]   replace a facet's selection
  min <n>                               set the minimum cell size
  submit                                rerun the meta-analysis
  quit                                  finish and print the report
Facets: outcome, measurement, aspect, medium, appeal, country";

/// What a console line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(Msg),
    Help,
    Quit,
}

/// Reads commands from stdin on a background thread until `quit` or end of input.
///
/// The criteria edited here are a local copy; every edit is forwarded whole.
pub fn spawn(tx: UnboundedSender<Msg>, mut criteria: CriteriaSet) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    engine_warn!("Failed to read stdin: {}", err);
                    break;
                }
            };
            match parse_command(&line, &mut criteria) {
                Ok(Some(Command::Send(msg))) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Ok(Some(Command::Help)) => println!("{HELP}"),
                Ok(Some(Command::Quit)) => break,
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
        }
        engine_debug!("Console input finished");
    });
}

pub fn parse_command(line: &str, criteria: &mut CriteriaSet) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));
    match word {
        "" => Ok(None),
        "submit" => Ok(Some(Command::Send(Msg::SubmitClicked))),
        "help" | "?" => Ok(Some(Command::Help)),
        "quit" | "exit" => Ok(Some(Command::Quit)),
        "min" => {
            let size = rest
                .parse::<u32>()
                .map_err(|_| format!("not a cell size: {rest:?}"))?;
            criteria.minimum_cell_size = size;
            Ok(Some(Command::Send(Msg::CriteriaEdited(criteria.clone()))))
        }
        "set" => {
            let (name, options) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            let facet = parse_facet(name).ok_or_else(|| format!("unknown facet {name:?}"))?;
            *criteria.selections_mut(facet) = options
                .split(',')
                .map(|option| option.trim().to_lowercase())
                .filter(|option| !option.is_empty())
                .collect();
            Ok(Some(Command::Send(Msg::CriteriaEdited(criteria.clone()))))
        }
        other => Err(format!("unknown command {other:?}; try `help`")),
    }
}

pub fn parse_facet(name: &str) -> Option<Facet> {
    match name.to_lowercase().as_str() {
        "outcome" | "outcomes" => Some(Facet::Outcome),
        "measurement" | "measurements" => Some(Facet::Measurement),
        "aspect" | "aspects" => Some(Facet::Aspect),
        "medium" | "media" | "mediums" => Some(Facet::Medium),
        "appeal" | "appeals" => Some(Facet::Appeal),
        "country" | "countries" => Some(Facet::Country),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CriteriaSet {
        CriteriaSet::new()
            .with(Facet::Outcome, ["meat consumption"])
            .with(Facet::Country, ["usa"])
    }

    #[test]
    fn set_replaces_a_facet_and_forwards_the_whole_selection() {
        let mut criteria = base();
        let command = parse_command("set country  Germany, USA ,", &mut criteria).unwrap();
        let expected = base().with(Facet::Country, ["germany", "usa"]);
        assert_eq!(command, Some(Command::Send(Msg::CriteriaEdited(expected.clone()))));
        assert_eq!(criteria, expected);
    }

    #[test]
    fn set_without_options_clears_the_facet() {
        let mut criteria = base();
        parse_command("set outcome", &mut criteria).unwrap();
        assert!(criteria.outcomes.is_empty());
    }

    #[test]
    fn simple_commands() {
        let mut criteria = base();
        assert_eq!(
            parse_command(" submit ", &mut criteria),
            Ok(Some(Command::Send(Msg::SubmitClicked)))
        );
        assert_eq!(parse_command("", &mut criteria), Ok(None));
        assert_eq!(parse_command("quit", &mut criteria), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("help", &mut criteria), Ok(Some(Command::Help)));
    }

    #[test]
    fn min_sets_cell_size() {
        let mut criteria = base();
        parse_command("min 25", &mut criteria).unwrap();
        assert_eq!(criteria.minimum_cell_size, 25);
        assert!(parse_command("min lots", &mut criteria).is_err());
    }

    #[test]
    fn rejects_unknown_words() {
        let mut criteria = base();
        assert!(parse_command("set colour red", &mut criteria).is_err());
        assert!(parse_command("rerun", &mut criteria).is_err());
        assert_eq!(criteria, base());
    }
}
