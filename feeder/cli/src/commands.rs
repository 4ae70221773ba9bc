//! Stdin command parsing
//!
//! One command per line:
//!
//! ```text
//! reload
//! fav <id>
//! play <id>
//! filter all|favorites
//! quit
//! ```

use std::str::FromStr;

use feeder_core::{FeedItemId, Filters};
use thiserror::Error;

/// A parsed stdin command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Reload the feed
    Reload,
    /// Toggle the favorite flag of an item
    Favorite(FeedItemId),
    /// Toggle playback of an item
    Play(FeedItemId),
    /// Replace the filters
    Filter(Filters),
    /// Shut down
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line
    #[error("Empty command")]
    Empty,

    /// Unknown verb
    #[error("Unknown command '{0}' (expected reload, fav, play, filter, or quit)")]
    Unknown(String),

    /// Verb given without its argument
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    /// Argument not understood
    #[error("Invalid argument for '{verb}': {value}")]
    InvalidArgument {
        /// Command verb
        verb: &'static str,
        /// Rejected value
        value: String,
    },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let arg = words.next();

        match verb.to_ascii_lowercase().as_str() {
            "reload" => Ok(Self::Reload),
            "quit" | "exit" => Ok(Self::Quit),
            "fav" => arg
                .map(|id| Self::Favorite(FeedItemId::new(id)))
                .ok_or(CommandError::MissingArgument("fav")),
            "play" => arg
                .map(|id| Self::Play(FeedItemId::new(id)))
                .ok_or(CommandError::MissingArgument("play")),
            "filter" => match arg {
                Some("all") => Ok(Self::Filter(Filters::default())),
                Some("favorites" | "favs") => Ok(Self::Filter(Filters::favorites_only())),
                Some(other) => Err(CommandError::InvalidArgument {
                    verb: "filter",
                    value: other.to_string(),
                }),
                None => Err(CommandError::MissingArgument("filter")),
            },
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!("reload".parse(), Ok(Command::Reload));
        assert_eq!("  quit ".parse(), Ok(Command::Quit));
        assert_eq!(
            "fav ep-12".parse(),
            Ok(Command::Favorite(FeedItemId::new("ep-12")))
        );
        assert_eq!("PLAY ep1".parse(), Ok(Command::Play(FeedItemId::new("ep1"))));
        assert_eq!(
            "filter favorites".parse(),
            Ok(Command::Filter(Filters::favorites_only()))
        );
        assert_eq!("filter all".parse(), Ok(Command::Filter(Filters::default())));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "play".parse::<Command>(),
            Err(CommandError::MissingArgument("play"))
        );
        assert_eq!(
            "filter none".parse::<Command>(),
            Err(CommandError::InvalidArgument {
                verb: "filter",
                value: "none".to_string()
            })
        );
    }
}
