use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const USAGE: &str = "usage: meshdedupe <asset-root>";

#[derive(Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub root: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    Help,
    Version,
    MissingRoot,
    InvalidFlag(String),
    UnexpectedArgument(String),
}

impl CliConfig {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_iter(env::args().skip(1))
    }

    pub fn from_iter<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut root: Option<PathBuf> = None;

        for arg in args {
            if arg == "-h" || arg == "--help" {
                return Err(CliError::Help);
            }
            if arg == "-V" || arg == "--version" {
                return Err(CliError::Version);
            }
            if arg.starts_with('-') {
                return Err(CliError::InvalidFlag(arg));
            }
            if root.is_some() {
                return Err(CliError::UnexpectedArgument(arg));
            }
            root = Some(PathBuf::from(arg));
        }

        let root = root.ok_or(CliError::MissingRoot)?;
        Ok(Self { root })
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Help => write!(
                f,
                "Deduplicate exported OBJ meshes and repair descriptor references.\n\n{}",
                USAGE
            ),
            Self::Version => write!(f, "meshdedupe {}", env!("CARGO_PKG_VERSION")),
            Self::MissingRoot => write!(f, "asset root argument is required\n{}", USAGE),
            Self::InvalidFlag(flag) => write!(f, "unrecognized argument: {}\n{}", flag, USAGE),
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected extra argument: {}\n{}", arg, USAGE)
            }
        }
    }
}

impl Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliConfig, CliError> {
        CliConfig::from_iter(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_root_only() {
        let config = parse(&["./dungeon-map"]).unwrap();
        assert_eq!(config.root, PathBuf::from("./dungeon-map"));
    }

    #[test]
    fn requires_root() {
        assert_eq!(parse(&[]), Err(CliError::MissingRoot));
    }

    #[test]
    fn rejects_flags_and_extra_arguments() {
        assert_eq!(
            parse(&["--dry-run", "./map"]),
            Err(CliError::InvalidFlag(String::from("--dry-run")))
        );
        assert_eq!(
            parse(&["./map", "./other"]),
            Err(CliError::UnexpectedArgument(String::from("./other")))
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["./map", "--help"]), Err(CliError::Help));
        assert_eq!(parse(&["-V"]), Err(CliError::Version));
    }
}
