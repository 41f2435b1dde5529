//! CLI surface: `-c PATH` loads and runs a config, `-o PATH N`
//! writes a skeleton config for N stations and exits, `-h`/`-V` are
//! handled by `structopt` itself. Anything else is `structopt`'s usual
//! usage-error path, which already exits nonzero.

use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "wmediumd",
    about = "Simulates a shared wireless medium for virtual radio interfaces"
)]
pub struct Opt {
    /// Load a configuration file and run the medium simulator.
    #[structopt(short = "c", long = "config")]
    pub config: Option<PathBuf>,

    /// Write a skeleton configuration for N stations to PATH and exit.
    #[structopt(short = "o", long = "output", number_of_values = 2, value_names = &["PATH", "N"])]
    pub output: Option<Vec<String>>,
}

pub enum Command {
    Run { config: PathBuf },
    WriteSkeleton { path: PathBuf, stations: u8 },
}

impl Opt {
    /// Resolves the parsed flags into one concrete command, or an error
    /// message for the usage-error path (any argv that isn't `-c` or `-o`
    /// on their own).
    pub fn command(self) -> Result<Command, String> {
        match (self.config, self.output) {
            (Some(config), None) => Ok(Command::Run { config }),
            (None, Some(values)) => {
                let [path, n] = <[String; 2]>::try_from(values)
                    .map_err(|_| "expected exactly PATH and N for -o".to_string())?;
                let stations: u8 = n
                    .parse()
                    .map_err(|_| format!("'{n}' is not a valid station count"))?;
                if stations < 2 {
                    return Err("station count for -o must be at least 2".to_string());
                }
                Ok(Command::WriteSkeleton {
                    path: PathBuf::from(path),
                    stations,
                })
            }
            (Some(_), Some(_)) => Err("-c and -o are mutually exclusive".to_string()),
            (None, None) => Err("one of -c or -o is required".to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_only_resolves_to_run() {
        let opt = Opt {
            config: Some(PathBuf::from("wmediumd.toml")),
            output: None,
        };
        assert!(matches!(opt.command(), Ok(Command::Run { .. })));
    }

    #[test]
    fn output_resolves_to_skeleton_with_parsed_count() {
        let opt = Opt {
            config: None,
            output: Some(vec!["skeleton.toml".to_string(), "4".to_string()]),
        };
        match opt.command().unwrap() {
            Command::WriteSkeleton { path, stations } => {
                assert_eq!(path, PathBuf::from("skeleton.toml"));
                assert_eq!(stations, 4);
            }
            _ => panic!("expected WriteSkeleton"),
        }
    }

    #[test]
    fn neither_flag_is_a_usage_error() {
        let opt = Opt { config: None, output: None };
        assert!(opt.command().is_err());
    }

    #[test]
    fn both_flags_is_a_usage_error() {
        let opt = Opt {
            config: Some(PathBuf::from("a.toml")),
            output: Some(vec!["b.toml".to_string(), "2".to_string()]),
        };
        assert!(opt.command().is_err());
    }

    #[test]
    fn station_count_below_two_is_rejected() {
        let opt = Opt {
            config: None,
            output: Some(vec!["skeleton.toml".to_string(), "1".to_string()]),
        };
        assert!(opt.command().is_err());
    }
}
