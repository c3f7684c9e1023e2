//! Command-line arguments for the `blockfall` driver binary.

use anyhow::{anyhow, Result};

/// Where commands come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Random commands from a seeded generator, no terminal needed
    Autoplay,
    /// Keyboard events from the controlling terminal
    Keys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub mode: InputMode,
    /// Stop autoplay after this many pieces have spawned
    pub max_pieces: Option<u64>,
    /// Milliseconds between autoplay commands
    pub autoplay_ms: u64,
    /// Print the final snapshot as JSON
    pub json: bool,
    /// TOML config file, overriding `BLOCKFALL_CONFIG`
    pub config_path: Option<String>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            mode: InputMode::Autoplay,
            max_pieces: None,
            autoplay_ms: 120,
            json: false,
            config_path: None,
        }
    }
}

pub fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut out = RunArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "autoplay" => out.mode = InputMode::Autoplay,
            "keys" => out.mode = InputMode::Keys,
            "--json" => out.json = true,
            "--max-pieces" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --max-pieces"))?;
                let n = v
                    .parse::<u64>()
                    .map_err(|_| anyhow!("invalid --max-pieces value: {}", v))?;
                out.max_pieces = Some(n);
            }
            "--autoplay-ms" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --autoplay-ms"))?;
                let ms = v
                    .parse::<u64>()
                    .map_err(|_| anyhow!("invalid --autoplay-ms value: {}", v))?;
                if ms == 0 {
                    return Err(anyhow!("--autoplay-ms must be greater than zero"));
                }
                out.autoplay_ms = ms;
            }
            "--config" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                out.config_path = Some(v.clone());
            }
            other => {
                return Err(anyhow!("unknown argument: {}", other));
            }
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse_run_args(&[]).unwrap(), RunArgs::default());
    }

    #[test]
    fn test_keys_mode_with_config() {
        let parsed = parse_run_args(&args(&["keys", "--config", "game.toml"])).unwrap();
        assert_eq!(parsed.mode, InputMode::Keys);
        assert_eq!(parsed.config_path.as_deref(), Some("game.toml"));
    }

    #[test]
    fn test_autoplay_options() {
        let parsed =
            parse_run_args(&args(&["--max-pieces", "50", "--autoplay-ms", "10", "--json"])).unwrap();
        assert_eq!(parsed.max_pieces, Some(50));
        assert_eq!(parsed.autoplay_ms, 10);
        assert!(parsed.json);
    }

    #[test]
    fn test_errors() {
        assert!(parse_run_args(&args(&["--max-pieces"])).is_err());
        assert!(parse_run_args(&args(&["--max-pieces", "x"])).is_err());
        assert!(parse_run_args(&args(&["--autoplay-ms", "0"])).is_err());
        assert!(parse_run_args(&args(&["--bogus"])).is_err());
    }
}
