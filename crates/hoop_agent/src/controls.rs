use anyhow::{anyhow, bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One line typed at the agent's console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Move the hoop to this sensor depth.
    HoopDepth(f32),
    Help,
}

pub const HELP: &str = "\
commands:
  depth <mm>    move the hoop to this distance from the sensor
  help";

impl Control {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
        match (verb, words.next(), words.next()) {
            ("depth", Some(arg), None) => {
                let depth = arg
                    .parse::<f32>()
                    .with_context(|| format!("'{arg}' is not a number"))?;
                Ok(Self::HoopDepth(depth))
            }
            ("help", None, _) => Ok(Self::Help),
            ("depth", _, _) => bail!("usage: depth <mm>"),
            _ => bail!("unknown command '{verb}'"),
        }
    }
}

/// Forwards console controls to the frame loop until stdin closes or the loop
/// goes away.
pub async fn read_controls(tx: mpsc::Sender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("stdin closed; console controls disabled");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Control::parse(&line) {
            Ok(Control::Help) => eprintln!("{HELP}"),
            Ok(control) => {
                if tx.send(control).await.is_err() {
                    return;
                }
            }
            Err(e) => eprintln!("error: {e:#}\n{HELP}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_depth_changes() {
        assert_eq!(
            Control::parse(" depth 1250.5 ").unwrap(),
            Control::HoopDepth(1250.5)
        );
        assert_eq!(Control::parse("depth -40").unwrap(), Control::HoopDepth(-40.0));
        assert_eq!(Control::parse("help").unwrap(), Control::Help);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Control::parse("").is_err());
        assert!(Control::parse("depth").is_err());
        assert!(Control::parse("depth far").is_err());
        assert!(Control::parse("depth 1 2").is_err());
        assert!(Control::parse("abs 1 2 3").is_err());
    }
}
