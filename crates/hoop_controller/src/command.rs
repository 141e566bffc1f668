use anyhow::{anyhow, bail, Context};
use hoop_core::Placement;

/// One line typed at the controller prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Place(Placement),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  abs <pageX> <pageY> <scale>          place the hoop in window pixels
  rel <relX> <relY> <scale> [depth]    place the hoop in window fractions
  help
  quit";

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let args = words
            .map(|w| w.parse::<f32>().with_context(|| format!("'{w}' is not a number")))
            .collect::<anyhow::Result<Vec<f32>>>()?;

        match (verb, args.as_slice()) {
            ("abs", &[page_x, page_y, scale]) => Ok(Self::Place(Placement::Absolute {
                page_x,
                page_y,
                scale,
            })),
            ("rel", &[rel_x, rel_y, scale]) => Ok(Self::Place(Placement::Relative {
                rel_x,
                rel_y,
                scale,
                depth: None,
            })),
            ("rel", &[rel_x, rel_y, scale, depth]) => Ok(Self::Place(Placement::Relative {
                rel_x,
                rel_y,
                scale,
                depth: Some(depth),
            })),
            ("help", []) => Ok(Self::Help),
            ("quit" | "exit", []) => Ok(Self::Quit),
            ("abs" | "rel", _) => bail!("wrong number of arguments for '{verb}'"),
            _ => bail!("unknown command '{verb}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_placements() {
        assert_eq!(
            Command::parse("abs 320 240 1.5").unwrap(),
            Command::Place(Placement::Absolute {
                page_x: 320.0,
                page_y: 240.0,
                scale: 1.5
            })
        );
        assert_eq!(
            Command::parse("  rel 0.5 0.5 1 900 ").unwrap(),
            Command::Place(Placement::Relative {
                rel_x: 0.5,
                rel_y: 0.5,
                scale: 1.0,
                depth: Some(900.0)
            })
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("abs 1 2").is_err());
        assert!(Command::parse("rel a b c").is_err());
        assert!(Command::parse("jump").is_err());
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
    }
}
