//! Command grammar
//!
//! Every command starts with a mention, then words separated by one or more
//! spaces. Patterns are tried in a fixed order and the first match wins;
//! text matching none of them is [`Command::Help`].

use once_cell::sync::Lazy;
use regex::Regex;
use relman_core::{AppId, Command, InputError};
use relman_track::{TrackName, VersionCode};

macro_rules! grammar {
    ($name:ident, $pattern:literal) => {
        static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($pattern).expect(concat!(stringify!($name), " pattern is valid")));
    };
}

grammar!(DEPLOY, r"^<[^>]+> +deploy +([^ ]+) +([^ ]+)");
grammar!(HALT, r"^<[^>]+> +halt +([^ ]+) +([^ ]+)");
grammar!(PING, r"^<[^>]+> +ping");
grammar!(PROMOTE, r"^<[^>]+> +promote +([^ ]+) +([^ ]+) +to +(.*)");
grammar!(ROLLOUT, r"^<[^>]+> +rollout +([^ ]+) +([^ ]+) +to +(.*)%");
grammar!(RELEASE_NOTES, r"^<[^>]+> +show +release +notes +for +([^ ]+) +(.+)");
grammar!(TRACKS, r"^<[^>]+> +show +tracks +for +(.+)");

/// Parse the text of an addressed message into a command
///
/// # Errors
/// - `InputError` when a command is recognised but an argument is malformed
pub fn parse_command(text: &str) -> Result<Command, InputError> {
    if let Some(caps) = DEPLOY.captures(text) {
        return Ok(Command::Deploy {
            artifact_id: caps[1].to_string(),
            version: caps[2].to_string(),
        });
    }

    if let Some(caps) = HALT.captures(text) {
        return Ok(Command::Halt {
            app_id: app_id(&caps[1])?,
            version_code: version_code(&caps[2])?,
        });
    }

    if PING.is_match(text) {
        return Ok(Command::Ping);
    }

    if let Some(caps) = PROMOTE.captures(text) {
        return Ok(Command::Promote {
            app_id: app_id(&caps[1])?,
            version_code: version_code(&caps[2])?,
            track: track_name(&caps[3])?,
        });
    }

    if let Some(caps) = ROLLOUT.captures(text) {
        return Ok(Command::Rollout {
            app_id: app_id(&caps[1])?,
            version_code: version_code(&caps[2])?,
            percentage: percentage(&caps[3])?,
        });
    }

    if let Some(caps) = RELEASE_NOTES.captures(text) {
        return Ok(Command::ShowReleaseNotes {
            app_id: app_id(&caps[1])?,
            version_code: version_code(&caps[2])?,
        });
    }

    if let Some(caps) = TRACKS.captures(text) {
        return Ok(Command::ShowTracks {
            app_id: app_id(&caps[1])?,
        });
    }

    Ok(Command::Help)
}

fn app_id(raw: &str) -> Result<AppId, InputError> {
    AppId::new(raw.trim())
}

fn version_code(raw: &str) -> Result<VersionCode, InputError> {
    raw.parse::<VersionCode>().map_err(InputError::from)
}

fn track_name(raw: &str) -> Result<TrackName, InputError> {
    TrackName::new(raw.trim()).map_err(|_| InputError::TrackName(raw.to_string()))
}

fn percentage(raw: &str) -> Result<u32, InputError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| InputError::Percentage(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vc(value: i64) -> VersionCode {
        VersionCode::new(value).unwrap()
    }

    fn app(name: &str) -> AppId {
        AppId::new(name).unwrap()
    }

    #[test]
    fn every_pattern_compiles() {
        for pattern in [
            &DEPLOY,
            &HALT,
            &PING,
            &PROMOTE,
            &ROLLOUT,
            &RELEASE_NOTES,
            &TRACKS,
        ] {
            assert!(Lazy::force(pattern).as_str().starts_with("^<[^>]+> +"));
        }
    }

    #[test]
    fn deploy() {
        assert_eq!(
            parse_command("<@U1> deploy wallet 1.4.0").unwrap(),
            Command::Deploy {
                artifact_id: "wallet".into(),
                version: "1.4.0".into(),
            }
        );
    }

    #[test]
    fn halt_tolerates_extra_spaces() {
        assert_eq!(
            parse_command("<@U1>   halt   wallet    42").unwrap(),
            Command::Halt {
                app_id: app("wallet"),
                version_code: vc(42),
            }
        );
    }

    #[test]
    fn promote() {
        assert_eq!(
            parse_command("<@U1> promote wallet 42 to production").unwrap(),
            Command::Promote {
                app_id: app("wallet"),
                version_code: vc(42),
                track: TrackName::production(),
            }
        );
    }

    #[test]
    fn rollout() {
        assert_eq!(
            parse_command("<@U1> rollout wallet 42 to 25%").unwrap(),
            Command::Rollout {
                app_id: app("wallet"),
                version_code: vc(42),
                percentage: 25,
            }
        );
    }

    #[test]
    fn show_commands() {
        assert_eq!(
            parse_command("<@U1> show tracks for wallet").unwrap(),
            Command::ShowTracks { app_id: app("wallet") }
        );
        assert_eq!(
            parse_command("<@U1> show release notes for wallet 42").unwrap(),
            Command::ShowReleaseNotes {
                app_id: app("wallet"),
                version_code: vc(42),
            }
        );
    }

    #[test]
    fn ping_and_help() {
        assert_eq!(parse_command("<@U1> ping").unwrap(), Command::Ping);
        assert_eq!(parse_command("<@U1> make coffee").unwrap(), Command::Help);
        assert_eq!(parse_command("<@U1> rollout wallet 42 to 25").unwrap(), Command::Help);
    }

    #[test]
    fn bad_version_code() {
        assert_eq!(
            parse_command("<@U1> halt wallet latest").unwrap_err(),
            InputError::VersionCode("latest".into())
        );
        assert_eq!(
            parse_command("<@U1> promote wallet 0 to beta").unwrap_err(),
            InputError::VersionCode("0".into())
        );
    }

    #[test]
    fn bad_percentage() {
        assert_eq!(
            parse_command("<@U1> rollout wallet 42 to half%").unwrap_err(),
            InputError::Percentage("half".into())
        );
        assert_eq!(
            parse_command("<@U1> rollout wallet 42 to 101%").unwrap_err(),
            InputError::Percentage("101".into())
        );
    }

    #[test]
    fn blank_track_rejected() {
        assert!(matches!(
            parse_command("<@U1> promote wallet 42 to "),
            Err(InputError::TrackName(_))
        ));
    }
}
