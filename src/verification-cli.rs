//! A simple CLI tool for checking an election's audit dump offline.
//! This uses the server's own verification code, and so is by definition
//! compatible with the output of `GET /elections/<id>/audit`.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use election_ledger::model::audit::{AuditDump, VerificationError};

const PROGRAM_NAME: &str = "verify-ledger";

const ABOUT_TEXT: &str = "Verify the integrity of an election's audit log.

EXIT CODES:
     0: Verification succeeded.
   255: Ran successfully, but verification failed.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON audit dump of one election,\n\
as returned by `GET /elections/<election_id>/audit`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(DUMP_PATH)
            .help(DUMP_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// Verification failed due to the contained reason.
    Verification(VerificationError),
}

/// One line of the verified results.
#[derive(Debug, Eq, PartialEq)]
struct FriendlyResults {
    candidate_name: String,
    votes: u64,
    winner: bool,
}

impl Display for FriendlyResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} vote{}{}",
            self.candidate_name,
            self.votes,
            if self.votes != 1 { "s" } else { "" },
            if self.winner { " (winner)" } else { "" }
        )
    }
}

/// Run verification.
fn verify(path: &str) -> Result<Vec<FriendlyResults>, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let dump: AuditDump =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // Run verification.
    dump.verify().map_err(Error::Verification)?;

    // Winners are only known once tallied.
    let winners = dump
        .election
        .tally
        .as_ref()
        .map(|tally| tally.winners.clone())
        .unwrap_or_default();

    // Most votes first, then ballot order.
    let mut results: Vec<_> = dump
        .election
        .candidates
        .into_iter()
        .map(|candidate| FriendlyResults {
            winner: winners.contains(&candidate.index),
            candidate_name: candidate.name,
            votes: candidate.vote_count,
        })
        .collect();
    results.sort_by(|a, b| b.votes.cmp(&a.votes));

    Ok(results)
}

/// Run verification, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(DUMP_PATH).unwrap(); // Required argument is guaranteed to be present.
    match verify(path) {
        Ok(friendly_results) => {
            println!("Verification succeeded.");
            for result in friendly_results {
                println!("{result}");
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {msg}");
            1
        }
        Err(Error::Verification(err)) => {
            println!("Verification failed: {err}.");
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use election_ledger::model::{
        audit::AuditEvent,
        clock::ManualClock,
        election::{ElectionSpec, VotingWindow},
        gate::AdminListGate,
        identity::Identity,
        ledger::Ledger,
    };

    /// Run a small election to completion and return its dump.
    fn finished_dump() -> AuditDump {
        let t0 = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(t0 - Duration::hours(1));
        let ledger = Ledger::new(AdminListGate::unrestricted(), Arc::new(clock.clone()));
        let creator = Identity::new("0xc0ffee").unwrap();

        let spec = ElectionSpec {
            title: "Club Captain".to_string(),
            description: String::new(),
            candidates: vec!["Chris Riches".to_string(), "Parry Hotter".to_string()],
            voting_window: VotingWindow::new(t0, t0 + Duration::hours(8)),
            electorate: None,
        };
        let id = ledger.create_election(creator.clone(), spec).unwrap();

        clock.set(t0);
        for (voter, candidate) in [("0x1", 1), ("0x2", 0), ("0x3", 1)] {
            ledger
                .cast_vote(id, Identity::new(voter).unwrap(), candidate)
                .unwrap();
        }
        clock.advance(Duration::hours(8));
        ledger.finalize_tally(id, &creator).unwrap();

        ledger.audit_dump(id).unwrap()
    }

    /// Write some dump contents to a fresh file.
    fn write_dump(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "verify-ledger-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn dump_file(name: &str, dump: &AuditDump) -> PathBuf {
        write_dump(name, &serde_json::to_string(dump).unwrap())
    }

    #[test]
    fn verification() {
        // This test actually enters ledger code, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(["election_ledger"], None, None);

        let path = dump_file("valid", &finished_dump());
        let expected_results = vec![
            FriendlyResults {
                candidate_name: "Parry Hotter".to_string(),
                votes: 2,
                winner: true,
            },
            FriendlyResults {
                candidate_name: "Chris Riches".to_string(),
                votes: 1,
                winner: false,
            },
        ];
        assert_eq!(verify(path.to_str().unwrap()), Ok(expected_results));

        let mut forged = finished_dump();
        forged.entries[3].event = AuditEvent::VoteCast {
            voter: Identity::new("0x2").unwrap(),
            candidate: 1,
        };
        let path = dump_file("forged", &forged);
        assert_eq!(
            verify(path.to_str().unwrap()),
            Err(Error::Verification(VerificationError::Chain { seq: 3 }))
        );

        let mut renamed = finished_dump();
        renamed.election.candidates[0].name = "Parry Hotter".to_string();
        renamed.election.candidates[1].name = "Chris Riches".to_string();
        let path = dump_file("renamed", &renamed);
        assert_eq!(
            verify(path.to_str().unwrap()),
            Err(Error::Verification(VerificationError::Description {
                field: "candidates"
            }))
        );

        let mut inflated = finished_dump();
        inflated.election.candidates[0].vote_count += 1;
        let path = dump_file("inflated", &inflated);
        assert!(matches!(
            verify(path.to_str().unwrap()),
            Err(Error::Verification(VerificationError::Counts { .. }))
        ));
    }

    #[test]
    fn correct_cli_usage() {
        let valid = dump_file("cli-valid", &finished_dump());
        let command_line = [PROGRAM_NAME, valid.to_str().unwrap()];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let mut invalid = finished_dump();
        invalid.entries.remove(2);
        let invalid = dump_file("cli-invalid", &invalid);
        let command_line = [PROGRAM_NAME, invalid.to_str().unwrap()];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 255);

        let malformed = write_dump("cli-malformed", "{\"election\": [");
        let command_line = [PROGRAM_NAME, malformed.to_str().unwrap()];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [PROGRAM_NAME, "not a real file"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);
    }

    #[test]
    fn bad_cli_usage() {
        // Something very wrong.
        let command_line = [PROGRAM_NAME, "this", "invocation", "is", "incorrect"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // No options at all.
        let command_line = [PROGRAM_NAME];
        cli().try_get_matches_from(command_line).unwrap_err();
    }
}
