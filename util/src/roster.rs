//! Student roster loading.
//!
//! The roster is a CSV file with a header row. Headers are trimmed and lowercased.
//! `username` is required; `uid` fills [`Student::uid`]; every other column becomes a
//! placeholder variable (`ip` is reachable as `{IP}`).
//!
//! Empty cells are left unset, so a student missing a value the answer key needs is
//! still graded and reported with a missing-variable annotation. Rows without a
//! username, and repeated usernames, are skipped with a warning.

use marker::types::Student;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot open roster '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("malformed roster: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster header has no 'username' column")]
    MissingUsernameColumn,
}

/// A parsed roster: its header columns and the students in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// Header names, trimmed and lowercased.
    pub columns: Vec<String>,
    pub students: Vec<Student>,
}

impl Roster {
    /// Placeholders that no roster column can supply, in the order given.
    ///
    /// `USERNAME` is always supplied. Every other placeholder needs a column of the
    /// same name, compared case-insensitively.
    pub fn unsupplied<I, S>(&self, placeholders: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        placeholders
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| {
                p != "USERNAME" && !self.columns.iter().any(|c| c.eq_ignore_ascii_case(p))
            })
            .collect()
    }
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster, RosterError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RosterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let roster = parse_roster(file)?;
    info!(count = roster.students.len(), path = %path.display(), "roster loaded");
    Ok(roster)
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Roster, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let username_col = headers
        .iter()
        .position(|h| h == "username")
        .ok_or(RosterError::MissingUsernameColumn)?;

    let mut seen = HashSet::new();
    let mut students = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // header is row 1
        let row = index + 2;

        let username = record.get(username_col).unwrap_or_default();
        if username.is_empty() {
            warn!(row, "roster row has no username, skipping");
            continue;
        }
        if !seen.insert(username.to_string()) {
            warn!(row, username, "duplicate username in roster, skipping");
            continue;
        }

        let mut student = Student::new(username, None);
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.is_empty() || value.is_empty() || header == "username" {
                continue;
            }
            if header == "uid" {
                student.uid = Some(value.to_string());
            } else {
                student = student.with_variable(header.as_str(), value);
            }
        }
        students.push(student);
    }

    Ok(Roster {
        columns: headers,
        students,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_uid_and_extra_columns() {
        let csv = "Username, UID ,IP\njdoe,7,10.0.0.7\nasmith,8,10.0.0.8\n";
        let roster = parse_roster(csv.as_bytes()).unwrap();
        assert_eq!(roster.columns, ["username", "uid", "ip"]);
        let students = roster.students;
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].username, "jdoe");
        assert_eq!(students[0].uid.as_deref(), Some("7"));
        assert_eq!(students[1].lookup("IP"), Some("10.0.0.8"));
    }

    #[test]
    fn test_missing_username_column() {
        let err = parse_roster("name,uid\njdoe,7\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RosterError::MissingUsernameColumn));
    }

    #[test]
    fn test_empty_cells_stay_unset() {
        let students = parse_roster("username,uid,ip\njdoe,,\n".as_bytes())
            .unwrap()
            .students;
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].uid, None);
        assert_eq!(students[0].lookup("IP"), None);
    }

    #[test]
    fn test_rows_without_username_and_duplicates_are_skipped() {
        let csv = "username,uid\n,1\njdoe,2\njdoe,3\nshort\n";
        let students = parse_roster(csv.as_bytes()).unwrap().students;
        let names: Vec<_> = students.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, ["jdoe", "short"]);
        assert_eq!(students[0].uid.as_deref(), Some("2"));
        assert_eq!(students[1].uid, None);
    }

    #[test]
    fn test_keeps_file_order() {
        let students = parse_roster("username\nzed\namy\nbob\n".as_bytes())
            .unwrap()
            .students;
        let names: Vec<_> = students.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, ["zed", "amy", "bob"]);
    }

    #[test]
    fn test_unsupplied_placeholders() {
        let roster = parse_roster("Username,UID\njdoe,7\n".as_bytes()).unwrap();
        let missing = roster.unsupplied(["IP", "UID", "USERNAME", "VLAN"]);
        assert_eq!(missing, ["IP", "VLAN"]);
        // an empty cell still counts as a column
        let roster = parse_roster("username,ip\njdoe,\n".as_bytes()).unwrap();
        assert!(roster.unsupplied(["IP"]).is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_roster("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, RosterError::Open { .. }));
    }
}
