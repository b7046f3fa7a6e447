//! Short-format status parsing
//!
//! The short format prints seven single-character columns, a separator, then
//! the path. When changelists are in use the client appends one section per
//! changelist introduced by a `--- Changelist 'name':` marker; entries after
//! a marker belong to that changelist until the next marker or end of input.

use std::path::PathBuf;

use crate::entry::{FileStatusEntry, LockDisposition, StatusKind};

/// Offset of the path in a short-format line (seven status columns plus one
/// separator column).
const PATH_COLUMN: usize = 8;

const CHANGELIST_MARKER: &str = "--- Changelist '";
const AGAINST_REVISION: &str = "Status against revision:";

/// Result of one parse call: the entries that could be classified plus a
/// warning per line that could not.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub entries: Vec<FileStatusEntry>,
    pub warnings: Vec<String>,
}

/// Parse `svn status` output.
///
/// Pure and infallible: malformed lines are recorded as warnings and
/// skipped. Entry order follows the input but carries no meaning beyond
/// determinism within a single call.
pub fn parse(raw: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut changelist: Option<String> = None;

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(name) = changelist_name(line) {
            changelist = Some(name);
            continue;
        }

        // Footer printed by `status --show-updates`; not an entry.
        if line.starts_with(AGAINST_REVISION) {
            continue;
        }

        match parse_entry(line) {
            Some(mut entry) => {
                entry.changelist = changelist.clone();
                outcome.entries.push(entry);
            }
            None => outcome.warnings.push(format!("unrecognized status line: {line:?}")),
        }
    }

    outcome
}

/// Output of `svn status --show-updates`: paths the repository has newer
/// revisions of, plus the revision the comparison ran against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStatus {
    pub incoming: Vec<PathBuf>,
    pub against_revision: Option<u64>,
}

/// Parse `svn status --show-updates` output, keeping only the out-of-date
/// marker column and the trailing revision footer.
pub fn parse_remote(raw: &str) -> RemoteStatus {
    let mut status = RemoteStatus::default();

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(AGAINST_REVISION) {
            status.against_revision = rest.trim().parse().ok();
            continue;
        }

        // The out-of-date marker sits in the ninth column, after the seven
        // status columns and their separator.
        let bytes = line.as_bytes();
        if bytes.len() <= PATH_COLUMN || bytes[PATH_COLUMN] != b'*' {
            continue;
        }

        if let Some(path) = remote_entry_path(&line[PATH_COLUMN + 1..]) {
            status.incoming.push(PathBuf::from(path));
        }
    }

    status
}

/// Strip the working-revision column that `--show-updates` inserts before
/// the path.
fn remote_entry_path(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    match rest.find(char::is_whitespace) {
        Some(split) if rest[..split].chars().all(|c| c.is_ascii_digit()) => {
            Some(rest[split..].trim())
        }
        _ => Some(rest.trim_end()),
    }
}

fn changelist_name(line: &str) -> Option<String> {
    let rest = line.strip_prefix(CHANGELIST_MARKER)?;
    let end = rest.rfind("':")?;
    Some(rest[..end].to_string())
}

fn parse_entry(line: &str) -> Option<FileStatusEntry> {
    let bytes = line.as_bytes();
    if bytes.len() <= PATH_COLUMN || !line.is_char_boundary(PATH_COLUMN) {
        return None;
    }

    let status = StatusKind::from_char(bytes[0] as char)?;
    let props = match bytes[1] as char {
        ' ' => StatusKind::Normal,
        'M' => StatusKind::Modified,
        'C' => StatusKind::Conflicted,
        _ => return None,
    };
    let copied = bytes[3] == b'+';
    let lock = LockDisposition::from_char(bytes[5] as char);

    let path = line[PATH_COLUMN..].trim_end();
    if path.is_empty() {
        return None;
    }

    Some(FileStatusEntry {
        path: PathBuf::from(path),
        status,
        props,
        lock,
        copied,
        changelist: None,
        is_directory: false,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_basic_statuses() {
        let raw = "M       src/main.c\n\
                   A       src/new.c\n\
                   D       src/old.c\n\
                   ?       notes.txt\n\
                   !       gone.c\n";
        let outcome = parse(raw);

        assert!(outcome.warnings.is_empty());
        let kinds: Vec<_> = outcome.entries.iter().map(|e| (e.path.clone(), e.status)).collect();
        assert_eq!(
            kinds,
            vec![
                (PathBuf::from("src/main.c"), StatusKind::Modified),
                (PathBuf::from("src/new.c"), StatusKind::Added),
                (PathBuf::from("src/old.c"), StatusKind::Deleted),
                (PathBuf::from("notes.txt"), StatusKind::Unversioned),
                (PathBuf::from("gone.c"), StatusKind::Missing),
            ]
        );
    }

    #[rstest]
    #[case(' ', StatusKind::Normal)]
    #[case('A', StatusKind::Added)]
    #[case('C', StatusKind::Conflicted)]
    #[case('D', StatusKind::Deleted)]
    #[case('I', StatusKind::Ignored)]
    #[case('!', StatusKind::Missing)]
    #[case('M', StatusKind::Modified)]
    #[case('~', StatusKind::Obstructed)]
    #[case('R', StatusKind::Replaced)]
    #[case('X', StatusKind::External)]
    #[case('?', StatusKind::Unversioned)]
    fn content_column_alphabet(#[case] c: char, #[case] expected: StatusKind) {
        assert_eq!(StatusKind::from_char(c), Some(expected));
    }

    #[test]
    fn separates_content_and_property_columns() {
        let outcome = parse(" M      props-only.txt\nMM      both.txt\n");
        assert_eq!(outcome.entries[0].status, StatusKind::Normal);
        assert_eq!(outcome.entries[0].props, StatusKind::Modified);
        assert_eq!(outcome.entries[1].status, StatusKind::Modified);
        assert_eq!(outcome.entries[1].props, StatusKind::Modified);
    }

    #[test]
    fn changelist_marker_reassigns_until_next_marker() {
        let raw = "M       plain.c\n\
                   \n\
                   --- Changelist 'ui fixes':\n\
                   M       panel.c\n\
                   A       icon.svg\n\
                   --- Changelist 'backend':\n\
                   M       server.c\n";
        let outcome = parse(raw);

        let lists: Vec<_> = outcome
            .entries
            .iter()
            .map(|e| e.changelist.as_deref())
            .collect();
        assert_eq!(lists, vec![None, Some("ui fixes"), Some("ui fixes"), Some("backend")]);
    }

    #[test]
    fn malformed_lines_become_warnings_not_errors() {
        let outcome = parse("M       good.c\ngarbage\nZ       bad-column.c\n");
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn lock_and_history_columns() {
        let raw = concat!(
            "A  +    copied.c\n",
            "M    K  held.bin\n",
            "     O  other.bin\n",
        );
        let outcome = parse(raw);

        assert!(outcome.entries[0].copied);
        assert_eq!(outcome.entries[1].lock, Some(LockDisposition::Held));
        assert_eq!(outcome.entries[2].status, StatusKind::Normal);
        assert_eq!(outcome.entries[2].lock, Some(LockDisposition::OtherUser));
    }

    #[test]
    fn paths_may_contain_spaces() {
        let outcome = parse("M       dir with space/my file.txt\n");
        assert_eq!(
            outcome.entries[0].path,
            PathBuf::from("dir with space/my file.txt")
        );
    }

    #[test]
    fn remote_status_collects_out_of_date_paths() {
        let raw = concat!(
            "M       *       42   README.md\n",
            "        *       42   docs/guide.md\n",
            "M               42   local-only.c\n",
            "Status against revision:     45\n",
        );
        let status = parse_remote(raw);

        assert_eq!(
            status.incoming,
            vec![PathBuf::from("README.md"), PathBuf::from("docs/guide.md")]
        );
        assert_eq!(status.against_revision, Some(45));
    }

    #[test]
    fn remote_footer_is_not_an_entry_in_plain_parse() {
        let outcome = parse("Status against revision:     45\n");
        assert!(outcome.entries.is_empty());
        assert!(outcome.warnings.is_empty());
    }
}
