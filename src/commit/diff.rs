//! Changesets and diff statistics.

use std::fmt;

/// Status of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
}

impl FileStatus {
    /// Single-letter code as printed by `git diff --name-status`.
    pub fn code(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::TypeChanged => 'T',
        }
    }

    /// Parse a name-status code such as `M`, `A` or `R100`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'A' => Some(FileStatus::Added),
            'M' => Some(FileStatus::Modified),
            'D' => Some(FileStatus::Deleted),
            'R' => Some(FileStatus::Renamed),
            'C' => Some(FileStatus::Copied),
            'T' => Some(FileStatus::TypeChanged),
            _ => None,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
            FileStatus::Copied => write!(f, "Copied"),
            FileStatus::TypeChanged => write!(f, "TypeChanged"),
        }
    }
}

/// A file in the staged changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed or copied files.
    pub old_path: Option<String>,
}

impl ChangedFile {
    pub fn new(status: FileStatus, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status,
            old_path: None,
        }
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Ordered list of staged file changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub files: Vec<ChangedFile>,
}

impl ChangeSet {
    pub fn new(files: Vec<ChangedFile>) -> Self {
        Self { files }
    }

    /// Parse `git diff --name-status` output.
    ///
    /// Lines look like `M\tsrc/lib.rs` or `R087\told.rs\tnew.rs`. Unparseable
    /// lines are skipped.
    pub fn parse_name_status(text: &str) -> Self {
        let files = text
            .lines()
            .filter_map(|line| {
                let mut parts = line.split('\t');
                let status = FileStatus::from_code(parts.next()?.trim())?;
                let first = parts.next()?.trim();
                if first.is_empty() {
                    return None;
                }
                match (status, parts.next()) {
                    (FileStatus::Renamed | FileStatus::Copied, Some(new_path)) => Some(ChangedFile {
                        path: new_path.trim().to_string(),
                        status,
                        old_path: Some(first.to_string()),
                    }),
                    _ => Some(ChangedFile::new(status, first)),
                }
            })
            .collect();
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangedFile> {
        self.files.iter()
    }
}

impl fmt::Display for ChangeSet {
    /// One `<code> <path>` line per file, the format shown to the model.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match &file.old_path {
                Some(old) => write!(f, "{} {} -> {}", file.status.code(), old, file.path)?,
                None => write!(f, "{} {}", file.status.code(), file.path)?,
            }
        }
        Ok(())
    }
}

/// One classified line of unified diff text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    /// `+++` header opening a new file section.
    FileHeader(&'a str),
    /// Added line, without the leading `+`.
    Added(&'a str),
    /// Removed line, without the leading `-`.
    Removed(&'a str),
    /// Context, hunk headers, `---` headers and git metadata.
    Other,
}

/// Iterator over the classified lines of a unified diff.
///
/// Hunk line counts from `@@ -a,b +c,d @@` headers are tracked, so content
/// such as `-- comment` (rendered `--- comment`) inside a hunk is a change,
/// not a file header. Outside a hunk, `+`/`-` lines are still counted as
/// changes so that bare diff fragments work too.
pub struct DiffLines<'a> {
    lines: std::str::Lines<'a>,
    old_left: usize,
    new_left: usize,
}

impl<'a> DiffLines<'a> {
    pub fn new(diff: &'a str) -> Self {
        Self {
            lines: diff.lines(),
            old_left: 0,
            new_left: 0,
        }
    }

    fn in_hunk(&self) -> bool {
        self.old_left > 0 || self.new_left > 0
    }
}

impl<'a> Iterator for DiffLines<'a> {
    type Item = DiffLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;

        if line.starts_with("diff --git ") {
            self.old_left = 0;
            self.new_left = 0;
            return Some(DiffLine::Other);
        }

        if self.in_hunk() {
            return Some(match line.as_bytes().first() {
                Some(b'+') => {
                    self.new_left = self.new_left.saturating_sub(1);
                    DiffLine::Added(&line[1..])
                }
                Some(b'-') => {
                    self.old_left = self.old_left.saturating_sub(1);
                    DiffLine::Removed(&line[1..])
                }
                Some(b'\\') => DiffLine::Other,
                _ => {
                    self.old_left = self.old_left.saturating_sub(1);
                    self.new_left = self.new_left.saturating_sub(1);
                    DiffLine::Other
                }
            });
        }

        if let Some(rest) = line.strip_prefix("+++ ") {
            return Some(DiffLine::FileHeader(rest));
        }
        if line.starts_with("--- ") {
            return Some(DiffLine::Other);
        }
        if line.starts_with("@@") {
            if let Some((old, new)) = parse_hunk_header(line) {
                self.old_left = old;
                self.new_left = new;
            }
            return Some(DiffLine::Other);
        }
        Some(match line.as_bytes().first() {
            Some(b'+') => DiffLine::Added(&line[1..]),
            Some(b'-') => DiffLine::Removed(&line[1..]),
            _ => DiffLine::Other,
        })
    }
}

/// Old and new line counts of a `@@ -a,b +c,d @@` hunk header.
fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let mut ranges = line.trim_start_matches('@').split_whitespace();
    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;
    let count = |range: &str| match range.split_once(',') {
        Some((_, n)) => n.parse().ok(),
        None => Some(1),
    };
    Some((count(old)?, count(new)?))
}

/// Aggregate line statistics of a unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStats {
    /// Count files and changed lines in unified diff text.
    pub fn from_diff(diff: &str) -> Self {
        let mut stats = DiffStats::default();
        for line in DiffLines::new(diff) {
            match line {
                DiffLine::FileHeader(_) => stats.files_changed += 1,
                DiffLine::Added(_) => stats.insertions += 1,
                DiffLine::Removed(_) => stats.deletions += 1,
                DiffLine::Other => {}
            }
        }
        stats
    }

    pub fn changed_lines(&self) -> usize {
        self.insertions + self.deletions
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = if self.files_changed == 1 { "file" } else { "files" };
        write!(
            f,
            "{} {} changed, {} insertions(+), {} deletions(-)",
            self.files_changed, files, self.insertions, self.deletions
        )
    }
}
