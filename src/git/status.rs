use serde::Serialize;

/// One entry of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// Two-letter index/worktree status code, e.g. `" M"`, `"A "`, `"??"`.
    pub code: String,
    pub path: String,
}

impl FileStatus {
    pub fn is_staged(&self) -> bool {
        matches!(self.code.chars().next(), Some(c) if c != ' ' && c != '?')
    }

    /// Worktree changes to a tracked file, which `git diff -- <path>` shows.
    pub fn is_unstaged(&self) -> bool {
        !self.is_untracked() && matches!(self.code.chars().nth(1), Some(c) if c != ' ')
    }

    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }
}

pub fn parse_porcelain(output: &str) -> Vec<FileStatus> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .filter_map(|line| {
            let code = line.get(..2)?.to_string();
            let raw_path = line.get(3..)?;
            // Renames are reported as "old -> new".
            let path = raw_path
                .rsplit_once(" -> ")
                .map(|(_, new)| new)
                .unwrap_or(raw_path)
                .trim_matches('"')
                .to_string();
            Some(FileStatus { code, path })
        })
        .collect()
}
