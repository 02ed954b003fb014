use std::path::{Path, PathBuf};

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("socrates")
}

/// Response journal for one video, one JSON object per line.
pub fn get_journal_path(root: &Path, youtube_id: &str) -> PathBuf {
    let safe: String = youtube_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    root.join("journals").join(format!("{safe}.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_names_are_filesystem_safe() {
        let path = get_journal_path(Path::new("/data"), "ab/c?d");
        assert_eq!(path, PathBuf::from("/data/journals/ab_c_d.jsonl"));
    }
}
