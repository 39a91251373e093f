use crate::error::{EditError, Result};
use crate::formats::schematic::SCHEMATIC_EXTENSION;
use std::path::{Path, PathBuf};

const SIZE_UNITS: [&str; 6] = ["B", "K", "M", "G", "T", "P"];

/// A schematic file found in a schematic directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchematicEntry {
    /// File name with the extension stripped.
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SchematicEntry {
    pub fn human_size(&self) -> String {
        human_size(self.size_bytes)
    }
}

/// Lists every `*.schematic` file in `dir`, sorted by name.
pub fn list_schematics(dir: &Path) -> Result<Vec<SchematicEntry>> {
    if !dir.is_dir() {
        return Err(EditError::invalid(format!(
            "Directory {} does not exist.",
            dir.display()
        )));
    }

    let suffix = format!(".{}", SCHEMATIC_EXTENSION);
    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir)? {
        let item = item?;
        let metadata = item.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let file_name = item.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(name) = file_name.strip_suffix(&suffix) {
            if name.is_empty() {
                continue;
            }
            entries.push(SchematicEntry {
                name: name.to_string(),
                path: item.path(),
                size_bytes: metadata.len(),
            });
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Formats a byte count the way the schematic list shows it: the unit is
/// picked from the number of decimal digits, the value is scaled by powers of
/// 1024 and printed with two decimals.
pub fn human_size(bytes: u64) -> String {
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{:.2}{}", value, SIZE_UNITS[factor])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0.00B");
        assert_eq!(human_size(999), "999.00B");
        assert_eq!(human_size(1500), "1.46K");
        assert_eq!(human_size(2 * 1024 * 1024), "2.00M");
    }

    #[test]
    fn test_lists_only_schematics() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tower.schematic"), vec![0u8; 1500]).unwrap();
        std::fs::write(dir.path().join("arch.schematic"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested.schematic")).unwrap();

        let entries = list_schematics(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["arch", "tower"]);
        assert_eq!(entries[1].human_size(), "1.46K");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_schematics(&dir.path().join("absent")),
            Err(EditError::InvalidArgument(_))
        ));
    }
}
