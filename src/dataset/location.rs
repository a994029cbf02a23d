use std::collections::BTreeSet;

use crate::error::IngestError;
use crate::file::FileRecord;

/// Resolves the single storage location shared by all files.
///
/// An explicit target wins and is written into every file. Otherwise the
/// distinct source folders already set on the files must be exactly one.
pub(crate) fn resolve_source_folder(
    files: &mut [FileRecord],
    target_folder: Option<&str>,
) -> Result<String, IngestError> {
    if let Some(target) = target_folder {
        for file in files.iter_mut() {
            file.set_source_folder(Some(target.to_string()));
        }
        return Ok(target.to_string());
    }

    let folders: BTreeSet<&str> = files.iter().filter_map(FileRecord::source_folder).collect();
    let mut iter = folders.iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(IngestError::UndeterminedLocation),
        (Some(folder), None) => Ok((*folder).to_string()),
        (Some(_), Some(_)) => Err(IngestError::AmbiguousLocation {
            folders: folders.iter().map(|folder| (*folder).to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataFile;

    fn remote(path: &str, folder: &str) -> FileRecord {
        FileRecord::from_catalog(DataFile::new(path, 1), folder)
    }

    #[test]
    fn target_overrides_every_file() {
        let mut files = vec![remote("a", "/one"), remote("b", "/two")];
        let folder = resolve_source_folder(&mut files, Some("/target")).expect("resolve");
        assert_eq!(folder, "/target");
        assert!(files.iter().all(|f| f.source_folder() == Some("/target")));
    }

    #[test]
    fn unset_folders_are_ignored() {
        let mut files = vec![
            remote("a", "/shared"),
            FileRecord::from_local("x/b.txt", "").expect("record"),
            remote("c", "/shared"),
        ];
        let folder = resolve_source_folder(&mut files, None).expect("resolve");
        assert_eq!(folder, "/shared");
    }

    #[test]
    fn distinct_folders_are_ambiguous() {
        let mut files = vec![remote("a", "/one"), remote("b", "/two")];
        match resolve_source_folder(&mut files, None) {
            Err(IngestError::AmbiguousLocation { folders }) => {
                assert_eq!(folders, vec!["/one".to_string(), "/two".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn no_folders_is_undetermined() {
        let mut files = vec![FileRecord::from_local("x/b.txt", "").expect("record")];
        assert!(matches!(
            resolve_source_folder(&mut files, None),
            Err(IngestError::UndeterminedLocation)
        ));
        assert!(matches!(
            resolve_source_folder(&mut [], None),
            Err(IngestError::UndeterminedLocation)
        ));
    }
}
