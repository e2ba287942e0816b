//! File-meta sniffing.
//!
//! Classification needs only the Media Storage SOP Class UID, so files are
//! sniffed through their file meta group first: preamble, `DICM` magic,
//! then the meta table. Anything that fails the sniff is reported as
//! not-DICOM rather than as an error, because not every file in a scanned
//! directory is expected to matter.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use dicom::object::meta::FileMetaTable;

/// The identity fields of a sniffed file.
#[derive(Debug, Clone)]
pub struct FileMetaSummary {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub transfer_syntax: String,
}

/// Reads the file meta group without parsing the main dataset.
///
/// Returns `None` for anything that is not a readable DICOM part-10 file.
pub fn sniff_file_meta(path: &Path) -> Option<FileMetaSummary> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);

    let mut preamble = [0u8; 132];
    reader.read_exact(&mut preamble).ok()?;
    if &preamble[128..132] != b"DICM" {
        return None;
    }

    let table = FileMetaTable::from_reader(&mut reader).ok()?;
    Some(FileMetaSummary {
        sop_class_uid: trim_uid(&table.media_storage_sop_class_uid),
        sop_instance_uid: trim_uid(&table.media_storage_sop_instance_uid),
        transfer_syntax: trim_uid(&table.transfer_syntax),
    })
}

/// UI values are even-length padded with a trailing NUL.
pub fn trim_uid(raw: &str) -> String {
    raw.trim_end_matches(['\0', ' ']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_non_dicom_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely,not,dicom\n1,2,3\n").unwrap();
        assert!(sniff_file_meta(file.path()).is_none());
    }

    #[test]
    fn rejects_truncated_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        assert!(sniff_file_meta(file.path()).is_none());
    }

    #[test]
    fn trims_uid_padding() {
        assert_eq!(trim_uid("1.2.840.10008.5.1.4.1.1.2\0"), "1.2.840.10008.5.1.4.1.1.2");
        assert_eq!(trim_uid("1.2.3"), "1.2.3");
    }
}
