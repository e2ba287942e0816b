//! Natural filename ordering.
//!
//! Sliceable roles are numbered in the order files are accepted, so the
//! listing order is load-bearing: `img2.dcm` must sort before `img10.dcm`.
//! Comparison is case-insensitive and digit-run aware.

use std::cmp::Ordering;
use std::path::Path;

/// Compares two strings treating runs of digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let a_num = take_digits(&mut a_chars);
                    let b_num = take_digits(&mut b_chars);
                    // Compare numerically: strip leading zeros, then by
                    // length, then lexically.
                    let a_trim = a_num.trim_start_matches('0');
                    let b_trim = b_num.trim_start_matches('0');
                    let ord = a_trim
                        .len()
                        .cmp(&b_trim.len())
                        .then_with(|| a_trim.cmp(b_trim))
                        .then_with(|| a_num.len().cmp(&b_num.len()));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = ac
                        .to_ascii_lowercase()
                        .cmp(&bc.to_ascii_lowercase())
                        .then_with(|| ac.cmp(&bc));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    a_chars.next();
                    b_chars.next();
                }
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

/// Sorts paths by natural order of their final component.
pub fn sort_paths_natural(paths: &mut [impl AsRef<Path>]) {
    paths.sort_by(|a, b| {
        let a_name = file_name(a.as_ref());
        let b_name = file_name(b.as_ref());
        natural_cmp(&a_name, &b_name).then_with(|| a.as_ref().cmp(b.as_ref()))
    });
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn digits_compare_numerically() {
        assert_eq!(natural_cmp("img2", "img10"), Ordering::Less);
        assert_eq!(natural_cmp("img10", "img2"), Ordering::Greater);
        assert_eq!(natural_cmp("img002", "img2"), Ordering::Greater);
        assert_eq!(natural_cmp("img2", "img2"), Ordering::Equal);
    }

    #[test]
    fn case_is_folded_before_tiebreak() {
        assert_eq!(natural_cmp("CT_1", "ct_2"), Ordering::Less);
        assert_eq!(natural_cmp("a", "B"), Ordering::Less);
    }

    #[test]
    fn sorts_paths_by_file_name() {
        let mut paths = vec![
            PathBuf::from("scan/img10.dcm"),
            PathBuf::from("scan/img9.dcm"),
            PathBuf::from("scan/img1.dcm"),
        ];
        sort_paths_natural(&mut paths);
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["img1.dcm", "img9.dcm", "img10.dcm"]);
    }
}
