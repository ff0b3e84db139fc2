//! Version comparison for extension and platform versions
//!
//! Extension versions are mostly semver, but platform and some plugin
//! versions carry four numeric segments (`6.5.8.2`), which semver rejects.

use std::cmp::Ordering;

use semver::Version;

/// Compare two version strings
pub fn compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (strip_prefix(a), strip_prefix(b));

    if let (Ok(va), Ok(vb)) = (Version::parse(a), Version::parse(b)) {
        return va.cmp(&vb);
    }

    compare_segments(a, b)
}

/// True when `candidate` is strictly newer than `current`
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare(candidate, current) == Ordering::Greater
}

fn strip_prefix(v: &str) -> &str {
    let v = v.trim();
    v.strip_prefix('v').unwrap_or(v)
}

fn split_release(v: &str) -> (&str, Option<&str>) {
    let v = v.split('+').next().unwrap_or(v);
    match v.split_once('-') {
        Some((release, pre)) => (release, Some(pre)),
        None => (v, None),
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let (ra, pa) = split_release(a);
    let (rb, pb) = split_release(b);

    let seg = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };
    let (sa, sb) = (seg(ra), seg(rb));

    for i in 0..sa.len().max(sb.len()) {
        let x = sa.get(i).copied().unwrap_or(0);
        let y = sb.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    // a release ranks above any of its pre-releases
    match (pa, pb) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    }
}
