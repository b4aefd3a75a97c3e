use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Strong's concordance numbers, as found in NET `<st data-num="...">`.
regex!(STRONGS_REGEX, r"^\d+b?$");
// NJPS footnote markers: "a", "-b", "cd-".
regex!(FOOTNOTE_MARKER_REGEX, r"^-?[a-z]{1,2}-?$");
// SBLGNT verse ids: "Matthew 1:1", "1 Corinthians 3:4-5", or a bare "3:4".
regex!(VERSE_ID_REGEX, r"^(?:(.+) )?(\d+):(\d+)(?:-(\d+))?$");
// First run of digits in a file stem, for natural ordering of source files.
regex!(NUMBER_REGEX, r"\d+");
