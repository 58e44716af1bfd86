use calibdb::scan::{load_array, load_scalar, load_value};
use calibdb::stream::DatabaseFile;
use calibdb::timestamp::{is_assignment, match_key, parse_date_tag, parse_reference_date, KeyMatch};
use chrono::NaiveDateTime;

const HISTORY: &str = "\
L.vdc.nw = 368

[ 2019-02-01 00:00:00 ]
L.vdc.nw = 400

[ 2020-01-01 00:00:00 ]
L.vdc.nw = 500
";

fn date(text: &str) -> NaiveDateTime {
    parse_reference_date(text).expect("valid reference date")
}

fn value_at(text: &str, key: &str, at: &str) -> Option<String> {
    let mut file = DatabaseFile::from_text(text);
    load_value(&mut file, &date(at), key, None).expect("lookup succeeds")
}

#[test]
fn undated_assignment_is_valid_from_the_start() {
    assert_eq!(value_at(HISTORY, "L.vdc.nw", "2018-06-01").as_deref(), Some("368"));
}

#[test]
fn later_blocks_override_earlier_ones() {
    assert_eq!(value_at(HISTORY, "L.vdc.nw", "2019-06-01").as_deref(), Some("400"));
    assert_eq!(value_at(HISTORY, "L.vdc.nw", "2020-06-01").as_deref(), Some("500"));
    // the tag date itself is included
    assert_eq!(value_at(HISTORY, "L.vdc.nw", "2019-02-01 00:00:00").as_deref(), Some("400"));
}

#[test]
fn last_assignment_in_valid_blocks_wins() {
    let text = "a = 1\na = 2\n\n[ 2019-01-01 00:00:00 ]\na = 3\na = 4\n";
    assert_eq!(value_at(text, "a", "2018-01-01").as_deref(), Some("2"));
    assert_eq!(value_at(text, "a", "2019-01-02").as_deref(), Some("4"));
}

#[test]
fn older_block_after_newer_one_is_ignored() {
    let text = "a = 1\n[ 2020-01-01 00:00:00 ]\na = 2\n[ 2019-01-01 00:00:00 ]\na = 3\n";
    assert_eq!(value_at(text, "a", "2021-01-01").as_deref(), Some("2"));
    assert_eq!(value_at(text, "a", "2019-06-01").as_deref(), Some("3"));
}

#[test]
fn missing_key_gives_none() {
    assert_eq!(value_at(HISTORY, "L.vdc.tdc_res", "2020-06-01"), None);
    // only assigned after the reference date
    assert_eq!(value_at("[ 2019-01-01 00:00:00 ]\nb = 1\n", "b", "2018-01-01"), None);
}

#[test]
fn keys_match_exactly() {
    let text = "L.vdc.nwx = 5\nl.vdc.nw = 6\nL.vdc.nw.old = 7\n";
    assert_eq!(value_at(text, "L.vdc.nw", "2020-01-01"), None);
    assert_eq!(value_at(text, "L.vdc.nwx", "2020-01-01").as_deref(), Some("5"));
}

#[test]
fn malformed_date_tag_is_ignored() {
    let text = "a = 1\n\n[ 2019-13-45 00:00:00 ]\na = 2\n";
    // the block keeps the date in effect before the bad tag
    assert_eq!(value_at(text, "a", "2000-01-01").as_deref(), Some("2"));
    let early = "a = 1\n\n[ 1990-01-01 00:00:00 ]\na = 2\n";
    assert_eq!(value_at(early, "a", "2000-01-01").as_deref(), Some("2"));
}

#[test]
fn time_zone_offset_is_honoured() {
    let text = "a = 1\n\n[ 2021-06-01 12:00:00 +0000 ]\na = 2\n";
    assert_eq!(value_at(text, "a", "2021-06-03").as_deref(), Some("2"));
    assert_eq!(value_at(text, "a", "2021-05-30").as_deref(), Some("1"));
}

#[test]
fn continued_value_is_looked_up_whole() {
    let text = "pos = 1 2 3 \\\n      4 5\n";
    let mut file = DatabaseFile::from_text(text);
    let values: Option<Vec<i32>> = load_array(&mut file, &date("2020-01-01"), "pos", None).expect("lookup succeeds");
    assert_eq!(values, Some(vec![1, 2, 3, 4, 5]));
}

#[test]
fn lookup_starts_over_each_time() {
    let mut file = DatabaseFile::from_text(HISTORY);
    let at = date("2019-06-01");
    let first: Option<u32> = load_scalar(&mut file, &at, "L.vdc.nw", None).expect("lookup succeeds");
    let again: Option<u32> = load_scalar(&mut file, &at, "L.vdc.nw", None).expect("lookup succeeds");
    assert_eq!(first, Some(400));
    assert_eq!(again, Some(400));
}

#[test]
fn empty_value_is_a_conversion_error() {
    let mut file = DatabaseFile::from_text("a =\n");
    let at = date("2020-01-01");
    assert_eq!(load_value(&mut file, &at, "a", None).expect("lookup succeeds").as_deref(), Some(""));
    let err = load_scalar::<f64, _>(&mut file, &at, "a", None).expect_err("nothing to convert");
    assert_eq!(err.code(), -131);
}

#[test]
fn assignment_recognition() {
    assert!(is_assignment("a = 1"));
    assert!(is_assignment("a ="));
    assert!(!is_assignment("a == 1"));
    assert!(!is_assignment("a != 1"));
    assert!(!is_assignment("a <= 1"));
    assert!(!is_assignment("a >= 1"));
    assert!(!is_assignment("= 1"));
    assert!(!is_assignment("no assignment here"));
    assert_eq!(match_key("  a  =  1 2 ", "a"), KeyMatch::Value("1 2"));
    assert_eq!(match_key("b = 1", "a"), KeyMatch::Other);
    assert_eq!(match_key("[ 2019-01-01 00:00:00 ]", "a"), KeyMatch::NoAssignment);
}

#[test]
fn date_tag_parsing() {
    let tag = parse_date_tag("[ 2019-02-01 08:30:00 ]", false).expect("valid tag");
    assert_eq!(tag, date("2019-02-01 08:30:00"));
    assert_eq!(parse_date_tag("[ config=highrate ]", false), None);
    assert_eq!(parse_date_tag("[ 2019-02-30 00:00:00 ]", false), None);
    assert_eq!(parse_date_tag("a = 1", false), None);
}
