use calibdb::database::Database;
use calibdb::line::next_logical_line;
use calibdb::request::{Request, Target};
use calibdb::scan::{load_value, Substitute};
use calibdb::seek::{seek_config, seek_date, CONFIG_LABEL};
use calibdb::stream::DatabaseFile;
use calibdb::textvars::TextVars;
use calibdb::timestamp::parse_reference_date;
use chrono::NaiveDateTime;

const CONFIGS: &str = "\
a = 0

[ config=lowrate ]
a = 1
b = 10

[ config = highrate ]
a = 2
";

const DATED: &str = "\
a = 0
[ 2018-01-01 00:00:00 ]
a = 1
[ 2019-01-01 00:00:00 ]
a = 2
[ 2020-01-01 00:00:00 ]
a = 3
";

fn date(text: &str) -> NaiveDateTime {
    parse_reference_date(text).expect("valid reference date")
}

fn next(file: &mut DatabaseFile<std::io::Cursor<Vec<u8>>>) -> Option<String> {
    next_logical_line(file).expect("in-memory read")
}

#[test]
fn config_block_is_found() {
    let mut file = DatabaseFile::from_text(CONFIGS);
    assert!(seek_config(&mut file, "highrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 2"));

    let mut file = DatabaseFile::from_text(CONFIGS);
    assert!(seek_config(&mut file, "lowrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 1"));
}

#[test]
fn failed_config_seek_restores_position() {
    let mut file = DatabaseFile::from_text(CONFIGS);
    assert_eq!(next(&mut file).as_deref(), Some("a = 0"));
    assert!(!seek_config(&mut file, "midrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("[ config=lowrate ]"));
    assert!(!seek_config(&mut file, "", CONFIG_LABEL, false).expect("read"));
}

#[test]
fn config_seek_can_stop_at_other_markers() {
    let text = "[ section ]\n[ config=x ]\nv = 1\n";
    let mut file = DatabaseFile::from_text(text);
    assert!(!seek_config(&mut file, "x", CONFIG_LABEL, true).expect("read"));
    assert!(seek_config(&mut file, "x", CONFIG_LABEL, false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("v = 1"));

    // without a label, any bracketed tag matches
    let mut file = DatabaseFile::from_text(text);
    assert!(seek_config(&mut file, "section", "", false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("[ config=x ]"));
}

#[test]
fn date_segment_is_the_latest_not_after_the_date() {
    let mut file = DatabaseFile::from_text(DATED);
    assert!(seek_date(&mut file, &date("2019-06-01"), false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 2"));

    let mut file = DatabaseFile::from_text(DATED);
    assert!(seek_date(&mut file, &date("2030-01-01"), false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 3"));

    let mut file = DatabaseFile::from_text(DATED);
    assert!(!seek_date(&mut file, &date("2017-01-01"), false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 0"));
}

#[test]
fn date_seek_can_stop_at_other_markers() {
    let text = "[ 2018-01-01 00:00:00 ]\na = 1\n[ config=x ]\n[ 2019-01-01 00:00:00 ]\na = 2\n";
    let mut file = DatabaseFile::from_text(text);
    assert!(seek_date(&mut file, &date("2019-06-01"), true).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 1"));
}

#[test]
fn database_lookups_stay_in_the_selected_block() {
    let mut db = Database::from_text(CONFIGS, date("2020-01-01"));
    assert_eq!(db.value("a").expect("lookup").as_deref(), Some("2"));

    assert!(db.seek_config("lowrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(db.value("a").expect("lookup").as_deref(), Some("1"));
    assert_eq!(db.scalar::<i32>("b").expect("lookup"), Some(10));

    // switching blocks searches the whole file
    assert!(db.seek_config("highrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(db.value("a").expect("lookup").as_deref(), Some("2"));
    assert_eq!(db.value("b").expect("lookup"), None);

    // a failed seek keeps the block
    assert!(!db.seek_config("midrate", CONFIG_LABEL, false).expect("read"));
    assert_eq!(db.value("a").expect("lookup").as_deref(), Some("2"));

    db.unscope().expect("rewind");
    assert_eq!(db.value("b").expect("lookup").as_deref(), Some("10"));
}

#[test]
fn database_date_segment() {
    let mut db = Database::from_text(DATED, date("2019-06-01"));
    assert!(db.seek_date(false).expect("read"));
    assert_eq!(db.next_line().expect("read").as_deref(), Some("a = 2"));
    assert_eq!(db.value("a").expect("lookup").as_deref(), Some("2"));
    db.unscope().expect("rewind");
    assert_eq!(db.array::<i32>("a").expect("lookup"), Some(vec![2]));
}

#[test]
fn database_batch_with_text_variables() {
    let mut vars = TextVars::new();
    vars.set("plane", ["u1", "v1"]);
    let text = "L.vdc.${plane}.nw = 368\nL.vdc.u2.nw = 400\n";
    let mut db = Database::from_text(text, date("2020-01-01")).with_text_vars(vars);

    let mut u1 = 0u32;
    let mut v1 = 0u32;
    let mut u2 = 0u32;
    {
        let mut requests = vec![
            Request::new("u1.nw", Target::scalar(&mut u1)),
            Request::new("v1.nw", Target::scalar(&mut v1)),
            Request::new("u2.nw", Target::scalar(&mut u2)),
        ];
        db.load(&mut requests, "L.vdc.", 0, "Vdc::Init").expect("all planes set");
    }
    assert_eq!((u1, v1, u2), (368, 368, 400));
    assert_eq!(db.matrix::<u32>("L.vdc.v1.nw", 1).expect("lookup"), Some(vec![vec![368]]));
}

#[test]
fn text_variable_expansion() {
    let mut vars = TextVars::new();
    assert!(vars.is_empty());
    vars.set("plane", ["u1", "v1"]);
    vars.set("arm", ["L"]);
    assert_eq!(vars.len(), 2);
    assert_eq!(
        vars.substitute("${arm}.vdc.${plane}.nw = 1"),
        vec!["L.vdc.u1.nw = 1", "L.vdc.v1.nw = 1"]
    );
    // unknown variables stay as they are
    assert_eq!(vars.substitute("${other} = 1"), vec!["${other} = 1"]);
    assert!(vars.remove("arm"));
    assert_eq!(vars.get("plane"), Some(&["u1".to_owned(), "v1".to_owned()][..]));

    let mut file = DatabaseFile::from_text("${plane}.t0 = 5\n");
    let value = load_value(&mut file, &date("2020-01-01"), "v1.t0", Some(&vars)).expect("lookup");
    assert_eq!(value.as_deref(), Some("5"));
}

#[test]
fn date_seek_stops_at_a_tag_that_does_not_qualify() {
    let text = "[ 2018-01-01 00:00:00 ]\na = 1\n[ 2022-01-01 00:00:00 ]\na = 3\n[ 2019-01-01 00:00:00 ]\na = 2\n";
    let mut file = DatabaseFile::from_text(text);
    assert!(seek_date(&mut file, &date("2020-01-01"), true).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 1"));

    let mut file = DatabaseFile::from_text(text);
    assert!(seek_date(&mut file, &date("2020-01-01"), false).expect("read"));
    assert_eq!(next(&mut file).as_deref(), Some("a = 2"));
}
