use calibdb::line::{next_logical_line, LogicalLines};
use calibdb::stream::DatabaseFile;

fn logical_lines(text: &str) -> Vec<String> {
    let mut file = DatabaseFile::from_text(text);
    LogicalLines::new(&mut file)
        .collect::<Result<Vec<_>, _>>()
        .expect("in-memory reads succeed")
}

#[test]
fn backslash_continuation_joins_lines() {
    let lines = logical_lines("key1 = 1 2 3 \\\n       4 5 6\n");
    assert_eq!(lines, vec!["key1 = 1 2 3 4 5 6"]);
}

#[test]
fn implicit_continuation_ends_at_blank_line() {
    let lines = logical_lines("key2 = 1 2 3\n       4 5 6\n\nkey3 = 7\n");
    assert_eq!(lines, vec!["key2 = 1 2 3 4 5 6", "key3 = 7"]);
}

#[test]
fn next_assignment_is_pushed_back() {
    let mut file = DatabaseFile::from_text("a = 1\nb = 2\n");
    let first = next_logical_line(&mut file).expect("read");
    assert_eq!(first.as_deref(), Some("a = 1"));
    // the second assignment was read ahead but must come back
    let second = next_logical_line(&mut file).expect("read");
    assert_eq!(second.as_deref(), Some("b = 2"));
    assert_eq!(next_logical_line(&mut file).expect("read"), None);
}

#[test]
fn marker_ends_implicit_continuation() {
    let lines = logical_lines("a = 1\n[ 2019-01-01 00:00:00 ]\na = 2\n");
    assert_eq!(lines, vec!["a = 1", "[ 2019-01-01 00:00:00 ]", "a = 2"]);
}

#[test]
fn comments_are_dropped() {
    let text = "# header\n   # indented comment\nx = 5 # trailing note\n\n#\n";
    assert_eq!(logical_lines(text), vec!["x = 5"]);
}

#[test]
fn comment_lines_inside_continuation_are_skipped() {
    let lines = logical_lines("m = 1 2 \\\n# in between\n  3 4\n");
    assert_eq!(lines, vec!["m = 1 2 3 4"]);
}

#[test]
fn tabs_become_spaces() {
    assert_eq!(logical_lines("a\t=\t5\n"), vec!["a = 5"]);
}

#[test]
fn pending_continuation_at_end_of_file_is_kept() {
    assert_eq!(logical_lines("a = 1 \\"), vec!["a = 1"]);
    assert_eq!(logical_lines("b = 1 2 \\\n 3 \\"), vec!["b = 1 2 3"]);
}

#[test]
fn empty_input_has_no_lines() {
    assert!(logical_lines("").is_empty());
    assert!(logical_lines("\n\n   \n# only a comment\n").is_empty());
}

#[test]
fn line_without_newline_at_end() {
    assert_eq!(logical_lines("x = 1\ny = 2"), vec!["x = 1", "y = 2"]);
}

#[test]
fn continuation_keeps_one_separating_space() {
    assert_eq!(logical_lines("a = 1 \\\n2 3\n"), vec!["a = 1 2 3"]);
    assert_eq!(logical_lines("a = 1\n2\n3\n\n"), vec!["a = 1 2 3"]);
}

#[test]
fn brackets_inside_continued_value_are_kept() {
    assert_eq!(logical_lines("names = a\n  b[1] c\n\n"), vec!["names = a b[1] c"]);
    assert_eq!(logical_lines("names = a\n  [ config=x ]\n"), vec!["names = a", "[ config=x ]"]);
}
