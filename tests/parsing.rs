use std::fs;
use std::path::PathBuf;

use arena_terminal::lichess::{
    FetchError, filter_broadcasts, parse_broadcasts_ndjson, parse_tournaments_json,
};
use arena_terminal::state::{Clock, TournamentStatus};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_tournament_fixture_started_first() {
    let raw = read_fixture("tournaments.json");
    let items = parse_tournaments_json(&raw).expect("fixture should parse");
    let ids = items.iter().map(|t| t.id.as_str()).collect::<Vec<_>>();
    // Finished arenas are not part of the list view.
    assert_eq!(ids, ["st4rt3d1", "cr8ted01", "cr8ted02"]);

    let live = &items[0];
    assert_eq!(live.status, Some(TournamentStatus::Started));
    assert_eq!(live.nb_players, Some(311));
    assert_eq!(live.display_name(), "Daily Bullet Arena");
    assert_eq!(
        live.clock,
        Some(Clock {
            limit: 60,
            increment: 0
        })
    );
    assert_eq!(items[1].status, Some(TournamentStatus::Created));
    assert_eq!(items[1].rated, Some(true));
    assert_eq!(items[2].minutes, Some(27));
}

#[test]
fn string_statuses_are_accepted() {
    let raw = r#"{"started":[{"id":"a","status":"started"}],"created":[{"id":"b","status":"created"},{"id":"c","status":"paused"}]}"#;
    let items = parse_tournaments_json(raw).expect("should parse");
    assert_eq!(items[0].status, Some(TournamentStatus::Started));
    assert_eq!(items[1].status, Some(TournamentStatus::Created));
    assert_eq!(
        items[2].status,
        Some(TournamentStatus::Other("paused".to_string()))
    );
}

#[test]
fn unknown_numeric_status_is_kept_raw() {
    let items = parse_tournaments_json(r#"{"created":[{"id":"a","status":15}]}"#)
        .expect("should parse");
    assert_eq!(items[0].status, Some(TournamentStatus::Other("15".to_string())));
}

#[test]
fn missing_arrays_default_to_empty() {
    assert!(parse_tournaments_json("{}").expect("should parse").is_empty());
    assert!(parse_tournaments_json("null").expect("should parse").is_empty());
    let only_created = parse_tournaments_json(r#"{"created":[{"id":"x"}]}"#)
        .expect("should parse");
    assert_eq!(only_created.len(), 1);
    assert_eq!(only_created[0].display_name(), "x");
}

#[test]
fn malformed_tournament_json_is_a_parse_error() {
    let err = parse_tournaments_json("<html>oops</html>").expect_err("html is not json");
    assert!(matches!(err, FetchError::Parse(_)));
    let err = parse_tournaments_json(r#"{"started":[{"name":"no id"}]}"#)
        .expect_err("id is required");
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn parses_broadcast_ndjson_skipping_blank_lines() {
    let raw = read_fixture("broadcasts.ndjson");
    let items = parse_broadcasts_ndjson(&raw).expect("fixture should parse");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].tour.id, "wch2026");
    assert_eq!(items[0].rounds.len(), 2);
    assert!(items[0].rounds[1].ongoing);
    // `ongoing` defaults to false when omitted.
    assert!(!items[1].rounds[1].ongoing);
    assert!(items[2].rounds.is_empty());
    assert_eq!(items[0].rounds[0].name.as_deref(), Some("Game 1"));
    assert_eq!(items[0].rounds[0].starts_at, Some(1760000000000));
    assert_eq!(items[1].tour.description, None);
}

#[test]
fn broadcast_line_error_names_the_line() {
    let raw = "{\"rounds\":[]}\nnot json\n";
    let err = parse_broadcasts_ndjson(raw).expect_err("second line is broken");
    match err {
        FetchError::Parse(msg) => assert!(msg.contains("line 2"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn finished_filter_keeps_any_broadcast_with_rounds() {
    let raw = concat!(
        "{\"tour\":{\"id\":\"a\"},\"rounds\":[{\"ongoing\":false},{\"ongoing\":false}]}\n",
        "{\"tour\":{\"id\":\"b\"},\"rounds\":[]}\n",
        "{\"tour\":{\"id\":\"c\"},\"rounds\":[{\"ongoing\":false}]}\n",
    );
    let items = parse_broadcasts_ndjson(raw).expect("should parse");
    let kept = filter_broadcasts(items, true);
    let ids = kept.iter().map(|b| b.tour.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["a", "c"]);
}

#[test]
fn ongoing_filter_requires_a_round_in_progress() {
    let raw = read_fixture("broadcasts.ndjson");
    let items = parse_broadcasts_ndjson(&raw).expect("fixture should parse");
    let kept = filter_broadcasts(items, false);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].tour.id, "wch2026");
}
