//! Export one identity's data and import it into another.

mod common;

use snakeladder::app::Command;
use snakeladder::storage::transfer::ExportBundle;

#[test]
fn export_then_import_into_other_identity() {
    let mut app = common::memory_app();
    app.dispatch(Command::Register {
        username: "gina".into(),
        password: "ginapw".into(),
        email: None,
    });
    app.dispatch(Command::MoveToCell(81));
    app.dispatch(Command::AddComment {
        cell: 81,
        text: "snake ahead".into(),
    });

    let text = app.export_current().to_pretty_json().unwrap();
    assert!(text.contains("\"exportedAt\""));
    assert!(text.contains("snake ahead"));
    let bundle = ExportBundle::from_json(&text).unwrap();
    assert!(bundle.settings.is_none());

    app.dispatch(Command::Logout);
    app.dispatch(Command::Register {
        username: "hank".into(),
        password: "hankpw".into(),
        email: None,
    });
    assert_eq!(app.game().state().position, 1);

    let summary = app.import_current(bundle).unwrap();
    assert!(summary.game && summary.comments && !summary.settings);
    assert!(summary.rejected.is_empty());
    assert_eq!(summary.imported(), 2);

    assert_eq!(app.game().state().position, 81);
    assert_eq!(app.game().state().move_count, 1);
    assert_eq!(
        app.game().comments().get(81).map(|c| c.text.as_str()),
        Some("snake ahead")
    );
}

#[test]
fn import_accepts_legacy_comment_layout() {
    let mut app = common::memory_app();
    let bundle = ExportBundle::from_json(
        r#"{
            "game": {"position": 12, "rollCount": 4, "moveCount": 4},
            "comments": {"7": {"text": "seven", "date": "01.01.2024, 10:00:00", "cell": 7}},
            "settings": {"sound": false},
            "exportedAt": "2024-01-01T00:00:00.000Z"
        }"#,
    )
    .unwrap();
    let summary = app.import_current(bundle).unwrap();
    assert_eq!(summary.imported(), 3);
    assert_eq!(app.game().state().position, 12);
    assert!(app.game().comments().contains(7));

    let raw = app.storage().get_raw("comments_guest").unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(doc["comments"]["7"].is_object());
    assert_eq!(doc["_version"], "1.0");
}

#[test]
fn clear_and_stats() {
    let mut app = common::memory_app();
    app.dispatch(Command::MoveToCell(5));
    let before = app.stats();
    assert!(before.item_count >= 2);
    assert!(before.total_size > 0);
    assert_eq!(before.limit_bytes, 5 * 1024 * 1024);

    assert!(app.clear_current());
    assert!(app.storage().get_raw("game_guest").is_none());
    assert!(app.storage().get_raw("comments_guest").is_none());
    assert_eq!(app.game().state().position, 1);
    assert!(app.stats().item_count < before.item_count);
}
