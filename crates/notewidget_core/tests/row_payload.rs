use notewidget_core::{ListSelection, RowAction, RowDescriptor, TaskStatus, WidgetConfig};
use serde_json::json;

#[test]
fn row_descriptor_serializes_action_payload_ids() {
    let row = RowDescriptor {
        title: "Pay rent".to_string(),
        note: String::new(),
        due_label: "Mon, Jan 1, 2024".to_string(),
        action: RowAction {
            note_id: 1,
            list_id: 5,
        },
    };

    let value = serde_json::to_value(&row).unwrap();
    assert_eq!(value["action"], json!({ "note_id": 1, "list_id": 5 }));
    assert_eq!(value["due_label"], "Mon, Jan 1, 2024");
}

#[test]
fn task_status_uses_sync_wire_names() {
    assert_eq!(
        serde_json::to_value(TaskStatus::NeedsAction).unwrap(),
        json!("needsAction")
    );
    let parsed: TaskStatus = serde_json::from_value(json!("completed")).unwrap();
    assert_eq!(parsed, TaskStatus::Completed);
}

#[test]
fn widget_config_serializes_list_selection() {
    let config = WidgetConfig {
        list: ListSelection::List(5),
        ..WidgetConfig::default()
    };
    let value = serde_json::to_value(config).unwrap();
    assert_eq!(value["list"], json!({ "list": 5 }));
    assert_eq!(value["sort"], "due_date");
    assert_eq!(value["direction"], "ascending");
}
