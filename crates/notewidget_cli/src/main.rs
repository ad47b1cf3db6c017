//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notewidget_core` linkage without a widget host.
//! - Render one widget's rows from a notes database for local inspection.
//!
//! Usage: `notewidget_cli [<db_path> <widget_id>]`

use notewidget_core::db::{open_db, share};
use notewidget_core::{
    ListWidgetService, RemoteViewsFactory, SqliteConfigStore, SqliteNoteStore, WidgetId,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("notewidget_core ping={}", notewidget_core::ping());
    println!("notewidget_core version={}", notewidget_core::core_version());

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [db_path, widget_id] => match render_widget(db_path, widget_id) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: notewidget_cli [<db_path> <widget_id>]");
            ExitCode::from(2)
        }
    }
}

fn render_widget(db_path: &str, widget_id: &str) -> Result<(), String> {
    let widget_id = widget_id
        .trim()
        .parse::<WidgetId>()
        .map_err(|err| format!("invalid widget id `{widget_id}`: {err}"))?;

    let conn = share(open_db(db_path).map_err(|err| err.to_string())?);
    let service = ListWidgetService::new(
        Arc::new(SqliteNoteStore::new(conn.clone())),
        Arc::new(SqliteConfigStore::new(conn)),
    );
    let factory = service
        .open_widget(widget_id)
        .map_err(|err| err.to_string())?;

    println!("widget={widget_id} rows={}", factory.count());
    for position in 0..factory.count() {
        let row = factory.view_at(position);
        println!(
            "{position}\t{}\t{}\tnote_id={} list_id={}",
            row.title, row.due_label, row.action.note_id, row.action.list_id
        );
    }
    Ok(())
}
