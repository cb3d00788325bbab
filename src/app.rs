use std::num::NonZeroUsize;

use dioxus::logger::tracing::{info, warn};
use dioxus::prelude::*;
use rfd::FileDialog;

use crate::config::AppConfig;
use crate::domain::entities::attendance::{InputMeaning, RollToken, Section};
use crate::domain::entities::view::{BatchFilter, RowLimit, ALL_OPTION_VALUE};
use crate::domain::roster::SectionRoster;
use crate::infra::import::location::SUPPORTED_EXTENSIONS;
use crate::domain::errors::IngestError;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::{AppState, Screen};
use crate::usecase::services::import_service::{load_location, load_path, LoadedDataset};
use crate::usecase::services::summary_service::SummaryEntry;

const PANEL_STYLE: &str =
    "background: #fff; border: 1px solid #ddd; border-radius: 8px; padding: 12px; margin-bottom: 12px;";
const BUTTON_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";
const HEADER_CELL_STYLE: &str =
    "border: 1px solid #bbb; padding: 6px; background: #f3f4f6; position: sticky; top: 0; cursor: pointer; white-space: nowrap;";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DropdownId {
    Batch,
    RowLimit,
    ColumnVisibility,
}

#[derive(Clone, Debug, PartialEq)]
struct DropdownOption {
    value: String,
    label: String,
}

impl DropdownOption {
    fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

fn dropdown_label(options: &[DropdownOption], selected: Option<&str>) -> String {
    selected
        .and_then(|value| options.iter().find(|opt| opt.value == value))
        .map(|opt| opt.label.clone())
        .unwrap_or_else(|| "(none)".to_string())
}

fn cell_alignment(value: &str) -> &'static str {
    if value.trim().parse::<f64>().is_ok() {
        "right"
    } else {
        "left"
    }
}

fn toggle_button_style(active: bool) -> &'static str {
    if active {
        "border: 1px solid #2563eb; background: #2563eb; color: #fff; padding: 4px 12px; border-radius: 6px; cursor: pointer;"
    } else {
        BUTTON_STYLE
    }
}

/// Runs `load` on the blocking pool, then commits its dataset to the session
/// on the UI thread. Ignored while another load is in flight.
fn start_ingest<F>(mut state: AppState, label: String, load: F)
where
    F: FnOnce() -> Result<LoadedDataset, IngestError> + Send + 'static,
{
    if *state.busy.peek() {
        return;
    }
    state.busy.set(true);
    state.status.set(format!("Loading {label}"));

    spawn(async move {
        let outcome = run_blocking(load).await;
        match outcome {
            Ok(Ok(loaded)) => {
                let result = state.session.write().commit_loaded(loaded);
                state.status.set(format!(
                    "Loaded {} rows, {} columns from {}",
                    result.row_count, result.column_count, result.location
                ));
                state.summary_report.set(None);
            }
            Ok(Err(err)) => {
                warn!("load failed: {err}");
                state.status.set(format!("Load failed: {err}"));
            }
            Err(err) => {
                warn!("load task failed: {err}");
                state.status.set(format!("Load failed: {err}"));
            }
        }
        state.busy.set(false);
    });
}

#[component]
fn DropdownSelect(
    id: DropdownId,
    label: &'static str,
    options: Vec<DropdownOption>,
    selected: Option<String>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    mut dropdown_pos: Signal<Option<(f64, f64)>>,
    on_select: EventHandler<String>,
) -> Element {
    let is_open = open_dropdown() == Some(id);
    let selected_label = dropdown_label(&options, selected.as_deref());
    let (left, top) = dropdown_pos().unwrap_or((0.0, 0.0));

    rsx! {
        div {
            style: "position: relative; display: inline-flex; align-items: center; gap: 6px;",
            span { "{label}" }
            button {
                style: BUTTON_STYLE,
                onclick: move |event| {
                    event.stop_propagation();
                    if open_dropdown() == Some(id) {
                        open_dropdown.set(None);
                        return;
                    }
                    let point = event.client_coordinates();
                    dropdown_pos.set(Some((point.x, point.y + 24.0)));
                    open_dropdown.set(Some(id));
                },
                "{selected_label}"
            }
        }

        if is_open {
            div {
                style: "position: fixed; left: {left}px; top: {top}px; min-width: 160px; max-height: 320px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200;",
                onclick: move |event| event.stop_propagation(),
                {options.iter().map(|opt| {
                    let value = opt.value.clone();
                    let label = opt.label.clone();
                    let is_selected = selected.as_deref() == Some(value.as_str());
                    let background = if is_selected { "#eef4ff" } else { "transparent" };
                    rsx!(
                        div {
                            style: "padding: 8px 10px; cursor: pointer; background: {background};",
                            onclick: move |_| {
                                on_select.call(value.clone());
                                open_dropdown.set(None);
                            },
                            "{label}"
                        }
                    )
                })}
            }
        }
    }
}

#[component]
fn ColumnVisibilityDropdown(
    id: DropdownId,
    columns: Vec<String>,
    visible: Vec<String>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    mut dropdown_pos: Signal<Option<(f64, f64)>>,
    on_toggle: EventHandler<String>,
) -> Element {
    let is_open = open_dropdown() == Some(id);
    let (left, top) = dropdown_pos().unwrap_or((0.0, 0.0));
    let shown = visible.len();
    let total = columns.len();

    rsx! {
        button {
            style: BUTTON_STYLE,
            onclick: move |event| {
                event.stop_propagation();
                if open_dropdown() == Some(id) {
                    open_dropdown.set(None);
                    return;
                }
                let point = event.client_coordinates();
                dropdown_pos.set(Some((point.x, point.y + 24.0)));
                open_dropdown.set(Some(id));
            },
            "Columns ({shown}/{total})"
        }

        if is_open {
            div {
                style: "position: fixed; left: {left}px; top: {top}px; min-width: 220px; max-height: 360px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200; padding: 6px;",
                onclick: move |event| event.stop_propagation(),
                {columns.iter().map(|header| {
                    let checked = visible.contains(header);
                    let header = header.clone();
                    let column = header.clone();
                    rsx!(
                        label {
                            style: "display: flex; align-items: center; gap: 8px; padding: 6px 4px; cursor: pointer;",
                            input {
                                r#type: "checkbox",
                                checked: checked,
                                onclick: move |_| {
                                    on_toggle.call(column.clone());
                                }
                            }
                            span { "{header}" }
                        }
                    )
                })}
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let roster = match SectionRoster::standard() {
        Ok(roster) => roster,
        Err(err) => {
            return rsx! {
                div {
                    p { "Section roster is inconsistent: {err}" }
                }
            };
        }
    };

    let config = use_hook(AppConfig::load_or_default);
    let state = AppState::new(roster, config);
    let AppState {
        session,
        screen,
        status,
        busy,
        config,
        ..
    } = state;

    use_effect(move || {
        if screen() != Screen::Students || session.peek().has_data() {
            return;
        }
        let location = config.peek().default_dataset.clone();
        info!(%location, "loading default dataset");
        start_ingest(state, location.clone(), move || load_location(&location));
    });

    let current = screen();
    let title = current.title();
    let status_text = status();
    let busy_text = if busy() { " (working...)" } else { "" };

    rsx! {
        div {
            style: "font-family: 'Segoe UI', sans-serif; background: #f5f6f8; min-height: 100vh; height: 100vh; overflow: hidden;",
            oncontextmenu: move |event| {
                event.prevent_default();
            },
            if current == Screen::Login {
                LoginScreen { state }
            } else {
                div {
                    style: "display: flex; height: 100vh;",
                    Sidebar { state }
                    div {
                        style: "flex: 1; padding: 16px; overflow: auto;",
                        h2 { "{title}" }
                        {match current {
                            Screen::Dashboard => rsx! { HomeScreen { state } },
                            Screen::Students => rsx! { StudentsScreen { state } },
                            Screen::Attendance => rsx! { AttendanceScreen { state } },
                            Screen::Hod => rsx! { HodScreen { state } },
                            Screen::Login => rsx! {},
                        }}
                        div {
                            style: "margin-top: 12px; color: #555; font-size: 13px;",
                            "{status_text}{busy_text}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn LoginScreen(state: AppState) -> Element {
    let AppState {
        auth,
        mut screen,
        mut username,
        mut password,
        mut show_password,
        mut login_error,
        mut status,
        ..
    } = state;
    let input_type = if show_password() { "text" } else { "password" };
    let toggle_label = if show_password() { "Hide" } else { "Show" };

    let mut submit = move || {
        let user = username();
        if auth.read().authenticate(&user, &password()) {
            info!(user = %user.trim(), "signed in");
            login_error.set(false);
            password.set(String::new());
            status.set(format!("Signed in as {}", user.trim()));
            screen.set(Screen::Dashboard);
        } else {
            login_error.set(true);
        }
    };

    rsx! {
        div {
            style: "display: flex; align-items: center; justify-content: center; height: 100vh;",
            div {
                style: "{PANEL_STYLE} width: 320px; display: flex; flex-direction: column; gap: 10px;",
                h2 { style: "margin: 0;", "Sign in" }
                label { "Username" }
                input {
                    value: username(),
                    oninput: move |event| {
                        username.set(event.value());
                        login_error.set(false);
                    }
                }
                label { "Password" }
                div {
                    style: "display: flex; gap: 6px;",
                    input {
                        style: "flex: 1;",
                        r#type: input_type,
                        value: password(),
                        oninput: move |event| {
                            password.set(event.value());
                            login_error.set(false);
                        },
                        onkeydown: move |event| {
                            if event.key() == Key::Enter {
                                submit();
                            }
                        }
                    }
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| show_password.set(!show_password()),
                        "{toggle_label}"
                    }
                }
                if login_error() {
                    p { style: "color: #d24; margin: 0;", "Invalid username or password" }
                }
                button {
                    style: toggle_button_style(true),
                    onclick: move |_| submit(),
                    "Sign in"
                }
            }
        }
    }
}

#[component]
fn Sidebar(state: AppState) -> Element {
    let AppState {
        mut screen,
        mut sidebar_open,
        mut password,
        mut login_error,
        mut status,
        ..
    } = state;
    let open = sidebar_open();
    let current = screen();
    let width = if open { "190px" } else { "56px" };
    let toggle_label = if open { "<<" } else { ">>" };

    rsx! {
        nav {
            style: "width: {width}; background: #1f2937; padding: 12px 8px; display: flex; flex-direction: column; gap: 6px;",
            button {
                style: "background: transparent; color: #fff; border: none; cursor: pointer; text-align: left;",
                onclick: move |_| sidebar_open.set(!open),
                "{toggle_label}"
            }
            {Screen::NAV.iter().map(|item| {
                let item = *item;
                let label = if open {
                    item.title().to_string()
                } else {
                    item.title().chars().take(1).collect()
                };
                let background = if item == current { "#374151" } else { "transparent" };
                rsx!(
                    button {
                        style: "background: {background}; color: #fff; border: none; border-radius: 6px; padding: 8px; cursor: pointer; text-align: left;",
                        onclick: move |_| screen.set(item),
                        "{label}"
                    }
                )
            })}
            div { style: "flex: 1;" }
            button {
                style: "background: transparent; color: #fca5a5; border: none; padding: 8px; cursor: pointer; text-align: left;",
                onclick: move |_| {
                    info!("signed out");
                    password.set(String::new());
                    login_error.set(false);
                    status.set("Signed out".to_string());
                    screen.set(Screen::Login);
                },
                if open { "Log out" } else { "X" }
            }
        }
    }
}

#[component]
fn HomeScreen(state: AppState) -> Element {
    let AppState {
        session, mut screen, ..
    } = state;
    let (records, version) = {
        let session = session.read();
        let records = session.table().map(|table| table.total_rows).unwrap_or(0);
        (records, session.version())
    };
    let cards = [
        (
            Screen::Students,
            format!("{records} records loaded (version {})", version.0),
        ),
        (
            Screen::Attendance,
            "Resolve roll numbers for sections A, B and C".to_string(),
        ),
        (Screen::Hod, "CGPA, backlog and attendance totals".to_string()),
    ];

    rsx! {
        div {
            style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px;",
            {cards.into_iter().map(|(target, detail)| {
                let title = target.title();
                rsx!(
                    div {
                        style: "{PANEL_STYLE} cursor: pointer;",
                        onclick: move |_| screen.set(target),
                        h3 { style: "margin-top: 0;", "{title}" }
                        p { style: "color: #555;", "{detail}" }
                    }
                )
            })}
        }
    }
}

#[component]
fn StudentsScreen(state: AppState) -> Element {
    let AppState {
        mut session,
        mut status,
        busy,
        config,
        ..
    } = state;
    let mut open_dropdown = use_signal(|| None::<DropdownId>);
    let dropdown_pos = use_signal(|| None::<(f64, f64)>);

    let (table, manifest, view, batch_values) = {
        let session = session.read();
        (
            session.table(),
            session.manifest(),
            session.view().clone(),
            session.batch_options(),
        )
    };
    let table = match table {
        Ok(table) => table,
        Err(err) => {
            warn!("table view failed: {err}");
            return rsx! {
                p { "Could not build the table: {err}" }
            };
        }
    };

    let has_batch = manifest.batch_column().is_some();
    let batch_options: Vec<DropdownOption> = std::iter::once(ALL_OPTION_VALUE.to_string())
        .chain(batch_values)
        .map(DropdownOption::same)
        .collect();
    let row_limit_options: Vec<DropdownOption> = std::iter::once(RowLimit::All)
        .chain(
            config
                .read()
                .row_limit_options
                .iter()
                .filter_map(|limit| NonZeroUsize::new(*limit).map(RowLimit::First)),
        )
        .map(|limit| DropdownOption::same(limit.to_string()))
        .collect();
    let selected_batch = view.batch_filter().option_value().to_string();
    let selected_limit = view.row_limit().to_string();
    let search = view.search_query().to_string();
    let sort = view.sort().cloned();
    let all_columns = manifest.columns().to_vec();
    let visible = view.visible_columns().to_vec();
    let shown = table.rows.len();
    let matching = table.matching_rows;
    let total = table.total_rows;
    let default_dataset = config.read().default_dataset.clone();
    let headers = table.columns.clone();
    let rows = table.rows.clone();

    rsx! {
        div {
            onclick: move |_| open_dropdown.set(None),
            div {
                style: "{PANEL_STYLE} display: flex; flex-wrap: wrap; gap: 8px; align-items: center; position: sticky; top: 0; z-index: 900;",
                button {
                    style: BUTTON_STYLE,
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(file_path) = FileDialog::new()
                            .add_filter("Spreadsheet", &SUPPORTED_EXTENSIONS)
                            .pick_file()
                        else {
                            status.set("No file selected".to_string());
                            return;
                        };
                        let label = file_path.display().to_string();
                        start_ingest(state, label, move || load_path(&file_path));
                    },
                    "Upload file"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: busy(),
                    onclick: move |_| {
                        let location = default_dataset.clone();
                        start_ingest(state, location.clone(), move || load_location(&location));
                    },
                    "Reload default"
                }
                if has_batch {
                    DropdownSelect {
                        id: DropdownId::Batch,
                        label: "Batch",
                        options: batch_options,
                        selected: Some(selected_batch),
                        open_dropdown,
                        dropdown_pos,
                        on_select: move |value: String| {
                            if let Err(err) = session.write().set_batch_filter(BatchFilter::from_option(&value)) {
                                status.set(err.to_string());
                            }
                        }
                    }
                }
                input {
                    style: "padding: 4px 8px; min-width: 200px;",
                    placeholder: "Search visible columns",
                    value: search,
                    oninput: move |event| {
                        session.write().set_search_query(event.value());
                    }
                }
                DropdownSelect {
                    id: DropdownId::RowLimit,
                    label: "Rows",
                    options: row_limit_options,
                    selected: Some(selected_limit),
                    open_dropdown,
                    dropdown_pos,
                    on_select: move |value: String| {
                        match value.parse::<RowLimit>() {
                            Ok(limit) => session.write().set_row_limit(limit),
                            Err(err) => status.set(err),
                        }
                    }
                }
                ColumnVisibilityDropdown {
                    id: DropdownId::ColumnVisibility,
                    columns: all_columns,
                    visible,
                    open_dropdown,
                    dropdown_pos,
                    on_toggle: move |column: String| {
                        if let Err(err) = session.write().toggle_column(&column) {
                            status.set(err.to_string());
                        }
                    }
                }
                if sort.is_some() {
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| session.write().clear_sort(),
                        "Clear sort"
                    }
                }
                span { style: "color: #555;", "Showing {shown} of {matching} matching ({total} total)" }
            }

            div {
                style: "overflow: auto; max-height: calc(100vh - 220px); border: 1px solid #ddd; background: #fff;",
                table { style: "border-collapse: collapse; width: 100%;",
                    thead {
                        tr {
                            {headers.iter().map(|header| {
                                let arrow = sort
                                    .as_ref()
                                    .filter(|spec| &spec.column == header)
                                    .map(|spec| spec.direction.arrow())
                                    .unwrap_or("");
                                let column = header.clone();
                                rsx!(
                                    th {
                                        style: HEADER_CELL_STYLE,
                                        onclick: move |_| {
                                            if let Err(err) = session.write().sort_by_column(&column) {
                                                status.set(err.to_string());
                                            }
                                        },
                                        "{header} {arrow}"
                                    }
                                )
                            })}
                        }
                    }
                    tbody {
                        {rows.iter().map(|row| {
                            rsx!(
                                tr {
                                    {row.iter().map(|value| {
                                        let alignment = cell_alignment(value);
                                        rsx!(
                                            td {
                                                style: "border: 1px solid #e5e7eb; padding: 4px 6px; text-align: {alignment};",
                                                "{value}"
                                            }
                                        )
                                    })}
                                }
                            )
                        })}
                    }
                }
                if rows.is_empty() {
                    p { style: "padding: 12px; color: #777;", "No rows to show" }
                }
            }
        }
    }
}

#[component]
fn AttendanceScreen(state: AppState) -> Element {
    let AppState {
        mut session,
        mut status,
        mut attendance_input,
        mut attendance_feedback,
        mut summary_report,
        ..
    } = state;

    let (active, meaning, absentees, column, has_report) = {
        let session = session.read();
        let absentees: Vec<String> = session
            .last_report()
            .map(|report| report.absentees().map(RollToken::to_string).collect())
            .unwrap_or_default();
        (
            session.active_sections().clone(),
            session.input_meaning(),
            absentees,
            session.attendance_column().to_string(),
            session.last_report().is_some(),
        )
    };
    let feedback = attendance_feedback();
    let absentee_text = absentees.join(", ");
    let absentee_count = absentees.len();

    rsx! {
        div {
            style: "{PANEL_STYLE} display: flex; flex-direction: column; gap: 10px;",
            div {
                style: "display: flex; gap: 8px; align-items: center;",
                span { "Sections" }
                {Section::ALL.iter().map(|section| {
                    let section = *section;
                    let style = toggle_button_style(active.contains(&section));
                    rsx!(
                        button {
                            style: style,
                            onclick: move |_| session.write().toggle_section(section),
                            "Section {section}"
                        }
                    )
                })}
            }
            div {
                style: "display: flex; gap: 8px; align-items: center;",
                span { "Roll numbers entered are" }
                button {
                    style: toggle_button_style(meaning == InputMeaning::MarksAbsent),
                    onclick: move |_| session.write().set_input_meaning(InputMeaning::MarksAbsent),
                    "Absent"
                }
                button {
                    style: toggle_button_style(meaning == InputMeaning::MarksPresent),
                    onclick: move |_| session.write().set_input_meaning(InputMeaning::MarksPresent),
                    "Present"
                }
            }
            textarea {
                style: "min-height: 120px; font-family: monospace;",
                placeholder: "e.g. 3, 7 LE2 A5",
                value: attendance_input(),
                oninput: move |event| attendance_input.set(event.value())
            }
            div {
                style: "display: flex; gap: 8px;",
                button {
                    style: toggle_button_style(true),
                    onclick: move |_| {
                        let input = attendance_input();
                        let mut session = session.write();
                        match session.resolve_attendance(&input) {
                            Ok(report) => {
                                attendance_feedback.set(report.feedback_lines());
                                status.set("Attendance resolved".to_string());
                            }
                            Err(err) => {
                                attendance_feedback.set(vec![err.to_string()]);
                                status.set(err.to_string());
                            }
                        }
                    },
                    "Resolve"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: !has_report,
                    onclick: move |_| {
                        let merged = session.write().merge_last_report();
                        match merged {
                            Ok(Some(version)) => {
                                summary_report.set(None);
                                status.set(format!("Added column {column} (version {})", version.0));
                            }
                            Ok(None) => status.set("Resolve attendance first".to_string()),
                            Err(err) => status.set(format!("Could not add attendance: {err}")),
                        }
                    },
                    "Add to table"
                }
            }
            if !feedback.is_empty() {
                div {
                    style: "background: #f9fafb; border: 1px solid #e5e7eb; border-radius: 6px; padding: 8px;",
                    for line in feedback.iter() {
                        p { style: "margin: 2px 0;", "{line}" }
                    }
                }
            }
            if has_report {
                div {
                    strong { "Absent ({absentee_count}): " }
                    span { "{absentee_text}" }
                }
            }
        }
    }
}

#[component]
fn SummaryTable(entries: Vec<SummaryEntry>) -> Element {
    rsx! {
        table { style: "border-collapse: collapse;",
            {entries.iter().map(|entry| {
                let label = entry.label.clone();
                let value = entry.value.clone();
                rsx!(
                    tr {
                        td { style: "padding: 4px 12px 4px 0; color: #555;", "{label}" }
                        td { style: "padding: 4px 0; font-weight: 600;", "{value}" }
                    }
                )
            })}
        }
    }
}

#[component]
fn HodScreen(state: AppState) -> Element {
    let AppState {
        session,
        mut summary_report,
        mut status,
        ..
    } = state;
    let report = summary_report();

    rsx! {
        div {
            style: PANEL_STYLE,
            button {
                style: toggle_button_style(true),
                onclick: move |_| {
                    let report = session.read().summary();
                    info!(batches = report.batch_totals.len(), "summary generated");
                    summary_report.set(Some(report));
                    status.set("Summary generated".to_string());
                },
                "Generate summary"
            }
        }
        {report.map(|report| rsx!(
            div {
                style: PANEL_STYLE,
                h3 { style: "margin-top: 0;", "All students" }
                SummaryTable { entries: report.totals.clone() }
                for note in report.notes.iter() {
                    p { style: "color: #a16207; margin: 4px 0;", "{note}" }
                }
            }
            {report.batch_totals.iter().map(|batch| {
                let title = format!("Batch {}", batch.batch);
                rsx!(
                    div {
                        style: PANEL_STYLE,
                        h3 { style: "margin-top: 0;", "{title}" }
                        SummaryTable { entries: batch.entries.clone() }
                    }
                )
            })}
        ))}
    }
}
