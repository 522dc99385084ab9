//! Upload → clean → download, end to end through real `.xlsx` bytes.

use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use rusty_clientes::data::columns::{INCOME_COLUMN, SENTINEL};
use rusty_clientes::chart::render::{RenderBackend, RenderError, ENABLE_HINT};
use rusty_clientes::session::{Session, SessionError};
use rusty_clientes::{chart_rows, clean, export, load_bytes, CellValue, ChartKind, ChartSpec};

enum In<'a> {
    Text(&'a str),
    Num(f64),
    Blank,
}

fn workbook(columns: &[&str], rows: &[Vec<In>]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let sheet = wb.add_worksheet();
    for (c, name) in columns.iter().enumerate() {
        sheet.write_string(0, c as u16, *name).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32 + 1, c as u16);
            match cell {
                In::Text(s) => {
                    sheet.write_string(r, c, *s).unwrap();
                }
                In::Num(n) => {
                    sheet.write_number(r, c, *n).unwrap();
                }
                In::Blank => {}
            }
        }
    }
    wb.save_to_buffer().unwrap()
}

const COLUMNS: [&str; 5] = [
    "Fecha de Registro",
    INCOME_COLUMN,
    "Edad",
    "Profesión",
    "Nombre",
];

#[test]
fn documented_row_round_trips_through_xlsx() {
    let bytes = workbook(
        &COLUMNS,
        &[vec![
            In::Text("not-a-date"),
            In::Num(-5.0),
            In::Blank,
            In::Blank,
            In::Text("Ana"),
        ]],
    );

    let cleaned = clean(&load_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned.cell(0, "Fecha de Registro"), Some(CellValue::text(SENTINEL)));
    assert_eq!(cleaned.cell(0, INCOME_COLUMN), Some(CellValue::Float(0.0)));
    assert_eq!(cleaned.cell(0, "Edad"), Some(CellValue::Integer(0)));
    assert_eq!(cleaned.cell(0, "Profesión"), Some(CellValue::text(SENTINEL)));
    assert_eq!(cleaned.cell(0, "Nombre"), Some(CellValue::text("Ana")));

    let back = load_bytes(&export(&cleaned).unwrap()).unwrap();
    assert_eq!(back.columns(), cleaned.columns());
    assert_eq!(back.cell(0, INCOME_COLUMN).and_then(|v| v.as_f64()), Some(0.0));
    assert_eq!(back.cell(0, "Fecha de Registro"), Some(CellValue::text(SENTINEL)));
}

#[test]
fn rows_identical_after_date_normalisation_collapse() {
    let bytes = workbook(
        &COLUMNS,
        &[
            vec![In::Text("2023-04-05"), In::Num(2.0), In::Num(30.0), In::Text("Docente"), In::Text("Ana")],
            vec![In::Text("2023/04/05"), In::Num(2.0), In::Num(30.0), In::Text("Docente"), In::Text("Ana")],
            vec![In::Text("2023-04-06"), In::Num(2.0), In::Num(30.0), In::Text("Docente"), In::Text("Ana")],
        ],
    );
    let cleaned = clean(&load_bytes(&bytes).unwrap()).unwrap();
    let dates: Vec<String> = cleaned
        .column_values("Fecha de Registro")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(dates, vec!["2023-04-05", "2023-04-06"]);
}

#[test]
fn session_downloads_survive_a_missing_render_backend() {
    let bytes = workbook(
        &["Barrio", INCOME_COLUMN],
        &[
            vec![In::Text("Centro"), In::Num(3.0)],
            vec![In::Blank, In::Num(1.0)],
            vec![In::Text("Norte"), In::Blank],
        ],
    );
    let mut session = Session::from_upload("clientes.xlsx", load_bytes(&bytes).unwrap())
        .unwrap()
        .with_render_backend(RenderBackend::Unavailable { hint: ENABLE_HINT });
    let spec = ChartSpec {
        x: "Barrio".into(),
        y: INCOME_COLUMN.into(),
        kind: ChartKind::Pie,
    };
    let chart = session.generate_chart(&spec).unwrap();
    assert_eq!(chart.title, "Distribución de Barrio");

    assert!(matches!(
        session.chart_image_download(),
        Err(SessionError::Render(RenderError::BackendUnavailable { .. }))
    ));
    let data = session.chart_data_download().unwrap();
    let rows = load_bytes(&data.bytes).unwrap();
    assert_eq!(rows.columns(), &["Barrio".to_string(), INCOME_COLUMN.to_string()]);
    assert_eq!(rows.len(), 3);

    let cleaned = session.cleaned_download().unwrap();
    assert_eq!(cleaned.file_name, "datos_limpios.xlsx");
}

#[test]
fn chart_rows_drop_missing_values_before_cleaning() {
    let bytes = workbook(
        &["Barrio", "Edad"],
        &[
            vec![In::Text("Centro"), In::Num(40.0)],
            vec![In::Blank, In::Num(22.0)],
            vec![In::Text("Sur"), In::Blank],
        ],
    );
    let raw = load_bytes(&bytes).unwrap();
    let rows = chart_rows(&raw, "Barrio", "Edad").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.cell(0, "Barrio"), Some(CellValue::text("Centro")));
}

#[test]
fn text_columns_chart_against_each_other() {
    let bytes = workbook(
        &["Edad", "Profesión"],
        &[
            vec![In::Num(30.0), In::Text("Docente")],
            vec![In::Num(41.0), In::Text("Médico")],
        ],
    );
    let mut session = Session::from_upload("clientes.xlsx", load_bytes(&bytes).unwrap()).unwrap();
    let spec = ChartSpec {
        x: "Edad".into(),
        y: "Profesión".into(),
        kind: ChartKind::Bar,
    };
    let layout = session.generate_chart(&spec).unwrap().layout();
    assert_eq!(layout.points.len(), 2);
    assert_eq!(
        layout.y_categories,
        Some(vec!["Docente".to_string(), "Médico".to_string()])
    );
    let data = session.chart_data_download().unwrap();
    assert_eq!(load_bytes(&data.bytes).unwrap().len(), 2);
}
