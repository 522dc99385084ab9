use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

/// A sample cell. Blank cells are `None` in a row.
#[derive(Clone)]
enum Cell {
    Text(String),
    Number(f64),
}

const COLUMNS: [&str; 12] = [
    "Nombre",
    "Fecha de Nacimiento",
    "Fecha de Registro",
    "Ingresos (Salarios Mínimos)",
    "Edad",
    "Número de Hijos",
    "Profesión",
    "Estado Civil",
    "Barrio",
    "Correo",
    "Tiene Mascotas",
    "Cliente Nuevo",
];

const NAMES: [&str; 8] = ["Ana", "Luis", "Marta", "Jorge", "Sofía", "Pedro", "Lucía", "Diego"];
const JOBS: [&str; 5] = ["Ingeniero", "Docente", "Médico", "Comerciante", "Abogado"];
const STATUS: [&str; 4] = ["Soltero", "Casado", "Divorciado", "Viudo"];
const BARRIOS: [&str; 5] = ["Centro", "Norte", "Sur", "Laureles", "Poblado"];
const YES_NO: [&str; 2] = ["Sí", "No"];

/// Dates written in the layouts seen in real uploads, plus junk.
fn messy_date(rng: &mut SimpleRng, year: u64) -> Option<Cell> {
    let (m, d) = (1 + rng.below(12), 1 + rng.below(28));
    let text = match rng.below(6) {
        0 => format!("{year}-{m:02}-{d:02}"),
        1 => format!("{year}/{m:02}/{d:02}"),
        2 => format!("{d:02}/{m:02}/{year}"),
        3 => "sin fecha".to_string(),
        4 => return None,
        _ => format!("{year}-{m:02}-{d:02} 10:15:00"),
    };
    Some(Cell::Text(text))
}

fn maybe(rng: &mut SimpleRng, p_blank: f64, value: Cell) -> Option<Cell> {
    (!rng.chance(p_blank)).then_some(value)
}

fn sample_row(rng: &mut SimpleRng) -> Vec<Option<Cell>> {
    let birth_year = 1950 + rng.below(55);
    let age = 2024 - birth_year;
    let income = match rng.below(10) {
        0 => Cell::Number(-(1.0 + rng.below(5) as f64)),
        1 => Cell::Text("no reporta".to_string()),
        _ => Cell::Number((rng.next_f64() * 80.0).round() / 10.0),
    };
    let name = rng.pick(&NAMES).to_string();
    let job = rng.pick(&JOBS).to_string();
    let status = rng.pick(&STATUS).to_string();
    let barrio = rng.pick(&BARRIOS).to_string();
    let pets = rng.pick(&YES_NO).to_string();
    let new_client = rng.pick(&YES_NO).to_string();
    let email = format!("{}{}@correo.com", name.to_lowercase(), rng.below(100));
    let register_year = 2018 + rng.below(7);
    let children = rng.below(4) as f64;

    vec![
        Some(Cell::Text(name)),
        messy_date(rng, birth_year),
        messy_date(rng, register_year),
        maybe(rng, 0.1, income),
        maybe(rng, 0.1, Cell::Number(age as f64)),
        maybe(rng, 0.15, Cell::Number(children)),
        maybe(rng, 0.15, Cell::Text(job)),
        maybe(rng, 0.1, Cell::Text(status)),
        maybe(rng, 0.1, Cell::Text(barrio)),
        maybe(rng, 0.2, Cell::Text(email)),
        maybe(rng, 0.1, Cell::Text(pets)),
        maybe(rng, 0.1, Cell::Text(new_client)),
    ]
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let mut rows: Vec<Vec<Option<Cell>>> = (0..200).map(|_| sample_row(&mut rng)).collect();
    // Exact copies so duplicate removal has something to do.
    for i in (0..rows.len()).step_by(25) {
        let copy = rows[i].clone();
        rows.push(copy);
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    for (c, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *name, &header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = ((r + 1) as u32, c as u16);
            match cell {
                Some(Cell::Text(s)) => {
                    sheet.write_string(r, c, s)?;
                }
                Some(Cell::Number(n)) => {
                    sheet.write_number(r, c, *n)?;
                }
                None => {}
            }
        }
    }

    let output_path = "clientes_muestra.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;

    log::info!("Wrote {} customer rows to {output_path}", rows.len());
    println!("Wrote {} customer rows to {output_path}", rows.len());
    Ok(())
}
